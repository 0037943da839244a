//! Read/write footprints for conflict detection between actions.
//!
//! Keys are namespaced by kind and target, so two actions touching different
//! units, or different variables on the same unit, never collide. Wildcard
//! keys stand for "this name on whichever units the action selects at apply
//! time" and overlap the concrete key on every unit.

use std::collections::BTreeSet;
use std::fmt;

use crate::state::{Coord, UnitId};

/// A single namespaced piece of world state.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VarKey {
    UnitVar { id: UnitId, name: String },
    UnitTag { id: UnitId, tag: String },
    TileVar { at: Coord, name: String },
    TileTag { at: Coord, tag: String },
    GlobalVar { name: String },
    GlobalTag { tag: String },
    /// The variable `name` on any unit.
    AnyUnitVar { name: String },
    /// The tag on any unit.
    AnyUnitTag { tag: String },
    /// The global RNG roll counter.
    GlobalRolls,
}

impl VarKey {
    pub fn unit_var(id: &UnitId, name: impl Into<String>) -> Self {
        Self::UnitVar {
            id: id.clone(),
            name: name.into(),
        }
    }

    pub fn unit_tag(id: &UnitId, tag: impl Into<String>) -> Self {
        Self::UnitTag {
            id: id.clone(),
            tag: tag.into(),
        }
    }

    pub fn tile_var(at: Coord, name: impl Into<String>) -> Self {
        Self::TileVar {
            at,
            name: name.into(),
        }
    }

    pub fn tile_tag(at: Coord, tag: impl Into<String>) -> Self {
        Self::TileTag {
            at,
            tag: tag.into(),
        }
    }

    pub fn global_var(name: impl Into<String>) -> Self {
        Self::GlobalVar { name: name.into() }
    }

    pub fn global_tag(tag: impl Into<String>) -> Self {
        Self::GlobalTag { tag: tag.into() }
    }

    pub fn any_unit_var(name: impl Into<String>) -> Self {
        Self::AnyUnitVar { name: name.into() }
    }

    pub fn any_unit_tag(tag: impl Into<String>) -> Self {
        Self::AnyUnitTag { tag: tag.into() }
    }

    /// Returns true if the two keys may denote the same piece of state.
    pub fn overlaps(&self, other: &VarKey) -> bool {
        use VarKey::*;
        match (self, other) {
            (AnyUnitVar { name: a }, AnyUnitVar { name: b })
            | (AnyUnitVar { name: a }, UnitVar { name: b, .. })
            | (UnitVar { name: b, .. }, AnyUnitVar { name: a }) => a == b,
            (AnyUnitTag { tag: a }, AnyUnitTag { tag: b })
            | (AnyUnitTag { tag: a }, UnitTag { tag: b, .. })
            | (UnitTag { tag: b, .. }, AnyUnitTag { tag: a }) => tags_overlap(a, b),
            (UnitTag { id: x, tag: a }, UnitTag { id: y, tag: b }) => x == y && tags_overlap(a, b),
            _ => self == other,
        }
    }
}

/// A tag ending in `:` names the family of tags sharing that prefix
/// (`threshold_fired:` covers `threshold_fired:<skill>` for every skill).
fn tags_overlap(a: &str, b: &str) -> bool {
    a == b || (a.ends_with(':') && b.starts_with(a)) || (b.ends_with(':') && a.starts_with(b))
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarKey::UnitVar { id, name } => write!(f, "unitvar:{id}:{name}"),
            VarKey::UnitTag { id, tag } => write!(f, "unittag:{id}:{tag}"),
            VarKey::TileVar { at, name } => write!(f, "tilevar:{},{}:{name}", at.x, at.y),
            VarKey::TileTag { at, tag } => write!(f, "tiletag:{},{}:{tag}", at.x, at.y),
            VarKey::GlobalVar { name } => write!(f, "globalvar:{name}"),
            VarKey::GlobalTag { tag } => write!(f, "globaltag:{tag}"),
            VarKey::AnyUnitVar { name } => write!(f, "unitvar:*:{name}"),
            VarKey::AnyUnitTag { tag } => write!(f, "unittag:*:{tag}"),
            VarKey::GlobalRolls => f.write_str("global:rolls"),
        }
    }
}

/// A set of [`VarKey`]s read or written by an action.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Footprint {
    keys: BTreeSet<VarKey>,
}

impl Footprint {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: VarKey) -> Self {
        self.keys.insert(key);
        self
    }

    pub fn insert(&mut self, key: VarKey) {
        self.keys.insert(key);
    }

    pub fn extend(&mut self, other: Footprint) {
        self.keys.extend(other.keys);
    }

    pub fn contains(&self, key: &VarKey) -> bool {
        self.keys.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VarKey> {
        self.keys.iter()
    }

    /// Returns true if no key of `self` overlaps a key of `other`.
    pub fn is_disjoint(&self, other: &Footprint) -> bool {
        !self
            .keys
            .iter()
            .any(|a| other.keys.iter().any(|b| a.overlaps(b)))
    }
}

impl FromIterator<VarKey> for Footprint {
    fn from_iter<I: IntoIterator<Item = VarKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}
