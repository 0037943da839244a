//! Unit variable and tag primitives.

use crate::action::{AtomicAction, EffectContext, Footprint, VarKey};
use crate::state::{UnitId, Value, WorldState};

/// Overwrites a unit variable.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetUnitVar {
    pub unit: UnitId,
    pub name: String,
    pub value: Value,
}

impl SetUnitVar {
    pub fn new(unit: impl Into<UnitId>, name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            unit: unit.into(),
            name: name.into(),
            value: value.into(),
        }
    }
}

impl AtomicAction for SetUnitVar {
    fn reads(&self) -> Footprint {
        Footprint::new()
    }

    fn writes(&self) -> Footprint {
        Footprint::new().with(VarKey::unit_var(&self.unit, &self.name))
    }

    fn apply(&self, world: &WorldState, _ctx: &mut EffectContext<'_>) -> WorldState {
        world.update_unit(self.unit.as_str(), |u| {
            u.with_var(self.name.clone(), self.value.clone())
        })
    }
}

/// Adds a numeric delta to a unit variable (absent reads as 0).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifyUnitVar {
    pub unit: UnitId,
    pub name: String,
    pub delta: Value,
}

impl ModifyUnitVar {
    pub fn new(unit: impl Into<UnitId>, name: impl Into<String>, delta: impl Into<Value>) -> Self {
        Self {
            unit: unit.into(),
            name: name.into(),
            delta: delta.into(),
        }
    }
}

impl AtomicAction for ModifyUnitVar {
    fn reads(&self) -> Footprint {
        Footprint::new().with(VarKey::unit_var(&self.unit, &self.name))
    }

    fn writes(&self) -> Footprint {
        Footprint::new().with(VarKey::unit_var(&self.unit, &self.name))
    }

    fn apply(&self, world: &WorldState, _ctx: &mut EffectContext<'_>) -> WorldState {
        world.update_unit(self.unit.as_str(), |u| u.modified(&self.name, &self.delta))
    }
}

/// Removes a unit variable. Removing `Hp` leaves it at 0.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemoveUnitVar {
    pub unit: UnitId,
    pub name: String,
}

impl RemoveUnitVar {
    pub fn new(unit: impl Into<UnitId>, name: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            name: name.into(),
        }
    }
}

impl AtomicAction for RemoveUnitVar {
    fn reads(&self) -> Footprint {
        Footprint::new()
    }

    fn writes(&self) -> Footprint {
        Footprint::new().with(VarKey::unit_var(&self.unit, &self.name))
    }

    fn apply(&self, world: &WorldState, _ctx: &mut EffectContext<'_>) -> WorldState {
        world.update_unit(self.unit.as_str(), |u| u.without_var(&self.name))
    }
}

/// Adds a tag to a unit.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AddUnitTag {
    pub unit: UnitId,
    pub tag: String,
}

impl AddUnitTag {
    pub fn new(unit: impl Into<UnitId>, tag: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            tag: tag.into(),
        }
    }
}

impl AtomicAction for AddUnitTag {
    fn reads(&self) -> Footprint {
        Footprint::new()
    }

    fn writes(&self) -> Footprint {
        Footprint::new().with(VarKey::unit_tag(&self.unit, &self.tag))
    }

    fn apply(&self, world: &WorldState, _ctx: &mut EffectContext<'_>) -> WorldState {
        world.update_unit(self.unit.as_str(), |u| u.with_tag(self.tag.clone()))
    }
}

/// Removes a tag from a unit.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemoveUnitTag {
    pub unit: UnitId,
    pub tag: String,
}

impl RemoveUnitTag {
    pub fn new(unit: impl Into<UnitId>, tag: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            tag: tag.into(),
        }
    }
}

impl AtomicAction for RemoveUnitTag {
    fn reads(&self) -> Footprint {
        Footprint::new()
    }

    fn writes(&self) -> Footprint {
        Footprint::new().with(VarKey::unit_tag(&self.unit, &self.tag))
    }

    fn apply(&self, world: &WorldState, _ctx: &mut EffectContext<'_>) -> WorldState {
        world.update_unit(self.unit.as_str(), |u| u.without_tag(&self.tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Coord, UnitState, keys};

    fn world() -> WorldState {
        WorldState::new(3, 3)
            .unwrap()
            .with_unit(UnitState::new("a", Coord::ORIGIN, 10))
    }

    #[test]
    fn modify_accumulates() {
        let w = world();
        let once = ModifyUnitVar::new("a", keys::ATK, 3).compile().apply(&w);
        let twice = ModifyUnitVar::new("a", keys::ATK, 3).compile().apply(&once);
        assert_eq!(twice.unit("a").unwrap().int(keys::ATK), 6);
    }

    #[test]
    fn removing_hp_keeps_invariant() {
        let w = RemoveUnitVar::new("a", keys::HP).compile().apply(&world());
        assert_eq!(w.unit("a").unwrap().get(keys::HP), Some(&Value::Int(0)));
    }

    #[test]
    fn unknown_unit_is_noop() {
        let w = world();
        assert_eq!(AddUnitTag::new("ghost", "x").compile().apply(&w), w);
    }

    #[test]
    fn set_and_modify_same_key_conflict() {
        let set = SetUnitVar::new("a", keys::ATK, 1);
        let add = ModifyUnitVar::new("a", keys::ATK, 1);
        let other = ModifyUnitVar::new("a", keys::DEF, 1);
        assert!(!set.is_commutative_with(&add));
        assert!(set.is_commutative_with(&other));
    }
}
