//! Tile variable and tag primitives. Out-of-bounds coordinates are no-ops.

use crate::action::{AtomicAction, EffectContext, Footprint, VarKey};
use crate::state::{Coord, Value, WorldState};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetTileVar {
    pub at: Coord,
    pub name: String,
    pub value: Value,
}

impl SetTileVar {
    pub fn new(at: Coord, name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            at,
            name: name.into(),
            value: value.into(),
        }
    }
}

impl AtomicAction for SetTileVar {
    fn reads(&self) -> Footprint {
        Footprint::new()
    }

    fn writes(&self) -> Footprint {
        Footprint::new().with(VarKey::tile_var(self.at, &self.name))
    }

    fn apply(&self, world: &WorldState, _ctx: &mut EffectContext<'_>) -> WorldState {
        world.update_tile(self.at, |t| t.with_var(self.name.clone(), self.value.clone()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemoveTileVar {
    pub at: Coord,
    pub name: String,
}

impl RemoveTileVar {
    pub fn new(at: Coord, name: impl Into<String>) -> Self {
        Self {
            at,
            name: name.into(),
        }
    }
}

impl AtomicAction for RemoveTileVar {
    fn reads(&self) -> Footprint {
        Footprint::new()
    }

    fn writes(&self) -> Footprint {
        Footprint::new().with(VarKey::tile_var(self.at, &self.name))
    }

    fn apply(&self, world: &WorldState, _ctx: &mut EffectContext<'_>) -> WorldState {
        world.update_tile(self.at, |t| t.without_var(&self.name))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AddTileTag {
    pub at: Coord,
    pub tag: String,
}

impl AddTileTag {
    pub fn new(at: Coord, tag: impl Into<String>) -> Self {
        Self { at, tag: tag.into() }
    }
}

impl AtomicAction for AddTileTag {
    fn reads(&self) -> Footprint {
        Footprint::new()
    }

    fn writes(&self) -> Footprint {
        Footprint::new().with(VarKey::tile_tag(self.at, &self.tag))
    }

    fn apply(&self, world: &WorldState, _ctx: &mut EffectContext<'_>) -> WorldState {
        world.update_tile(self.at, |t| t.with_tag(self.tag.clone()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemoveTileTag {
    pub at: Coord,
    pub tag: String,
}

impl RemoveTileTag {
    pub fn new(at: Coord, tag: impl Into<String>) -> Self {
        Self { at, tag: tag.into() }
    }
}

impl AtomicAction for RemoveTileTag {
    fn reads(&self) -> Footprint {
        Footprint::new()
    }

    fn writes(&self) -> Footprint {
        Footprint::new().with(VarKey::tile_tag(self.at, &self.tag))
    }

    fn apply(&self, world: &WorldState, _ctx: &mut EffectContext<'_>) -> WorldState {
        world.update_tile(self.at, |t| t.without_tag(&self.tag))
    }
}
