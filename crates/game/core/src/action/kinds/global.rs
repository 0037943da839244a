//! Global variable and tag primitives.

use crate::action::{AtomicAction, EffectContext, Footprint, VarKey};
use crate::state::{Value, WorldState};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetGlobalVar {
    pub name: String,
    pub value: Value,
}

impl SetGlobalVar {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl AtomicAction for SetGlobalVar {
    fn reads(&self) -> Footprint {
        Footprint::new()
    }

    fn writes(&self) -> Footprint {
        Footprint::new().with(VarKey::global_var(&self.name))
    }

    fn apply(&self, world: &WorldState, _ctx: &mut EffectContext<'_>) -> WorldState {
        world.update_global(|g| g.with_var(self.name.clone(), self.value.clone()))
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifyGlobalVar {
    pub name: String,
    pub delta: Value,
}

impl ModifyGlobalVar {
    pub fn new(name: impl Into<String>, delta: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            delta: delta.into(),
        }
    }
}

impl AtomicAction for ModifyGlobalVar {
    fn reads(&self) -> Footprint {
        Footprint::new().with(VarKey::global_var(&self.name))
    }

    fn writes(&self) -> Footprint {
        Footprint::new().with(VarKey::global_var(&self.name))
    }

    fn apply(&self, world: &WorldState, _ctx: &mut EffectContext<'_>) -> WorldState {
        world.update_global(|g| g.modified(&self.name, &self.delta))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemoveGlobalVar {
    pub name: String,
}

impl RemoveGlobalVar {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl AtomicAction for RemoveGlobalVar {
    fn reads(&self) -> Footprint {
        Footprint::new()
    }

    fn writes(&self) -> Footprint {
        Footprint::new().with(VarKey::global_var(&self.name))
    }

    fn apply(&self, world: &WorldState, _ctx: &mut EffectContext<'_>) -> WorldState {
        world.update_global(|g| g.without_var(&self.name))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AddGlobalTag {
    pub tag: String,
}

impl AddGlobalTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl AtomicAction for AddGlobalTag {
    fn reads(&self) -> Footprint {
        Footprint::new()
    }

    fn writes(&self) -> Footprint {
        Footprint::new().with(VarKey::global_tag(&self.tag))
    }

    fn apply(&self, world: &WorldState, _ctx: &mut EffectContext<'_>) -> WorldState {
        world.update_global(|g| g.with_tag(self.tag.clone()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemoveGlobalTag {
    pub tag: String,
}

impl RemoveGlobalTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl AtomicAction for RemoveGlobalTag {
    fn reads(&self) -> Footprint {
        Footprint::new()
    }

    fn writes(&self) -> Footprint {
        Footprint::new().with(VarKey::global_tag(&self.tag))
    }

    fn apply(&self, world: &WorldState, _ctx: &mut EffectContext<'_>) -> WorldState {
        world.update_global(|g| g.without_tag(&self.tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::keys;

    #[test]
    fn reverse_toggle_round_trip() {
        let world = WorldState::new(1, 1).unwrap();
        let on = SetGlobalVar::new(keys::REVERSE_HEAL_TURNS, 2).compile().apply(&world);
        assert_eq!(on.global().int(keys::REVERSE_HEAL_TURNS), 2);
        let off = RemoveGlobalVar::new(keys::REVERSE_HEAL_TURNS).compile().apply(&on);
        assert_eq!(off, world);
    }
}
