//! Atomic actions: typed world mutations with declared footprints.
//!
//! # Module Structure
//!
//! - `effect`: compiled [`Effect`]s, the [`EffectContext`] and its [`Trace`]
//! - `footprint`: namespaced [`VarKey`]s and [`Footprint`] sets
//! - `kinds`: one struct per primitive (unit/tile/global vars and tags,
//!   damage, heal, movement, area damage)
//! - `targeting`: targeting modes and line/cone shapes
//! - `batch`: grouping submitted actions into mutually commutative batches
//!
//! Every action is pure: `apply` returns a new [`WorldState`] and never
//! touches its input.

pub mod batch;
pub mod effect;
pub mod footprint;
pub mod kinds;
pub mod targeting;

pub use batch::plan_batches;
pub use effect::{Effect, EffectContext, Trace, TraceEvent};
pub use footprint::{Footprint, VarKey};
pub use kinds::{
    AddGlobalTag, AddTileTag, AddUnitTag, Damage, DashTowards, Heal, LineAoeDamage, MagicDamage,
    ModifyGlobalVar, ModifyUnitVar, Move, PhysicalDamage, RemoveGlobalTag, RemoveGlobalVar,
    RemoveTileTag, RemoveTileVar, RemoveUnitTag, RemoveUnitVar, SetGlobalVar, SetTileVar,
    SetUnitVar,
};
pub use targeting::{Shape, TargetingMode};

use crate::state::WorldState;

/// A single declared mutation.
///
/// `reads` and `writes` are static approximations of the state an
/// application may touch. Actions that select units at apply time declare
/// wildcard keys for them.
pub trait AtomicAction {
    fn reads(&self) -> Footprint;

    fn writes(&self) -> Footprint;

    /// Applies the action to `world`, returning the successor state.
    fn apply(&self, world: &WorldState, ctx: &mut EffectContext<'_>) -> WorldState;

    /// Packages the action as a reusable [`Effect`].
    fn compile(&self) -> Effect
    where
        Self: Sized + Clone + Send + Sync + 'static,
    {
        let action = self.clone();
        Effect::new(move |world, ctx| action.apply(world, ctx))
    }

    /// True when neither action writes anything the other reads or writes,
    /// so applying them in either order yields the same world.
    fn is_commutative_with(&self, other: &dyn AtomicAction) -> bool {
        let (my_reads, my_writes) = (self.reads(), self.writes());
        let (their_reads, their_writes) = (other.reads(), other.writes());
        my_writes.is_disjoint(&their_writes)
            && my_writes.is_disjoint(&their_reads)
            && their_writes.is_disjoint(&my_reads)
    }
}

macro_rules! define_actions {
    ($($variant:ident),* $(,)?) => {
        /// Every primitive in the action vocabulary.
        #[derive(Clone, Debug, PartialEq, strum::AsRefStr)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[strum(serialize_all = "snake_case")]
        pub enum Action {
            $($variant($variant),)*
        }

        $(
            impl From<$variant> for Action {
                fn from(action: $variant) -> Self {
                    Action::$variant(action)
                }
            }
        )*

        impl AtomicAction for Action {
            fn reads(&self) -> Footprint {
                match self {
                    $(Action::$variant(a) => a.reads(),)*
                }
            }

            fn writes(&self) -> Footprint {
                match self {
                    $(Action::$variant(a) => a.writes(),)*
                }
            }

            fn apply(&self, world: &WorldState, ctx: &mut EffectContext<'_>) -> WorldState {
                match self {
                    $(Action::$variant(a) => a.apply(world, ctx),)*
                }
            }
        }
    };
}

define_actions! {
    SetUnitVar,
    ModifyUnitVar,
    RemoveUnitVar,
    AddUnitTag,
    RemoveUnitTag,
    Damage,
    Heal,
    PhysicalDamage,
    MagicDamage,
    Move,
    DashTowards,
    LineAoeDamage,
    SetTileVar,
    RemoveTileVar,
    AddTileTag,
    RemoveTileTag,
    SetGlobalVar,
    ModifyGlobalVar,
    RemoveGlobalVar,
    AddGlobalTag,
    RemoveGlobalTag,
}

impl Action {
    /// Snake-case name of the primitive, e.g. `physical_damage`.
    pub fn name(&self) -> &str {
        self.as_ref()
    }
}

/// Applies `actions` strictly left to right, threading one world through.
pub fn apply_all(world: &WorldState, actions: &[Action], ctx: &mut EffectContext<'_>) -> WorldState {
    actions
        .iter()
        .fold(world.clone(), |acc, action| action.apply(&acc, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattleConfig;
    use crate::state::{Coord, UnitState, keys};

    #[test]
    fn enum_delegates_and_names_variants() {
        let action: Action = Damage::new("a", 4).into();
        assert_eq!(action.name(), "damage");
        assert_eq!(Action::from(LineAoeDamage::new("a", "b", Default::default(), 1)).name(), "line_aoe_damage");

        let world = WorldState::new(2, 2)
            .unwrap()
            .with_unit(UnitState::new("a", Coord::ORIGIN, 10));
        let config = BattleConfig::default();
        let mut ctx = EffectContext::new(&config);
        let next = apply_all(
            &world,
            &[action, ModifyUnitVar::new("a", keys::HP, 1).into()],
            &mut ctx,
        );
        assert_eq!(next.unit("a").unwrap().hp(), 7);
        assert_eq!(ctx.trace.lines(), vec!["a takes 4 damage"]);
    }

    #[test]
    fn commutativity_is_symmetric() {
        let a: Action = SetGlobalVar::new("weather", "rain").into();
        let b: Action = Damage::new("x", 1).into();
        let c: Action = SetGlobalVar::new(keys::REVERSE_DAMAGE_TURNS, 1).into();
        assert!(a.is_commutative_with(&b));
        assert!(b.is_commutative_with(&a));
        assert!(!b.is_commutative_with(&c));
        assert!(!c.is_commutative_with(&b));
    }
}
