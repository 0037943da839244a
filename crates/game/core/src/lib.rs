//! Deterministic battle rules and data types.
//!
//! `battle-core` defines the immutable world snapshot, the atomic action
//! vocabulary with its read/write footprints, and the damage/status pipeline
//! those actions invoke. Everything here is a pure function over values:
//! there is no I/O, no wall clock and no ambient randomness. The DSL
//! compiler and the turn scheduler live in the content and runtime crates
//! and depend on the types re-exported here.
pub mod action;
pub mod combat;
pub mod config;
pub mod error;
pub mod rng;
pub mod round;
pub mod state;

pub use action::{
    Action, AddGlobalTag, AddTileTag, AddUnitTag, AtomicAction, Damage, DashTowards, Effect,
    EffectContext, Footprint, Heal, LineAoeDamage, MagicDamage, ModifyGlobalVar, ModifyUnitVar,
    Move, PhysicalDamage, RemoveGlobalTag, RemoveGlobalVar, RemoveTileTag, RemoveTileVar,
    RemoveUnitTag, RemoveUnitVar, SetGlobalVar, SetTileVar, SetUnitVar, Shape, TargetingMode,
    Trace, TraceEvent, VarKey, plan_batches,
};
pub use combat::{AttackSpec, DamageFlags, DamageKind, DamageReport};
pub use config::BattleConfig;
pub use error::{CastError, ErrorSeverity, GameError, WorldError};
pub use state::{
    Coord, Direction, DistanceMetric, GlobalState, TileGrid, TileState, UnitId, UnitState, Value,
    VarBag, WorldState,
};
