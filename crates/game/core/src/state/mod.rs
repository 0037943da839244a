//! Immutable world snapshot and its building blocks.
//!
//! [`WorldState`] aggregates one [`GlobalState`], a fixed-size [`TileGrid`]
//! and the unit map. All types here are plain values with copy-with-change
//! helpers; nothing in the crate mutates a snapshot after handing it out.
mod common;
mod digest;
mod global;
pub mod keys;
mod tile;
mod unit;
mod value;
mod vars;
mod world;

pub use common::{Coord, Direction, DistanceMetric, UnitId};
pub use global::GlobalState;
pub use tile::{TileGrid, TileState};
pub use unit::UnitState;
pub use value::Value;
pub use vars::VarBag;
pub use world::WorldState;
