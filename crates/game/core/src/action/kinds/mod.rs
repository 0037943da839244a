mod area;
pub(crate) mod combat;
mod global;
mod movement;
mod tile;
mod unit;

pub use area::LineAoeDamage;
pub use combat::{Damage, Heal, MagicDamage, PhysicalDamage};
pub use global::{AddGlobalTag, ModifyGlobalVar, RemoveGlobalTag, RemoveGlobalVar, SetGlobalVar};
pub use movement::{DashTowards, Move};
pub use tile::{AddTileTag, RemoveTileTag, RemoveTileVar, SetTileVar};
pub use unit::{AddUnitTag, ModifyUnitVar, RemoveUnitTag, RemoveUnitVar, SetUnitVar};
