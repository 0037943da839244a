//! Damage and status resolution.
//!
//! Pure routines invoked by the damaging and healing actions. The physical
//! and magic path runs a fixed, order-sensitive chain:
//!
//! 1. Evasion (guaranteed charges first, then a seeded roll)
//! 2. Attack / defense stat resolution
//! 3. Defense-ignoring overrides (forced > low-HP execute > explicit ratio)
//! 4. Raw damage `max(0, power + attack - effective_defense)`
//! 5. Resistance and timed damage reduction
//! 6. Counter-attack and duel multipliers
//! 7. Generic damage: reversal toggle, shield, undying floor, Hp clamp
//! 8. Post-damage hooks: on-damage heal, HP-threshold trigger
//!
//! Healing mirrors step 7 with its own reversal toggle, a no-heal block and
//! the max-HP clamp.

mod damage;
mod evasion;
mod heal;
mod mitigation;
mod threshold;

pub use damage::{apply_damage, resolve_attack};
pub use evasion::{EvasionOutcome, check_evasion};
pub use heal::apply_heal;
pub use mitigation::{AttackSpec, mitigate};
pub use threshold::crossed_threshold;

use std::fmt;

use bitflags::bitflags;

use crate::state::UnitId;

/// Damage channel, selecting which attack/defense/resistance stats apply.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DamageKind {
    /// Atk against Def, reduced by physical resistance.
    #[default]
    Physical,
    /// MAtk (falling back to Atk) against MDef, reduced by magic resistance.
    Magic,
    /// Skips evasion and mitigation entirely.
    True,
}

bitflags! {
    /// What happened while a single damage or heal resolved.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct DamageFlags: u16 {
        const EVADED       = 1 << 0;
        const REVERSED     = 1 << 1;
        const ABSORBED     = 1 << 2;
        const UNDYING      = 1 << 3;
        const LETHAL       = 1 << 4;
        const BLOCKED      = 1 << 5;
        const THRESHOLD    = 1 << 6;
        const COUNTER      = 1 << 7;
        const DUEL         = 1 << 8;
        const IGNORED_DEF  = 1 << 9;
    }
}

impl fmt::Display for DamageFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

/// Outcome of a single damage or heal resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DamageReport {
    pub target: UnitId,
    /// Hp actually removed (damage) or restored (heal).
    pub amount: i64,
    /// Damage soaked by the shield.
    pub absorbed: i64,
    pub flags: DamageFlags,
}

impl DamageReport {
    pub(crate) fn none(target: &UnitId) -> Self {
        Self {
            target: target.clone(),
            amount: 0,
            absorbed: 0,
            flags: DamageFlags::empty(),
        }
    }

    pub(crate) fn flagged(target: &UnitId, flags: DamageFlags) -> Self {
        Self {
            flags,
            ..Self::none(target)
        }
    }
}
