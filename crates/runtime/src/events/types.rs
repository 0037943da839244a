//! Event types for different topics.

use battle_core::{Coord, DamageFlags, TraceEvent, UnitId};

/// Events related to turn management (lightweight)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TurnEvent {
    /// A batch of actions was applied without advancing the turn.
    BatchApplied {
        turn: u64,
        actions: usize,
        /// Number of mutually commutative groups the batch splits into.
        batches: usize,
    },

    /// The maintenance pass finished and the turn counter moved on.
    Advanced { from: u64, to: u64 },
}

/// Events about individual units.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnitEvent {
    /// A timed status counter reached zero and its tag was removed.
    StatusExpired { unit: UnitId, status: String },

    /// The unit had Hp <= 0 at the end of a maintenance pass and was removed.
    Died { unit: UnitId, position: Coord },
}

/// Combat outcomes mirrored from the effect trace.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatEvent {
    Damaged {
        target: UnitId,
        amount: i64,
        flags: DamageFlags,
    },
    Healed {
        target: UnitId,
        amount: i64,
        flags: DamageFlags,
    },
    Evaded {
        attacker: UnitId,
        defender: UnitId,
    },
    /// A unit crossed its Hp threshold and its one-shot skill fired.
    ThresholdTriggered { unit: UnitId, skill: String },
}

impl CombatEvent {
    /// Converts a trace entry; moves and notes have no combat counterpart.
    pub fn from_trace(event: &TraceEvent) -> Option<Self> {
        match event {
            TraceEvent::Damaged {
                target,
                amount,
                flags,
            } => Some(Self::Damaged {
                target: target.clone(),
                amount: *amount,
                flags: *flags,
            }),
            TraceEvent::Healed {
                target,
                amount,
                flags,
            } => Some(Self::Healed {
                target: target.clone(),
                amount: *amount,
                flags: *flags,
            }),
            TraceEvent::Evaded { attacker, defender } => Some(Self::Evaded {
                attacker: attacker.clone(),
                defender: defender.clone(),
            }),
            TraceEvent::ThresholdTriggered { unit, skill } => Some(Self::ThresholdTriggered {
                unit: unit.clone(),
                skill: skill.clone(),
            }),
            TraceEvent::Moved { .. } | TraceEvent::Note(_) => None,
        }
    }
}
