//! Well-known variable and tag names.
//!
//! Storage is a free-form string map; these constants are the names the
//! combat pipeline and the maintenance pass agree on.

// ============================================================================
// Core stats
// ============================================================================

pub const HP: &str = "Hp";
pub const MAX_HP: &str = "MaxHp";
pub const MP: &str = "Mp";
pub const MAX_MP: &str = "MaxMp";
pub const ATK: &str = "Atk";
pub const DEF: &str = "Def";
pub const MATK: &str = "MAtk";
pub const MDEF: &str = "MDef";
pub const POS: &str = "Pos";
pub const TEAM: &str = "Team";
pub const ROLE: &str = "Role";
pub const SHIELD: &str = "Shield";

pub const HP_REGEN: &str = "hp_regen";
pub const MP_REGEN: &str = "mp_regen";

// ============================================================================
// Combat modifiers
// ============================================================================

pub const RESIST_PHYSICAL: &str = "resist_physical";
pub const RESIST_MAGIC: &str = "resist_magic";
/// Prefix shared by every resistance key; per-turn deltas on these clamp to
/// the configured resistance caps.
pub const RESIST_PREFIX: &str = "resist";

pub const EVASION: &str = "evasion";
/// Guaranteed-evasion charges, consumed one per evaded hit.
pub const EVADE_CHARGES: &str = "evade_charges";
pub const TEMP_EVASION_BONUS: &str = "temp_evasion_bonus";
/// One-shot multiplier set on a defender that evaded; consumed by its next hit.
pub const COUNTER_MULTIPLIER: &str = "counter_multiplier";
/// Rolls consumed from this unit's evasion stream.
pub const EVADE_ROLLS: &str = "evade_rolls";

pub const IGNORE_DEF_BELOW_HP_PCT: &str = "ignore_def_below_hp_pct";
pub const DAMAGE_REDUCTION: &str = "damage_reduction";
pub const ON_DAMAGE_HEAL: &str = "on_damage_heal";

pub const HP_THRESHOLD: &str = "hp_threshold";
pub const THRESHOLD_SKILL_ID: &str = "threshold_skill_id";
pub const THRESHOLD_FIRED_PREFIX: &str = "threshold_fired:";

pub const DUEL_TAG: &str = "duel";

// ============================================================================
// Damage over time
// ============================================================================

pub const BLEED_TURNS: &str = "bleed_turns";
pub const BLEED_PER_TURN: &str = "bleed_per_turn";
pub const BLEEDING_TAG: &str = "bleeding";
pub const BURN_TURNS: &str = "burn_turns";
pub const BURN_PER_TURN: &str = "burn_per_turn";
pub const BURNING_TAG: &str = "burning";

// ============================================================================
// Per-turn additive deltas
// ============================================================================

/// `per_turn_<Key>` adds its value to `<Key>` once per maintenance pass.
pub const PER_TURN_PREFIX: &str = "per_turn_";
/// `max_<Key>` caps a per-turn delta applied to `<Key>`.
pub const MAX_PREFIX: &str = "max_";

// ============================================================================
// Skill bookkeeping
// ============================================================================

/// `cooldown_until:<skill>` holds the first turn the skill is usable again.
pub const COOLDOWN_PREFIX: &str = "cooldown_until:";

// ============================================================================
// Global toggles
// ============================================================================

pub const REVERSE_HEAL_TURNS: &str = "reverse_heal_turns";
pub const REVERSE_DAMAGE_TURNS: &str = "reverse_damage_turns";
pub const REVERSE_HEAL_TAG: &str = "reverse_heal";
pub const REVERSE_DAMAGE_TAG: &str = "reverse_damage";

/// Key recording that a unit already fired its threshold trigger for `skill`.
pub fn threshold_fired(skill: &str) -> String {
    format!("{THRESHOLD_FIRED_PREFIX}{skill}")
}

/// Cooldown bookkeeping key for `skill`.
pub fn cooldown_until(skill: &str) -> String {
    format!("{COOLDOWN_PREFIX}{skill}")
}

// ============================================================================
// Timed statuses
// ============================================================================

/// A turn counter, the tag it keeps alive, and an optional companion value
/// that is cleared together with the tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimedStatus {
    pub counter: &'static str,
    pub tag: &'static str,
    pub companion: Option<&'static str>,
}

impl TimedStatus {
    const fn new(counter: &'static str, tag: &'static str) -> Self {
        Self {
            counter,
            tag,
            companion: None,
        }
    }

    const fn with_value(counter: &'static str, tag: &'static str, value: &'static str) -> Self {
        Self {
            counter,
            tag,
            companion: Some(value),
        }
    }
}

pub const UNDYING_TURNS: &str = "undying_turns";
pub const STUNNED_TURNS: &str = "stunned_turns";
pub const SILENCED_TURNS: &str = "silenced_turns";
pub const ROOTED_TURNS: &str = "rooted_turns";
pub const UNTARGETABLE_TURNS: &str = "untargetable_turns";
pub const CANNOT_ACT_TURNS: &str = "cannot_act_turns";
pub const STATUS_IMMUNE_TURNS: &str = "status_immune_turns";
pub const NO_HEAL_TURNS: &str = "no_heal_turns";
pub const TEMP_EVASION_BONUS_TURNS: &str = "temp_evasion_bonus_turns";
pub const FORCE_IGNORE_DEF_TURNS: &str = "force_ignore_def_turns";
pub const DAMAGE_REDUCTION_TURNS: &str = "damage_reduction_turns";
pub const ON_DAMAGE_HEAL_TURNS: &str = "on_damage_heal_turns";

/// Timed statuses in the order the maintenance pass decrements them.
pub const TIMED_STATUSES: [TimedStatus; 12] = [
    TimedStatus::new(UNDYING_TURNS, "undying"),
    TimedStatus::new(STUNNED_TURNS, "stunned"),
    TimedStatus::new(SILENCED_TURNS, "silenced"),
    TimedStatus::new(ROOTED_TURNS, "rooted"),
    TimedStatus::new(UNTARGETABLE_TURNS, "untargetable"),
    TimedStatus::new(CANNOT_ACT_TURNS, "cannot_act"),
    TimedStatus::new(STATUS_IMMUNE_TURNS, "status_immune"),
    TimedStatus::new(NO_HEAL_TURNS, "no_heal"),
    TimedStatus::with_value(
        TEMP_EVASION_BONUS_TURNS,
        "temp_evasion_bonus",
        TEMP_EVASION_BONUS,
    ),
    TimedStatus::new(FORCE_IGNORE_DEF_TURNS, "force_ignore_def"),
    TimedStatus::with_value(DAMAGE_REDUCTION_TURNS, "damage_reduction", DAMAGE_REDUCTION),
    TimedStatus::with_value(ON_DAMAGE_HEAL_TURNS, "on_damage_heal", ON_DAMAGE_HEAL),
];
