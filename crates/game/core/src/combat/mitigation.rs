//! Steps 2-6: stat resolution, defense overrides, resistance and multipliers.

use crate::combat::{DamageFlags, DamageKind};
use crate::config::BattleConfig;
use crate::round;
use crate::state::{UnitState, keys};

/// Parameters of one physical, magic or true-damage hit.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackSpec {
    pub kind: DamageKind,
    pub power: i64,
    /// Fraction of the defense stat to ignore (0.0 ..= 1.0).
    pub ignore_ratio: f64,
}

impl AttackSpec {
    pub fn new(kind: DamageKind, power: i64) -> Self {
        Self {
            kind,
            power,
            ignore_ratio: 0.0,
        }
    }

    pub fn physical(power: i64) -> Self {
        Self::new(DamageKind::Physical, power)
    }

    pub fn magic(power: i64) -> Self {
        Self::new(DamageKind::Magic, power)
    }

    pub fn true_damage(power: i64) -> Self {
        Self::new(DamageKind::True, power)
    }

    #[must_use]
    pub fn with_ignore_ratio(mut self, ratio: f64) -> Self {
        self.ignore_ratio = ratio;
        self
    }
}

fn attack_stat(attacker: &UnitState, kind: DamageKind) -> i64 {
    match kind {
        DamageKind::Magic if attacker.get(keys::MATK).is_some() => attacker.int(keys::MATK),
        _ => attacker.int(keys::ATK),
    }
}

fn defense_stat(defender: &UnitState, kind: DamageKind) -> i64 {
    match kind {
        DamageKind::Magic => defender.int(keys::MDEF),
        _ => defender.int(keys::DEF),
    }
}

fn resistance(defender: &UnitState, kind: DamageKind) -> f64 {
    match kind {
        DamageKind::Physical => defender.float(keys::RESIST_PHYSICAL),
        DamageKind::Magic => defender.float(keys::RESIST_MAGIC),
        DamageKind::True => 0.0,
    }
}

/// Attacker's execute threshold: defense is ignored when the defender's Hp
/// is at or below this percentage of its MaxHp.
fn below_execute_line(attacker: &UnitState, defender: &UnitState) -> bool {
    let pct = attacker.float(keys::IGNORE_DEF_BELOW_HP_PCT);
    let max_hp = defender.max_hp();
    if pct <= 0.0 || max_hp <= 0 {
        return false;
    }
    (defender.hp() as f64) * 100.0 <= pct * max_hp as f64
}

/// Damage after steps 2-6, before the generic damage primitive.
///
/// Reads the attacker's pending counter multiplier but does not consume it;
/// the caller removes it once the hit lands.
pub fn mitigate(
    attacker: &UnitState,
    defender: &UnitState,
    spec: &AttackSpec,
    config: &BattleConfig,
) -> (i64, DamageFlags) {
    let mut flags = DamageFlags::empty();
    if spec.kind == DamageKind::True {
        return (spec.power.max(0), flags);
    }

    let attack = attack_stat(attacker, spec.kind);
    let defense = defense_stat(defender, spec.kind);

    let effective_def = if attacker.int(keys::FORCE_IGNORE_DEF_TURNS) > 0
        || below_execute_line(attacker, defender)
    {
        flags |= DamageFlags::IGNORED_DEF;
        0
    } else {
        round::scale(defense, 1.0 - spec.ignore_ratio.clamp(0.0, 1.0))
    };

    let mut damage = (spec.power + attack - effective_def).max(0) as f64;

    let resist = resistance(defender, spec.kind);
    if resist > 0.0 {
        damage *= 1.0 - config.clamp_resist(resist);
    }

    if defender.int(keys::DAMAGE_REDUCTION_TURNS) > 0 {
        let reduction = defender.float(keys::DAMAGE_REDUCTION).clamp(0.0, 1.0);
        damage *= 1.0 - reduction;
    }

    let counter = attacker.float(keys::COUNTER_MULTIPLIER);
    if counter > 0.0 {
        damage *= counter;
        flags |= DamageFlags::COUNTER;
    }

    if attacker.has_tag(keys::DUEL_TAG) && defender.has_tag(keys::DUEL_TAG) {
        damage *= config.duel_multiplier;
        flags |= DamageFlags::DUEL;
    }

    (round::to_int(damage).max(0), flags)
}
