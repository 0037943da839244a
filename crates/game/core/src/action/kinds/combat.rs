//! Damage and heal actions, delegating to the combat pipeline.

use crate::action::{AtomicAction, EffectContext, Footprint, VarKey};
use crate::combat::{self, AttackSpec, DamageKind};
use crate::state::{UnitId, WorldState, keys};

// ============================================================================
// Footprint helpers
// ============================================================================

/// Which unit a footprint key refers to: a known id, or any unit selected at
/// apply time.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Subject<'a> {
    Unit(&'a UnitId),
    Any,
}

impl Subject<'_> {
    pub(crate) fn var(self, name: &str) -> VarKey {
        match self {
            Subject::Unit(id) => VarKey::unit_var(id, name),
            Subject::Any => VarKey::any_unit_var(name),
        }
    }

    pub(crate) fn tag(self, tag: &str) -> VarKey {
        match self {
            Subject::Unit(id) => VarKey::unit_tag(id, tag),
            Subject::Any => VarKey::any_unit_tag(tag),
        }
    }
}

/// Everything the generic damage and heal primitives may read, through
/// either reversal toggle.
pub(crate) fn hp_reads(s: Subject<'_>) -> Footprint {
    let mut fp: Footprint = [
        keys::HP,
        keys::MAX_HP,
        keys::SHIELD,
        keys::UNDYING_TURNS,
        keys::NO_HEAL_TURNS,
        keys::ON_DAMAGE_HEAL,
        keys::ON_DAMAGE_HEAL_TURNS,
        keys::HP_THRESHOLD,
        keys::THRESHOLD_SKILL_ID,
    ]
    .into_iter()
    .map(|name| s.var(name))
    .collect();
    fp.insert(s.tag(keys::THRESHOLD_FIRED_PREFIX));
    fp.insert(VarKey::global_var(keys::REVERSE_DAMAGE_TURNS));
    fp.insert(VarKey::global_var(keys::REVERSE_HEAL_TURNS));
    fp
}

pub(crate) fn hp_writes(s: Subject<'_>) -> Footprint {
    Footprint::new()
        .with(s.var(keys::HP))
        .with(s.var(keys::SHIELD))
        .with(s.tag(keys::THRESHOLD_FIRED_PREFIX))
}

pub(crate) fn attack_reads(attacker: Subject<'_>, defender: Subject<'_>) -> Footprint {
    let mut fp: Footprint = [
        keys::ATK,
        keys::MATK,
        keys::FORCE_IGNORE_DEF_TURNS,
        keys::IGNORE_DEF_BELOW_HP_PCT,
        keys::COUNTER_MULTIPLIER,
    ]
    .into_iter()
    .map(|name| attacker.var(name))
    .collect();
    fp.insert(attacker.tag(keys::DUEL_TAG));

    for name in [
        keys::DEF,
        keys::MDEF,
        keys::RESIST_PHYSICAL,
        keys::RESIST_MAGIC,
        keys::DAMAGE_REDUCTION,
        keys::DAMAGE_REDUCTION_TURNS,
        keys::EVASION,
        keys::TEMP_EVASION_BONUS,
        keys::TEMP_EVASION_BONUS_TURNS,
        keys::EVADE_CHARGES,
        keys::EVADE_ROLLS,
        keys::UNTARGETABLE_TURNS,
    ] {
        fp.insert(defender.var(name));
    }
    fp.insert(defender.tag(keys::DUEL_TAG));
    fp.extend(hp_reads(defender));
    fp
}

pub(crate) fn attack_writes(attacker: Subject<'_>, defender: Subject<'_>) -> Footprint {
    let mut fp = Footprint::new()
        .with(attacker.var(keys::COUNTER_MULTIPLIER))
        .with(defender.var(keys::EVADE_CHARGES))
        .with(defender.var(keys::EVADE_ROLLS))
        .with(defender.var(keys::COUNTER_MULTIPLIER));
    fp.extend(hp_writes(defender));
    fp
}

// ============================================================================
// Actions
// ============================================================================

/// Generic damage: shield, undying, Hp clamp and hooks, no mitigation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Damage {
    pub target: UnitId,
    pub amount: i64,
}

impl Damage {
    pub fn new(target: impl Into<UnitId>, amount: i64) -> Self {
        Self {
            target: target.into(),
            amount,
        }
    }
}

impl AtomicAction for Damage {
    fn reads(&self) -> Footprint {
        hp_reads(Subject::Unit(&self.target))
    }

    fn writes(&self) -> Footprint {
        hp_writes(Subject::Unit(&self.target))
    }

    fn apply(&self, world: &WorldState, ctx: &mut EffectContext<'_>) -> WorldState {
        combat::apply_damage(world, &self.target, self.amount, ctx).0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Heal {
    pub target: UnitId,
    pub amount: i64,
}

impl Heal {
    pub fn new(target: impl Into<UnitId>, amount: i64) -> Self {
        Self {
            target: target.into(),
            amount,
        }
    }
}

impl AtomicAction for Heal {
    fn reads(&self) -> Footprint {
        hp_reads(Subject::Unit(&self.target))
    }

    fn writes(&self) -> Footprint {
        hp_writes(Subject::Unit(&self.target))
    }

    fn apply(&self, world: &WorldState, ctx: &mut EffectContext<'_>) -> WorldState {
        combat::apply_heal(world, &self.target, self.amount, ctx).0
    }
}

/// Atk against Def through the full pipeline.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhysicalDamage {
    pub attacker: UnitId,
    pub target: UnitId,
    pub power: i64,
    pub ignore_ratio: f64,
}

impl PhysicalDamage {
    pub fn new(attacker: impl Into<UnitId>, target: impl Into<UnitId>, power: i64) -> Self {
        Self {
            attacker: attacker.into(),
            target: target.into(),
            power,
            ignore_ratio: 0.0,
        }
    }

    #[must_use]
    pub fn with_ignore_ratio(mut self, ratio: f64) -> Self {
        self.ignore_ratio = ratio;
        self
    }
}

impl AtomicAction for PhysicalDamage {
    fn reads(&self) -> Footprint {
        attack_reads(Subject::Unit(&self.attacker), Subject::Unit(&self.target))
    }

    fn writes(&self) -> Footprint {
        attack_writes(Subject::Unit(&self.attacker), Subject::Unit(&self.target))
    }

    fn apply(&self, world: &WorldState, ctx: &mut EffectContext<'_>) -> WorldState {
        let spec = AttackSpec::physical(self.power).with_ignore_ratio(self.ignore_ratio);
        combat::resolve_attack(world, &self.attacker, &self.target, &spec, ctx).0
    }
}

/// MAtk (falling back to Atk) against MDef through the full pipeline.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MagicDamage {
    pub attacker: UnitId,
    pub target: UnitId,
    pub power: i64,
    pub ignore_ratio: f64,
}

impl MagicDamage {
    pub fn new(attacker: impl Into<UnitId>, target: impl Into<UnitId>, power: i64) -> Self {
        Self {
            attacker: attacker.into(),
            target: target.into(),
            power,
            ignore_ratio: 0.0,
        }
    }

    #[must_use]
    pub fn with_ignore_ratio(mut self, ratio: f64) -> Self {
        self.ignore_ratio = ratio;
        self
    }
}

impl AtomicAction for MagicDamage {
    fn reads(&self) -> Footprint {
        attack_reads(Subject::Unit(&self.attacker), Subject::Unit(&self.target))
    }

    fn writes(&self) -> Footprint {
        attack_writes(Subject::Unit(&self.attacker), Subject::Unit(&self.target))
    }

    fn apply(&self, world: &WorldState, ctx: &mut EffectContext<'_>) -> WorldState {
        let spec = AttackSpec::new(DamageKind::Magic, self.power).with_ignore_ratio(self.ignore_ratio);
        combat::resolve_attack(world, &self.attacker, &self.target, &spec, ctx).0
    }
}
