//! Step 1: evasion.

use crate::action::{EffectContext, TraceEvent};
use crate::rng::{PcgRng, RollContext, compute_seed, stream_id};
use crate::state::{UnitId, Value, WorldState, keys};

/// Result of the evasion check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvasionOutcome {
    Hit,
    /// The hit was avoided; `guaranteed` when a charge was spent.
    Evaded { guaranteed: bool },
}

impl EvasionOutcome {
    pub fn is_evaded(self) -> bool {
        matches!(self, EvasionOutcome::Evaded { .. })
    }
}

/// Rolls the defender's evasion against an incoming hit.
///
/// Guaranteed-evasion charges are spent before any roll. A successful evade
/// leaves the defender holding a one-shot counter multiplier for its next
/// hit. Rolls come from the defender's own stream, so checks against
/// different defenders never share state.
pub fn check_evasion(
    world: &WorldState,
    attacker: &UnitId,
    defender: &UnitId,
    ctx: &mut EffectContext<'_>,
) -> (WorldState, EvasionOutcome) {
    let Some(unit) = world.unit(defender.as_str()) else {
        return (world.clone(), EvasionOutcome::Hit);
    };
    let counter = ctx.config.counter_multiplier;

    let charges = unit.int(keys::EVADE_CHARGES);
    if charges > 0 {
        let next = world.update_unit(defender.as_str(), |u| {
            u.with_var(keys::EVADE_CHARGES, charges - 1)
                .with_var(keys::COUNTER_MULTIPLIER, counter)
        });
        ctx.record(TraceEvent::Evaded {
            attacker: attacker.clone(),
            defender: defender.clone(),
        });
        return (next, EvasionOutcome::Evaded { guaranteed: true });
    }

    let mut chance = unit.float(keys::EVASION);
    if unit.int(keys::TEMP_EVASION_BONUS_TURNS) > 0 {
        chance += unit.float(keys::TEMP_EVASION_BONUS);
    }
    let chance = chance.max(0.0).min(ctx.config.max_evasion);
    if chance <= 0.0 {
        return (world.clone(), EvasionOutcome::Hit);
    }

    let rolls = unit.int(keys::EVADE_ROLLS).max(0) as u64;
    let seed = compute_seed(
        world.global().seed,
        world.turn(),
        stream_id(defender.as_str()),
        rolls,
        RollContext::Evasion,
    );
    let evaded = PcgRng::unit_f64(seed) < chance;

    let next = world.update_unit(defender.as_str(), |u| {
        let u = u.modified(keys::EVADE_ROLLS, &Value::Int(1));
        if evaded {
            u.with_var(keys::COUNTER_MULTIPLIER, counter)
        } else {
            u
        }
    });

    if evaded {
        tracing::debug!(%attacker, %defender, chance, "hit evaded");
        ctx.record(TraceEvent::Evaded {
            attacker: attacker.clone(),
            defender: defender.clone(),
        });
        (next, EvasionOutcome::Evaded { guaranteed: false })
    } else {
        (next, EvasionOutcome::Hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattleConfig;
    use crate::state::{Coord, UnitState};

    fn duel(defender: UnitState) -> WorldState {
        WorldState::with_seed(4, 4, 11)
            .unwrap()
            .with_unit(UnitState::new("att", Coord::new(0, 0), 20))
            .with_unit(defender)
    }

    #[test]
    fn charge_is_spent_before_rolling() {
        let world = duel(UnitState::new("def", Coord::new(1, 0), 20).with_var(keys::EVADE_CHARGES, 2));
        let config = BattleConfig::default();
        let mut ctx = EffectContext::new(&config);

        let (next, outcome) = check_evasion(&world, &"att".into(), &"def".into(), &mut ctx);

        assert_eq!(outcome, EvasionOutcome::Evaded { guaranteed: true });
        let def = next.unit("def").unwrap();
        assert_eq!(def.int(keys::EVADE_CHARGES), 1);
        assert_eq!(def.float(keys::COUNTER_MULTIPLIER), config.counter_multiplier);
        assert_eq!(def.int(keys::EVADE_ROLLS), 0);
    }

    #[test]
    fn zero_evasion_never_rolls() {
        let world = duel(UnitState::new("def", Coord::new(1, 0), 20));
        let config = BattleConfig::default();
        let mut ctx = EffectContext::new(&config);

        let (next, outcome) = check_evasion(&world, &"att".into(), &"def".into(), &mut ctx);
        assert_eq!(outcome, EvasionOutcome::Hit);
        assert_eq!(next, world);
    }

    #[test]
    fn rolls_are_reproducible() {
        let world = duel(UnitState::new("def", Coord::new(1, 0), 20).with_var(keys::EVASION, 0.5));
        let config = BattleConfig::default();

        let run = || {
            let mut ctx = EffectContext::new(&config);
            check_evasion(&world, &"att".into(), &"def".into(), &mut ctx)
        };
        let (a_world, a) = run();
        let (b_world, b) = run();
        assert_eq!(a, b);
        assert_eq!(a_world, b_world);
        assert_eq!(a_world.unit("def").unwrap().int(keys::EVADE_ROLLS), 1);
    }
}
