//! Heal pipeline: reversal toggle, no-heal block, MaxHp clamp.

use crate::action::{EffectContext, TraceEvent};
use crate::combat::damage::damage_core;
use crate::combat::{DamageFlags, DamageReport};
use crate::state::{UnitId, WorldState, keys};

/// Heals `target` by `amount`.
///
/// While the global reverse-heal toggle is active the heal lands as damage
/// instead. Dead units stay dead.
pub fn apply_heal(
    world: &WorldState,
    target: &UnitId,
    amount: i64,
    ctx: &mut EffectContext<'_>,
) -> (WorldState, DamageReport) {
    if world.global().int(keys::REVERSE_HEAL_TURNS) > 0 {
        return damage_core(world, target, amount, DamageFlags::REVERSED, ctx);
    }
    heal_core(world, target, amount, DamageFlags::empty(), ctx)
}

pub(crate) fn heal_core(
    world: &WorldState,
    target: &UnitId,
    amount: i64,
    flags: DamageFlags,
    ctx: &mut EffectContext<'_>,
) -> (WorldState, DamageReport) {
    let Some(unit) = world.unit(target.as_str()) else {
        return (world.clone(), DamageReport::flagged(target, flags));
    };
    if amount <= 0 || !unit.is_alive() {
        return (world.clone(), DamageReport::flagged(target, flags));
    }
    if unit.int(keys::NO_HEAL_TURNS) > 0 {
        return (
            world.clone(),
            DamageReport::flagged(target, flags | DamageFlags::BLOCKED),
        );
    }

    let before = unit.hp();
    let mut after = before.saturating_add(amount);
    if unit.get(keys::MAX_HP).is_some() {
        after = after.min(unit.max_hp().max(before));
    }

    let restored = after - before;
    let next = world.update_unit(target.as_str(), |u| u.with_var(keys::HP, after));
    ctx.record(TraceEvent::Healed {
        target: target.clone(),
        amount: restored,
        flags,
    });

    (
        next,
        DamageReport {
            target: target.clone(),
            amount: restored,
            absorbed: 0,
            flags,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattleConfig;
    use crate::state::{Coord, UnitState};

    fn wounded(hp: i64) -> WorldState {
        WorldState::new(3, 3)
            .unwrap()
            .with_unit(UnitState::new("u", Coord::ORIGIN, 40).with_var(keys::HP, hp))
    }

    fn heal(world: &WorldState, amount: i64) -> (WorldState, DamageReport) {
        let config = BattleConfig::default();
        let mut ctx = EffectContext::new(&config);
        apply_heal(world, &"u".into(), amount, &mut ctx)
    }

    #[test]
    fn clamps_to_max_hp() {
        let (next, report) = heal(&wounded(35), 20);
        assert_eq!(next.unit("u").unwrap().hp(), 40);
        assert_eq!(report.amount, 5);
    }

    #[test]
    fn no_heal_blocks() {
        let world = wounded(10).update_unit("u", |u| u.with_var(keys::NO_HEAL_TURNS, 1));
        let (next, report) = heal(&world, 20);
        assert_eq!(next, world);
        assert!(report.flags.contains(DamageFlags::BLOCKED));
    }

    #[test]
    fn dead_units_are_not_revived() {
        let world = wounded(0);
        let (next, report) = heal(&world, 20);
        assert_eq!(next.unit("u").unwrap().hp(), 0);
        assert_eq!(report.amount, 0);
    }

    #[test]
    fn reverse_heal_deals_damage() {
        let world = wounded(30).update_global(|g| g.with_var(keys::REVERSE_HEAL_TURNS, 2));
        let (next, report) = heal(&world, 12);
        assert_eq!(next.unit("u").unwrap().hp(), 18);
        assert!(report.flags.contains(DamageFlags::REVERSED));
    }
}
