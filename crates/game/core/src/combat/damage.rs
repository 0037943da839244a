//! Steps 1-8 for attacks and the generic damage primitive.

use crate::action::{EffectContext, TraceEvent};
use crate::combat::heal::heal_core;
use crate::combat::threshold::fire_threshold;
use crate::combat::{AttackSpec, DamageFlags, DamageKind, DamageReport, check_evasion, mitigate};
use crate::state::{UnitId, WorldState, keys};

/// Resolves a physical, magic or true-damage hit from `attacker` on `defender`.
///
/// Unknown units make the hit a no-op. True damage skips straight to the
/// generic primitive; physical and magic run the full chain.
pub fn resolve_attack(
    world: &WorldState,
    attacker: &UnitId,
    defender: &UnitId,
    spec: &AttackSpec,
    ctx: &mut EffectContext<'_>,
) -> (WorldState, DamageReport) {
    let Some(target) = world.unit(defender.as_str()) else {
        return (world.clone(), DamageReport::none(defender));
    };

    if spec.kind == DamageKind::True {
        return apply_damage(world, defender, spec.power, ctx);
    }
    if target.is_untargetable() {
        return (
            world.clone(),
            DamageReport::flagged(defender, DamageFlags::BLOCKED),
        );
    }
    if !world.contains_unit(attacker.as_str()) {
        return (world.clone(), DamageReport::none(defender));
    }

    let (world, outcome) = check_evasion(world, attacker, defender, ctx);
    if outcome.is_evaded() {
        return (world, DamageReport::flagged(defender, DamageFlags::EVADED));
    }

    let (Some(att), Some(def)) = (world.unit(attacker.as_str()), world.unit(defender.as_str()))
    else {
        return (world.clone(), DamageReport::none(defender));
    };
    let (amount, flags) = mitigate(att, def, spec, ctx.config);

    // The retaliation bonus is spent on the first hit that lands.
    let world = if flags.contains(DamageFlags::COUNTER) {
        world.update_unit(attacker.as_str(), |u| u.without_var(keys::COUNTER_MULTIPLIER))
    } else {
        world
    };

    route_damage(&world, defender, amount, flags, ctx)
}

/// Generic damage primitive (step 7 onward).
///
/// Non-positive amounts and unknown targets are no-ops.
pub fn apply_damage(
    world: &WorldState,
    target: &UnitId,
    amount: i64,
    ctx: &mut EffectContext<'_>,
) -> (WorldState, DamageReport) {
    route_damage(world, target, amount, DamageFlags::empty(), ctx)
}

fn route_damage(
    world: &WorldState,
    target: &UnitId,
    amount: i64,
    flags: DamageFlags,
    ctx: &mut EffectContext<'_>,
) -> (WorldState, DamageReport) {
    if world.global().int(keys::REVERSE_DAMAGE_TURNS) > 0 {
        return heal_core(world, target, amount, flags | DamageFlags::REVERSED, ctx);
    }
    damage_core(world, target, amount, flags, ctx)
}

/// Shield, undying floor, Hp clamp and the post-damage hooks, with no
/// reversal check.
pub(crate) fn damage_core(
    world: &WorldState,
    target: &UnitId,
    amount: i64,
    mut flags: DamageFlags,
    ctx: &mut EffectContext<'_>,
) -> (WorldState, DamageReport) {
    let Some(unit) = world.unit(target.as_str()) else {
        return (world.clone(), DamageReport::flagged(target, flags));
    };
    if amount <= 0 {
        return (world.clone(), DamageReport::flagged(target, flags));
    }

    let shield = unit.int(keys::SHIELD).max(0);
    let absorbed = shield.min(amount);
    let overflow = amount - absorbed;
    if absorbed > 0 {
        flags |= DamageFlags::ABSORBED;
    }

    let before = unit.hp();
    let mut after = before.saturating_sub(overflow);
    if unit.int(keys::UNDYING_TURNS) > 0 && after < 1 {
        let floor = ctx.config.undying_floor.min(before);
        if after < floor {
            after = floor;
            flags |= DamageFlags::UNDYING;
            tracing::debug!(unit = %target, floor, "undying floor held");
        }
    }
    let after = after.max(0);
    if before > 0 && after == 0 {
        flags |= DamageFlags::LETHAL;
    }

    let mut next = world.update_unit(target.as_str(), |u| {
        let u = u.with_var(keys::HP, after);
        if absorbed > 0 {
            u.with_var(keys::SHIELD, shield - absorbed)
        } else {
            u
        }
    });

    let dealt = before - after;
    ctx.record(TraceEvent::Damaged {
        target: target.clone(),
        amount: dealt,
        flags,
    });

    if after > 0 {
        if let Some(unit) = next.unit(target.as_str()) {
            let on_hit_heal = unit.int(keys::ON_DAMAGE_HEAL);
            if unit.int(keys::ON_DAMAGE_HEAL_TURNS) > 0 && on_hit_heal > 0 {
                next = heal_core(&next, target, on_hit_heal, DamageFlags::empty(), ctx).0;
            }
        }
    }

    if let Some(fired) = fire_threshold(&next, target, before, after, ctx) {
        next = fired;
        flags |= DamageFlags::THRESHOLD;
    }

    (
        next,
        DamageReport {
            target: target.clone(),
            amount: dealt,
            absorbed,
            flags,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::apply_heal;
    use crate::config::BattleConfig;
    use crate::state::{Coord, UnitState, Value};

    fn arena() -> WorldState {
        WorldState::new(5, 5)
            .unwrap()
            .with_unit(UnitState::new("att", Coord::new(0, 0), 50).with_var(keys::ATK, 10))
            .with_unit(UnitState::new("def", Coord::new(1, 0), 50).with_var(keys::DEF, 2))
    }

    fn hit(world: &WorldState, spec: AttackSpec) -> (WorldState, DamageReport) {
        let config = BattleConfig::default();
        let mut ctx = EffectContext::new(&config);
        resolve_attack(world, &"att".into(), &"def".into(), &spec, &mut ctx)
    }

    fn hp(world: &WorldState, id: &str) -> i64 {
        world.unit(id).unwrap().hp()
    }

    #[test]
    fn basic_physical_hit() {
        let (next, report) = hit(&arena(), AttackSpec::physical(7));
        assert_eq!(report.amount, 15);
        assert_eq!(hp(&next, "def"), 35);
    }

    #[test]
    fn shield_absorbs_first() {
        let world = arena().update_unit("def", |u| u.with_var(keys::SHIELD, 10));
        let (next, report) = hit(&world, AttackSpec::physical(7));
        assert_eq!(report.absorbed, 10);
        assert_eq!(report.amount, 5);
        assert_eq!(next.unit("def").unwrap().int(keys::SHIELD), 0);
        assert_eq!(hp(&next, "def"), 45);
    }

    #[test]
    fn undying_holds_at_floor() {
        let world = arena().update_unit("def", |u| {
            u.with_var(keys::HP, 5).with_var(keys::UNDYING_TURNS, 1)
        });
        let (next, report) = hit(&world, AttackSpec::true_damage(100));
        assert_eq!(hp(&next, "def"), 1);
        assert!(report.flags.contains(DamageFlags::UNDYING));
        assert!(!report.flags.contains(DamageFlags::LETHAL));
    }

    #[test]
    fn lethal_hit_leaves_unit_in_place() {
        let (next, report) = hit(&arena(), AttackSpec::true_damage(80));
        assert_eq!(hp(&next, "def"), 0);
        assert!(next.contains_unit("def"));
        assert!(report.flags.contains(DamageFlags::LETHAL));
    }

    #[test]
    fn untargetable_blocks_physical_but_not_true() {
        let world = arena().update_unit("def", |u| u.with_var(keys::UNTARGETABLE_TURNS, 2));
        let (next, report) = hit(&world, AttackSpec::physical(7));
        assert_eq!(next, world);
        assert!(report.flags.contains(DamageFlags::BLOCKED));

        let (next, _) = hit(&world, AttackSpec::true_damage(7));
        assert_eq!(hp(&next, "def"), 43);
    }

    #[test]
    fn evaded_hit_grants_and_consumes_counter() {
        let world = arena().update_unit("def", |u| u.with_var(keys::EVADE_CHARGES, 1));
        let (world, report) = hit(&world, AttackSpec::physical(7));
        assert!(report.flags.contains(DamageFlags::EVADED));
        assert_eq!(hp(&world, "def"), 50);

        // Defender strikes back with the stored multiplier.
        let config = BattleConfig::default();
        let mut ctx = EffectContext::new(&config);
        let (world, report) = resolve_attack(
            &world,
            &"def".into(),
            &"att".into(),
            &AttackSpec::true_damage(0),
            &mut ctx,
        );
        // True damage ignores multipliers; the bonus is still pending.
        assert_eq!(report.amount, 0);
        assert!(world.unit("def").unwrap().get(keys::COUNTER_MULTIPLIER).is_some());

        let (world, report) = resolve_attack(
            &world,
            &"def".into(),
            &"att".into(),
            &AttackSpec::physical(10),
            &mut ctx,
        );
        // (10 + 0 - 0) * 1.5
        assert_eq!(report.amount, 15);
        assert!(world.unit("def").unwrap().get(keys::COUNTER_MULTIPLIER).is_none());
    }

    #[test]
    fn reverse_damage_heals_instead() {
        let world = arena()
            .update_unit("def", |u| u.with_var(keys::HP, 20))
            .update_global(|g| g.with_var(keys::REVERSE_DAMAGE_TURNS, 1));
        let (next, report) = hit(&world, AttackSpec::physical(7));
        assert_eq!(hp(&next, "def"), 35);
        assert!(report.flags.contains(DamageFlags::REVERSED));
    }

    #[test]
    fn threshold_fires_once() {
        let world = arena().update_unit("def", |u| {
            u.with_var(keys::MAX_HP, 100)
                .with_var(keys::HP, 60)
                .with_var(keys::HP_THRESHOLD, 0.5)
                .with_var(keys::THRESHOLD_SKILL_ID, "S")
        });
        let config = BattleConfig::default();
        let mut ctx = EffectContext::new(&config);
        let target: UnitId = "def".into();

        let (world, first) = apply_damage(&world, &target, 20, &mut ctx);
        assert!(first.flags.contains(DamageFlags::THRESHOLD));
        assert!(world.unit("def").unwrap().has_tag(&keys::threshold_fired("S")));

        let (world, _) = apply_heal(&world, &target, 30, &mut ctx);
        let (_, second) = apply_damage(&world, &target, 30, &mut ctx);
        assert!(!second.flags.contains(DamageFlags::THRESHOLD));

        let fired = ctx
            .trace
            .events()
            .iter()
            .filter(|e| matches!(e, TraceEvent::ThresholdTriggered { .. }))
            .count();
        assert_eq!(fired, 1);
    }

    #[test]
    fn on_damage_heal_restores_after_hit() {
        let world = arena().update_unit("def", |u| {
            u.with_var(keys::ON_DAMAGE_HEAL_TURNS, 2)
                .with_var(keys::ON_DAMAGE_HEAL, 3)
        });
        let config = BattleConfig::default();
        let mut ctx = EffectContext::new(&config);
        let (next, _) = apply_damage(&world, &"def".into(), 10, &mut ctx);
        assert_eq!(next.unit("def").unwrap().get(keys::HP), Some(&Value::Int(43)));
    }
}
