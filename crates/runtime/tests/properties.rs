use battle_content::{CastTarget, compile_skill};
use battle_core::state::keys;
use battle_core::{
    Action, AtomicAction, BattleConfig, Coord, Damage, EffectContext, Heal, ModifyUnitVar, Move,
    PhysicalDamage, SetGlobalVar, UnitState, WorldState,
};
use battle_runtime::{Scheduler, apply_batch};
use proptest::prelude::*;

const UNITS: [&str; 3] = ["a", "b", "c"];

fn roster(seed: u64) -> WorldState {
    WorldState::with_seed(6, 6, seed)
        .unwrap()
        .with_unit(
            UnitState::new("a", Coord::new(0, 0), 30)
                .with_var(keys::ATK, 8)
                .with_var(keys::TEAM, "blue"),
        )
        .with_unit(
            UnitState::new("b", Coord::new(2, 1), 25)
                .with_var(keys::DEF, 3)
                .with_var(keys::SHIELD, 4)
                .with_var(keys::TEAM, "red"),
        )
        .with_unit(
            UnitState::new("c", Coord::new(4, 4), 18)
                .with_var(keys::UNDYING_TURNS, 1)
                .with_var(keys::TEAM, "red"),
        )
}

fn unit_id() -> impl Strategy<Value = &'static str> {
    prop::sample::select(UNITS.to_vec())
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (unit_id(), 0..20i64).prop_map(|(u, n)| Damage::new(u, n).into()),
        (unit_id(), 0..20i64).prop_map(|(u, n)| Heal::new(u, n).into()),
        (unit_id(), unit_id(), 0..12i64).prop_map(|(a, t, p)| PhysicalDamage::new(a, t, p).into()),
        (
            unit_id(),
            prop::sample::select(vec![keys::ATK, keys::DEF, keys::HP, keys::SHIELD]),
            -5..5i64
        )
            .prop_map(|(u, name, d)| ModifyUnitVar::new(u, name, d).into()),
        (unit_id(), 0..6i32, 0..6i32).prop_map(|(u, x, y)| Move::new(u, Coord::new(x, y)).into()),
        (0..3i64).prop_map(|n| SetGlobalVar::new("weather", n).into()),
    ]
}

fn apply(world: &WorldState, actions: &[Action]) -> WorldState {
    apply_batch(world, actions)
}

proptest! {
    #[test]
    fn same_batch_same_world(seed in any::<u64>(), actions in prop::collection::vec(action(), 0..10)) {
        let left = roster(seed);
        let right = roster(seed);
        let a = apply(&left, &actions);
        let b = apply(&right, &actions);
        prop_assert_eq!(
            a.digest(),
            b.digest(),
            "{} vs {}",
            hex::encode(a.digest()),
            hex::encode(b.digest())
        );
        prop_assert_eq!(a, b);
    }

    #[test]
    fn commuting_actions_reorder_freely(seed in any::<u64>(), first in action(), second in action()) {
        prop_assume!(first.is_commutative_with(&second));
        let world = roster(seed);
        let forward = apply(&world, &[first.clone(), second.clone()]);
        let backward = apply(&world, &[second, first]);
        prop_assert_eq!(hex::encode(forward.digest()), hex::encode(backward.digest()));
    }

    #[test]
    fn regen_never_exceeds_maxima(
        max_hp in 1..60i64,
        hp_frac in 0.0..=1.0f64,
        hp_regen in -3..12i64,
        max_mp in 0..10i64,
        mp in 0..10i64,
        mp_regen in -2..6i64,
        turns in 1..8usize,
    ) {
        let hp = ((max_hp as f64 * hp_frac).round() as i64).max(1);
        let mut world = WorldState::new(3, 3).unwrap().with_unit(
            UnitState::new("u", Coord::new(1, 1), max_hp)
                .with_var(keys::HP, hp)
                .with_var(keys::HP_REGEN, hp_regen)
                .with_var(keys::MAX_MP, max_mp)
                .with_var(keys::MP, mp.min(max_mp))
                .with_var(keys::MP_REGEN, mp_regen),
        );
        let scheduler = Scheduler::default();
        for _ in 0..turns {
            world = scheduler.advance_turn(&world, None).0;
            let Some(unit) = world.unit("u") else { break };
            prop_assert!(unit.hp() <= unit.max_hp());
            prop_assert!(unit.int(keys::MP) <= unit.int(keys::MAX_MP));
            prop_assert!(unit.int(keys::MP) >= 0);
        }
    }

    #[test]
    fn recompiled_scripts_behave_identically(
        seed in any::<u64>(),
        script in prop::sample::select(vec![
            "chance 50% then { deal 4 damage to target } else { heal 2 to self }",
            "for each enemies in range 5 of self nearest limit 2 do { deal physical 3 damage to it }",
            "repeat 3 times { deal magic 2 damage to target }",
            "if target.Hp > 20 then { deal true 5 damage to target } else { heal 5 to target }",
            "parallel { add target var \"Def\" by -1; chance 30% then { add target tag \"marked\" } }",
        ]),
    ) {
        let first = compile_skill("Probe", script).unwrap();
        let second = compile_skill("Probe", script).unwrap();
        let world = roster(seed);
        let config = BattleConfig::default();

        let mut ctx = EffectContext::new(&config);
        let a = first.effect("a", CastTarget::from("b")).run(&world, &mut ctx);
        let mut ctx = EffectContext::new(&config);
        let b = second.effect("a", CastTarget::from("b")).run(&world, &mut ctx);
        prop_assert_eq!(a, b);
    }
}
