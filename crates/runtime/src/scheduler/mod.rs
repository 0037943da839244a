//! Turn scheduler.
//!
//! Two operations drive a battle: [`Scheduler::apply_batch`] threads an
//! externally ordered list of actions through a world without touching the
//! turn counter, and [`Scheduler::advance_turn`] runs the maintenance pass
//! that closes a turn. [`Scheduler::run_turn`] does both.

mod maintenance;

use battle_content::{CastTarget, Skill};
use battle_core::action::apply_all;
use battle_core::{
    Action, BattleConfig, CastError, EffectContext, Trace, WorldState, plan_batches,
};

use crate::events::{CombatEvent, Event, EventSink, TurnEvent};

/// Everything one call to [`Scheduler::run_turn`] produced.
#[derive(Clone, Debug)]
pub struct TurnReport {
    pub world: WorldState,
    /// What the action batch did.
    pub trace: Trace,
    /// Human-readable maintenance log.
    pub log: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    config: BattleConfig,
}

impl Scheduler {
    pub fn new(config: BattleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Applies `actions` strictly in order. Pure: no turn advance, no events.
    pub fn apply_batch(&self, world: &WorldState, actions: &[Action]) -> WorldState {
        self.apply_inner(world, actions).0
    }

    /// Like [`apply_batch`](Self::apply_batch), also returning the trace and
    /// publishing combat events followed by a batch summary.
    pub fn apply_batch_traced(
        &self,
        world: &WorldState,
        actions: &[Action],
        sink: Option<&mut dyn EventSink>,
    ) -> (WorldState, Trace) {
        let (world, trace, events) = self.apply_inner(world, actions);
        emit_all(sink, events);
        (world, trace)
    }

    /// Validates and runs one skill cast against `world`.
    pub fn cast(
        &self,
        world: &WorldState,
        skill: &Skill,
        caster: &str,
        target: CastTarget,
        sink: Option<&mut dyn EventSink>,
    ) -> Result<(WorldState, Trace), CastError> {
        skill.validate_cast(world, caster, &target)?;

        let mut ctx = EffectContext::new(&self.config);
        let next = skill.effect(caster, target).run(world, &mut ctx);
        tracing::debug!(skill = skill.name(), caster, "skill cast");

        emit_all(sink, combat_events(&ctx.trace));
        Ok((next, ctx.trace))
    }

    /// Runs the maintenance pass and advances the turn counter by one.
    pub fn advance_turn(
        &self,
        world: &WorldState,
        sink: Option<&mut dyn EventSink>,
    ) -> (WorldState, Vec<String>) {
        let mut ctx = EffectContext::new(&self.config);
        let (world, events) = maintenance::run(world, &mut ctx);
        emit_all(sink, events);
        (world, ctx.trace.lines())
    }

    /// Applies the batch, then closes the turn.
    pub fn run_turn(
        &self,
        world: &WorldState,
        actions: &[Action],
        sink: Option<&mut dyn EventSink>,
    ) -> TurnReport {
        let (world, trace, mut events) = self.apply_inner(world, actions);

        let mut ctx = EffectContext::new(&self.config);
        let (world, maintenance_events) = maintenance::run(&world, &mut ctx);
        events.extend(maintenance_events);
        emit_all(sink, events);

        TurnReport {
            world,
            trace,
            log: ctx.trace.lines(),
        }
    }

    fn apply_inner(&self, world: &WorldState, actions: &[Action]) -> (WorldState, Trace, Vec<Event>) {
        let mut ctx = EffectContext::new(&self.config);
        let next = apply_all(world, actions, &mut ctx);

        let batches = plan_batches(actions).len();
        tracing::debug!(
            turn = world.turn(),
            actions = actions.len(),
            batches,
            "action batch applied"
        );

        let mut events = combat_events(&ctx.trace);
        events.push(
            TurnEvent::BatchApplied {
                turn: world.turn(),
                actions: actions.len(),
                batches,
            }
            .into(),
        );
        (next, ctx.trace, events)
    }
}

/// [`Scheduler::apply_batch`] with the default configuration.
pub fn apply_batch(world: &WorldState, actions: &[Action]) -> WorldState {
    Scheduler::default().apply_batch(world, actions)
}

/// [`Scheduler::advance_turn`] with the default configuration.
pub fn advance_turn(
    world: &WorldState,
    sink: Option<&mut dyn EventSink>,
) -> (WorldState, Vec<String>) {
    Scheduler::default().advance_turn(world, sink)
}

fn combat_events(trace: &Trace) -> Vec<Event> {
    trace
        .events()
        .iter()
        .filter_map(CombatEvent::from_trace)
        .map(Event::Combat)
        .collect()
}

fn emit_all(sink: Option<&mut dyn EventSink>, events: Vec<Event>) {
    if let Some(sink) = sink {
        for event in events {
            sink.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::state::keys;
    use battle_core::{Coord, Damage, Heal, SetGlobalVar, UnitState};

    fn duel() -> WorldState {
        WorldState::new(4, 4)
            .unwrap()
            .with_unit(UnitState::new("a", Coord::ORIGIN, 20))
            .with_unit(UnitState::new("b", Coord::new(1, 0), 20))
    }

    #[test]
    fn apply_batch_keeps_turn_and_input() {
        let world = duel();
        let actions: Vec<Action> = vec![Damage::new("a", 5).into(), Heal::new("a", 2).into()];
        let next = apply_batch(&world, &actions);

        assert_eq!(next.unit("a").unwrap().hp(), 17);
        assert_eq!(next.turn(), 0);
        assert_eq!(world.unit("a").unwrap().hp(), 20);
    }

    #[test]
    fn traced_batch_publishes_combat_then_summary() {
        let world = duel();
        let actions: Vec<Action> = vec![
            Damage::new("a", 3).into(),
            Damage::new("b", 4).into(),
            SetGlobalVar::new(keys::REVERSE_DAMAGE_TURNS, 1).into(),
        ];
        let mut events: Vec<Event> = Vec::new();
        let (_, trace) = Scheduler::default().apply_batch_traced(&world, &actions, Some(&mut events));

        assert_eq!(trace.lines(), vec!["a takes 3 damage", "b takes 4 damage"]);
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[2],
            Event::Turn(TurnEvent::BatchApplied {
                turn: 0,
                actions: 3,
                batches: 2,
            })
        );
    }

    #[test]
    fn run_turn_applies_then_maintains() {
        let world = duel();
        let actions: Vec<Action> = vec![Damage::new("b", 25).into()];
        let mut events: Vec<Event> = Vec::new();
        let report = Scheduler::default().run_turn(&world, &actions, Some(&mut events));

        assert!(!report.world.contains_unit("b"));
        assert_eq!(report.world.turn(), 1);
        assert_eq!(report.trace.lines(), vec!["b takes 20 damage [LETHAL]"]);
        assert_eq!(report.log, vec!["b dies", "turn 1 begins"]);
        assert!(matches!(events.last(), Some(Event::Turn(TurnEvent::Advanced { from: 0, to: 1 }))));
    }

    #[test]
    fn cast_rejects_invalid_targets() {
        let skill = battle_content::compile_skill("Jab", "range 1\ntargeting enemies\ndeal 2 damage to target")
            .unwrap();
        let world = duel().update_unit("b", |u| u.with_var(keys::TEAM, "red"));
        let scheduler = Scheduler::default();

        let err = scheduler
            .cast(&world, &skill, "a", CastTarget::None, None)
            .unwrap_err();
        assert!(matches!(err, CastError::InvalidTarget(_)));

        let (next, trace) = scheduler
            .cast(&world, &skill, "a", "b".into(), None)
            .unwrap();
        assert_eq!(next.unit("b").unwrap().hp(), 18);
        assert_eq!(trace.lines(), vec!["a casts Jab", "b takes 2 damage"]);
    }
}
