//! The once-per-turn maintenance pass.
//!
//! Per unit, in id order: timed status decay, MP/HP regeneration, per-turn
//! deltas, then damage over time. Deaths are collected only after every unit
//! has been processed, followed by the global toggles and the turn counter.

use battle_core::combat::apply_damage;
use battle_core::state::keys;
use battle_core::{BattleConfig, EffectContext, TraceEvent, UnitId, UnitState, Value, WorldState};

use crate::events::{CombatEvent, Event, TurnEvent, UnitEvent};

struct DamageOverTime {
    name: &'static str,
    turns: &'static str,
    per_turn: &'static str,
    tag: &'static str,
}

const DAMAGE_OVER_TIME: [DamageOverTime; 2] = [
    DamageOverTime {
        name: "bleed",
        turns: keys::BLEED_TURNS,
        per_turn: keys::BLEED_PER_TURN,
        tag: keys::BLEEDING_TAG,
    },
    DamageOverTime {
        name: "burn",
        turns: keys::BURN_TURNS,
        per_turn: keys::BURN_PER_TURN,
        tag: keys::BURNING_TAG,
    },
];

const GLOBAL_TOGGLES: [(&str, &str); 2] = [
    (keys::REVERSE_HEAL_TURNS, keys::REVERSE_HEAL_TAG),
    (keys::REVERSE_DAMAGE_TURNS, keys::REVERSE_DAMAGE_TAG),
];

/// Runs one pass. Log lines accumulate in `ctx.trace`; the returned events
/// are in the order things happened.
pub(crate) fn run(world: &WorldState, ctx: &mut EffectContext<'_>) -> (WorldState, Vec<Event>) {
    let mut pass = Pass {
        ctx,
        events: Vec::new(),
        seen: 0,
    };
    let ids: Vec<UnitId> = world.unit_ids().cloned().collect();

    let mut world = world.clone();
    for id in &ids {
        world = pass.decay_statuses(&world, id);
        if world.unit(id.as_str()).is_some_and(UnitState::is_alive) {
            world = pass.regenerate(&world, id);
            world = pass.apply_per_turn(&world, id);
            world = pass.damage_over_time(&world, id);
        }
    }

    world = pass.remove_dead(&world);
    world = pass.decay_global_toggles(&world);

    let from = world.turn();
    let to = from + 1;
    world = world.update_global(|global| global.with_turn(to));
    pass.note(format!("turn {to} begins"));
    pass.publish(TurnEvent::Advanced { from, to });
    tracing::debug!(turn = to, units = world.unit_count(), "turn advanced");

    (world, pass.finish())
}

struct Pass<'a, 'c> {
    ctx: &'a mut EffectContext<'c>,
    events: Vec<Event>,
    /// Trace entries already mirrored into `events`.
    seen: usize,
}

impl Pass<'_, '_> {
    fn note(&mut self, line: String) {
        self.ctx.record(TraceEvent::Note(line));
    }

    fn publish(&mut self, event: impl Into<Event>) {
        self.sync_trace();
        self.events.push(event.into());
    }

    fn sync_trace(&mut self) {
        let events = self.ctx.trace.events();
        self.events.extend(
            events[self.seen..]
                .iter()
                .filter_map(CombatEvent::from_trace)
                .map(Event::Combat),
        );
        self.seen = events.len();
    }

    fn finish(mut self) -> Vec<Event> {
        self.sync_trace();
        self.events
    }

    // ------------------------------------------------------------------
    // Per-unit steps
    // ------------------------------------------------------------------

    fn decay_statuses(&mut self, world: &WorldState, id: &UnitId) -> WorldState {
        let Some(unit) = world.unit(id.as_str()) else {
            return world.clone();
        };
        let mut unit = unit.clone();
        for status in keys::TIMED_STATUSES {
            let left = unit.int(status.counter);
            if left <= 0 {
                continue;
            }
            if left > 1 {
                unit = unit.with_var(status.counter, left - 1);
                continue;
            }
            unit = unit.without_var(status.counter).without_tag(status.tag);
            if let Some(value) = status.companion {
                unit = unit.without_var(value);
            }
            self.note(format!("{id}: {} expired", status.tag));
            self.publish(UnitEvent::StatusExpired {
                unit: id.clone(),
                status: status.tag.to_string(),
            });
        }
        world.with_unit(unit)
    }

    fn regenerate(&mut self, world: &WorldState, id: &UnitId) -> WorldState {
        let Some(unit) = world.unit(id.as_str()) else {
            return world.clone();
        };
        let unit = self.regen(unit.clone(), keys::MP, keys::MAX_MP, keys::MP_REGEN);
        let unit = self.regen(unit, keys::HP, keys::MAX_HP, keys::HP_REGEN);
        world.with_unit(unit)
    }

    /// Adds the regen rate to `key`, never above the max (or the current
    /// value if that is already higher) and never below zero.
    fn regen(&mut self, unit: UnitState, key: &str, max_key: &str, rate_key: &str) -> UnitState {
        let rate = unit.int(rate_key);
        if rate == 0 {
            return unit;
        }
        let current = unit.int(key);
        let mut next = (current + rate).max(0);
        if unit.get(max_key).is_some() {
            next = next.min(unit.int(max_key).max(current));
        }
        if next == current {
            return unit;
        }
        self.note(format!("{} regenerates {} {key}", unit.id, next - current));
        unit.with_var(key, next)
    }

    fn apply_per_turn(&mut self, world: &WorldState, id: &UnitId) -> WorldState {
        let Some(unit) = world.unit(id.as_str()) else {
            return world.clone();
        };
        let deltas: Vec<(String, Value)> = unit
            .bag()
            .vars()
            .filter_map(|(key, delta)| {
                let target = key.strip_prefix(keys::PER_TURN_PREFIX)?;
                (!target.is_empty()).then(|| (target.to_string(), delta.clone()))
            })
            .collect();
        if deltas.is_empty() {
            return world.clone();
        }

        let config = self.ctx.config;
        let unit = deltas.into_iter().fold(unit.clone(), |unit, (key, delta)| {
            let current = unit.get(&key).cloned().unwrap_or_default();
            let next = clamp_per_turn(&unit, &key, current.add(&delta), config);
            unit.with_var(key, next)
        });
        world.with_unit(unit)
    }

    fn damage_over_time(&mut self, world: &WorldState, id: &UnitId) -> WorldState {
        let mut world = world.clone();
        for dot in &DAMAGE_OVER_TIME {
            let Some(unit) = world.unit(id.as_str()) else {
                break;
            };
            let turns = unit.int(dot.turns);
            if turns <= 0 {
                continue;
            }
            let amount = unit.int(dot.per_turn);

            self.note(format!("{id} suffers {} ({turns} turns left)", dot.name));
            let (next, _) = apply_damage(&world, id, amount, self.ctx);
            world = if turns > 1 {
                next.update_unit(id.as_str(), |u| u.with_var(dot.turns, turns - 1))
            } else {
                self.note(format!("{id}: {} expired", dot.tag));
                next.update_unit(id.as_str(), |u| {
                    u.without_var(dot.turns)
                        .without_var(dot.per_turn)
                        .without_tag(dot.tag)
                })
            };
        }
        world
    }

    // ------------------------------------------------------------------
    // World-wide steps
    // ------------------------------------------------------------------

    fn remove_dead(&mut self, world: &WorldState) -> WorldState {
        let dead: Vec<(UnitId, _)> = world
            .units()
            .filter(|unit| !unit.is_alive())
            .map(|unit| (unit.id.clone(), unit.position()))
            .collect();

        let mut world = world.clone();
        for (id, position) in dead {
            tracing::debug!(unit = %id, %position, "unit died");
            self.note(format!("{id} dies"));
            self.publish(UnitEvent::Died {
                unit: id.clone(),
                position,
            });
            world = world.without_unit(id.as_str());
        }
        world
    }

    fn decay_global_toggles(&mut self, world: &WorldState) -> WorldState {
        let mut world = world.clone();
        for (counter, tag) in GLOBAL_TOGGLES {
            let left = world.global().int(counter);
            if left <= 0 {
                continue;
            }
            world = if left > 1 {
                world.update_global(|g| g.with_var(counter, left - 1))
            } else {
                self.note(format!("{tag} ends"));
                world.update_global(|g| g.without_var(counter).without_tag(tag))
            };
        }
        world
    }
}

/// Clamps a per-turn result: an explicit `max_<Key>` wins, then the
/// conventional Hp/Mp maxima, then the resistance caps. A missing Hp/Mp
/// maximum leaves the value uncapped above, like regeneration does.
fn clamp_per_turn(unit: &UnitState, key: &str, value: Value, config: &BattleConfig) -> Value {
    if let Some(cap) = unit.get(&format!("{}{key}", keys::MAX_PREFIX)) {
        return if value.as_float() > cap.as_float() {
            cap.clone()
        } else {
            value
        };
    }
    match key {
        keys::HP => Value::Int(cap_vital(unit, key, keys::MAX_HP, value.as_int())),
        keys::MP => Value::Int(cap_vital(unit, key, keys::MAX_MP, value.as_int())),
        _ if key.starts_with(keys::RESIST_PREFIX) => {
            Value::Float(config.clamp_resist(value.as_float()))
        }
        _ => value,
    }
}

/// Floors at zero; caps at `max_key` (or the current value if already
/// higher) only when the unit carries that maximum.
fn cap_vital(unit: &UnitState, key: &str, max_key: &str, next: i64) -> i64 {
    let next = next.max(0);
    match unit.get(max_key) {
        Some(max) => next.min(max.as_int().max(unit.int(key)).max(0)),
        None => next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{Coord, VarBag};

    fn pass(world: &WorldState) -> (WorldState, Vec<String>, Vec<Event>) {
        let config = BattleConfig::default();
        let mut ctx = EffectContext::new(&config);
        let (world, events) = run(world, &mut ctx);
        (world, ctx.trace.lines(), events)
    }

    fn single(unit: UnitState) -> WorldState {
        WorldState::new(4, 4).unwrap().with_unit(unit)
    }

    #[test]
    fn timed_status_expires_with_tag_and_companion() {
        let world = single(
            UnitState::new("a", Coord::ORIGIN, 10)
                .with_var(keys::DAMAGE_REDUCTION_TURNS, 1)
                .with_var(keys::DAMAGE_REDUCTION, 0.5)
                .with_tag("damage_reduction")
                .with_var(keys::STUNNED_TURNS, 2)
                .with_tag("stunned"),
        );
        let (world, log, events) = pass(&world);
        let a = world.unit("a").unwrap();

        assert!(a.get(keys::DAMAGE_REDUCTION_TURNS).is_none());
        assert!(a.get(keys::DAMAGE_REDUCTION).is_none());
        assert!(!a.has_tag("damage_reduction"));
        assert_eq!(a.int(keys::STUNNED_TURNS), 1);
        assert!(a.has_tag("stunned"));
        assert!(log.contains(&"a: damage_reduction expired".to_string()));
        assert_eq!(
            events[0],
            Event::Unit(UnitEvent::StatusExpired {
                unit: "a".into(),
                status: "damage_reduction".into(),
            })
        );
    }

    #[test]
    fn regen_clamps_to_maxima() {
        let world = single(
            UnitState::new("a", Coord::ORIGIN, 20)
                .with_var(keys::HP, 18)
                .with_var(keys::HP_REGEN, 5)
                .with_var(keys::MP, 1)
                .with_var(keys::MAX_MP, 4)
                .with_var(keys::MP_REGEN, 2),
        );
        let (world, log, _) = pass(&world);
        let a = world.unit("a").unwrap();
        assert_eq!(a.hp(), 20);
        assert_eq!(a.int(keys::MP), 3);
        assert_eq!(log[0], "a regenerates 2 Mp");
        assert_eq!(log[1], "a regenerates 2 Hp");
    }

    #[test]
    fn per_turn_deltas_use_clamp_heuristics() {
        let world = single(
            UnitState::new("a", Coord::ORIGIN, 10)
                .with_var("per_turn_Atk", 2)
                .with_var("Atk", 5)
                .with_var("max_Atk", 6)
                .with_var("per_turn_resist_magic", 0.5)
                .with_var(keys::RESIST_MAGIC, 0.6)
                .with_var("per_turn_Hp", 4)
                .with_var("per_turn_Focus", 1),
        );
        let (world, _, _) = pass(&world);
        let a = world.unit("a").unwrap();
        assert_eq!(a.int("Atk"), 6);
        assert_eq!(a.float(keys::RESIST_MAGIC), BattleConfig::DEFAULT_MAX_RESIST_CAP);
        assert_eq!(a.hp(), 10);
        assert_eq!(a.int("Focus"), 1);
    }

    #[test]
    fn per_turn_hp_without_max_hp_is_uncapped() {
        let bag = VarBag::new()
            .with_var(keys::POS, Coord::ORIGIN)
            .with_var(keys::HP, 10)
            .with_var("per_turn_Hp", 2);
        let world = single(UnitState::from_bag("a", bag));
        let (world, log, _) = pass(&world);
        let a = world.unit("a").unwrap();
        assert_eq!(a.hp(), 12);
        assert!(a.get(keys::MAX_HP).is_none());
        assert_eq!(log, vec!["turn 1 begins"]);
    }

    #[test]
    fn per_turn_hp_keeps_an_over_max_value() {
        let world = single(
            UnitState::new("a", Coord::ORIGIN, 10)
                .with_var(keys::HP, 14)
                .with_var("per_turn_Hp", 3)
                .with_var("per_turn_Mp", -5)
                .with_var(keys::MP, 2),
        );
        let (world, _, _) = pass(&world);
        let a = world.unit("a").unwrap();
        assert_eq!(a.hp(), 14);
        assert_eq!(a.int(keys::MP), 0);
    }

    #[test]
    fn burn_kills_and_unit_is_removed_after_the_sweep() {
        let world = single(
            UnitState::new("a", Coord::new(2, 1), 3)
                .with_var(keys::BURN_TURNS, 3)
                .with_var(keys::BURN_PER_TURN, 4)
                .with_tag(keys::BURNING_TAG),
        );
        let (world, log, events) = pass(&world);

        assert!(!world.contains_unit("a"));
        assert_eq!(world.turn(), 1);
        assert!(log.contains(&"a dies".to_string()));
        assert_eq!(
            events,
            vec![
                Event::Combat(CombatEvent::Damaged {
                    target: "a".into(),
                    amount: 3,
                    flags: battle_core::DamageFlags::LETHAL,
                }),
                Event::Unit(UnitEvent::Died {
                    unit: "a".into(),
                    position: Coord::new(2, 1),
                }),
                Event::Turn(TurnEvent::Advanced { from: 0, to: 1 }),
            ]
        );
    }

    #[test]
    fn global_toggles_self_clear() {
        let world = WorldState::new(2, 2).unwrap().update_global(|g| {
            g.with_var(keys::REVERSE_HEAL_TURNS, 1)
                .with_tag(keys::REVERSE_HEAL_TAG)
                .with_var(keys::REVERSE_DAMAGE_TURNS, 2)
        });
        let (world, log, _) = pass(&world);
        let global = world.global();
        assert!(global.get(keys::REVERSE_HEAL_TURNS).is_none());
        assert!(!global.has_tag(keys::REVERSE_HEAL_TAG));
        assert_eq!(global.int(keys::REVERSE_DAMAGE_TURNS), 1);
        assert_eq!(log, vec!["reverse_heal ends", "turn 1 begins"]);
    }
}
