//! Compiled effects and the context threaded through them.
//!
//! An [`Effect`] is a pure function from one [`WorldState`] to the next. The
//! only side channel is the [`EffectContext`] passed explicitly to every call:
//! it carries the combat configuration and collects a [`Trace`] of what
//! happened, so no ambient/global trace state exists.

use std::fmt;
use std::sync::Arc;

use crate::combat::DamageFlags;
use crate::config::BattleConfig;
use crate::state::{Coord, UnitId, WorldState};

// ============================================================================
// Trace
// ============================================================================

/// A single observable event recorded while an effect ran.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TraceEvent {
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
    Moved {
        unit: UnitId,
        from: Coord,
        to: Coord,
    },
    ThresholdTriggered {
        unit: UnitId,
        skill: String,
    },
    Note(String),
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::Damaged {
                target,
                amount,
                flags,
            } => {
                write!(f, "{target} takes {amount} damage")?;
                if !flags.is_empty() {
                    write!(f, " [{flags}]")?;
                }
                Ok(())
            }
            TraceEvent::Healed {
                target,
                amount,
                flags,
            } => {
                write!(f, "{target} heals {amount}")?;
                if !flags.is_empty() {
                    write!(f, " [{flags}]")?;
                }
                Ok(())
            }
            TraceEvent::Evaded { attacker, defender } => {
                write!(f, "{defender} evades {attacker}")
            }
            TraceEvent::Moved { unit, from, to } => write!(f, "{unit} moves {from} -> {to}"),
            TraceEvent::ThresholdTriggered { unit, skill } => {
                write!(f, "{unit} crosses hp threshold, triggers {skill}")
            }
            TraceEvent::Note(note) => f.write_str(note),
        }
    }
}

/// Ordered collector of [`TraceEvent`]s.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trace {
    events: Vec<TraceEvent>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: TraceEvent) {
        tracing::trace!(%event, "effect trace");
        self.events.push(event);
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drains the collected events, leaving the trace empty.
    pub fn take(&mut self) -> Vec<TraceEvent> {
        std::mem::take(&mut self.events)
    }

    /// Human-readable lines, one per event.
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }
}

// ============================================================================
// Effect Context
// ============================================================================

/// Explicit per-call context for effect execution.
pub struct EffectContext<'a> {
    /// Combat tuning consulted by the damage and heal pipelines.
    pub config: &'a BattleConfig,

    /// Events recorded by the effects run under this context.
    pub trace: Trace,
}

impl<'a> EffectContext<'a> {
    pub fn new(config: &'a BattleConfig) -> Self {
        Self {
            config,
            trace: Trace::new(),
        }
    }

    pub fn record(&mut self, event: TraceEvent) {
        self.trace.push(event);
    }
}

// ============================================================================
// Effect
// ============================================================================

type EffectFn = dyn Fn(&WorldState, &mut EffectContext<'_>) -> WorldState + Send + Sync;

/// A compiled, side-effect-free world transition.
///
/// Cloning shares the underlying closure.
#[derive(Clone)]
pub struct Effect(Arc<EffectFn>);

impl Effect {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&WorldState, &mut EffectContext<'_>) -> WorldState + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// The effect that returns its input unchanged.
    pub fn identity() -> Self {
        Self::new(|world, _| world.clone())
    }

    /// Applies the effect with the default configuration, discarding the trace.
    pub fn apply(&self, world: &WorldState) -> WorldState {
        let config = BattleConfig::default();
        let mut ctx = EffectContext::new(&config);
        self.run(world, &mut ctx)
    }

    /// Applies the effect under an explicit context.
    pub fn run(&self, world: &WorldState, ctx: &mut EffectContext<'_>) -> WorldState {
        (self.0)(world, ctx)
    }

    /// Sequencing: `self` first, then `next` on its result.
    #[must_use]
    pub fn then(self, next: Effect) -> Effect {
        Effect::new(move |world, ctx| {
            let mid = self.run(world, ctx);
            next.run(&mid, ctx)
        })
    }

    /// Folds effects left-to-right into one.
    pub fn sequence(effects: impl IntoIterator<Item = Effect>) -> Effect {
        let effects: Vec<Effect> = effects.into_iter().collect();
        Effect::new(move |world, ctx| {
            effects
                .iter()
                .fold(world.clone(), |acc, effect| effect.run(&acc, ctx))
        })
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Effect(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{UnitState, Value, keys};

    fn bump(key: &'static str) -> Effect {
        Effect::new(move |world, _| {
            world.update_unit("a", |u| u.modified(key, &Value::Int(1)))
        })
    }

    #[test]
    fn sequence_folds_left_to_right() {
        let world = WorldState::new(2, 2)
            .unwrap()
            .with_unit(UnitState::new("a", Coord::ORIGIN, 10));
        let set_then_bump = Effect::new(|world, _| {
            world.update_unit("a", |u| u.with_var(keys::ATK, 5))
        })
        .then(bump(keys::ATK));

        let out = Effect::sequence([bump(keys::ATK), set_then_bump]).apply(&world);
        assert_eq!(out.unit("a").unwrap().int(keys::ATK), 6);
        assert_eq!(world.unit("a").unwrap().int(keys::ATK), 0);
    }

    #[test]
    fn trace_collects_lines_in_order() {
        let config = BattleConfig::default();
        let mut ctx = EffectContext::new(&config);
        ctx.record(TraceEvent::Note("first".into()));
        ctx.record(TraceEvent::Damaged {
            target: "a".into(),
            amount: 3,
            flags: DamageFlags::empty(),
        });
        assert_eq!(ctx.trace.lines(), vec!["first", "a takes 3 damage"]);
    }
}
