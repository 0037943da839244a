//! Turn orchestration for the battle simulation.
//!
//! This crate drives a [`battle_core::WorldState`] through turns: action
//! batches supplied by the host are applied in submission order, then the
//! maintenance pass decays statuses, regenerates, ticks damage over time and
//! removes the dead. What happened is published on an [`EventBus`].
//!
//! Modules are organized by responsibility:
//! - [`scheduler`] applies batches and runs the maintenance pass
//! - [`events`] provides the topic-based synchronous event bus
pub mod events;
pub mod scheduler;

pub use events::{
    CombatEvent, Event, EventBus, EventSink, SubscriptionId, Topic, TurnEvent, UnitEvent,
};
pub use scheduler::{Scheduler, TurnReport, advance_turn, apply_batch};
