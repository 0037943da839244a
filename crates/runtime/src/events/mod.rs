//! Topic-based event bus for battle events.
//!
//! Events are published to a topic and delivered synchronously to the
//! handlers subscribed to it, on the publishing call stack.

mod bus;
mod types;

pub use bus::{Event, EventBus, EventSink, SubscriptionId, Topic};
pub use types::{CombatEvent, TurnEvent, UnitEvent};
