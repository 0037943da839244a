//! Topic-based event bus implementation.

use std::collections::HashMap;
use std::fmt;

use super::types::{CombatEvent, TurnEvent, UnitEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Topic {
    /// Batch application and turn advancement
    Turn,
    /// Status expiry and deaths
    Unit,
    /// Damage, heals, evasions and threshold triggers
    Combat,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Event {
    Turn(TurnEvent),
    Unit(UnitEvent),
    Combat(CombatEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Turn(_) => Topic::Turn,
            Event::Unit(_) => Topic::Unit,
            Event::Combat(_) => Topic::Combat,
        }
    }
}

impl From<TurnEvent> for Event {
    fn from(event: TurnEvent) -> Self {
        Event::Turn(event)
    }
}

impl From<UnitEvent> for Event {
    fn from(event: UnitEvent) -> Self {
        Event::Unit(event)
    }
}

impl From<CombatEvent> for Event {
    fn from(event: CombatEvent) -> Self {
        Event::Combat(event)
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Anything the scheduler can hand its events to.
pub trait EventSink {
    fn emit(&mut self, event: Event);
}

impl EventSink for EventBus {
    fn emit(&mut self, event: Event) {
        self.publish(&event);
    }
}

/// Collects events in publication order.
impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) {
        self.push(event);
    }
}

// ============================================================================
// Bus
// ============================================================================

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&Event)>;

struct Subscription {
    id: SubscriptionId,
    handler: Handler,
}

/// Topic-based event bus
///
/// Handlers run inline, in subscription order, while `publish` is on the
/// stack. A handler must not publish back into the same bus.
pub struct EventBus {
    topics: HashMap<Topic, Vec<Subscription>>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            topics: HashMap::new(),
            next_id: 0,
        }
    }

    /// Subscribe a handler to a specific topic
    pub fn subscribe(&mut self, topic: Topic, handler: impl FnMut(&Event) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.topics.entry(topic).or_default().push(Subscription {
            id,
            handler: Box::new(handler),
        });
        id
    }

    /// Subscribe one handler factory to several topics.
    ///
    /// Each topic gets its own handler instance; the returned ids are in
    /// `topics` order.
    pub fn subscribe_multiple<F>(
        &mut self,
        topics: &[Topic],
        mut make_handler: impl FnMut(Topic) -> F,
    ) -> Vec<SubscriptionId>
    where
        F: FnMut(&Event) + 'static,
    {
        topics
            .iter()
            .map(|&topic| {
                let handler = make_handler(topic);
                self.subscribe(topic, handler)
            })
            .collect()
    }

    /// Removes a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for subscriptions in self.topics.values_mut() {
            if let Some(index) = subscriptions.iter().position(|s| s.id == id) {
                subscriptions.remove(index);
                return true;
            }
        }
        false
    }

    /// Publish an event to its corresponding topic
    ///
    /// Returns how many handlers received it.
    pub fn publish(&mut self, event: &Event) -> usize {
        let topic = event.topic();
        let Some(subscriptions) = self.topics.get_mut(&topic) else {
            tracing::trace!("No subscribers for topic {:?}", topic);
            return 0;
        };
        for subscription in subscriptions.iter_mut() {
            (subscription.handler)(event);
        }
        subscriptions.len()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.topics.get(&topic).map_or(0, Vec::len)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<(Topic, usize)> = self
            .topics
            .iter()
            .map(|(topic, subs)| (*topic, subs.len()))
            .collect();
        counts.sort();
        f.debug_struct("EventBus")
            .field("subscribers", &counts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn advanced(to: u64) -> Event {
        TurnEvent::Advanced { from: to - 1, to }.into()
    }

    #[test]
    fn delivers_only_to_matching_topic() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe(Topic::Turn, move |event| sink.borrow_mut().push(event.clone()));

        assert_eq!(bus.publish(&advanced(1)), 1);
        let died = UnitEvent::Died {
            unit: "orc".into(),
            position: battle_core::Coord::new(1, 1),
        };
        assert_eq!(bus.publish(&died.into()), 0);

        assert_eq!(*seen.borrow(), vec![advanced(1)]);
    }

    #[test]
    fn handlers_run_in_subscription_order() {
        let mut bus = EventBus::default();
        let order = Rc::new(RefCell::new(Vec::new()));
        for label in ["first", "second"] {
            let order = Rc::clone(&order);
            bus.subscribe(Topic::Turn, move |_| order.borrow_mut().push(label));
        }
        bus.publish(&advanced(2));
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut bus = EventBus::new();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        let id = bus.subscribe(Topic::Turn, move |_| *counter.borrow_mut() += 1);

        bus.publish(&advanced(1));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&advanced(2));

        assert_eq!(*hits.borrow(), 1);
        assert_eq!(bus.subscriber_count(Topic::Turn), 0);
    }

    #[test]
    fn subscribe_multiple_registers_each_topic() {
        let mut bus = EventBus::new();
        let topics = Rc::new(RefCell::new(Vec::new()));
        let ids = bus.subscribe_multiple(&[Topic::Unit, Topic::Combat], |topic| {
            let topics = Rc::clone(&topics);
            move |event: &Event| topics.borrow_mut().push((topic, event.topic()))
        });
        assert_eq!(ids.len(), 2);
        assert_eq!(bus.subscriber_count(Topic::Unit), 1);
        assert_eq!(bus.subscriber_count(Topic::Combat), 1);

        bus.emit(
            CombatEvent::ThresholdTriggered {
                unit: "boss".into(),
                skill: "Enrage".into(),
            }
            .into(),
        );
        assert_eq!(*topics.borrow(), vec![(Topic::Combat, Topic::Combat)]);
    }
}
