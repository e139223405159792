//! # Event Publisher
//!
//! Defines the publishing side of the event bus and the handler registry.

use crate::events::{BusEvent, EventFilter};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, trace};

/// Trait for publishing events to the bus.
pub trait EventPublisher<E: BusEvent>: Send + Sync {
    /// Publish an event to the bus.
    ///
    /// # Returns
    ///
    /// The number of handlers and subscriptions that received the event.
    fn publish(&self, event: E) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// Callback invoked synchronously for each matching event.
pub type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Handle returned by [`InMemoryEventBus::on`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct Registration<E: BusEvent> {
    id: HandlerId,
    filter: EventFilter<E::Topic>,
    handler: Handler<E>,
}

/// In-memory implementation of the event bus.
///
/// Handlers are kept in registration order. Async consumers use a
/// `tokio::sync::broadcast` subscription instead.
pub struct InMemoryEventBus<E: BusEvent> {
    /// Broadcast sender for subscriptions.
    sender: broadcast::Sender<E>,

    /// Registered handlers in registration order.
    handlers: RwLock<Vec<Registration<E>>>,

    /// Next handler id.
    next_handler: AtomicU64,

    /// Total events published.
    events_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl<E: BusEvent> InMemoryEventBus<E> {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            handlers: RwLock::new(Vec::new()),
            next_handler: AtomicU64::new(1),
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Register a handler for events matching `filter`.
    ///
    /// Handlers run inside `publish`, after every previously registered
    /// handler.
    pub fn on<F>(&self, filter: EventFilter<E::Topic>, handler: F) -> HandlerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_handler.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().push(Registration {
            id,
            filter,
            handler: Arc::new(handler),
        });
        debug!(handler = id.0, "Event handler registered");
        id
    }

    /// Remove a handler. Returns `false` if it was not registered.
    pub fn off(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|r| r.id != id);
        let removed = handlers.len() != before;
        if removed {
            debug!(handler = id.0, "Event handler removed");
        }
        removed
    }

    /// Remove every registered handler. Subscriptions are unaffected.
    pub fn clear_handlers(&self) {
        let mut handlers = self.handlers.write();
        if !handlers.is_empty() {
            debug!(count = handlers.len(), "Clearing event handlers");
        }
        handlers.clear();
    }

    /// Subscribe to events matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter<E::Topic>) -> Subscription<E> {
        debug!(topics = ?filter.topics, "New subscription created");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Get a stream of events matching a filter.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter<E::Topic>) -> EventStream<E> {
        EventStream::new(self.sender.subscribe(), filter)
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn dispatch(&self, event: &E) -> usize {
        let topic = event.topic();
        // Snapshot so handlers may register or unregister re-entrantly.
        let matching: Vec<(HandlerId, Handler<E>)> = self
            .handlers
            .read()
            .iter()
            .filter(|r| r.filter.accepts(topic))
            .map(|r| (r.id, Arc::clone(&r.handler)))
            .collect();

        for (id, handler) in &matching {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                error!(handler = id.0, topic = ?topic, "Event handler panicked");
            }
        }
        matching.len()
    }
}

impl<E: BusEvent> Default for InMemoryEventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BusEvent> EventPublisher<E> for InMemoryEventBus<E> {
    fn publish(&self, event: E) -> usize {
        self.events_published.fetch_add(1, Ordering::Relaxed);

        let handled = self.dispatch(&event);
        let topic = event.topic();
        let subscribers = self.sender.send(event).unwrap_or(0);

        trace!(
            topic = ?topic,
            handlers = handled,
            subscribers = subscribers,
            "Event published"
        );
        handled + subscribers
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::test_events::{TestEvent, Topic};
    use parking_lot::Mutex;

    #[test]
    fn test_publish_no_receivers() {
        let bus = InMemoryEventBus::<TestEvent>::new();
        assert_eq!(bus.publish(TestEvent::Ping), 0);
        assert_eq!(bus.events_published(), 1);
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let bus = InMemoryEventBus::<TestEvent>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            bus.on(EventFilter::all(), move |_| seen.lock().push(tag));
        }

        assert_eq!(bus.publish(TestEvent::Ping), 3);
        assert_eq!(*seen.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_panicking_handler_does_not_block_others() {
        let bus = InMemoryEventBus::<TestEvent>::new();
        let hits = Arc::new(AtomicU64::new(0));

        bus.on(EventFilter::all(), |_| panic!("handler failure"));
        let counter = Arc::clone(&hits);
        bus.on(EventFilter::all(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(TestEvent::Ping);
        bus.publish(TestEvent::Data(1));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_off_and_filtering() {
        let bus = InMemoryEventBus::<TestEvent>::new();
        let hits = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&hits);
        let id = bus.on(EventFilter::topic(Topic::Data), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(TestEvent::Ping);
        bus.publish(TestEvent::Data(3));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(bus.off(id));
        assert!(!bus.off(id));
        bus.publish(TestEvent::Data(4));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_may_unregister_itself() {
        let bus = Arc::new(InMemoryEventBus::<TestEvent>::new());
        let slot: Arc<Mutex<Option<HandlerId>>> = Arc::new(Mutex::new(None));

        let bus_ref = Arc::clone(&bus);
        let slot_ref = Arc::clone(&slot);
        let id = bus.on(EventFilter::all(), move |_| {
            if let Some(id) = slot_ref.lock().take() {
                bus_ref.off(id);
            }
        });
        *slot.lock() = Some(id);

        bus.publish(TestEvent::Ping);
        assert_eq!(bus.handler_count(), 0);
    }

    #[test]
    fn test_clear_handlers_keeps_subscriptions() {
        let bus = InMemoryEventBus::<TestEvent>::new();
        bus.on(EventFilter::all(), |_| {});
        let _sub = bus.subscribe(EventFilter::all());

        bus.clear_handlers();
        assert_eq!(bus.handler_count(), 0);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = InMemoryEventBus::<TestEvent>::new();

        let _sub1 = bus.subscribe(EventFilter::all());
        let _sub2 = bus.subscribe(EventFilter::all());
        let _sub3 = bus.subscribe(EventFilter::topic(Topic::Ping));

        assert_eq!(bus.publish(TestEvent::Data(1)), 3);
        assert_eq!(bus.subscriber_count(), 3);
    }

    #[test]
    fn test_default_bus() {
        let bus = InMemoryEventBus::<TestEvent>::default();
        assert_eq!(bus.capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.events_published(), 0);
    }
}
