//! # Bus Events
//!
//! The contract an event type fulfils to travel over the bus, and the
//! topic filter shared by handlers and subscriptions.

use std::fmt::Debug;
use std::hash::Hash;

/// An event that can be published on an [`InMemoryEventBus`].
///
/// [`InMemoryEventBus`]: crate::InMemoryEventBus
pub trait BusEvent: Clone + Debug + Send + Sync + 'static {
    /// Discriminant used for filtering.
    type Topic: Copy + Eq + Hash + Debug + Send + Sync + Unpin + 'static;

    /// The topic of this event.
    fn topic(&self) -> Self::Topic;
}

/// Filter for handlers and subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter<T> {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<T>,
}

impl<T> Default for EventFilter<T> {
    fn default() -> Self {
        Self { topics: Vec::new() }
    }
}

impl<T: Copy + Eq> EventFilter<T> {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<T>) -> Self {
        Self { topics }
    }

    /// Create a filter for a single topic.
    #[must_use]
    pub fn topic(topic: T) -> Self {
        Self {
            topics: vec![topic],
        }
    }

    /// Check if a topic passes this filter.
    #[must_use]
    pub fn accepts(&self, topic: T) -> bool {
        self.topics.is_empty() || self.topics.contains(&topic)
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches<E>(&self, event: &E) -> bool
    where
        E: BusEvent<Topic = T>,
    {
        self.accepts(event.topic())
    }
}
