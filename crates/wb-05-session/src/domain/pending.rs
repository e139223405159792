use std::collections::{HashMap, VecDeque};
use wb_02_message_codec::ResponseEnvelope;

/// An outstanding request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCall {
    /// Correlation ID of the request.
    pub correlation_id: u64,
    /// Method called.
    pub method: String,
}

/// Bounded table of outstanding requests.
///
/// Responses are matched by correlation ID. A response that does not echo
/// an ID falls back to the oldest pending call of the same method.
#[derive(Debug, Clone)]
pub struct PendingCalls {
    calls: HashMap<u64, String>,
    order: VecDeque<u64>,
    capacity: usize,
}

impl PendingCalls {
    /// Empty table holding at most `capacity` calls (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            calls: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Track a request. Returns the call evicted to make room, if any.
    pub fn insert(&mut self, correlation_id: u64, method: impl Into<String>) -> Option<PendingCall> {
        let mut evicted = None;
        if !self.calls.contains_key(&correlation_id) && self.calls.len() >= self.capacity {
            evicted = self.pop_oldest();
        }
        if self.calls.insert(correlation_id, method.into()).is_none() {
            self.order.push_back(correlation_id);
        }
        evicted
    }

    /// Remove a request, e.g. when sending it failed.
    pub fn remove(&mut self, correlation_id: u64) -> Option<PendingCall> {
        let method = self.calls.remove(&correlation_id)?;
        self.order.retain(|id| *id != correlation_id);
        Some(PendingCall {
            correlation_id,
            method,
        })
    }

    /// Find and remove the call `response` answers.
    pub fn match_response(&mut self, response: &ResponseEnvelope) -> Option<PendingCall> {
        match response.correlation_id {
            Some(id) => self.remove(id),
            None => {
                let id = self
                    .order
                    .iter()
                    .copied()
                    .find(|id| self.calls.get(id).is_some_and(|m| *m == response.method))?;
                self.remove(id)
            }
        }
    }

    /// Drop every pending call. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.calls.len();
        self.calls.clear();
        self.order.clear();
        dropped
    }

    /// Number of pending calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Whether no call is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    fn pop_oldest(&mut self) -> Option<PendingCall> {
        let id = self.order.pop_front()?;
        let method = self.calls.remove(&id)?;
        Some(PendingCall {
            correlation_id: id,
            method,
        })
    }
}
