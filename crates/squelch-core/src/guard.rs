//! Feedback-loop suppression.
//!
//! Delivering a message can make a receiver transmit it again (relays,
//! repeaters, intrinsic radios). The router tracks the text it is currently
//! routing in a [`RoutingContext`] and refuses to route the same text again
//! until the outer call returns.

use std::cell::RefCell;
use std::collections::HashSet;
use tracing::trace;

/// Call-scoped routing state.
///
/// Create one per top-level transmission (or per tick) and pass it to every
/// nested routing call made while handling that transmission.
#[derive(Debug, Default)]
pub struct RoutingContext {
    in_flight: RefCell<HashSet<String>>,
}

impl RoutingContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `text` as in flight.
    ///
    /// Returns `None` if the same text is already being routed. The returned
    /// guard releases the text when dropped.
    #[must_use]
    pub fn enter(&self, text: &str) -> Option<InFlightGuard<'_>> {
        if !self.in_flight.borrow_mut().insert(text.to_string()) {
            trace!(len = text.len(), "Message already in flight");
            return None;
        }
        Some(InFlightGuard {
            ctx: self,
            text: text.to_string(),
        })
    }

    /// Check whether `text` is currently being routed.
    #[must_use]
    pub fn is_in_flight(&self, text: &str) -> bool {
        self.in_flight.borrow().contains(text)
    }

    /// Number of messages currently in flight.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.borrow().len()
    }
}

/// Releases an in-flight message on drop.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    ctx: &'a RoutingContext,
    text: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.ctx.in_flight.borrow_mut().remove(&self.text);
    }
}
