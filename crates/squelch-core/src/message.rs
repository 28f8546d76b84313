//! Messages moving through the router.

use crate::actor::ActorId;
use crate::channel::{ChannelDescriptor, ChannelId};
use crate::chime::ChimeCue;
use bytes::Bytes;
use squelch_protocol::ChatRecord;

/// A request to transmit one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmission {
    /// Actor that spoke.
    pub source: ActorId,
    /// Raw message text.
    pub text: String,
    /// Target channel id.
    pub channel: ChannelId,
    /// Device that picked the message up, e.g. a headset.
    pub device: ActorId,
    /// Escape markup in `text` before wrapping it.
    pub escape_markup: bool,
}

impl Transmission {
    /// Create a transmission sent through the speaker's own radio.
    #[must_use]
    pub fn new(source: ActorId, text: impl Into<String>, channel: impl Into<ChannelId>) -> Self {
        Self {
            source,
            text: text.into(),
            channel: channel.into(),
            device: source,
            escape_markup: true,
        }
    }

    /// Send through a separate device.
    #[must_use]
    pub fn via(mut self, device: ActorId) -> Self {
        self.device = device;
        self
    }

    /// Keep markup in the text as-is.
    #[must_use]
    pub fn raw_markup(mut self) -> Self {
        self.escape_markup = false;
        self
    }
}

/// The formatted message, built once per routing call and shared by every
/// recipient.
#[derive(Debug, Clone)]
pub struct RadioPayload {
    pub source: ActorId,
    pub device: ActorId,
    /// Raw message text.
    pub message: String,
    pub channel: ChannelDescriptor,
    /// Structured chat record.
    pub record: ChatRecord,
    /// Encoded chat frame for session delivery; `None` if encoding failed.
    pub frame: Option<Bytes>,
}

/// How a routing call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The delivery scan ran (possibly reaching nobody).
    Broadcast,
    /// A send-attempt observer cancelled the transmission.
    Cancelled,
    /// Identical text was already in flight.
    Suppressed,
}

/// Result of one routing call.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliverySummary {
    pub outcome: RouteOutcome,
    /// Each recipient once, in scan order.
    pub recipients: Vec<ActorId>,
    /// The chime that played, if any.
    pub chime: Option<ChimeCue>,
}

impl DeliverySummary {
    pub(crate) fn empty(outcome: RouteOutcome) -> Self {
        Self {
            outcome,
            recipients: Vec::new(),
            chime: None,
        }
    }

    /// Number of recipients reached.
    #[must_use]
    pub fn recipient_count(&self) -> usize {
        self.recipients.len()
    }

    /// Check whether `actor` received the message.
    #[must_use]
    pub fn reached(&self, actor: ActorId) -> bool {
        self.recipients.contains(&actor)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.outcome == RouteOutcome::Cancelled
    }

    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.outcome == RouteOutcome::Suppressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transmission_defaults() {
        let tx = Transmission::new(ActorId(1), "status green", "cmd");
        assert_eq!(tx.device, ActorId(1));
        assert!(tx.escape_markup);

        let tx = tx.via(ActorId(2)).raw_markup();
        assert_eq!(tx.device, ActorId(2));
        assert!(!tx.escape_markup);
    }

    #[test]
    fn test_empty_summary() {
        let summary = DeliverySummary::empty(RouteOutcome::Suppressed);
        assert!(summary.is_suppressed());
        assert_eq!(summary.recipient_count(), 0);
        assert!(!summary.reached(ActorId(1)));
    }
}
