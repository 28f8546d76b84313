//! Audit log and replay collaborators.

use crate::actor::ActorId;
use crate::channel::ChannelDescriptor;
use crate::identity::SpeakerIdentity;
use squelch_protocol::ChatRecord;
use std::fmt;

/// Audit entry category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogType {
    Chat,
}

/// How much attention an audit entry deserves. Radio traffic is routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogImpact {
    Low,
}

impl fmt::Display for LogImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogImpact::Low => f.write_str("low"),
        }
    }
}

/// Administrative audit log.
pub trait AuditLog: Send + Sync {
    fn record(&self, kind: LogType, impact: LogImpact, text: &str);
}

/// Records chat traffic for replays.
pub trait ReplayRecorder: Send + Sync {
    fn record(&self, record: &ChatRecord);
}

/// Audit line for one broadcast.
///
/// Names the override when a voice mask was active.
#[must_use]
pub fn audit_text(
    identity: &SpeakerIdentity,
    source: ActorId,
    channel: &ChannelDescriptor,
    message: &str,
) -> String {
    if identity.is_masked() {
        format!(
            "Radio message from {} ({}) as {} on {}: {}",
            identity.base_name, source, identity.display_name, channel.name, message
        )
    } else {
        format!(
            "Radio message from {} ({}) on {}: {}",
            identity.base_name, source, channel.name, message
        )
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudit;

impl AuditLog for NullAudit {
    fn record(&self, _kind: LogType, _impact: LogImpact, _text: &str) {}
}

impl ReplayRecorder for NullAudit {
    fn record(&self, _record: &ChatRecord) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SpeechStyle;

    fn identity(display: &str) -> SpeakerIdentity {
        SpeakerIdentity {
            base_name: "Alice".to_string(),
            display_name: display.to_string(),
            style: SpeechStyle::default(),
        }
    }

    #[test]
    fn test_plain_audit_text() {
        let channel = ChannelDescriptor::new("cmd", "Command");
        assert_eq!(
            audit_text(&identity("Alice"), ActorId(1), &channel, "status green"),
            "Radio message from Alice (1) on Command: status green"
        );
    }

    #[test]
    fn test_masked_audit_text() {
        let channel = ChannelDescriptor::new("cmd", "Command");
        assert_eq!(
            audit_text(&identity("Unknown Operative"), ActorId(1), &channel, "status green"),
            "Radio message from Alice (1) as Unknown Operative on Command: status green"
        );
    }

    #[test]
    fn test_impact_label() {
        assert_eq!(LogImpact::Low.to_string(), "low");
    }
}
