//! Outbound collaborators: session delivery and audio playback.

use crate::actor::ActorId;
use crate::capability::Session;
use bytes::Bytes;

/// Pushes encoded frames to connected clients.
pub trait SessionTransport: Send + Sync {
    /// Deliver one encoded frame to `actor`'s session.
    fn push_to_session(&self, actor: ActorId, session: &Session, frame: Bytes);
}

/// Plays sounds to a set of listeners.
pub trait AudioTransport: Send + Sync {
    /// Play `sound` once, addressed only to `targets`.
    fn play_to_targets(&self, sound: &str, targets: &[ActorId], volume: f32);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTransport;

impl SessionTransport for NullTransport {
    fn push_to_session(&self, _actor: ActorId, _session: &Session, _frame: Bytes) {}
}

impl AudioTransport for NullTransport {
    fn play_to_targets(&self, _sound: &str, _targets: &[ActorId], _volume: f32) {}
}
