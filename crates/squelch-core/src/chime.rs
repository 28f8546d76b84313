//! Notification chime for radio traffic.
//!
//! When the speaker wears a chime-equipped radio, every connected actor
//! wearing one hears the chime. Targets are recomputed from worn devices on
//! each broadcast and are independent of who received the radio message.

use crate::actor::ActorId;
use crate::capability::{CapabilityKind, CapabilityStore};
use crate::transport::AudioTransport;
use tracing::{debug, trace};

/// Slot a radio headset is worn in.
pub const EARS_SLOT: &str = "ears";

/// Default chime volume in decibels.
pub const DEFAULT_CHIME_VOLUME: f32 = -7.0;

/// A chime to play.
#[derive(Debug, Clone, PartialEq)]
pub struct ChimeCue {
    pub sound: String,
    pub targets: Vec<ActorId>,
    pub volume: f32,
}

/// Computes and plays chime cues.
#[derive(Debug, Clone)]
pub struct ChimeDispatcher {
    slot: String,
    volume: f32,
}

impl ChimeDispatcher {
    /// Create a dispatcher checking `slot` and playing at `volume`.
    #[must_use]
    pub fn new(slot: impl Into<String>, volume: f32) -> Self {
        Self {
            slot: slot.into(),
            volume,
        }
    }

    /// Chime sound of the device `actor` wears, if any.
    fn worn_chime<'s>(&self, store: &'s dyn CapabilityStore, actor: ActorId) -> Option<&'s str> {
        let (_, device) = store.worn_in(actor, &self.slot)?;
        device.chime.as_ref()?.sound()
    }

    /// Work out who should hear a chime for a broadcast by `source`.
    #[must_use]
    pub fn cue_for(&self, store: &dyn CapabilityStore, source: ActorId) -> Option<ChimeCue> {
        let Some(sound) = self.worn_chime(store, source) else {
            trace!(actor = %source, "No chime device worn");
            return None;
        };

        let targets = store
            .query_all(CapabilityKind::Session.into())
            .filter(|(actor, _)| self.worn_chime(store, *actor).is_some())
            .map(|(actor, _)| actor)
            .collect();

        Some(ChimeCue {
            sound: sound.to_string(),
            targets,
            volume: self.volume,
        })
    }

    /// Play the chime for a broadcast by `source`, if it has one.
    pub fn maybe_chime(
        &self,
        store: &dyn CapabilityStore,
        source: ActorId,
        audio: &dyn AudioTransport,
    ) -> Option<ChimeCue> {
        let cue = self.cue_for(store, source)?;
        debug!(sound = %cue.sound, targets = cue.targets.len(), "Playing radio chime");
        audio.play_to_targets(&cue.sound, &cue.targets, cue.volume);
        Some(cue)
    }
}

impl Default for ChimeDispatcher {
    fn default() -> Self {
        Self::new(EARS_SLOT, DEFAULT_CHIME_VOLUME)
    }
}
