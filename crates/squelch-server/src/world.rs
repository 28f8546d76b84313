//! The in-memory world the server routes against.
//!
//! Holds the actor store, the router and the collaborators the router
//! reports to: a per-actor session outbox that also carries chimes, a
//! bounded replay buffer, and a tracing-backed audit sink.

use crate::config::Config;
use crate::metrics;
use anyhow::{Context, Result};
use bytes::Bytes;
use dashmap::DashMap;
use squelch_protocol::{codec, ChatRecord, Frame};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tenvis_squelch_core::capability::Session;
use tenvis_squelch_core::{
    ActorId, AuditLog, AudioTransport, CapabilityStore, ChannelRegistry, DeliverySummary,
    LogImpact, LogType, MemoryStore, RadioRouter, ReplayRecorder, RouterError, RoutingContext,
    SessionTransport, Transmission,
};
use tracing::{debug, info, warn};

/// Frames waiting to be collected by each actor's session.
///
/// Each actor holds at most `capacity` frames; the oldest is dropped to make
/// room for a new one.
#[derive(Debug)]
pub struct SessionOutbox {
    frames: DashMap<ActorId, VecDeque<Bytes>>,
    capacity: usize,
}

impl SessionOutbox {
    /// A zero `capacity` is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Take every queued frame for `actor`, oldest first.
    #[must_use]
    pub fn drain(&self, actor: ActorId) -> Vec<Bytes> {
        self.frames
            .remove(&actor)
            .map(|(_, frames)| Vec::from(frames))
            .unwrap_or_default()
    }

    fn enqueue(&self, actor: ActorId, frame: Bytes) {
        let mut queue = self.frames.entry(actor).or_default();
        if queue.len() == self.capacity {
            queue.pop_front();
            warn!(actor = %actor, capacity = self.capacity, "Session outbox full, dropped oldest frame");
            metrics::record_error("outbox_overflow");
        }
        queue.push_back(frame);
    }

    /// Number of frames queued for `actor`.
    #[must_use]
    pub fn pending(&self, actor: ActorId) -> usize {
        self.frames.get(&actor).map_or(0, |frames| frames.len())
    }
}

impl SessionTransport for SessionOutbox {
    fn push_to_session(&self, actor: ActorId, session: &Session, frame: Bytes) {
        debug!(actor = %actor, session = %session.id, bytes = frame.len(), "Queued session frame");
        metrics::record_session_frame(frame.len());
        self.enqueue(actor, frame);
    }
}

/// Chimes reach clients as frames in the same outbox as chat.
impl AudioTransport for SessionOutbox {
    fn play_to_targets(&self, sound: &str, targets: &[ActorId], volume: f32) {
        metrics::record_chime(targets.len());
        let frame = match codec::encode(&Frame::chime(sound, volume)) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(sound, error = %e, "Failed to encode chime frame");
                metrics::record_error("encode");
                return;
            }
        };
        debug!(sound, targets = targets.len(), volume, "Queued chime");
        for target in targets {
            self.enqueue(*target, frame.clone());
        }
    }
}

/// Most recent chat records, oldest dropped first.
#[derive(Debug)]
pub struct ReplayBuffer {
    records: Mutex<VecDeque<ChatRecord>>,
    capacity: usize,
}

impl ReplayBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// Snapshot of the buffered records, oldest first.
    #[must_use]
    pub fn recent(&self) -> Vec<ChatRecord> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.iter().cloned().collect()
    }
}

impl ReplayRecorder for ReplayBuffer {
    fn record(&self, record: &ChatRecord) {
        if self.capacity == 0 {
            return;
        }
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record.clone());
    }
}

/// Writes audit entries to the `squelch::audit` tracing target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAudit;

impl AuditLog for TracingAudit {
    fn record(&self, kind: LogType, impact: LogImpact, text: &str) {
        info!(target: "squelch::audit", ?kind, %impact, "{}", text);
    }
}

/// Everything one routing tick needs.
pub struct World {
    store: MemoryStore,
    router: RadioRouter,
    outbox: Arc<SessionOutbox>,
    replay: Arc<ReplayBuffer>,
}

impl World {
    /// Build a world from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured channel is invalid or duplicated.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut channels = ChannelRegistry::new();
        for channel in &config.channels {
            channels
                .register(channel.clone())
                .with_context(|| format!("Failed to register channel: {}", channel.id))?;
        }

        let mut store = MemoryStore::new();
        for seed in &config.actors {
            store.insert(seed.id, seed.record.clone());
        }

        let outbox = Arc::new(SessionOutbox::new(config.router.outbox_capacity));
        let replay = Arc::new(ReplayBuffer::new(config.router.replay_capacity));
        let router = RadioRouter::with_config(channels, config.router.router_config())
            .with_sessions(outbox.clone())
            .with_audio(outbox.clone())
            .with_replay(replay.clone())
            .with_audit(Arc::new(TracingAudit));

        info!(
            channels = router.channels().len(),
            actors = store.len(),
            "World ready"
        );

        Ok(Self {
            store,
            router,
            outbox,
            replay,
        })
    }

    /// Route one transmission in a fresh routing context.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is unknown.
    pub fn transmit(&self, transmission: &Transmission) -> Result<DeliverySummary, RouterError> {
        let _timer = metrics::RoutingTimer::start();
        let ctx = RoutingContext::new();
        let summary = self.router.route(&self.store, &ctx, transmission)?;
        metrics::record_transmission(summary.outcome, summary.recipient_count());
        Ok(summary)
    }

    /// Set a relay's power. Returns `None` if the actor has no power receiver.
    pub fn set_power(&mut self, actor: ActorId, powered: bool) -> Option<bool> {
        let power = self.store.get_mut(actor)?.power.as_mut()?;
        power.powered = powered;
        info!(actor = %actor, powered, "Power changed");
        Some(powered)
    }

    /// Check whether `actor` exists.
    #[must_use]
    pub fn contains(&self, actor: ActorId) -> bool {
        self.store.get(actor).is_some()
    }

    #[must_use]
    pub fn outbox(&self) -> &SessionOutbox {
        &self.outbox
    }

    #[must_use]
    pub fn replay(&self) -> &ReplayBuffer {
        &self.replay
    }

    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.router.channels().len()
    }
}
