//! The radio router.
//!
//! One routing call resolves the speaker, builds the payload once, runs the
//! send-attempt phase, scans every receiver, delivers to the survivors and
//! then hands off to the chime, audit and replay collaborators.

use crate::actor::ActorId;
use crate::audit::{audit_text, AuditLog, LogImpact, LogType, NullAudit, ReplayRecorder};
use crate::badge::{Badge, BadgeResolver};
use crate::capability::{ActorRecord, CapabilityStore};
use crate::channel::{ChannelDescriptor, ChannelRegistry};
use crate::chime::{ChimeDispatcher, DEFAULT_CHIME_VOLUME, EARS_SLOT};
use crate::format::{escape_markup, Localizer, TemplateLocalizer, RADIO_WRAP, RADIO_WRAP_BOLD};
use crate::guard::RoutingContext;
use crate::hooks::{BroadcastSummary, Delivery, Hooks, ReceiveAttempt, SendAttempt};
use crate::identity::{
    resolve_speaker, ChatStyler, SpeakerIdentity, SpeechStyle, StyleRegistry, SuffixStyler,
};
use crate::message::{DeliverySummary, RadioPayload, RouteOutcome, Transmission};
use crate::profile::{eligibility, Eligibility, RecipientProfile, SourceProfile, RECEIVER_QUERY};
use crate::transport::{AudioTransport, NullTransport, SessionTransport};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use squelch_protocol::{codec, ChatChannel, ChatRecord, Frame};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Verb used when a style has none.
const FALLBACK_VERB: &str = "says";

/// Default cap on message text, in bytes.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Router errors.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Invalid channel id.
    #[error("Invalid channel id: {0}")]
    InvalidChannel(&'static str),

    /// Channel not found.
    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    /// Channel registered twice.
    #[error("Channel already registered: {0}")]
    DuplicateChannel(String),

    #[error("Message of {size} bytes exceeds the {limit} byte limit")]
    MessageTooLarge { size: usize, limit: usize },
}

/// Router configuration.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Inventory slot checked for chime-equipped radios.
    pub ears_slot: String,
    /// Chime volume in decibels.
    pub chime_volume: f32,
    /// Seed for speech verb selection; `None` seeds from entropy.
    pub verb_seed: Option<u64>,
    /// Longest message text accepted, in bytes. Must leave room for the
    /// wrapped rendering under the frame size limit.
    pub max_message_size: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            ears_slot: EARS_SLOT.to_string(),
            chime_volume: DEFAULT_CHIME_VOLUME,
            verb_seed: None,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

/// Routes radio messages from a speaker to every eligible receiver.
///
/// The router holds no per-message state; feedback suppression lives in the
/// caller's [`RoutingContext`] and actor state in the caller's
/// [`CapabilityStore`].
pub struct RadioRouter {
    channels: ChannelRegistry,
    styles: StyleRegistry,
    badges: BadgeResolver,
    chime: ChimeDispatcher,
    hooks: Hooks,
    styler: Box<dyn ChatStyler>,
    localizer: Box<dyn Localizer>,
    sessions: Arc<dyn SessionTransport>,
    audio: Arc<dyn AudioTransport>,
    audit: Arc<dyn AuditLog>,
    replay: Arc<dyn ReplayRecorder>,
    rng: Mutex<StdRng>,
    config: RouterConfig,
}

impl RadioRouter {
    /// Create a router with default configuration and no-op collaborators.
    #[must_use]
    pub fn new(channels: ChannelRegistry) -> Self {
        Self::with_config(channels, RouterConfig::default())
    }

    /// Create a router with custom configuration.
    #[must_use]
    pub fn with_config(channels: ChannelRegistry, config: RouterConfig) -> Self {
        info!(channels = channels.len(), "Creating radio router with config: {:?}", config);
        let rng = match config.verb_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            channels,
            styles: StyleRegistry::default(),
            badges: BadgeResolver::default(),
            chime: ChimeDispatcher::new(config.ears_slot.clone(), config.chime_volume),
            hooks: Hooks::new(),
            styler: Box::new(SuffixStyler),
            localizer: Box::new(TemplateLocalizer::default()),
            sessions: Arc::new(NullTransport),
            audio: Arc::new(NullTransport),
            audit: Arc::new(NullAudit),
            replay: Arc::new(NullAudit),
            rng: Mutex::new(rng),
            config,
        }
    }

    #[must_use]
    pub fn with_sessions(mut self, sessions: Arc<dyn SessionTransport>) -> Self {
        self.sessions = sessions;
        self
    }

    #[must_use]
    pub fn with_audio(mut self, audio: Arc<dyn AudioTransport>) -> Self {
        self.audio = audio;
        self
    }

    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    #[must_use]
    pub fn with_replay(mut self, replay: Arc<dyn ReplayRecorder>) -> Self {
        self.replay = replay;
        self
    }

    #[must_use]
    pub fn with_styles(mut self, styles: StyleRegistry) -> Self {
        self.styles = styles;
        self
    }

    #[must_use]
    pub fn with_styler(mut self, styler: impl ChatStyler + 'static) -> Self {
        self.styler = Box::new(styler);
        self
    }

    #[must_use]
    pub fn with_localizer(mut self, localizer: impl Localizer + 'static) -> Self {
        self.localizer = Box::new(localizer);
        self
    }

    #[must_use]
    pub fn with_badges(mut self, badges: BadgeResolver) -> Self {
        self.badges = badges;
        self
    }

    /// Observer registration.
    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    /// The channel registry.
    #[must_use]
    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    /// The router configuration.
    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Route a transmission, resolving its channel id first.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::ChannelNotFound`] for unknown channel ids and
    /// [`RouterError::MessageTooLarge`] for oversized text; nothing is
    /// delivered in either case.
    pub fn route(
        &self,
        store: &dyn CapabilityStore,
        ctx: &RoutingContext,
        transmission: &Transmission,
    ) -> Result<DeliverySummary, RouterError> {
        let channel = self.channels.resolve(&transmission.channel)?;
        self.route_descriptor(store, ctx, transmission, channel)
    }

    /// Route a transmission on an already-resolved channel.
    ///
    /// `transmission.channel` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::MessageTooLarge`] if the text is longer than
    /// [`RouterConfig::max_message_size`].
    pub fn route_descriptor(
        &self,
        store: &dyn CapabilityStore,
        ctx: &RoutingContext,
        transmission: &Transmission,
        channel: &ChannelDescriptor,
    ) -> Result<DeliverySummary, RouterError> {
        let size = transmission.text.len();
        if size > self.config.max_message_size {
            warn!(source = %transmission.source, size, "Rejected oversized radio message");
            return Err(RouterError::MessageTooLarge {
                size,
                limit: self.config.max_message_size,
            });
        }

        let Some(_guard) = ctx.enter(&transmission.text) else {
            debug!(source = %transmission.source, channel = %channel.id, "Suppressed radio echo");
            return Ok(DeliverySummary::empty(RouteOutcome::Suppressed));
        };

        let identity = resolve_speaker(
            store,
            &self.hooks,
            &self.styles,
            self.styler.as_ref(),
            transmission.source,
            &transmission.text,
        );
        let badge = self.badges.resolve(store, transmission.source, self.localizer.as_ref());
        let payload = self.compose(transmission, channel, &identity, &badge);

        let send = SendAttempt {
            channel,
            source_device: transmission.device,
        };
        if self.hooks.send_attempt(&send).is_cancelled() {
            debug!(
                source = %transmission.source,
                device = %transmission.device,
                channel = %channel.id,
                "Radio transmission cancelled"
            );
            self.hooks.broadcast(&BroadcastSummary {
                source: transmission.source,
                message: &transmission.text,
                channel,
                recipients: &[],
            });
            return Ok(DeliverySummary::empty(RouteOutcome::Cancelled));
        }

        let source = SourceProfile::resolve(store, transmission.source, transmission.device, channel);
        let mut recipients = Vec::new();
        let mut seen = HashSet::new();

        for (actor, record) in store.query_all(RECEIVER_QUERY) {
            let Some(profile) = RecipientProfile::from_record(actor, record) else {
                continue;
            };
            if let Eligibility::Skip(reason) = eligibility(&profile, channel, &source) {
                trace!(recipient = %actor, ?reason, "Skipped receiver");
                continue;
            }
            if !seen.insert(actor) {
                continue;
            }

            let attempt = ReceiveAttempt {
                channel,
                source_device: transmission.device,
                recipient: actor,
            };
            if self.hooks.receive_attempt(&attempt).is_cancelled() {
                trace!(recipient = %actor, "Receive attempt cancelled");
                continue;
            }

            self.deliver(store, ctx, actor, record, &payload);
            recipients.push(actor);
        }

        self.hooks.broadcast(&BroadcastSummary {
            source: transmission.source,
            message: &transmission.text,
            channel,
            recipients: &recipients,
        });

        let chime = self
            .chime
            .maybe_chime(store, transmission.source, self.audio.as_ref());

        self.audit.record(
            LogType::Chat,
            LogImpact::Low,
            &audit_text(&identity, transmission.source, channel, &transmission.text),
        );
        self.replay.record(&payload.record);

        debug!(
            source = %transmission.source,
            channel = %channel.id,
            recipients = recipients.len(),
            relay_coverage = source.relay_coverage,
            "Radio message routed"
        );

        Ok(DeliverySummary {
            outcome: RouteOutcome::Broadcast,
            recipients,
            chime,
        })
    }

    /// Transmit speech through the speaker's built-in radio.
    ///
    /// Returns `None` if the speaker has no intrinsic transmitter for
    /// `channel`; otherwise the channel is consumed by this transmission.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel id is unknown.
    pub fn on_spoke(
        &self,
        store: &dyn CapabilityStore,
        ctx: &RoutingContext,
        speaker: ActorId,
        text: &str,
        channel: &str,
    ) -> Result<Option<DeliverySummary>, RouterError> {
        let transmits = store
            .get(speaker)
            .and_then(|r| r.intrinsic_transmitter.as_ref())
            .is_some_and(|t| t.channels.contains(channel));
        if !transmits {
            return Ok(None);
        }
        self.route(store, ctx, &Transmission::new(speaker, text, channel))
            .map(Some)
    }

    fn deliver(
        &self,
        store: &dyn CapabilityStore,
        ctx: &RoutingContext,
        recipient: ActorId,
        record: &ActorRecord,
        payload: &RadioPayload,
    ) {
        self.hooks.deliver(&Delivery {
            router: self,
            store,
            ctx,
            recipient,
            payload,
        });

        if !record.intrinsic_receiver {
            return;
        }
        if let (Some(session), Some(frame)) = (record.session.as_ref(), payload.frame.as_ref()) {
            trace!(recipient = %recipient, session = %session.id, "Pushing radio frame");
            self.sessions.push_to_session(recipient, session, frame.clone());
        }
    }

    fn pick_verb(&self, style: &SpeechStyle) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let verb = style
            .verbs
            .choose(&mut *rng)
            .map_or(FALLBACK_VERB, String::as_str);
        self.localizer.format(verb, &[])
    }

    fn compose(
        &self,
        transmission: &Transmission,
        channel: &ChannelDescriptor,
        identity: &SpeakerIdentity,
        badge: &Badge,
    ) -> RadioPayload {
        let style = &identity.style;
        let template = if style.bold { RADIO_WRAP_BOLD } else { RADIO_WRAP };
        let verb = self.pick_verb(style);
        let name = format!(
            "[icon src=\"{}\" tooltip=\"{}\"] {}",
            badge.icon,
            badge.title,
            escape_markup(&identity.display_name)
        );
        let label = format!("\\[{}\\]", channel.name);
        let content = if transmission.escape_markup {
            escape_markup(&transmission.text)
        } else {
            transmission.text.clone()
        };
        let font_size = style.font_size.to_string();

        let wrapped = self.localizer.format(
            template,
            &[
                ("color", channel.color.as_str()),
                ("fontType", style.font_id.as_str()),
                ("fontSize", font_size.as_str()),
                ("verb", verb.as_str()),
                ("channel", label.as_str()),
                ("name", name.as_str()),
                ("message", content.as_str()),
            ],
        );

        let record = ChatRecord::new(ChatChannel::Radio, transmission.text.as_str(), wrapped)
            .with_sender(transmission.source.0);
        let frame = match codec::encode(&Frame::chat(record.clone())) {
            Ok(frame) => Some(frame),
            Err(e) => {
                warn!(error = %e, channel = %channel.id, "Failed to encode radio frame");
                None
            }
        };

        RadioPayload {
            source: transmission.source,
            device: transmission.device,
            message: transmission.text.clone(),
            channel: channel.clone(),
            record,
            frame,
        }
    }
}

impl std::fmt::Debug for RadioRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadioRouter")
            .field("channels", &self.channels.len())
            .field("hooks", &self.hooks)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ZoneId;
    use crate::capability::{ActorRecord, MemoryStore, Receiver};

    fn router() -> RadioRouter {
        let channels: ChannelRegistry = [
            ChannelDescriptor::new("common", "Common").with_color("#2cdb2c"),
            ChannelDescriptor::new("cc", "CentCom").long_range(),
        ]
        .into_iter()
        .collect();
        RadioRouter::with_config(
            channels,
            RouterConfig {
                verb_seed: Some(7),
                ..RouterConfig::default()
            },
        )
    }

    #[test]
    fn test_unknown_channel_fails_fast() {
        let router = router();
        let store = MemoryStore::new();
        let ctx = RoutingContext::new();

        let result = router.route(&store, &ctx, &Transmission::new(ActorId(1), "hi", "nope"));
        assert!(matches!(result, Err(RouterError::ChannelNotFound(id)) if id == "nope"));
        assert_eq!(ctx.in_flight_count(), 0);
    }

    #[test]
    fn test_wrapped_message_format() {
        let router = router();
        let mut store = MemoryStore::new();
        let alice = store.spawn(ActorRecord::named("Alice").exempt());
        let channel = router.channels().resolve("common").unwrap().clone();
        let identity = resolve_speaker(
            &store,
            &router.hooks,
            &router.styles,
            router.styler.as_ref(),
            alice,
            "[b]hi",
        );

        let payload = router.compose(
            &Transmission::new(alice, "[b]hi", "common"),
            &channel,
            &identity,
            &Badge::none(),
        );
        assert_eq!(
            payload.record.wrapped_message,
            "[color=#2cdb2c]\\[Common\\] [icon src=\"JobIconNoId\" tooltip=\"\"] Alice says, \
             [font=\"Default\" size=12]\"\\[b]hi\"[/font][/color]"
        );
        assert_eq!(payload.record.message, "[b]hi");
        assert_eq!(payload.record.sender, Some(alice.0));
        assert!(payload.frame.is_some());

        let raw = router.compose(
            &Transmission::new(alice, "[b]hi", "common").raw_markup(),
            &channel,
            &identity,
            &Badge::none(),
        );
        assert!(raw.record.wrapped_message.contains("\"[b]hi\""));
    }

    #[test]
    fn test_oversized_message_rejected_before_routing() {
        let mut router = router();
        router.config.max_message_size = 16;
        let mut store = MemoryStore::new();
        let alice = store.spawn(ActorRecord::named("Alice").in_zone(ZoneId(1)).exempt());
        let ear = store.spawn(
            ActorRecord::named("radio")
                .in_zone(ZoneId(1))
                .with_receiver(Receiver::on(["common"])),
        );
        let ctx = RoutingContext::new();

        let result = router.route(&store, &ctx, &Transmission::new(alice, "x".repeat(17), "common"));
        assert!(matches!(
            result,
            Err(RouterError::MessageTooLarge { size: 17, limit: 16 })
        ));
        assert_eq!(ctx.in_flight_count(), 0);

        let summary = router
            .route(&store, &ctx, &Transmission::new(alice, "x".repeat(16), "common"))
            .unwrap();
        assert_eq!(summary.recipients, vec![ear]);
    }

    #[test]
    fn test_on_spoke_requires_intrinsic_transmitter() {
        let router = router();
        let mut store = MemoryStore::new();
        let borg = store.spawn(
            ActorRecord::named("B-12")
                .in_zone(ZoneId(1))
                .exempt()
                .with_intrinsic_transmitter(["common"]),
        );
        let human = store.spawn(ActorRecord::named("Alice").in_zone(ZoneId(1)));
        let ear = store.spawn(
            ActorRecord::named("radio")
                .in_zone(ZoneId(1))
                .with_receiver(Receiver::on(["common"])),
        );
        let ctx = RoutingContext::new();

        let summary = router
            .on_spoke(&store, &ctx, borg, "beep", "common")
            .unwrap()
            .unwrap();
        assert_eq!(summary.recipients, vec![ear]);

        assert!(router.on_spoke(&store, &ctx, borg, "beep", "cc").unwrap().is_none());
        assert!(router.on_spoke(&store, &ctx, human, "hi", "common").unwrap().is_none());
    }

    #[test]
    fn test_seeded_verbs_are_repeatable() {
        let style = SpeechStyle::new("Many", ["says", "states", "declares", "reports"]);
        let first: Vec<String> = (0..8).map(|_| router().pick_verb(&style)).collect();
        let second: Vec<String> = (0..8).map(|_| router().pick_verb(&style)).collect();
        assert_eq!(first, second);

        let empty = SpeechStyle::new("Mute", Vec::<String>::new());
        assert_eq!(router().pick_verb(&empty), FALLBACK_VERB);
    }
}
