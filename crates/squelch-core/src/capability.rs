//! Capability records and the store the router reads them from.
//!
//! The router never mutates capabilities. Everything it needs is read from a
//! [`CapabilityStore`] snapshot taken for the duration of one routing call.

use crate::actor::{ActorId, ZoneId};
use crate::channel::ChannelId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::ops::BitOr;

/// Radio receiver: which channels an actor listens to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Receiver {
    /// Subscribed channel ids.
    pub channels: HashSet<ChannelId>,
    /// Listen to every channel.
    pub receive_all: bool,
    /// Hear traffic from any zone.
    pub global_receive: bool,
}

impl Receiver {
    /// Create a receiver subscribed to the given channels.
    #[must_use]
    pub fn on<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ChannelId>,
    {
        Self {
            channels: channels.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Listen to every channel.
    #[must_use]
    pub fn receiving_all(mut self) -> Self {
        self.receive_all = true;
        self
    }

    /// Hear traffic from any zone.
    #[must_use]
    pub fn global(mut self) -> Self {
        self.global_receive = true;
        self
    }
}

/// Wall-mounted intercom with a fixed list of channels it can carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Intercom {
    /// Channels the hardware supports.
    pub supported_channels: HashSet<ChannelId>,
}

/// Encryption keys installed in a relay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptionKeys {
    /// Channels the relay is tuned to.
    pub channels: HashSet<ChannelId>,
}

/// Power receiver state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerReceiver {
    /// Currently powered.
    pub powered: bool,
}

/// Notification chime attached to a wearable radio.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chime {
    /// Sound resource reference.
    pub sound: Option<String>,
}

impl Chime {
    /// The sound reference, if present and non-empty.
    #[must_use]
    pub fn sound(&self) -> Option<&str> {
        self.sound.as_deref().filter(|s| !s.is_empty())
    }
}

/// Identity card carrying a job badge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdCard {
    /// Job icon id.
    pub job_icon: String,
    /// Localized job title.
    pub job_title: String,
}

impl IdCard {
    /// Create a card.
    #[must_use]
    pub fn new(job_icon: impl Into<String>, job_title: impl Into<String>) -> Self {
        Self {
            job_icon: job_icon.into(),
            job_title: job_title.into(),
        }
    }
}

/// Personal assistant device, optionally holding an identity card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pda {
    /// Inserted card.
    pub contained_id: Option<IdCard>,
}

/// Radio built into the actor itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntrinsicTransmitter {
    /// Channels the actor transmits on when it speaks.
    pub channels: HashSet<ChannelId>,
}

/// A connected player session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    /// Session identifier assigned by the network layer.
    pub id: String,
}

/// Every capability an actor may carry.
///
/// Fields map one-to-one onto [`CapabilityKind`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorRecord {
    /// Base display name.
    pub name: String,
    pub zone: Option<ZoneId>,
    pub receiver: Option<Receiver>,
    pub intercom: Option<Intercom>,
    /// Telecom relay marker.
    pub relay: bool,
    pub keys: Option<EncryptionKeys>,
    pub power: Option<PowerReceiver>,
    /// Can transmit without relay coverage.
    pub telecom_exempt: bool,
    pub chime: Option<Chime>,
    pub id_card: Option<IdCard>,
    pub pda: Option<Pda>,
    /// Synthetic chassis or brain.
    pub chassis: bool,
    /// Held by the ship AI.
    pub ai_held: bool,
    pub intrinsic_transmitter: Option<IntrinsicTransmitter>,
    pub intrinsic_receiver: bool,
    pub session: Option<Session>,
    /// Items in hands and pockets.
    pub carried: Vec<ActorId>,
    /// Items in inventory slots, keyed by slot name.
    pub worn: BTreeMap<String, ActorId>,
}

impl ActorRecord {
    /// Create a record with only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_zone(mut self, zone: ZoneId) -> Self {
        self.zone = Some(zone);
        self
    }

    #[must_use]
    pub fn with_receiver(mut self, receiver: Receiver) -> Self {
        self.receiver = Some(receiver);
        self
    }

    #[must_use]
    pub fn with_intercom<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ChannelId>,
    {
        self.intercom = Some(Intercom {
            supported_channels: channels.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Make this actor a relay tuned to `channels`.
    #[must_use]
    pub fn relay_for<I, S>(mut self, channels: I, powered: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ChannelId>,
    {
        self.relay = true;
        self.keys = Some(EncryptionKeys {
            channels: channels.into_iter().map(Into::into).collect(),
        });
        self.power = Some(PowerReceiver { powered });
        self
    }

    #[must_use]
    pub fn exempt(mut self) -> Self {
        self.telecom_exempt = true;
        self
    }

    #[must_use]
    pub fn with_chime(mut self, sound: Option<&str>) -> Self {
        self.chime = Some(Chime {
            sound: sound.map(str::to_string),
        });
        self
    }

    #[must_use]
    pub fn with_id_card(mut self, card: IdCard) -> Self {
        self.id_card = Some(card);
        self
    }

    #[must_use]
    pub fn with_pda(mut self, card: Option<IdCard>) -> Self {
        self.pda = Some(Pda { contained_id: card });
        self
    }

    #[must_use]
    pub fn synthetic(mut self) -> Self {
        self.chassis = true;
        self
    }

    #[must_use]
    pub fn ai_held(mut self) -> Self {
        self.ai_held = true;
        self
    }

    #[must_use]
    pub fn with_intrinsic_transmitter<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ChannelId>,
    {
        self.intrinsic_transmitter = Some(IntrinsicTransmitter {
            channels: channels.into_iter().map(Into::into).collect(),
        });
        self
    }

    #[must_use]
    pub fn with_session(mut self, id: impl Into<String>) -> Self {
        self.intrinsic_receiver = true;
        self.session = Some(Session { id: id.into() });
        self
    }

    #[must_use]
    pub fn carrying(mut self, item: ActorId) -> Self {
        self.carried.push(item);
        self
    }

    #[must_use]
    pub fn wearing(mut self, slot: impl Into<String>, item: ActorId) -> Self {
        self.worn.insert(slot.into(), item);
        self
    }

    /// Check whether this record carries a capability.
    #[must_use]
    pub fn has(&self, kind: CapabilityKind) -> bool {
        match kind {
            CapabilityKind::Zone => self.zone.is_some(),
            CapabilityKind::Receiver => self.receiver.is_some(),
            CapabilityKind::Intercom => self.intercom.is_some(),
            CapabilityKind::Relay => self.relay,
            CapabilityKind::EncryptionKeys => self.keys.is_some(),
            CapabilityKind::Power => self.power.is_some(),
            CapabilityKind::TelecomExempt => self.telecom_exempt,
            CapabilityKind::Chime => self.chime.is_some(),
            CapabilityKind::IdCard => self.id_card.is_some(),
            CapabilityKind::Pda => self.pda.is_some(),
            CapabilityKind::Chassis => self.chassis,
            CapabilityKind::AiHeld => self.ai_held,
            CapabilityKind::IntrinsicTransmitter => self.intrinsic_transmitter.is_some(),
            CapabilityKind::IntrinsicReceiver => self.intrinsic_receiver,
            CapabilityKind::Session => self.session.is_some(),
        }
    }

    /// Check whether this record carries every capability in `set`.
    #[must_use]
    pub fn has_all(&self, set: CapabilitySet) -> bool {
        CapabilityKind::ALL
            .iter()
            .all(|kind| !set.contains(*kind) || self.has(*kind))
    }
}

/// Capability kinds usable in store queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CapabilityKind {
    Zone = 0,
    Receiver = 1,
    Intercom = 2,
    Relay = 3,
    EncryptionKeys = 4,
    Power = 5,
    TelecomExempt = 6,
    Chime = 7,
    IdCard = 8,
    Pda = 9,
    Chassis = 10,
    AiHeld = 11,
    IntrinsicTransmitter = 12,
    IntrinsicReceiver = 13,
    Session = 14,
}

impl CapabilityKind {
    /// Every kind, in declaration order.
    pub const ALL: [CapabilityKind; 15] = [
        CapabilityKind::Zone,
        CapabilityKind::Receiver,
        CapabilityKind::Intercom,
        CapabilityKind::Relay,
        CapabilityKind::EncryptionKeys,
        CapabilityKind::Power,
        CapabilityKind::TelecomExempt,
        CapabilityKind::Chime,
        CapabilityKind::IdCard,
        CapabilityKind::Pda,
        CapabilityKind::Chassis,
        CapabilityKind::AiHeld,
        CapabilityKind::IntrinsicTransmitter,
        CapabilityKind::IntrinsicReceiver,
        CapabilityKind::Session,
    ];

    const fn bit(self) -> u32 {
        1 << (self as u8)
    }
}

/// A set of capability kinds that must all be present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet(u32);

impl CapabilitySet {
    /// The empty set; matches every actor.
    pub const EMPTY: CapabilitySet = CapabilitySet(0);

    /// Add a kind.
    #[must_use]
    pub const fn with(self, kind: CapabilityKind) -> Self {
        Self(self.0 | kind.bit())
    }

    #[must_use]
    pub const fn contains(self, kind: CapabilityKind) -> bool {
        self.0 & kind.bit() != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<CapabilityKind> for CapabilitySet {
    fn from(kind: CapabilityKind) -> Self {
        Self::EMPTY.with(kind)
    }
}

impl BitOr<CapabilityKind> for CapabilitySet {
    type Output = CapabilitySet;

    fn bitor(self, rhs: CapabilityKind) -> CapabilitySet {
        self.with(rhs)
    }
}

impl BitOr for CapabilityKind {
    type Output = CapabilitySet;

    fn bitor(self, rhs: CapabilityKind) -> CapabilitySet {
        CapabilitySet::from(self).with(rhs)
    }
}

/// Read-only view over actor capabilities.
pub trait CapabilityStore {
    /// Look up one actor.
    fn get(&self, actor: ActorId) -> Option<&ActorRecord>;

    /// Iterate every actor carrying all capabilities in `kinds`.
    fn query_all(&self, kinds: CapabilitySet)
        -> Box<dyn Iterator<Item = (ActorId, &ActorRecord)> + '_>;

    /// Check one capability.
    fn has_capability(&self, actor: ActorId, kind: CapabilityKind) -> bool {
        self.get(actor).is_some_and(|record| record.has(kind))
    }

    /// Base display name, or empty if the actor is unknown.
    fn name(&self, actor: ActorId) -> &str {
        self.get(actor).map(|r| r.name.as_str()).unwrap_or("")
    }

    /// The item an actor wears in `slot`.
    fn worn_in(&self, actor: ActorId, slot: &str) -> Option<(ActorId, &ActorRecord)> {
        let item = *self.get(actor)?.worn.get(slot)?;
        self.get(item).map(|record| (item, record))
    }
}

/// In-memory capability storage.
///
/// Iteration order is by actor id.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    actors: BTreeMap<ActorId, ActorRecord>,
    next_id: u64,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an actor under a fresh id.
    pub fn spawn(&mut self, record: ActorRecord) -> ActorId {
        self.next_id += 1;
        let id = ActorId(self.next_id);
        self.actors.insert(id, record);
        id
    }

    /// Add or replace an actor under a caller-chosen id.
    pub fn insert(&mut self, id: ActorId, record: ActorRecord) -> Option<ActorRecord> {
        self.next_id = self.next_id.max(id.0);
        self.actors.insert(id, record)
    }

    /// Remove an actor.
    pub fn remove(&mut self, id: ActorId) -> Option<ActorRecord> {
        self.actors.remove(&id)
    }

    /// Mutable access between routing calls.
    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut ActorRecord> {
        self.actors.get_mut(&id)
    }

    /// Number of actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

impl CapabilityStore for MemoryStore {
    fn get(&self, actor: ActorId) -> Option<&ActorRecord> {
        self.actors.get(&actor)
    }

    fn query_all(
        &self,
        kinds: CapabilitySet,
    ) -> Box<dyn Iterator<Item = (ActorId, &ActorRecord)> + '_> {
        Box::new(
            self.actors
                .iter()
                .filter(move |(_, record)| record.has_all(kinds))
                .map(|(id, record)| (*id, record)),
        )
    }
}
