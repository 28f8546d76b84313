//! # squelch-core
//!
//! Radio message routing and delivery for the Squelch engine.
//!
//! This crate provides the building blocks:
//!
//! - **Capability** - Actor records and the store the router reads them from
//! - **Channel** - Radio channel descriptors and their registry
//! - **Router** - Resolves a speaker, filters receivers and delivers
//! - **Hooks** - Observers that can cancel, rename or react to traffic
//! - **Profile** - Pure eligibility rules for each receiver
//! - **Chime** - Notification sound for chime-equipped radios
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Transmission│────▶│ RadioRouter │────▶│  Receivers  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                       │    │    │
//!            ┌──────────┘    │    └──────────┐
//!            ▼               ▼               ▼
//!     ┌─────────────┐ ┌─────────────┐ ┌─────────────┐
//!     │    Hooks    │ │    Chime    │ │ Audit/Replay│
//!     └─────────────┘ └─────────────┘ └─────────────┘
//! ```

pub mod actor;
pub mod audit;
pub mod badge;
pub mod capability;
pub mod channel;
pub mod chime;
pub mod format;
pub mod guard;
pub mod hooks;
pub mod identity;
pub mod infrastructure;
pub mod message;
pub mod profile;
pub mod router;
pub mod transport;

pub use actor::{ActorId, ZoneId};
pub use audit::{AuditLog, LogImpact, LogType, NullAudit, ReplayRecorder};
pub use badge::{Badge, BadgeResolver};
pub use capability::{ActorRecord, CapabilityKind, CapabilitySet, CapabilityStore, MemoryStore};
pub use channel::{ChannelDescriptor, ChannelId, ChannelRegistry};
pub use chime::{ChimeCue, ChimeDispatcher};
pub use format::{Localizer, TemplateLocalizer};
pub use guard::RoutingContext;
pub use hooks::{Hooks, NameOverride, Scope, Verdict};
pub use identity::{ChatStyler, SpeechStyle, StyleRegistry};
pub use message::{DeliverySummary, RadioPayload, RouteOutcome, Transmission};
pub use router::{RadioRouter, RouterConfig, RouterError};
pub use transport::{AudioTransport, NullTransport, SessionTransport};
