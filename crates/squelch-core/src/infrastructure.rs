//! Relay coverage lookup.

use crate::actor::ZoneId;
use crate::capability::{CapabilityKind, CapabilitySet, CapabilityStore};
use tracing::trace;

/// Capabilities that make an actor a relay candidate.
pub const RELAY_QUERY: CapabilitySet = CapabilitySet::EMPTY
    .with(CapabilityKind::Relay)
    .with(CapabilityKind::EncryptionKeys)
    .with(CapabilityKind::Power)
    .with(CapabilityKind::Zone);

/// Check whether `zone` has a powered relay tuned to `channel`.
///
/// Scans every relay on each call so power changes apply immediately.
#[must_use]
pub fn has_active_relay(store: &dyn CapabilityStore, zone: ZoneId, channel: &str) -> bool {
    let active = store.query_all(RELAY_QUERY).any(|(_, record)| {
        record.zone == Some(zone)
            && record.power.is_some_and(|p| p.powered)
            && record
                .keys
                .as_ref()
                .is_some_and(|keys| keys.channels.contains(channel))
    });
    trace!(%zone, channel, active, "Relay coverage");
    active
}
