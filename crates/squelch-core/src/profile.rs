//! Eligibility rules over per-recipient profiles.
//!
//! The router builds one [`RecipientProfile`] per receiver during its scan
//! and one [`SourceProfile`] per call. The rules are pure functions of the
//! two plus the channel.

use crate::actor::{ActorId, ZoneId};
use crate::capability::{
    ActorRecord, CapabilityKind, CapabilitySet, CapabilityStore, Intercom, Receiver,
};
use crate::channel::ChannelDescriptor;
use crate::infrastructure::has_active_relay;

/// Capabilities that make an actor a receiver candidate.
pub const RECEIVER_QUERY: CapabilitySet = CapabilitySet::EMPTY
    .with(CapabilityKind::Receiver)
    .with(CapabilityKind::Zone);

/// Why a receiver was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotSubscribed,
    IntercomUnsupported,
    OutOfRange,
    NoRelay,
}

/// Rule outcome for one receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Deliver,
    Skip(SkipReason),
}

/// Facts about the transmitting side, computed once per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceProfile {
    /// Zone of the transmitting device (or the speaker if the device has none).
    pub zone: Option<ZoneId>,
    /// The transmitting device needs no relay.
    pub exempt: bool,
    /// The source zone has an active relay for the channel.
    pub relay_coverage: bool,
}

impl SourceProfile {
    /// Resolve the source side of a transmission.
    #[must_use]
    pub fn resolve(
        store: &dyn CapabilityStore,
        speaker: ActorId,
        device: ActorId,
        channel: &ChannelDescriptor,
    ) -> Self {
        let device_record = store.get(device);
        let zone = device_record
            .and_then(|r| r.zone)
            .or_else(|| store.get(speaker).and_then(|r| r.zone));
        let exempt = device_record.is_some_and(|r| r.telecom_exempt);
        let relay_coverage = zone.is_some_and(|zone| has_active_relay(store, zone, &channel.id));

        Self {
            zone,
            exempt,
            relay_coverage,
        }
    }
}

/// Facts about one receiver.
#[derive(Debug, Clone, Copy)]
pub struct RecipientProfile<'a> {
    pub actor: ActorId,
    pub zone: ZoneId,
    pub receiver: &'a Receiver,
    pub intercom: Option<&'a Intercom>,
}

impl<'a> RecipientProfile<'a> {
    /// Build a profile; `None` if the record lacks a receiver or zone.
    #[must_use]
    pub fn from_record(actor: ActorId, record: &'a ActorRecord) -> Option<Self> {
        Some(Self {
            actor,
            zone: record.zone?,
            receiver: record.receiver.as_ref()?,
            intercom: record.intercom.as_ref(),
        })
    }
}

/// The receiver listens to the channel, and its hardware can carry it.
///
/// # Errors
///
/// Returns the skip reason if the rule fails.
pub fn subscription_rule(
    profile: &RecipientProfile<'_>,
    channel: &ChannelDescriptor,
) -> Result<(), SkipReason> {
    if !profile.receiver.receive_all && !profile.receiver.channels.contains(&channel.id) {
        return Err(SkipReason::NotSubscribed);
    }
    match profile.intercom {
        Some(intercom) if !intercom.supported_channels.contains(&channel.id) => {
            Err(SkipReason::IntercomUnsupported)
        }
        _ => Ok(()),
    }
}

/// Short-range traffic stays in the source zone unless the receiver hears
/// every zone.
///
/// # Errors
///
/// Returns the skip reason if the rule fails.
pub fn range_rule(
    profile: &RecipientProfile<'_>,
    channel: &ChannelDescriptor,
    source: &SourceProfile,
) -> Result<(), SkipReason> {
    if channel.long_range || source.zone == Some(profile.zone) {
        return Ok(());
    }
    if profile.receiver.global_receive && !channel.global_receive_exempt {
        return Ok(());
    }
    Err(SkipReason::OutOfRange)
}

/// Short-range traffic from a non-exempt device needs relay coverage.
///
/// # Errors
///
/// Returns the skip reason if the rule fails.
pub fn infrastructure_rule(
    channel: &ChannelDescriptor,
    source: &SourceProfile,
) -> Result<(), SkipReason> {
    if channel.long_range || source.exempt || source.relay_coverage {
        Ok(())
    } else {
        Err(SkipReason::NoRelay)
    }
}

/// Apply every rule in order.
#[must_use]
pub fn eligibility(
    profile: &RecipientProfile<'_>,
    channel: &ChannelDescriptor,
    source: &SourceProfile,
) -> Eligibility {
    let verdict = subscription_rule(profile, channel)
        .and_then(|()| range_rule(profile, channel, source))
        .and_then(|()| infrastructure_rule(channel, source));
    match verdict {
        Ok(()) => Eligibility::Deliver,
        Err(reason) => Eligibility::Skip(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const Z: ZoneId = ZoneId(1);
    const Y: ZoneId = ZoneId(2);

    fn covered(zone: ZoneId) -> SourceProfile {
        SourceProfile {
            zone: Some(zone),
            exempt: false,
            relay_coverage: true,
        }
    }

    fn profile<'a>(record: &'a ActorRecord) -> RecipientProfile<'a> {
        RecipientProfile::from_record(ActorId(1), record).unwrap()
    }

    fn cmd() -> ChannelDescriptor {
        ChannelDescriptor::new("cmd", "Command")
    }

    #[test]
    fn test_profile_requires_receiver_and_zone() {
        let record = ActorRecord::named("no zone").with_receiver(Receiver::on(["cmd"]));
        assert!(RecipientProfile::from_record(ActorId(1), &record).is_none());
        let record = ActorRecord::named("no receiver").in_zone(Z);
        assert!(RecipientProfile::from_record(ActorId(1), &record).is_none());
    }

    #[test]
    fn test_subscription() {
        let subscribed = ActorRecord::named("a").in_zone(Z).with_receiver(Receiver::on(["cmd"]));
        let other = ActorRecord::named("b").in_zone(Z).with_receiver(Receiver::on(["sec"]));
        let all = ActorRecord::named("c")
            .in_zone(Z)
            .with_receiver(Receiver::default().receiving_all());

        assert_eq!(subscription_rule(&profile(&subscribed), &cmd()), Ok(()));
        assert_eq!(
            subscription_rule(&profile(&other), &cmd()),
            Err(SkipReason::NotSubscribed)
        );
        assert_eq!(subscription_rule(&profile(&all), &cmd()), Ok(()));
    }

    #[test]
    fn test_intercom_restricts_even_receive_all() {
        let intercom = ActorRecord::named("intercom")
            .in_zone(Z)
            .with_receiver(Receiver::default().receiving_all())
            .with_intercom(["common"]);

        assert_eq!(
            subscription_rule(&profile(&intercom), &cmd()),
            Err(SkipReason::IntercomUnsupported)
        );
    }

    #[test]
    fn test_range() {
        let far = ActorRecord::named("far").in_zone(Y).with_receiver(Receiver::on(["cmd"]));
        let far_global = ActorRecord::named("far")
            .in_zone(Y)
            .with_receiver(Receiver::on(["cmd"]).global());

        assert_eq!(
            range_rule(&profile(&far), &cmd(), &covered(Z)),
            Err(SkipReason::OutOfRange)
        );
        assert_eq!(range_rule(&profile(&far), &cmd().long_range(), &covered(Z)), Ok(()));
        assert_eq!(range_rule(&profile(&far_global), &cmd(), &covered(Z)), Ok(()));
        assert_eq!(
            range_rule(&profile(&far_global), &cmd().global_receive_exempt(), &covered(Z)),
            Err(SkipReason::OutOfRange)
        );
    }

    #[test]
    fn test_infrastructure() {
        let uncovered = SourceProfile {
            zone: Some(Z),
            exempt: false,
            relay_coverage: false,
        };
        let exempt = SourceProfile {
            exempt: true,
            ..uncovered
        };

        assert_eq!(infrastructure_rule(&cmd(), &uncovered), Err(SkipReason::NoRelay));
        assert_eq!(infrastructure_rule(&cmd(), &exempt), Ok(()));
        assert_eq!(infrastructure_rule(&cmd().long_range(), &uncovered), Ok(()));
        assert_eq!(infrastructure_rule(&cmd(), &covered(Z)), Ok(()));
    }

    #[test]
    fn test_removing_any_enabler_never_helps() {
        let base = ActorRecord::named("r").in_zone(Z).with_receiver(Receiver::on(["cmd"]));
        let source = SourceProfile {
            zone: Some(Z),
            exempt: true,
            relay_coverage: true,
        };
        assert_eq!(eligibility(&profile(&base), &cmd(), &source), Eligibility::Deliver);

        let unsubscribed = ActorRecord::named("r").in_zone(Z).with_receiver(Receiver::default());
        let other_zone = ActorRecord::named("r").in_zone(Y).with_receiver(Receiver::on(["cmd"]));
        let no_exempt = SourceProfile {
            exempt: false,
            ..source
        };
        let no_relay = SourceProfile {
            relay_coverage: false,
            ..source
        };
        let neither = SourceProfile {
            exempt: false,
            relay_coverage: false,
            ..source
        };

        assert_ne!(eligibility(&profile(&unsubscribed), &cmd(), &source), Eligibility::Deliver);
        assert_ne!(eligibility(&profile(&other_zone), &cmd(), &source), Eligibility::Deliver);
        // Exemption and coverage are alternatives; each alone still delivers.
        assert_eq!(eligibility(&profile(&base), &cmd(), &no_exempt), Eligibility::Deliver);
        assert_eq!(eligibility(&profile(&base), &cmd(), &no_relay), Eligibility::Deliver);
        assert_eq!(
            eligibility(&profile(&base), &cmd(), &neither),
            Eligibility::Skip(SkipReason::NoRelay)
        );
    }
}
