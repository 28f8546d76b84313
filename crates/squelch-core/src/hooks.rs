//! Observer lists for the router's extension points.
//!
//! Attempt phases are two-scoped: every global observer runs, then every
//! observer registered on the target actor. All of them run; the phase is
//! cancelled if any one of them voted to cancel.

use crate::actor::ActorId;
use crate::capability::CapabilityStore;
use crate::channel::ChannelDescriptor;
use crate::guard::RoutingContext;
use crate::message::{DeliverySummary, RadioPayload, Transmission};
use crate::router::{RadioRouter, RouterError};
use std::collections::HashMap;

/// Outcome of one attempt observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    /// Let the stage continue.
    #[default]
    Proceed,
    /// Stop the stage.
    Cancel,
}

impl Verdict {
    /// Combine two votes; any cancel wins.
    #[must_use]
    pub fn or(self, other: Verdict) -> Verdict {
        if self == Verdict::Cancel || other == Verdict::Cancel {
            Verdict::Cancel
        } else {
            Verdict::Proceed
        }
    }

    #[must_use]
    pub fn is_cancelled(self) -> bool {
        self == Verdict::Cancel
    }
}

/// Where an observer is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Sees the event for every target.
    Global,
    /// Sees the event only when this actor is the target.
    Actor(ActorId),
}

/// A transmission is about to leave its device.
#[derive(Debug, Clone, Copy)]
pub struct SendAttempt<'a> {
    pub channel: &'a ChannelDescriptor,
    pub source_device: ActorId,
}

/// A transmission is about to reach one receiver.
#[derive(Debug, Clone, Copy)]
pub struct ReceiveAttempt<'a> {
    pub channel: &'a ChannelDescriptor,
    pub source_device: ActorId,
    pub recipient: ActorId,
}

/// Query for a speaker's displayed name.
#[derive(Debug, Clone, Copy)]
pub struct NameTransformation<'a> {
    pub actor: ActorId,
    pub base_name: &'a str,
}

/// Answer to a [`NameTransformation`] query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameOverride {
    /// Replacement display name.
    pub name: Option<String>,
    /// Explicit speech style id.
    pub style: Option<String>,
}

impl NameOverride {
    /// Override only the name.
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            style: None,
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Later answers replace earlier ones field by field.
    fn merge(mut self, later: NameOverride) -> NameOverride {
        if later.name.is_some() {
            self.name = later.name;
        }
        if later.style.is_some() {
            self.style = later.style;
        }
        self
    }
}

/// A payload arriving at one recipient.
///
/// Observers may transmit again through [`Delivery::relay`]; nested calls
/// share the outer call's [`RoutingContext`].
pub struct Delivery<'a> {
    pub router: &'a RadioRouter,
    pub store: &'a dyn CapabilityStore,
    pub ctx: &'a RoutingContext,
    pub recipient: ActorId,
    pub payload: &'a RadioPayload,
}

impl Delivery<'_> {
    /// Route a follow-up transmission within the same call.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel id is unknown.
    pub fn relay(&self, transmission: &Transmission) -> Result<DeliverySummary, RouterError> {
        self.router.route(self.store, self.ctx, transmission)
    }
}

/// Emitted once per routing call after the delivery scan.
#[derive(Debug, Clone, Copy)]
pub struct BroadcastSummary<'a> {
    pub source: ActorId,
    pub message: &'a str,
    pub channel: &'a ChannelDescriptor,
    /// Each recipient appears once.
    pub recipients: &'a [ActorId],
}

pub type SendAttemptObserver = dyn Fn(&SendAttempt<'_>) -> Verdict + Send + Sync;
pub type ReceiveAttemptObserver = dyn Fn(&ReceiveAttempt<'_>) -> Verdict + Send + Sync;
pub type NameObserver = dyn Fn(&NameTransformation<'_>) -> Option<NameOverride> + Send + Sync;
pub type DeliveryObserver = dyn Fn(&Delivery<'_>) + Send + Sync;
pub type SummaryObserver = dyn Fn(&BroadcastSummary<'_>) + Send + Sync;

/// Ordered observers split by scope.
pub struct Observers<F: ?Sized> {
    global: Vec<Box<F>>,
    scoped: HashMap<ActorId, Vec<Box<F>>>,
}

impl<F: ?Sized> Default for Observers<F> {
    fn default() -> Self {
        Self {
            global: Vec::new(),
            scoped: HashMap::new(),
        }
    }
}

impl<F: ?Sized> Observers<F> {
    /// Register an observer after any already present in the same scope.
    pub fn add(&mut self, scope: Scope, observer: Box<F>) {
        match scope {
            Scope::Global => self.global.push(observer),
            Scope::Actor(actor) => self.scoped.entry(actor).or_default().push(observer),
        }
    }

    /// Global observers, then those scoped to `target`.
    pub fn for_target(&self, target: ActorId) -> impl Iterator<Item = &F> + '_ {
        self.global
            .iter()
            .chain(self.scoped.get(&target).into_iter().flatten())
            .map(|observer| &**observer)
    }

    /// Total registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.global.len() + self.scoped.values().map(Vec::len).sum::<usize>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every extension point the router raises.
#[derive(Default)]
pub struct Hooks {
    send_attempt: Observers<SendAttemptObserver>,
    receive_attempt: Observers<ReceiveAttemptObserver>,
    name: Observers<NameObserver>,
    delivery: Observers<DeliveryObserver>,
    summary: Vec<Box<SummaryObserver>>,
}

impl Hooks {
    /// Create an empty hook set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe send attempts. Scoped observers see attempts from that device.
    pub fn on_send_attempt(
        &mut self,
        scope: Scope,
        observer: impl Fn(&SendAttempt<'_>) -> Verdict + Send + Sync + 'static,
    ) {
        self.send_attempt.add(scope, Box::new(observer));
    }

    /// Observe receive attempts. Scoped observers see attempts on that recipient.
    pub fn on_receive_attempt(
        &mut self,
        scope: Scope,
        observer: impl Fn(&ReceiveAttempt<'_>) -> Verdict + Send + Sync + 'static,
    ) {
        self.receive_attempt.add(scope, Box::new(observer));
    }

    /// Answer name queries. Scoped observers see queries about that speaker.
    pub fn on_name_transformation(
        &mut self,
        scope: Scope,
        observer: impl Fn(&NameTransformation<'_>) -> Option<NameOverride> + Send + Sync + 'static,
    ) {
        self.name.add(scope, Box::new(observer));
    }

    /// Observe deliveries. Scoped observers see deliveries to that recipient.
    pub fn on_delivery(
        &mut self,
        scope: Scope,
        observer: impl Fn(&Delivery<'_>) + Send + Sync + 'static,
    ) {
        self.delivery.add(scope, Box::new(observer));
    }

    /// Observe broadcast summaries.
    pub fn on_broadcast(
        &mut self,
        observer: impl Fn(&BroadcastSummary<'_>) + Send + Sync + 'static,
    ) {
        self.summary.push(Box::new(observer));
    }

    pub(crate) fn send_attempt(&self, event: &SendAttempt<'_>) -> Verdict {
        self.send_attempt
            .for_target(event.source_device)
            .fold(Verdict::Proceed, |verdict, observer| verdict.or(observer(event)))
    }

    pub(crate) fn receive_attempt(&self, event: &ReceiveAttempt<'_>) -> Verdict {
        self.receive_attempt
            .for_target(event.recipient)
            .fold(Verdict::Proceed, |verdict, observer| verdict.or(observer(event)))
    }

    pub(crate) fn transform_name(&self, event: &NameTransformation<'_>) -> NameOverride {
        self.name
            .for_target(event.actor)
            .filter_map(|observer| observer(event))
            .fold(NameOverride::default(), NameOverride::merge)
    }

    pub(crate) fn deliver(&self, delivery: &Delivery<'_>) {
        for observer in self.delivery.for_target(delivery.recipient) {
            observer(delivery);
        }
    }

    pub(crate) fn broadcast(&self, summary: &BroadcastSummary<'_>) {
        for observer in &self.summary {
            observer(summary);
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("send_attempt", &self.send_attempt.len())
            .field("receive_attempt", &self.receive_attempt.len())
            .field("name", &self.name.len())
            .field("delivery", &self.delivery.len())
            .field("summary", &self.summary.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn channel() -> ChannelDescriptor {
        ChannelDescriptor::new("cmd", "Command")
    }

    #[test]
    fn test_verdict_or() {
        assert_eq!(Verdict::Proceed.or(Verdict::Proceed), Verdict::Proceed);
        assert_eq!(Verdict::Proceed.or(Verdict::Cancel), Verdict::Cancel);
        assert_eq!(Verdict::Cancel.or(Verdict::Proceed), Verdict::Cancel);
    }

    #[test]
    fn test_send_attempt_runs_every_observer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut hooks = Hooks::new();

        let counter = calls.clone();
        hooks.on_send_attempt(Scope::Global, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Verdict::Cancel
        });
        let counter = calls.clone();
        hooks.on_send_attempt(Scope::Actor(ActorId(7)), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Verdict::Proceed
        });

        let channel = channel();
        let verdict = hooks.send_attempt(&SendAttempt {
            channel: &channel,
            source_device: ActorId(7),
        });
        assert!(verdict.is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_scoped_observers_only_see_their_actor() {
        let mut hooks = Hooks::new();
        hooks.on_receive_attempt(Scope::Actor(ActorId(2)), |_| Verdict::Cancel);

        let channel = channel();
        let attempt = |recipient| ReceiveAttempt {
            channel: &channel,
            source_device: ActorId(1),
            recipient,
        };
        assert!(hooks.receive_attempt(&attempt(ActorId(2))).is_cancelled());
        assert!(!hooks.receive_attempt(&attempt(ActorId(3))).is_cancelled());
    }

    #[test]
    fn test_name_overrides_merge_in_order() {
        let mut hooks = Hooks::new();
        hooks.on_name_transformation(Scope::Global, |_| {
            Some(NameOverride::name("Unknown").with_style("Whisper"))
        });
        hooks.on_name_transformation(Scope::Actor(ActorId(1)), |event| {
            Some(NameOverride::name(format!("Masked {}", event.base_name)))
        });
        hooks.on_name_transformation(Scope::Actor(ActorId(1)), |_| None);

        let answer = hooks.transform_name(&NameTransformation {
            actor: ActorId(1),
            base_name: "Alice",
        });
        assert_eq!(answer.name.as_deref(), Some("Masked Alice"));
        assert_eq!(answer.style.as_deref(), Some("Whisper"));
    }

    #[test]
    fn test_observer_counts() {
        let mut hooks = Hooks::new();
        hooks.on_send_attempt(Scope::Global, |_| Verdict::Proceed);
        hooks.on_send_attempt(Scope::Actor(ActorId(1)), |_| Verdict::Proceed);
        hooks.on_broadcast(|_| {});

        assert_eq!(hooks.send_attempt.len(), 2);
        assert!(hooks.receive_attempt.is_empty());
        assert!(format!("{hooks:?}").contains("send_attempt: 2"));
    }
}
