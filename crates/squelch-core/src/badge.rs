//! Job badge shown next to the speaker's name.
//!
//! Badges come from an ordered list of strategies; the first one that
//! produces a badge wins. The default order puts the two forced overrides
//! (ship AI, synthetic chassis) ahead of anything the speaker carries.

use crate::actor::ActorId;
use crate::capability::{CapabilityStore, IdCard};
use crate::format::{Localizer, JOB_NAME_BORG, JOB_NAME_STATION_AI};

/// Icon used when no badge is found.
pub const NO_ID_ICON: &str = "JobIconNoId";
const BORG_ICON: &str = "JobIconBorg";
const STATION_AI_ICON: &str = "JobIconStationAi";

/// Job icon and title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub icon: String,
    pub title: String,
}

impl Badge {
    #[must_use]
    pub fn new(icon: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            icon: icon.into(),
            title: title.into(),
        }
    }

    /// The empty badge.
    #[must_use]
    pub fn none() -> Self {
        Self::new(NO_ID_ICON, "")
    }

    fn from_card(card: &IdCard) -> Self {
        Self::new(&card.job_icon, &card.job_title)
    }
}

/// One way of finding a badge for a speaker.
pub type BadgeStrategy = fn(&dyn CapabilityStore, ActorId, &dyn Localizer) -> Option<Badge>;

/// Ship-AI-held actors always show the AI badge.
pub fn station_ai(
    store: &dyn CapabilityStore,
    actor: ActorId,
    loc: &dyn Localizer,
) -> Option<Badge> {
    store
        .get(actor)
        .filter(|r| r.ai_held)
        .map(|_| Badge::new(STATION_AI_ICON, loc.format(JOB_NAME_STATION_AI, &[])))
}

/// Synthetic chassis and brains always show the borg badge.
pub fn synthetic_chassis(
    store: &dyn CapabilityStore,
    actor: ActorId,
    loc: &dyn Localizer,
) -> Option<Badge> {
    store
        .get(actor)
        .filter(|r| r.chassis)
        .map(|_| Badge::new(BORG_ICON, loc.format(JOB_NAME_BORG, &[])))
}

/// An identity card carried directly.
pub fn carried_id_card(
    store: &dyn CapabilityStore,
    actor: ActorId,
    _loc: &dyn Localizer,
) -> Option<Badge> {
    store
        .get(actor)?
        .carried
        .iter()
        .find_map(|item| store.get(*item)?.id_card.as_ref().map(Badge::from_card))
}

/// An identity card inside a carried personal assistant device.
pub fn carried_pda(
    store: &dyn CapabilityStore,
    actor: ActorId,
    _loc: &dyn Localizer,
) -> Option<Badge> {
    store.get(actor)?.carried.iter().find_map(|item| {
        let card = store.get(*item)?.pda.as_ref()?.contained_id.as_ref()?;
        Some(Badge::from_card(card))
    })
}

/// Default strategy order.
pub const DEFAULT_STRATEGIES: [BadgeStrategy; 4] =
    [station_ai, synthetic_chassis, carried_id_card, carried_pda];

/// Evaluates badge strategies in priority order.
#[derive(Clone)]
pub struct BadgeResolver {
    strategies: Vec<BadgeStrategy>,
}

impl BadgeResolver {
    /// Create a resolver with a custom order.
    #[must_use]
    pub fn with_strategies(strategies: Vec<BadgeStrategy>) -> Self {
        Self { strategies }
    }

    /// First badge any strategy produces, or [`Badge::none`].
    #[must_use]
    pub fn resolve(
        &self,
        store: &dyn CapabilityStore,
        actor: ActorId,
        loc: &dyn Localizer,
    ) -> Badge {
        self.strategies
            .iter()
            .find_map(|strategy| strategy(store, actor, loc))
            .unwrap_or_else(Badge::none)
    }
}

impl std::fmt::Debug for BadgeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BadgeResolver")
            .field("strategies", &self.strategies.len())
            .finish()
    }
}

impl Default for BadgeResolver {
    fn default() -> Self {
        Self::with_strategies(DEFAULT_STRATEGIES.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{ActorRecord, MemoryStore};
    use crate::format::TemplateLocalizer;

    fn resolve(store: &MemoryStore, actor: ActorId) -> Badge {
        BadgeResolver::default().resolve(store, actor, &TemplateLocalizer::default())
    }

    #[test]
    fn test_no_badge() {
        let mut store = MemoryStore::new();
        let alice = store.spawn(ActorRecord::named("Alice"));
        assert_eq!(resolve(&store, alice), Badge::none());
    }

    #[test]
    fn test_direct_card_beats_pda() {
        let mut store = MemoryStore::new();
        let pda = store.spawn(
            ActorRecord::named("pda").with_pda(Some(IdCard::new("JobIconCaptain", "Captain"))),
        );
        let card = store.spawn(
            ActorRecord::named("card").with_id_card(IdCard::new("JobIconEngineer", "Engineer")),
        );
        let alice = store.spawn(ActorRecord::named("Alice").carrying(pda).carrying(card));

        assert_eq!(resolve(&store, alice), Badge::new("JobIconEngineer", "Engineer"));
    }

    #[test]
    fn test_pda_card_used_when_no_direct_card() {
        let mut store = MemoryStore::new();
        let empty_pda = store.spawn(ActorRecord::named("pda").with_pda(None));
        let pda = store.spawn(
            ActorRecord::named("pda").with_pda(Some(IdCard::new("JobIconMedic", "Medic"))),
        );
        let alice = store.spawn(ActorRecord::named("Alice").carrying(empty_pda).carrying(pda));

        assert_eq!(resolve(&store, alice), Badge::new("JobIconMedic", "Medic"));
    }

    #[test]
    fn test_chassis_forces_badge() {
        let mut store = MemoryStore::new();
        let card = store.spawn(
            ActorRecord::named("card").with_id_card(IdCard::new("JobIconEngineer", "Engineer")),
        );
        let borg = store.spawn(ActorRecord::named("B-12").synthetic().carrying(card));

        assert_eq!(resolve(&store, borg), Badge::new(BORG_ICON, "Cyborg"));
    }

    #[test]
    fn test_station_ai_beats_chassis() {
        let mut store = MemoryStore::new();
        let ai = store.spawn(ActorRecord::named("AI").synthetic().ai_held());
        assert_eq!(resolve(&store, ai), Badge::new(STATION_AI_ICON, "Station AI"));
    }

    #[test]
    fn test_custom_order() {
        let mut store = MemoryStore::new();
        let card = store.spawn(
            ActorRecord::named("card").with_id_card(IdCard::new("JobIconEngineer", "Engineer")),
        );
        let borg = store.spawn(ActorRecord::named("B-12").synthetic().carrying(card));

        let resolver =
            BadgeResolver::with_strategies(vec![carried_id_card as BadgeStrategy, synthetic_chassis]);
        let badge = resolver.resolve(&store, borg, &TemplateLocalizer::default());
        assert_eq!(badge.title, "Engineer");
    }
}
