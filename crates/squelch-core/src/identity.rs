//! Speaker name and speech style resolution.

use crate::actor::ActorId;
use crate::capability::CapabilityStore;
use crate::hooks::{Hooks, NameTransformation};
use std::collections::HashMap;
use tracing::trace;

/// Style id used when nothing more specific applies.
pub const DEFAULT_STYLE: &str = "Default";

/// How a line is voiced: verb choices and emphasis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechStyle {
    pub id: String,
    /// Verbs (or verb template ids) picked from at random.
    pub verbs: Vec<String>,
    pub font_id: String,
    pub font_size: u16,
    pub bold: bool,
}

impl SpeechStyle {
    /// Create a plain style.
    #[must_use]
    pub fn new<I, S>(id: impl Into<String>, verbs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            verbs: verbs.into_iter().map(Into::into).collect(),
            font_id: "Default".to_string(),
            font_size: 12,
            bold: false,
        }
    }

    #[must_use]
    pub fn bold(mut self, font_size: u16) -> Self {
        self.bold = true;
        self.font_size = font_size;
        self
    }
}

impl Default for SpeechStyle {
    fn default() -> Self {
        Self::new(DEFAULT_STYLE, ["says"])
    }
}

/// Registered speech styles.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    styles: HashMap<String, SpeechStyle>,
    fallback: SpeechStyle,
}

impl StyleRegistry {
    /// Create a registry holding only the default style.
    #[must_use]
    pub fn new() -> Self {
        Self {
            styles: HashMap::new(),
            fallback: SpeechStyle::default(),
        }
    }

    /// Add or replace a style.
    pub fn register(&mut self, style: SpeechStyle) {
        self.styles.insert(style.id.clone(), style);
    }

    /// Look up a style by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SpeechStyle> {
        self.styles.get(id).or_else(|| {
            if id == self.fallback.id {
                Some(&self.fallback)
            } else {
                None
            }
        })
    }

    /// Look up a style, falling back to the default.
    #[must_use]
    pub fn resolve(&self, id: &str) -> &SpeechStyle {
        self.get(id).unwrap_or(&self.fallback)
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(SpeechStyle::new("Exclaim", ["exclaims"]));
        registry.register(SpeechStyle::new("Ask", ["asks"]));
        registry.register(SpeechStyle::new("Yell", ["yells", "shouts"]).bold(14));
        registry
    }
}

/// Derives a speech style from message content.
pub trait ChatStyler: Send + Sync {
    /// Style id for `message` spoken by `speaker`.
    fn style_id(&self, store: &dyn CapabilityStore, speaker: ActorId, message: &str) -> String;
}

/// Picks a style from trailing punctuation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuffixStyler;

impl ChatStyler for SuffixStyler {
    fn style_id(&self, _store: &dyn CapabilityStore, _speaker: ActorId, message: &str) -> String {
        let trimmed = message.trim_end();
        let id = if trimmed.ends_with("!!") {
            "Yell"
        } else if trimmed.ends_with('!') {
            "Exclaim"
        } else if trimmed.ends_with('?') {
            "Ask"
        } else {
            DEFAULT_STYLE
        };
        id.to_string()
    }
}

/// Who a message appears to come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerIdentity {
    /// The actor's own name.
    pub base_name: String,
    /// Name shown to listeners; differs from `base_name` under a voice mask.
    pub display_name: String,
    pub style: SpeechStyle,
}

impl SpeakerIdentity {
    /// Check whether a voice mask replaced the name.
    #[must_use]
    pub fn is_masked(&self) -> bool {
        self.display_name != self.base_name
    }
}

/// Resolve the speaker's display name and speech style.
///
/// Raises one [`NameTransformation`] query. An empty override name falls
/// back to the base name; an unknown override style falls back to the
/// content-derived style.
pub fn resolve_speaker(
    store: &dyn CapabilityStore,
    hooks: &Hooks,
    styles: &StyleRegistry,
    styler: &dyn ChatStyler,
    source: ActorId,
    message: &str,
) -> SpeakerIdentity {
    let base_name = store.name(source).to_string();
    let answer = hooks.transform_name(&NameTransformation {
        actor: source,
        base_name: &base_name,
    });

    let display_name = answer
        .name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| base_name.clone());

    let style = match answer.style.as_deref().and_then(|id| styles.get(id)) {
        Some(style) => style.clone(),
        None => styles
            .resolve(&styler.style_id(store, source, message))
            .clone(),
    };

    trace!(actor = %source, masked = display_name != base_name, style = %style.id, "Resolved speaker");

    SpeakerIdentity {
        base_name,
        display_name,
        style,
    }
}
