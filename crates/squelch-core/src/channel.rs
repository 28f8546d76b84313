//! Radio channel descriptors and the registry they are resolved from.

use crate::router::RouterError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Maximum channel id length.
pub const MAX_CHANNEL_ID_LENGTH: usize = 64;

/// Default channel color.
const DEFAULT_CHANNEL_COLOR: &str = "#ffffff";

/// A channel identifier.
pub type ChannelId = String;

/// Validate a channel id.
///
/// # Errors
///
/// Returns an error message if the channel id is invalid.
pub fn validate_channel_id(id: &str) -> Result<(), &'static str> {
    if id.is_empty() {
        return Err("Channel id cannot be empty");
    }
    if id.len() > MAX_CHANNEL_ID_LENGTH {
        return Err("Channel id too long");
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("Channel id contains invalid characters");
    }
    Ok(())
}

fn default_color() -> String {
    DEFAULT_CHANNEL_COLOR.to_string()
}

/// A named delivery scope with routing rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDescriptor {
    /// Channel id.
    pub id: ChannelId,
    /// Display name shown in brackets before the speaker.
    pub name: String,
    /// Markup color.
    #[serde(default = "default_color")]
    pub color: String,
    /// Delivered across zones without relay coverage.
    #[serde(default)]
    pub long_range: bool,
    /// Receivers' global-receive flag does not bypass the zone check.
    #[serde(default)]
    pub global_receive_exempt: bool,
}

impl ChannelDescriptor {
    /// Create a short-range channel.
    #[must_use]
    pub fn new(id: impl Into<ChannelId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: default_color(),
            long_range: false,
            global_receive_exempt: false,
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    #[must_use]
    pub fn long_range(mut self) -> Self {
        self.long_range = true;
        self
    }

    #[must_use]
    pub fn global_receive_exempt(mut self) -> Self {
        self.global_receive_exempt = true;
        self
    }
}

/// Read-only channel lookup for the router.
#[derive(Debug, Default, Clone)]
pub struct ChannelRegistry {
    channels: HashMap<ChannelId, ChannelDescriptor>,
}

impl ChannelRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is invalid or already registered.
    pub fn register(&mut self, channel: ChannelDescriptor) -> Result<(), RouterError> {
        validate_channel_id(&channel.id).map_err(RouterError::InvalidChannel)?;
        if self.channels.contains_key(&channel.id) {
            return Err(RouterError::DuplicateChannel(channel.id));
        }
        debug!(channel = %channel.id, long_range = channel.long_range, "Registered channel");
        self.channels.insert(channel.id.clone(), channel);
        Ok(())
    }

    /// Resolve a channel id.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::ChannelNotFound`] for unknown ids.
    pub fn resolve(&self, id: &str) -> Result<&ChannelDescriptor, RouterError> {
        self.channels
            .get(id)
            .ok_or_else(|| RouterError::ChannelNotFound(id.to_string()))
    }

    /// Number of registered channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Iterate all channels.
    pub fn iter(&self) -> impl Iterator<Item = &ChannelDescriptor> {
        self.channels.values()
    }
}

impl FromIterator<ChannelDescriptor> for ChannelRegistry {
    /// Later duplicates replace earlier ones; ids are not validated.
    fn from_iter<I: IntoIterator<Item = ChannelDescriptor>>(iter: I) -> Self {
        Self {
            channels: iter.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_id_validation() {
        assert!(validate_channel_id("command").is_ok());
        assert!(validate_channel_id("deep_space-1").is_ok());
        assert!(validate_channel_id("").is_err());
        assert!(validate_channel_id("has space").is_err());
        assert!(validate_channel_id(&"a".repeat(MAX_CHANNEL_ID_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = ChannelRegistry::new();
        registry
            .register(ChannelDescriptor::new("cmd", "Command").with_color("#fcdf03"))
            .unwrap();

        let channel = registry.resolve("cmd").unwrap();
        assert_eq!(channel.name, "Command");
        assert!(!channel.long_range);
        assert!(matches!(
            registry.resolve("sec"),
            Err(RouterError::ChannelNotFound(id)) if id == "sec"
        ));
    }

    #[test]
    fn test_register_rejects_duplicates_and_bad_ids() {
        let mut registry = ChannelRegistry::new();
        registry.register(ChannelDescriptor::new("cmd", "Command")).unwrap();

        assert!(matches!(
            registry.register(ChannelDescriptor::new("cmd", "Again")),
            Err(RouterError::DuplicateChannel(_))
        ));
        assert!(matches!(
            registry.register(ChannelDescriptor::new("", "Empty")),
            Err(RouterError::InvalidChannel(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_descriptor_defaults_from_toml() {
        let channel: ChannelDescriptor = toml::from_str(
            r#"
            id = "common"
            name = "Common"
            "#,
        )
        .unwrap();
        assert_eq!(channel.color, DEFAULT_CHANNEL_COLOR);
        assert!(!channel.long_range);
        assert!(!channel.global_receive_exempt);
    }
}
