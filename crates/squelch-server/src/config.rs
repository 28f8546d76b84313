//! Squelch server settings.
//!
//! Settings come from the first `squelch.toml` found on the search path,
//! falling back to built-in defaults. `SQUELCH_HOST` and `SQUELCH_PORT`
//! override the listen address either way.
//!
//! ```toml
//! [listen]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [router]
//! chime_volume = -7.0
//!
//! [[channels]]
//! id = "common"
//! name = "Common"
//! color = "#2cdb2c"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tenvis_squelch_core::{ActorId, ActorRecord, ChannelDescriptor, RouterConfig};
use tracing::{debug, warn};

/// Files tried in order by [`Config::load`].
const SEARCH_PATH: [&str; 3] = [
    "squelch.toml",
    "/etc/squelch/squelch.toml",
    "~/.config/squelch/squelch.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen: ListenConfig,
    pub router: RouterSection,
    pub metrics: MetricsConfig,
    /// Registered at startup, in order.
    pub channels: Vec<ChannelDescriptor>,
    /// Actors the world starts with.
    pub actors: Vec<ActorSeed>,
}

impl Default for Config {
    /// A bare config still gets the common channel.
    fn default() -> Self {
        Self {
            listen: ListenConfig::default(),
            router: RouterSection::default(),
            metrics: MetricsConfig::default(),
            channels: vec![ChannelDescriptor::new("common", "Common").with_color("#2cdb2c")],
            actors: Vec::new(),
        }
    }
}

/// HTTP listen address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Router tuning plus the replay buffer size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSection {
    /// Decibels.
    pub chime_volume: f32,
    /// Slot checked for chime-equipped headsets.
    pub ears_slot: String,
    pub verb_seed: Option<u64>,
    /// Zero disables replay recording.
    pub replay_capacity: usize,
    /// Frames held per session until it drains its inbox.
    pub outbox_capacity: usize,
    /// Longest accepted message text, in bytes.
    pub max_message_size: usize,
}

impl Default for RouterSection {
    fn default() -> Self {
        let core = RouterConfig::default();
        Self {
            chime_volume: core.chime_volume,
            ears_slot: core.ears_slot,
            verb_seed: core.verb_seed,
            replay_capacity: 1024,
            outbox_capacity: 1024,
            max_message_size: core.max_message_size,
        }
    }
}

impl RouterSection {
    #[must_use]
    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            ears_slot: self.ears_slot.clone(),
            chime_volume: self.chime_volume,
            verb_seed: self.verb_seed,
            max_message_size: self.max_message_size,
        }
    }
}

/// Prometheus exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 9090,
        }
    }
}

/// An actor listed in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorSeed {
    pub id: ActorId,
    #[serde(flatten)]
    pub record: ActorRecord,
}

impl Config {
    /// Read the first file on the search path, or use defaults if none
    /// exists, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a file is found but is unreadable or malformed.
    pub fn load() -> Result<Self> {
        let found = SEARCH_PATH
            .iter()
            .map(|candidate| PathBuf::from(shellexpand::tilde(candidate).into_owned()))
            .find(|candidate| candidate.is_file());

        let mut config = match found {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("No squelch.toml found, using defaults");
                Self::default()
            }
        };
        config.listen.apply_env();
        Ok(config)
    }

    /// Parse one TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or malformed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("Malformed settings in {}", path.display()))?;
        debug!(path = %path.display(), "Loaded settings");
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error if the listen host and port are not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ListenConfig { host, port } = &self.listen;
        format!("{host}:{port}")
            .parse()
            .with_context(|| format!("Invalid listen address {host}:{port}"))
    }
}

impl ListenConfig {
    fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("SQUELCH_HOST") {
            self.host = host;
        }
        if let Ok(port) = std::env::var("SQUELCH_PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => warn!(value = %port, "Ignoring unparsable SQUELCH_PORT"),
            }
        }
    }
}
