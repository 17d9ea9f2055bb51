//! Adapter and server identity configuration, loaded from TOML.

use std::{
    num::{NonZeroU64, NonZeroUsize},
    path::Path,
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::info;

fn default_worker_threads() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN.saturating_add(3))
}

fn default_ticks_per_second() -> NonZeroU64 {
    NonZeroU64::MIN.saturating_add(19)
}

/// Dispatch adapter tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Size of the session worker pool.
    pub worker_threads: NonZeroUsize,
    /// Rate of [`crate::adapter::DispatchAdapter::run`].
    pub ticks_per_second: NonZeroU64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            ticks_per_second: default_ticks_per_second(),
        }
    }
}

/// What the server advertises to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerIdentity {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub max_players: u32,
    /// Message of the day.
    pub motd: String,
    pub protocol: u32,
    pub game_version: String,
    pub default_gamemode: String,
}

impl Default for ServerIdentity {
    fn default() -> Self {
        Self {
            name: "Gravel Server".into(),
            address: "0.0.0.0".into(),
            port: 19132,
            max_players: 20,
            motd: "A gravel server".into(),
            protocol: info::LATEST_PROTOCOL,
            game_version: info::GAME_VERSION_NETWORK.into(),
            default_gamemode: "Creative".into(),
        }
    }
}

/// The full network configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub adapter: AdapterConfig,
    #[serde(default)]
    pub identity: ServerIdentity,
}

impl NetworkConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("invalid network configuration")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!("loaded network configuration from {}", path.display());
        Ok(config)
    }
}
