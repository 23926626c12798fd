//! Configuration management for meshtopo.

use serde::{Deserialize, Serialize};
use std::env;
#[cfg(feature = "toml")]
use std::path::Path;

use crate::error::{Error, Result};

/// Lifetime of a parent entry when nothing else is configured (seconds)
pub const DEFAULT_PARENT_TTL_SECS: u64 = 70;

/// Environment variable overriding the parent TTL
pub const ENV_PARENT_TTL_SECS: &str = "MESHTOPO_PARENT_TTL_SECS";

/// Environment variable selecting JSON log output
pub const ENV_LOG_JSON: &str = "MESHTOPO_LOG_JSON";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub topology: TopologyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Maximum age of a parent entry before it is evicted (seconds)
    pub parent_ttl_secs: u64,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            parent_ttl_secs: DEFAULT_PARENT_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Config {
    #[cfg(feature = "toml")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `MESHTOPO_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default_config();

        if let Ok(ttl) = env::var(ENV_PARENT_TTL_SECS) {
            config.topology.parent_ttl_secs = ttl.trim().parse().map_err(|_| {
                Error::Config(format!("{} must be an integer, got {:?}", ENV_PARENT_TTL_SECS, ttl))
            })?;
        }

        if let Ok(json) = env::var(ENV_LOG_JSON) {
            config.logging.json = matches!(json.trim(), "1" | "true" | "yes");
        }

        config.validate()?;
        tracing::debug!(
            parent_ttl_secs = config.topology.parent_ttl_secs,
            json_logs = config.logging.json,
            "Loaded configuration from environment"
        );
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.topology.parent_ttl_secs == 0 {
            return Err(Error::Config("parent_ttl_secs must be greater than zero".to_string()));
        }
        Ok(())
    }
}
