//! Application configuration structures.

use std::collections::HashSet;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::target::TargetConfig;
use super::validation::ConfigError;
use crate::discovery::ConsulConfig;
use crate::server::METRICS_PATH;

// =============================================================================
// Constants
// =============================================================================

/// Default listen port.
pub const DEFAULT_PORT: u16 = 9089;

/// Default `/jmx` request timeout (10 seconds).
pub const DEFAULT_FETCH_TIMEOUT: Duration = crate::fetch::DEFAULT_FETCH_TIMEOUT;

/// Default catalog directory.
pub const DEFAULT_CATALOG_PATH: &str = "catalog";

fn default_catalog_path() -> String {
    DEFAULT_CATALOG_PATH.to_string()
}

fn default_fetch_timeout() -> Duration {
    DEFAULT_FETCH_TIMEOUT
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Web server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (default: "0.0.0.0").
    pub bind: String,

    /// Server port (default: 9089).
    pub port: u16,

    /// Scrape endpoint path (default: "/metrics").
    pub metrics_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            metrics_path: METRICS_PATH.to_string(),
        }
    }
}

// =============================================================================
// Discovery Configuration
// =============================================================================

/// Service discovery configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Consul agent registration.
    #[serde(default)]
    pub consul: Option<ConsulConfig>,
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Web server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Default cluster label for every target.
    pub cluster: String,

    /// Directory holding `common.yaml` and `<service>.yaml` catalogs.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Per-request timeout for `/jmx` fetches (default: 10s).
    #[serde(default = "default_fetch_timeout", with = "humantime_serde")]
    pub fetch_timeout: Duration,

    /// Daemons to scrape.
    #[serde(default)]
    pub targets: Vec<TargetConfig>,

    /// Optional service discovery.
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Enabled targets in declaration order.
    pub fn enabled_targets(&self) -> impl Iterator<Item = &TargetConfig> {
        self.targets.iter().filter(|t| t.enabled)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns the first invalid value as a `ConfigError`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate server bind address
        self.server.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::Invalid(format!(
                "invalid server bind address: '{}'",
                self.server.bind
            ))
        })?;

        // Validate server port
        if self.server.port == 0 {
            return Err(ConfigError::Invalid(
                "server port must be non-zero".to_string(),
            ));
        }

        if !self.server.metrics_path.starts_with('/') || self.server.metrics_path == "/healthz" {
            return Err(ConfigError::Invalid(format!(
                "invalid metrics path: '{}'",
                self.server.metrics_path
            )));
        }

        if self.cluster.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "cluster must be non-empty".to_string(),
            ));
        }

        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "fetch_timeout must be positive".to_string(),
            ));
        }

        // Validate targets
        if self.enabled_targets().next().is_none() {
            return Err(ConfigError::Invalid(
                "at least one enabled target is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for target in self.enabled_targets() {
            target.endpoint()?;

            let cluster = target.cluster_or(&self.cluster);
            if cluster.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "target '{}': cluster must be non-empty",
                    target.service
                )));
            }
            if !seen.insert((cluster, target.service)) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate target: service '{}' in cluster '{}'",
                    target.service, cluster
                )));
            }
        }

        Ok(())
    }
}
