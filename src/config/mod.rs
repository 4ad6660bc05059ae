//! Configuration module for the exporter.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Server settings (port, bind address, metrics path)
//! - Cluster label, catalog location and fetch timeout
//! - Scrape targets and optional Consul registration

mod app;
mod target;
mod validation;

pub use app::{AppConfig, DiscoveryConfig, ServerConfig};
pub use target::TargetConfig;
pub use validation::{ConfigError, expand_env_vars, parse_duration};

// Re-export constants
pub use app::{DEFAULT_CATALOG_PATH, DEFAULT_FETCH_TIMEOUT, DEFAULT_PORT};
