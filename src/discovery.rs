//! Consul service registration.
//!
//! When configured, the exporter registers itself with the local Consul agent
//! once its listener is bound and deregisters on shutdown. Failures are
//! reported to the caller, which logs them and keeps serving.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default Consul agent address.
pub const DEFAULT_CONSUL_URL: &str = "http://127.0.0.1:8500";

/// Default request timeout (5 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Health check interval advertised to Consul.
const CHECK_INTERVAL: &str = "15s";

fn default_consul_url() -> String {
    DEFAULT_CONSUL_URL.to_string()
}

fn default_service_name() -> String {
    "hadoop-exporter".to_string()
}

fn default_tags() -> Vec<String> {
    vec!["hadoop".to_string()]
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

/// Errors talking to the Consul agent.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("invalid consul url: {0}")]
    Url(#[from] url::ParseError),

    #[error("consul request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("consul returned status {0}")]
    Status(u16),
}

/// Consul registration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsulConfig {
    /// Agent base URL (default: `http://127.0.0.1:8500`).
    #[serde(default = "default_consul_url")]
    pub url: String,
    /// Registered service name (default: `hadoop-exporter`).
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Service ID (default: `<service_name>-<port>`).
    #[serde(default)]
    pub service_id: Option<String>,
    /// Advertised address. Without it Consul uses the agent's address and
    /// no HTTP health check is registered.
    #[serde(default)]
    pub address: Option<String>,
    /// Service tags (default: `["hadoop"]`).
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,
    /// Request timeout (default: 5s).
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ConsulConfig {
    fn default() -> Self {
        Self {
            url: default_consul_url(),
            service_name: default_service_name(),
            service_id: None,
            address: None,
            tags: default_tags(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ConsulConfig {
    /// Service ID used for `port`.
    pub fn service_id(&self, port: u16) -> String {
        self.service_id
            .clone()
            .unwrap_or_else(|| format!("{}-{}", self.service_name, port))
    }
}

/// Agent service definition (`PUT /v1/agent/service/register` body).
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceDefinition<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<&'a str>,
    port: u16,
    tags: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    check: Option<HealthCheck>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct HealthCheck {
    #[serde(rename = "HTTP")]
    http: String,
    interval: &'static str,
}

/// An active registration; call [`deregister`](Self::deregister) on shutdown.
#[derive(Debug)]
pub struct Registration {
    client: Client,
    base: Url,
    service_id: String,
}

/// Register the exporter listening on `port`.
///
/// # Errors
/// Returns `DiscoveryError` if the agent is unreachable or rejects the
/// definition.
pub async fn register(config: &ConsulConfig, port: u16) -> Result<Registration, DiscoveryError> {
    let client = Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| DiscoveryError::Client(e.to_string()))?;
    let base = Url::parse(&config.url)?;
    let service_id = config.service_id(port);

    let definition = ServiceDefinition {
        id: &service_id,
        name: &config.service_name,
        address: config.address.as_deref(),
        port,
        tags: &config.tags,
        check: config.address.as_deref().map(|address| HealthCheck {
            http: format!("http://{address}:{port}/healthz"),
            interval: CHECK_INTERVAL,
        }),
    };

    let response = client
        .put(base.join("v1/agent/service/register")?)
        .json(&definition)
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(DiscoveryError::Status(response.status().as_u16()));
    }

    tracing::info!(
        consul = %base,
        service_id = %service_id,
        "Registered with Consul"
    );
    Ok(Registration {
        client,
        base,
        service_id,
    })
}

impl Registration {
    /// Registered service ID.
    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Remove the registration from the agent.
    ///
    /// # Errors
    /// Returns `DiscoveryError` if the agent is unreachable or refuses.
    pub async fn deregister(self) -> Result<(), DiscoveryError> {
        let path = format!("v1/agent/service/deregister/{}", self.service_id);
        let response = self.client.put(self.base.join(&path)?).send().await?;
        if !response.status().is_success() {
            return Err(DiscoveryError::Status(response.status().as_u16()));
        }
        tracing::info!(service_id = %self.service_id, "Deregistered from Consul");
        Ok(())
    }
}
