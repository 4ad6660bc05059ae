//! Scrape target configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use super::validation::{ConfigError, expand_env_vars};
use crate::service::ServiceKind;

fn default_enabled() -> bool {
    true
}

/// One Hadoop daemon to scrape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Daemon kind; selects the catalog and rules.
    pub service: ServiceKind,
    /// `/jmx` endpoint URL. `${VAR}` and `${VAR:-default}` are expanded.
    pub url: String,
    /// Cluster label override (default: the top-level cluster).
    #[serde(default)]
    pub cluster: Option<String>,
    /// Enable this target (default: true).
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl TargetConfig {
    /// Create an enabled target.
    pub fn new(service: ServiceKind, url: impl Into<String>) -> Self {
        Self {
            service,
            url: url.into(),
            cluster: None,
            enabled: true,
        }
    }

    /// Set the cluster override.
    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    /// Set enabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Cluster label for this target.
    pub fn cluster_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.cluster.as_deref().unwrap_or(default)
    }

    /// Endpoint URL after environment expansion.
    ///
    /// # Errors
    /// Returns `ConfigError::UnsetVariable` for an unresolved `${VAR}` and
    /// `ConfigError::Invalid` for unparsable or non-HTTP URLs.
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let expanded = expand_env_vars(&self.url)?;
        let url = Url::parse(&expanded).map_err(|e| {
            ConfigError::Invalid(format!(
                "target '{}': invalid url '{}': {}",
                self.service, expanded, e
            ))
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::Invalid(format!(
                "target '{}': unsupported url scheme '{}', expected http/https",
                self.service, other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_from_yaml() {
        let yaml = r#"
service: resourcemanager
url: http://rm1:8088/jmx
cluster: analytics
"#;
        let target: TargetConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(target.service, ServiceKind::ResourceManager);
        assert!(target.enabled);
        assert_eq!(target.cluster_or("prod"), "analytics");
        assert_eq!(target.endpoint().unwrap().port(), Some(8088));
    }

    #[test]
    fn test_target_endpoint_rejects_bad_urls() {
        let target = TargetConfig::new(ServiceKind::NameNode, "not a url");
        assert!(target.endpoint().is_err());

        let target = TargetConfig::new(ServiceKind::NameNode, "ftp://nn1/jmx");
        let err = target.endpoint().unwrap_err();
        assert!(err.to_string().contains("unsupported url scheme"));
    }

    #[test]
    fn test_target_defaults() {
        let target = TargetConfig::new(ServiceKind::HBase, "http://hm:16010/jmx").with_enabled(false);
        assert!(!target.enabled);
        assert_eq!(target.cluster_or("prod"), "prod");
    }

    #[test]
    fn test_target_endpoint_unset_variable() {
        let target = TargetConfig::new(ServiceKind::DataNode, "http://${UNSET_DN_HOST_4711}:9864/jmx");
        assert!(matches!(target.endpoint(), Err(ConfigError::UnsetVariable(_))));

        let target =
            TargetConfig::new(ServiceKind::DataNode, "http://${UNSET_DN_HOST_4711:-dn1}:9864/jmx");
        assert_eq!(target.endpoint().unwrap().host_str(), Some("dn1"));
    }
}
