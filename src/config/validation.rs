//! Configuration errors and value helpers.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use regex::{Captures, Regex};
use thiserror::Error;

/// Configuration error types. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Config file is not valid YAML of the expected shape.
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// `${VAR}` without a default refers to an unset variable.
    #[error("environment variable '{0}' is not set and has no default")]
    UnsetVariable(String),

    /// A value failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Parse a human-readable duration such as `10s`, `1500ms` or `1m30s`.
///
/// ```
/// use hadoop_exporter::config::parse_duration;
///
/// assert_eq!(parse_duration("10s").unwrap().as_secs(), 10);
/// assert_eq!(parse_duration("1500ms").unwrap().as_millis(), 1500);
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    match s.trim() {
        "" => Err("duration string is empty".to_string()),
        s => humantime::parse_duration(s).map_err(|e| format!("invalid duration '{s}': {e}")),
    }
}

/// Expand `${VAR}` and `${VAR:-default}` references.
///
/// # Errors
/// Returns `ConfigError::UnsetVariable` for the first `${VAR}` whose variable
/// is unset and that carries no default.
pub fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    static ENV_VAR: OnceLock<Regex> = OnceLock::new();
    let regex = ENV_VAR.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}")
            .expect("failed to compile env var regex")
    });

    let mut unset = None;
    let expanded = regex.replace_all(input, |caps: &Captures| {
        match (std::env::var(&caps[1]), caps.get(3)) {
            (Ok(value), _) => value,
            (Err(_), Some(default)) => default.as_str().to_string(),
            (Err(_), None) => {
                unset.get_or_insert_with(|| caps[1].to_string());
                String::new()
            }
        }
    });

    match unset {
        Some(name) => Err(ConfigError::UnsetVariable(name)),
        None => Ok(expanded.into_owned()),
    }
}
