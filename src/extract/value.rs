//! Raw JMX value resolution.

use std::str::FromStr;

use serde_json::Value;
use strum_macros::EnumString;

use super::ExtractError;
use crate::classify::ValueTransform;

/// Value reported for HA and filesystem states outside the known set.
pub const OUT_OF_DOMAIN: f64 = 9999.0;

#[derive(Debug, Clone, Copy, EnumString)]
#[strum(serialize_all = "lowercase")]
enum HaState {
    Initializing = 0,
    Active = 1,
    Standby = 2,
    Stopping = 3,
}

#[derive(Debug, Clone, Copy, EnumString)]
enum FsState {
    Safemode = 0,
    Operational = 1,
}

#[derive(Debug, Clone, Copy, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
enum NodeState {
    New = 1,
    Running = 2,
    Unhealthy = 3,
    Decommissioned = 4,
    Lost = 5,
    Rebooted = 6,
}

/// Numeric reading of a raw value.
///
/// Numbers pass through, booleans become 1/0, numeric strings are parsed.
/// Anything else, including an absent field, reads as 0.
pub fn numeric(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    }
}

/// Apply `transform` to the raw value of `field`.
///
/// `raw` must already be looked up through
/// [`ValueTransform::source_field`].
pub fn resolve(
    transform: ValueTransform,
    field: &str,
    raw: Option<&Value>,
) -> Result<f64, ExtractError> {
    let text = raw.and_then(Value::as_str);
    let value = match transform {
        ValueTransform::Identity | ValueTransform::Observation => numeric(raw),
        ValueTransform::StripWhitespace => match text {
            Some(s) => {
                let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
                compact.parse().unwrap_or_default()
            }
            None => numeric(raw),
        },
        ValueTransform::HaState => sentinel_enum::<HaState>(field, text, |s| s as u8),
        ValueTransform::FsState => sentinel_enum::<FsState>(field, text, |s| s as u8),
        ValueTransform::NodeState => {
            let state = text.and_then(|s| NodeState::from_str(s).ok()).ok_or_else(|| {
                ExtractError::EnumOutOfDomain {
                    field: field.to_string(),
                    value: raw.map(Value::to_string).unwrap_or_default(),
                }
            })?;
            f64::from(state as u8)
        }
    };
    Ok(value)
}

fn sentinel_enum<E: FromStr>(field: &str, text: Option<&str>, code: fn(E) -> u8) -> f64 {
    match text.map(E::from_str) {
        Some(Ok(state)) => f64::from(code(state)),
        Some(Err(_)) => {
            tracing::warn!(field, value = text.unwrap_or_default(), "Unexpected state value");
            OUT_OF_DOMAIN
        }
        None => {
            tracing::warn!(field, "Missing state value");
            OUT_OF_DOMAIN
        }
    }
}
