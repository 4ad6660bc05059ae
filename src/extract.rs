//! Sample extraction from fetched beans.
//!
//! Extraction walks every submodule of a [`ServiceSchema`], selects its beans
//! and turns raw attribute values into samples of the prebuilt families.
//! Nothing here fails a scrape: bad values and malformed records are logged
//! and skipped.

mod value;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::bean::Bean;
use crate::classify::{
    FamilySchema, FieldBinding, FieldSource, ServiceSchema, SubmoduleSchema, ValueTransform,
};
use crate::metrics::{MetricFamily, SampleValue};

pub use value::{OUT_OF_DOMAIN, numeric, resolve};

/// Recoverable extraction failures.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("value {value} of '{field}' is outside the known states")]
    EnumOutOfDomain { field: String, value: String },

    #[error("malformed peer list in '{field}': {reason}")]
    MalformedPeerList { field: String, reason: String },
}

/// One record of a serialized peer list.
pub type PeerRecord = Map<String, Value>;

/// Extract every family of `schema` from `beans`.
///
/// Families come back in schema order, including those without samples.
pub fn extract(beans: &[Bean], schema: &ServiceSchema, cluster: &str) -> Vec<MetricFamily> {
    schema
        .submodules()
        .iter()
        .flat_map(|submodule| extract_submodule(beans, submodule, cluster).into_values())
        .collect()
}

fn extract_submodule<'s>(
    beans: &[Bean],
    submodule: &'s SubmoduleSchema,
    cluster: &str,
) -> IndexMap<&'s str, MetricFamily> {
    let mut families: IndexMap<&str, MetricFamily> = submodule
        .families()
        .iter()
        .map(|(key, schema)| (key.as_str(), schema.new_family()))
        .collect();

    for bean in beans.iter().filter(|bean| submodule.selects(bean)) {
        match submodule.rules().fields {
            FieldSource::Catalog => from_catalog(bean, submodule, cluster, &mut families),
            FieldSource::Bean => from_bean(bean, submodule, cluster, &mut families),
            FieldSource::PeerList(attribute) => {
                if let Err(e) = from_peer_list(bean, attribute, submodule, cluster, &mut families) {
                    tracing::warn!(
                        submodule = submodule.name(),
                        bean = bean.name(),
                        error = %e,
                        "Skipping bean"
                    );
                }
            }
        }
    }

    families
}

fn push_value(
    families: &mut IndexMap<&str, MetricFamily>,
    schema: &FamilySchema,
    labels: Vec<String>,
    value: SampleValue,
) {
    if let Some(family) = families.get_mut(schema.key.key.as_str()) {
        family.push(labels, value);
    }
}

fn from_catalog(
    bean: &Bean,
    submodule: &SubmoduleSchema,
    cluster: &str,
    families: &mut IndexMap<&str, MetricFamily>,
) {
    let mut observations: IndexMap<&str, (u64, f64)> = IndexMap::new();

    for binding in submodule.bindings() {
        let Some(schema) = submodule.families().get(&binding.key) else {
            continue;
        };
        let raw = bean.get(binding.transform.source_field(&binding.field));

        if binding.transform == ValueTransform::Observation {
            let (count, sum) = observations.entry(binding.key.as_str()).or_default();
            if raw.is_some() {
                *count += 1;
                *sum += numeric(raw);
            }
            continue;
        }

        match resolve(binding.transform, &binding.field, raw) {
            Ok(value) => {
                let labels = schema.sample_labels(cluster, &binding.field_labels, bean, None);
                push_value(families, schema, labels, SampleValue::Gauge(value));
            }
            Err(e) => tracing::warn!(bean = bean.name(), error = %e, "Skipping sample"),
        }
    }

    for (key, (count, sum)) in observations {
        if let Some(schema) = submodule.families().get(key) {
            let labels = schema.sample_labels(cluster, &[], bean, None);
            push_value(families, schema, labels, SampleValue::Histogram { count, sum });
        }
    }
}

/// Capitalised attributes of the bean, classified on the fly. Attributes whose
/// family the catalog never declared are skipped.
fn from_bean(
    bean: &Bean,
    submodule: &SubmoduleSchema,
    cluster: &str,
    families: &mut IndexMap<&str, MetricFamily>,
) {
    let metric_fields = bean
        .attributes()
        .filter(|(name, _)| name.starts_with(|c: char| c.is_ascii_uppercase()));

    for (field, raw) in metric_fields {
        let Some(rule) = submodule.rules().rule_for(field) else {
            continue;
        };
        let Some(schema) = submodule.families().get(&rule.family_key(field)) else {
            continue;
        };
        match resolve(rule.transform, field, Some(raw)) {
            Ok(value) => {
                let field_labels = schema.field_label_values(field);
                let labels = schema.sample_labels(cluster, &field_labels, bean, None);
                push_value(families, schema, labels, SampleValue::Gauge(value));
            }
            Err(e) => tracing::warn!(bean = bean.name(), error = %e, "Skipping sample"),
        }
    }
}

fn from_peer_list(
    bean: &Bean,
    attribute: &str,
    submodule: &SubmoduleSchema,
    cluster: &str,
    families: &mut IndexMap<&str, MetricFamily>,
) -> Result<(), ExtractError> {
    let records = parse_peer_list(attribute, bean.get(attribute))?;

    for record in &records {
        match record_samples(record, submodule, cluster, bean) {
            Ok(samples) => {
                for (schema, labels, value) in samples {
                    push_value(families, schema, labels, SampleValue::Gauge(value));
                }
            }
            Err(e) => tracing::error!(
                submodule = submodule.name(),
                host = record.get("HostName").and_then(serde_json::Value::as_str).unwrap_or_default(),
                error = %e,
                "Dropping peer record"
            ),
        }
    }
    Ok(())
}

/// All samples of one peer record, or the first value error.
fn record_samples<'s>(
    record: &PeerRecord,
    submodule: &'s SubmoduleSchema,
    cluster: &str,
    bean: &Bean,
) -> Result<Vec<(&'s FamilySchema, Vec<String>, f64)>, ExtractError> {
    submodule
        .bindings()
        .iter()
        .filter_map(|binding: &FieldBinding| {
            let schema = submodule.families().get(&binding.key)?;
            Some((binding, schema))
        })
        .map(|(binding, schema)| {
            let raw = record.get(binding.transform.source_field(&binding.field));
            let labels = schema.sample_labels(cluster, &binding.field_labels, bean, Some(record));
            resolve(binding.transform, &binding.field, raw).map(|value| (schema, labels, value))
        })
        .collect()
}

/// Decode a peer list held either as a JSON-encoded string or as an array.
pub fn parse_peer_list(field: &str, raw: Option<&Value>) -> Result<Vec<PeerRecord>, ExtractError> {
    let malformed = |reason: String| ExtractError::MalformedPeerList {
        field: field.to_string(),
        reason,
    };
    let value: Value = match raw {
        Some(Value::String(encoded)) => {
            serde_json::from_str(encoded).map_err(|e| malformed(e.to_string()))?
        }
        Some(array @ Value::Array(_)) => array.clone(),
        Some(other) => return Err(malformed(format!("unexpected value {other}"))),
        None => return Err(malformed("attribute is missing".to_string())),
    };
    serde_json::from_value(value).map_err(|e| malformed(e.to_string()))
}
