//! Metric family data model.
//!
//! Families are built fresh on every scrape and handed to the exposition
//! layer; nothing here is retained between scrapes.

use serde::Serialize;
use strum_macros::{AsRefStr, Display};

/// Name of the label every exported family carries first.
pub const CLUSTER_LABEL: &str = "cluster";

/// Kind of a metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Instantaneous value.
    Gauge,
    /// Aggregated observations with a count and a sum.
    Histogram,
}

/// Value carried by one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SampleValue {
    /// Gauge reading.
    Gauge(f64),
    /// Histogram observation count and sum.
    Histogram {
        /// Number of observations.
        count: u64,
        /// Sum of observed values.
        sum: f64,
    },
}

impl SampleValue {
    /// Gauge value, if this is a gauge sample.
    pub fn as_gauge(&self) -> Option<f64> {
        match self {
            Self::Gauge(v) => Some(*v),
            Self::Histogram { .. } => None,
        }
    }
}

/// One labeled data point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    /// Label values, aligned with the family's label names.
    pub label_values: Vec<String>,
    /// Sample value.
    pub value: SampleValue,
}

/// A named group of same-shaped samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricFamily {
    /// Fully qualified exposed name (e.g. `hadoop_namenode_jvm_gc_count`).
    pub name: String,
    /// Help text.
    pub help: String,
    /// Label names; `cluster` always comes first.
    pub label_names: Vec<String>,
    /// Family kind.
    pub kind: MetricKind,
    /// Samples in encounter order.
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    /// Create an empty family.
    pub fn new(
        name: impl Into<String>,
        help: impl Into<String>,
        label_names: Vec<String>,
        kind: MetricKind,
    ) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            label_names,
            kind,
            samples: Vec::new(),
        }
    }

    /// Append a sample.
    ///
    /// Samples whose label count does not match the family are dropped, which
    /// keeps label cardinality fixed across the family.
    pub fn push(&mut self, label_values: Vec<String>, value: SampleValue) {
        if label_values.len() != self.label_names.len() {
            tracing::warn!(
                family = %self.name,
                expected = self.label_names.len(),
                got = label_values.len(),
                "Dropping sample with mismatched label count"
            );
            return;
        }
        self.samples.push(Sample {
            label_values,
            value,
        });
    }

    /// Append a gauge sample.
    pub fn push_gauge(&mut self, label_values: Vec<String>, value: f64) {
        self.push(label_values, SampleValue::Gauge(value));
    }

    /// Whether the family holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
