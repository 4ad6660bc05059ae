//! Collector registry and scrape driver.

use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::collector::{Collection, Collector};
use crate::metrics::{CLUSTER_LABEL, MetricFamily, MetricKind};

/// Exporter self-metric: whether the last fetch of a target succeeded.
pub const TARGET_UP: &str = "hadoop_exporter_target_up";
/// Exporter self-metric: wall time of a target's collection.
pub const SCRAPE_DURATION: &str = "hadoop_exporter_scrape_duration_seconds";

/// Metadata about a registered collector.
#[derive(Debug, Clone)]
pub struct CollectorInfo {
    /// Collector name (`<cluster>/<service>`).
    pub name: String,
    /// Cluster label value.
    pub cluster: String,
    /// Service name.
    pub service: String,
}

/// Registry of every configured collector.
///
/// A scrape runs all collectors in registration order, merges families that
/// share an exposed name (one per cluster of the same service) and appends
/// the exporter's own target health families.
#[derive(Default)]
pub struct CollectorRegistry {
    collectors: Vec<Arc<dyn Collector>>,
}

impl std::fmt::Debug for CollectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorRegistry")
            .field("collector_count", &self.collectors.len())
            .finish_non_exhaustive()
    }
}

impl CollectorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collector.
    pub fn register<C: Collector>(&mut self, collector: C) {
        tracing::info!(collector = %collector.name(), "Collector registered");
        self.collectors.push(Arc::new(collector));
    }

    /// Registered collectors.
    pub fn list(&self) -> Vec<CollectorInfo> {
        self.collectors
            .iter()
            .map(|c| CollectorInfo {
                name: c.name().to_string(),
                cluster: c.cluster().to_string(),
                service: c.service().to_string(),
            })
            .collect()
    }

    /// Number of registered collectors.
    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    /// Whether no collector is registered.
    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Run every collector once and return the merged families.
    pub async fn gather(&self) -> Vec<MetricFamily> {
        let start = Instant::now();
        let mut merged: IndexMap<String, MetricFamily> = IndexMap::new();
        let mut up = health_family(TARGET_UP, "Whether the last JMX fetch of the target succeeded.");
        let mut duration = health_family(
            SCRAPE_DURATION,
            "Time spent collecting the target in seconds.",
        );

        for collector in &self.collectors {
            let Collection {
                families,
                target_up,
                duration: elapsed,
            } = collector.collect().await;

            let labels = vec![collector.cluster().to_string(), collector.service().to_string()];
            up.push_gauge(labels.clone(), f64::from(u8::from(target_up)));
            duration.push_gauge(labels, elapsed.as_secs_f64());

            for family in families {
                merge_family(&mut merged, family);
            }
        }

        let mut families: Vec<MetricFamily> = merged.into_values().collect();
        if !self.collectors.is_empty() {
            families.push(up);
            families.push(duration);
        }

        tracing::debug!(
            collectors = self.collectors.len(),
            families = families.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Scrape gathered"
        );
        families
    }
}

fn health_family(name: &str, help: &str) -> MetricFamily {
    MetricFamily::new(
        name,
        help,
        vec![CLUSTER_LABEL.to_string(), "service".to_string()],
        MetricKind::Gauge,
    )
}

/// Append `family`'s samples to an existing family of the same name.
/// A same-named family with a different shape is dropped.
fn merge_family(merged: &mut IndexMap<String, MetricFamily>, family: MetricFamily) {
    match merged.entry(family.name.clone()) {
        Entry::Vacant(slot) => {
            slot.insert(family);
        }
        Entry::Occupied(mut slot) => {
            let existing = slot.get_mut();
            if existing.label_names != family.label_names || existing.kind != family.kind {
                tracing::warn!(
                    family = %family.name,
                    "Dropping family with conflicting shape"
                );
                return;
            }
            existing.samples.extend(family.samples);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::SampleValue;
    use crate::service::ServiceKind;
    use std::time::Duration;

    /// A mock collector for testing.
    struct MockCollector {
        name: String,
        cluster: String,
        up: bool,
    }

    impl MockCollector {
        fn new(cluster: &str, up: bool) -> Self {
            Self {
                name: format!("{cluster}/namenode"),
                cluster: cluster.to_string(),
                up,
            }
        }
    }

    #[async_trait::async_trait]
    impl Collector for MockCollector {
        fn name(&self) -> &str {
            &self.name
        }

        fn cluster(&self) -> &str {
            &self.cluster
        }

        fn service(&self) -> ServiceKind {
            ServiceKind::NameNode
        }

        async fn collect(&self) -> Collection {
            if !self.up {
                return Collection::default();
            }
            let mut family = MetricFamily::new(
                "hadoop_namenode_jvm_gc_count",
                "GC count of each type GC.",
                vec!["cluster".to_string(), "type".to_string()],
                MetricKind::Gauge,
            );
            family.push_gauge(vec![self.cluster.clone(), "ParNew".to_string()], 1.0);
            Collection {
                families: vec![family],
                target_up: true,
                duration: Duration::from_millis(5),
            }
        }
    }

    #[tokio::test]
    async fn test_registry_merges_same_named_families() {
        let mut registry = CollectorRegistry::new();
        registry.register(MockCollector::new("c1", true));
        registry.register(MockCollector::new("c2", true));
        registry.register(MockCollector::new("c3", false));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.list()[1].name, "c2/namenode");

        let families = registry.gather().await;
        let names: Vec<_> = families.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["hadoop_namenode_jvm_gc_count", TARGET_UP, SCRAPE_DURATION]);

        assert_eq!(families[0].samples.len(), 2);
        assert_eq!(families[0].samples[1].label_values[0], "c2");

        let up = &families[1];
        assert_eq!(up.samples.len(), 3);
        assert_eq!(up.samples[2].label_values, vec!["c3", "namenode"]);
        assert_eq!(up.samples[2].value, SampleValue::Gauge(0.0));
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let registry = CollectorRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.gather().await.is_empty());
    }

    #[test]
    fn test_merge_rejects_conflicting_shape() {
        let mut merged = IndexMap::new();
        let a = MetricFamily::new("x", "", vec!["cluster".into()], MetricKind::Gauge);
        let mut b = MetricFamily::new("x", "", vec!["cluster".into(), "mode".into()], MetricKind::Gauge);
        b.push_gauge(vec!["c".into(), "m".into()], 1.0);
        merge_family(&mut merged, a);
        merge_family(&mut merged, b);
        assert!(merged["x"].is_empty());
    }
}
