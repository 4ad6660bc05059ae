//! Per-service JMX collector.

use std::sync::Arc;
use std::time::{Duration, Instant};

use url::Url;

use crate::catalog::FieldCatalog;
use crate::classify::ServiceSchema;
use crate::collector::{Collection, Collector, CollectorError};
use crate::extract::extract;
use crate::fetch::{BeanSource, HttpBeanSource};
use crate::service::ServiceKind;

/// Collector for one Hadoop daemon.
///
/// The schema is built once from the catalog; every collection fetches the
/// bean list, extracts samples and drops families that ended up empty.
pub struct ServiceCollector {
    name: String,
    cluster: String,
    schema: ServiceSchema,
    source: Arc<dyn BeanSource>,
}

impl ServiceCollector {
    /// Create a collector reading beans from `source`.
    ///
    /// # Errors
    /// Returns `CollectorError::Catalog` if the catalog has no entry for
    /// `service`.
    pub fn new(
        cluster: impl Into<String>,
        service: ServiceKind,
        catalog: &FieldCatalog,
        source: Arc<dyn BeanSource>,
    ) -> Result<Self, CollectorError> {
        let cluster = cluster.into();
        let service_catalog = catalog.service(service)?;
        let schema = ServiceSchema::build(service, &service_catalog, &catalog.common());

        Ok(Self {
            name: format!("{cluster}/{service}"),
            cluster,
            schema,
            source,
        })
    }

    /// Create a collector polling an HTTP `/jmx` endpoint.
    ///
    /// # Errors
    /// Returns `CollectorError::Catalog` for a missing catalog entry or
    /// `CollectorError::Fetch` if the HTTP client cannot be built.
    pub fn http(
        cluster: impl Into<String>,
        service: ServiceKind,
        catalog: &FieldCatalog,
        url: Url,
        timeout: Duration,
    ) -> Result<Self, CollectorError> {
        let source = HttpBeanSource::new(url, timeout)?;
        Self::new(cluster, service, catalog, Arc::new(source))
    }

    /// Schema built for this collector.
    pub fn schema(&self) -> &ServiceSchema {
        &self.schema
    }
}

impl std::fmt::Debug for ServiceCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCollector")
            .field("name", &self.name)
            .field("endpoint", &self.source.endpoint())
            .field("families", &self.schema.family_count())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Collector for ServiceCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn cluster(&self) -> &str {
        &self.cluster
    }

    fn service(&self) -> ServiceKind {
        self.schema.service()
    }

    async fn collect(&self) -> Collection {
        let start = Instant::now();

        let (beans, target_up) = match self.source.fetch().await {
            Ok(beans) => (beans, true),
            Err(e) => {
                tracing::warn!(
                    collector = %self.name,
                    endpoint = self.source.endpoint(),
                    error = %e,
                    "Fetch failed, exposing no samples"
                );
                (Vec::new(), false)
            }
        };

        let families: Vec<_> = extract(&beans, &self.schema, &self.cluster)
            .into_iter()
            .filter(|family| !family.is_empty())
            .collect();

        let duration = start.elapsed();
        tracing::debug!(
            collector = %self.name,
            beans = beans.len(),
            families = families.len(),
            duration_ms = duration.as_millis() as u64,
            "Collection finished"
        );

        Collection {
            families,
            target_up,
            duration,
        }
    }
}
