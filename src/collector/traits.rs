//! Core collector traits and types.

use std::time::Duration;

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::fetch::FetchError;
use crate::metrics::MetricFamily;
use crate::service::ServiceKind;

/// Errors that can occur while building collectors.
///
/// Scrape-time failures never surface here; they degrade to an empty
/// collection instead.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Field catalog missing or malformed.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Bean source could not be created.
    #[error("fetch setup error: {0}")]
    Fetch(#[from] FetchError),
}

/// Result of one collection cycle.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Families with at least one sample, in catalog order.
    pub families: Vec<MetricFamily>,
    /// Whether the payload was fetched and decoded.
    pub target_up: bool,
    /// Wall time of the cycle.
    pub duration: Duration,
}

/// Core collector trait.
///
/// One collector serves one (cluster, service) pair. Collectors hold no
/// per-scrape state; `collect` may run concurrently for overlapping scrapes.
///
/// # Error Handling
///
/// `collect` is infallible. An unreachable target or malformed payload is a
/// valid observation: it yields a [`Collection`] with no families and
/// `target_up == false`, so one failing daemon never hides the others.
#[async_trait::async_trait]
pub trait Collector: Send + Sync + 'static {
    /// Unique identifier, `<cluster>/<service>`.
    fn name(&self) -> &str;

    /// Cluster label value.
    fn cluster(&self) -> &str;

    /// Monitored service.
    fn service(&self) -> ServiceKind;

    /// Perform one collection cycle.
    async fn collect(&self) -> Collection;
}
