//! Hadoop JMX to Prometheus exporter.
//!
//! Polls the `/jmx` endpoints of Hadoop daemons (NameNode, DataNode,
//! ResourceManager, HBase and friends) on every scrape and republishes their
//! beans as labeled Prometheus metric families.
//!
//! # Architecture
//!
//! - **Catalog**: per-service YAML declarations of the raw fields to export
//! - **Classification**: declarative rules mapping raw field names to families
//! - **Extraction**: turns fetched beans into samples of those families
//! - **Collectors**: one per (cluster, service) target, driven by a registry
//! - **Server**: `axum` endpoint rendering the Prometheus text format
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hadoop_exporter::{
//!     CollectorRegistry, FieldCatalog, ServiceCollector, ServiceKind,
//!     server::{AppState, METRICS_PATH, create_router},
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = FieldCatalog::load("catalog", [ServiceKind::NameNode])?;
//! let mut registry = CollectorRegistry::new();
//! registry.register(ServiceCollector::http(
//!     "prod",
//!     ServiceKind::NameNode,
//!     &catalog,
//!     "http://nn1:9870/jmx".parse()?,
//!     std::time::Duration::from_secs(10),
//! )?);
//!
//! let app = create_router(AppState {
//!     registry: Arc::new(registry),
//!     metrics_path: METRICS_PATH.to_string(),
//! });
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:9089").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod bean;
pub mod catalog;
pub mod classify;
pub mod collector;
pub mod config;
pub mod discovery;
pub mod exposition;
pub mod extract;
pub mod fetch;
pub mod metrics;
pub mod server;
pub mod service;

pub use bean::Bean;
pub use catalog::{CatalogError, FieldCatalog, RawFieldDescriptor, ServiceCatalog};
pub use classify::{FamilyKey, FamilySchema, ServiceSchema, build_schema};
pub use collector::{Collection, Collector, CollectorError, CollectorRegistry, ServiceCollector};
pub use config::{AppConfig, ConfigError, TargetConfig};
pub use extract::{ExtractError, extract};
pub use fetch::{BeanSource, FetchError, HttpBeanSource};
pub use metrics::{MetricFamily, MetricKind, Sample, SampleValue};
pub use service::ServiceKind;
