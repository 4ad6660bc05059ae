//! Collector Layer
//!
//! One collector per configured (cluster, service) target. Collectors are
//! driven synchronously from the `/metrics` handler: every scrape fetches
//! fresh beans and rebuilds all families.
//!
//! # Architecture
//!
//! - [`Collector`]: Core trait for implementing data collectors
//! - [`ServiceCollector`]: Fetches a daemon's `/jmx` payload and extracts families
//! - [`CollectorRegistry`]: Runs collectors per scrape and merges their output
//!
//! # Example
//!
//! ```rust,no_run
//! use hadoop_exporter::{CollectorRegistry, FieldCatalog, ServiceCollector, ServiceKind};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = FieldCatalog::load("catalog", [ServiceKind::NameNode])?;
//! let url = "http://namenode:9870/jmx".parse()?;
//! let collector = ServiceCollector::http(
//!     "prod",
//!     ServiceKind::NameNode,
//!     &catalog,
//!     url,
//!     Duration::from_secs(10),
//! )?;
//! let mut registry = CollectorRegistry::new();
//! registry.register(collector);
//! # Ok(())
//! # }
//! ```

mod registry;
mod service;
mod traits;

pub use registry::{CollectorInfo, CollectorRegistry, SCRAPE_DURATION, TARGET_UP};
pub use service::ServiceCollector;
pub use traits::{Collection, Collector, CollectorError};
