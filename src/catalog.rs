//! Field catalog.
//!
//! The catalog declares, per service, which submodules are exported and which
//! raw JMX fields each submodule carries, together with their help text. It is
//! read once at startup from a directory of YAML files:
//!
//! ```text
//! catalog/
//!   common.yaml           # JvmMetrics, RpcActivity, UgiMetrics, ...
//!   namenode.yaml
//!   resourcemanager.yaml
//! ```
//!
//! Each file maps submodule names to an ordered mapping of field name to help
//! text. Declaration order is significant: it drives the order in which
//! families are emitted.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::service::ServiceKind;

/// File stem of the shared submodule catalog.
pub const COMMON_CATALOG: &str = "common";

/// Errors raised while loading the catalog. Always fatal at startup.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog directory does not exist or is not a directory.
    #[error("catalog directory '{0}' not found")]
    MissingDirectory(PathBuf),

    /// Catalog file could not be read.
    #[error("failed to read catalog file '{path}': {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Catalog file is not valid YAML of the expected shape.
    #[error("failed to parse catalog file '{path}': {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_yaml::Error,
    },

    /// A submodule was declared without fields.
    #[error("catalog '{catalog}' declares submodule '{submodule}' without fields")]
    EmptySubmodule {
        /// Catalog name (service or `common`).
        catalog: String,
        /// Offending submodule.
        submodule: String,
    },

    /// Service was not loaded into this catalog.
    #[error("no catalog loaded for service '{0}'")]
    UnknownService(ServiceKind),

    /// Submodule is not declared for the service.
    #[error("submodule '{submodule}' is not declared for '{catalog}'")]
    UnknownSubmodule {
        /// Catalog name (service or `common`).
        catalog: String,
        /// Requested submodule.
        submodule: String,
    },
}

/// A raw field as declared in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFieldDescriptor {
    /// Raw JMX attribute name.
    pub name: String,
    /// Help text; empty when the catalog leaves it blank.
    pub help: String,
}

impl RawFieldDescriptor {
    /// Create a descriptor.
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
        }
    }
}

/// On-disk shape: submodule -> field -> optional help.
type CatalogFile = IndexMap<String, IndexMap<String, Option<String>>>;

/// Ordered submodule declarations for one service (or for `common`).
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    name: String,
    submodules: IndexMap<String, Vec<RawFieldDescriptor>>,
}

impl ServiceCatalog {
    /// Build a catalog from in-memory declarations.
    pub fn new(
        name: impl Into<String>,
        submodules: impl IntoIterator<Item = (String, Vec<RawFieldDescriptor>)>,
    ) -> Self {
        Self {
            name: name.into(),
            submodules: submodules.into_iter().collect(),
        }
    }

    /// Parse a YAML catalog document.
    pub fn from_yaml(name: impl Into<String>, content: &str) -> Result<Self, serde_yaml::Error> {
        let file: CatalogFile = serde_yaml::from_str(content)?;
        let submodules = file.into_iter().map(|(submodule, fields)| {
            let fields = fields
                .into_iter()
                .map(|(field, help)| RawFieldDescriptor::new(field, help.unwrap_or_default()))
                .collect();
            (submodule, fields)
        });
        Ok(Self::new(name, submodules))
    }

    /// Load and validate `<dir>/<name>.yaml`.
    fn load(dir: &Path, name: &str) -> Result<Self, CatalogError> {
        let path = dir.join(format!("{name}.yaml"));
        let content = std::fs::read_to_string(&path).map_err(|source| CatalogError::Io {
            path: path.clone(),
            source,
        })?;
        let catalog =
            Self::from_yaml(name, &content).map_err(|source| CatalogError::Parse { path, source })?;
        catalog.validate()?;
        tracing::debug!(
            catalog = %name,
            submodules = catalog.submodules.len(),
            "Loaded field catalog"
        );
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        match self.submodules.iter().find(|(_, fields)| fields.is_empty()) {
            Some((submodule, _)) => Err(CatalogError::EmptySubmodule {
                catalog: self.name.clone(),
                submodule: submodule.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Catalog name (service name or `common`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Submodule names in declaration order.
    pub fn list_submodules(&self) -> Vec<&str> {
        self.submodules.keys().map(String::as_str).collect()
    }

    /// Declared fields of a submodule, in declaration order.
    pub fn load_fields(&self, submodule: &str) -> Result<&[RawFieldDescriptor], CatalogError> {
        self.submodules
            .get(submodule)
            .map(Vec::as_slice)
            .ok_or_else(|| CatalogError::UnknownSubmodule {
                catalog: self.name.clone(),
                submodule: submodule.to_string(),
            })
    }

    /// Iterate submodules with their fields, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RawFieldDescriptor])> {
        self.submodules
            .iter()
            .map(|(name, fields)| (name.as_str(), fields.as_slice()))
    }

    /// Whether the submodule is declared.
    pub fn contains(&self, submodule: &str) -> bool {
        self.submodules.contains_key(submodule)
    }
}

/// Catalog for every configured service plus the shared submodules.
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    common: Arc<ServiceCatalog>,
    services: IndexMap<ServiceKind, Arc<ServiceCatalog>>,
}

impl FieldCatalog {
    /// Load `common.yaml` and one file per requested service from `dir`.
    ///
    /// # Errors
    /// Returns `CatalogError` if any file is missing or malformed; a partial
    /// catalog is never returned.
    pub fn load(
        dir: impl AsRef<Path>,
        services: impl IntoIterator<Item = ServiceKind>,
    ) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(CatalogError::MissingDirectory(dir.to_path_buf()));
        }

        let common = Arc::new(ServiceCatalog::load(dir, COMMON_CATALOG)?);
        let mut loaded = IndexMap::new();
        for service in services {
            if loaded.contains_key(&service) {
                continue;
            }
            let catalog = ServiceCatalog::load(dir, service.as_ref())?;
            loaded.insert(service, Arc::new(catalog));
        }

        tracing::info!(
            path = %dir.display(),
            services = loaded.len(),
            "Field catalog loaded"
        );
        Ok(Self {
            common,
            services: loaded,
        })
    }

    /// Assemble a catalog from already-built parts.
    pub fn from_parts(
        common: ServiceCatalog,
        services: impl IntoIterator<Item = (ServiceKind, ServiceCatalog)>,
    ) -> Self {
        Self {
            common: Arc::new(common),
            services: services
                .into_iter()
                .map(|(kind, catalog)| (kind, Arc::new(catalog)))
                .collect(),
        }
    }

    /// Shared submodule catalog.
    pub fn common(&self) -> Arc<ServiceCatalog> {
        Arc::clone(&self.common)
    }

    /// Catalog for one service.
    pub fn service(&self, service: ServiceKind) -> Result<Arc<ServiceCatalog>, CatalogError> {
        self.services
            .get(&service)
            .cloned()
            .ok_or(CatalogError::UnknownService(service))
    }

    /// Submodules declared for a service, in order.
    pub fn list_submodules(&self, service: ServiceKind) -> Result<Vec<String>, CatalogError> {
        let catalog = self.service(service)?;
        Ok(catalog
            .list_submodules()
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    /// Fields of a service submodule, falling back to the shared catalog.
    pub fn load_fields(
        &self,
        service: ServiceKind,
        submodule: &str,
    ) -> Result<Vec<RawFieldDescriptor>, CatalogError> {
        let catalog = self.service(service)?;
        if catalog.contains(submodule) {
            return catalog.load_fields(submodule).map(<[_]>::to_vec);
        }
        self.common.load_fields(submodule).map(<[_]>::to_vec)
    }
}
