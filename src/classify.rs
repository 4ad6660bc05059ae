//! Field classification and schema construction.
//!
//! Every raw field declared in the catalog is classified by the first matching
//! rule of its submodule's ruleset. Classification yields a family key;
//! fields sharing a key are aggregated into one [`FamilySchema`]. Schemas are
//! built once at startup and reused by every scrape.

mod common;
mod hbase;
mod namenode;
mod resourcemanager;
pub mod rules;

use std::fmt;

use indexmap::IndexMap;

use crate::bean::Bean;
use crate::catalog::{RawFieldDescriptor, ServiceCatalog};
use crate::metrics::{CLUSTER_LABEL, MetricFamily, MetricKind};
use crate::service::ServiceKind;

pub use resourcemanager::LIVE_NODE_MANAGERS;
pub use rules::{
    Extract, FieldSource, LabelSource, LabelSpec, Matcher, Rule, Selector, SubmoduleRules,
    ValueTransform, snake_case,
};

/// Ruleset used for `submodule` of `service`.
///
/// Service-specific rules take precedence over the common rules; submodules
/// with neither get the generic per-field ruleset.
pub fn ruleset(service: ServiceKind, submodule: &str) -> &'static SubmoduleRules {
    let specific = match service {
        ServiceKind::NameNode => namenode::ruleset(submodule),
        ServiceKind::ResourceManager => resourcemanager::ruleset(submodule),
        ServiceKind::HBase => hbase::ruleset(submodule),
        _ => None,
    };
    specific
        .or_else(|| common::ruleset(submodule))
        .unwrap_or(&rules::GENERIC)
}

// ============================================================================
// Schema types
// ============================================================================

/// Identity of a family within a service: the submodule plus the
/// classification key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FamilyKey {
    /// Submodule name.
    pub submodule: String,
    /// Classification key within the submodule.
    pub key: String,
}

impl FamilyKey {
    pub fn new(submodule: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            submodule: submodule.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for FamilyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.submodule, self.key)
    }
}

/// Shape of one exposed family.
#[derive(Debug, Clone)]
pub struct FamilySchema {
    /// Family identity.
    pub key: FamilyKey,
    /// Fully qualified exposed name.
    pub name: String,
    /// Help text.
    pub help: String,
    /// Labels after `cluster`.
    pub labels: &'static [LabelSpec],
    /// Family kind.
    pub kind: MetricKind,
}

impl FamilySchema {
    /// Label names, `cluster` first.
    pub fn label_names(&self) -> Vec<String> {
        std::iter::once(CLUSTER_LABEL)
            .chain(self.labels.iter().map(|l| l.name))
            .map(str::to_string)
            .collect()
    }

    /// Empty family with this schema's shape.
    pub fn new_family(&self) -> MetricFamily {
        MetricFamily::new(&self.name, &self.help, self.label_names(), self.kind)
    }

    /// Label values derived from the raw field name, in label order.
    pub fn field_label_values(&self, field: &str) -> Vec<String> {
        self.labels
            .iter()
            .filter_map(|spec| match spec.source {
                LabelSource::Field(extract) => Some(extract.apply(field)),
                _ => None,
            })
            .collect()
    }

    /// Complete label values for one sample.
    ///
    /// `field_labels` are the precomputed values from
    /// [`field_label_values`](Self::field_label_values); tag and peer labels
    /// are read from `bean` and `peer`. Missing values become empty strings.
    pub fn sample_labels(
        &self,
        cluster: &str,
        field_labels: &[String],
        bean: &Bean,
        peer: Option<&serde_json::Map<String, serde_json::Value>>,
    ) -> Vec<String> {
        let mut field_labels = field_labels.iter();
        let mut values = Vec::with_capacity(self.labels.len() + 1);
        values.push(cluster.to_string());
        for spec in self.labels {
            let value = match spec.source {
                LabelSource::Field(_) => field_labels.next().cloned(),
                LabelSource::BeanTag(tag) => bean.tag(tag).map(str::to_string),
                LabelSource::Peer(attr) => peer.and_then(|p| p.get(attr)).map(label_text),
            };
            values.push(value.unwrap_or_default());
        }
        values
    }
}

fn label_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A catalog field bound to its family.
#[derive(Debug, Clone)]
pub struct FieldBinding {
    /// Raw field name.
    pub field: String,
    /// Classification key of the target family.
    pub key: String,
    /// Precomputed field-derived label values.
    pub field_labels: Vec<String>,
    /// Value transform of the classifying rule.
    pub transform: ValueTransform,
}

/// Families and bindings of one submodule.
#[derive(Debug, Clone)]
pub struct SubmoduleSchema {
    name: String,
    rules: &'static SubmoduleRules,
    families: IndexMap<String, FamilySchema>,
    bindings: Vec<FieldBinding>,
}

impl SubmoduleSchema {
    /// Submodule name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ruleset the schema was built with.
    pub fn rules(&self) -> &'static SubmoduleRules {
        self.rules
    }

    /// Families keyed by classification key, in first-seen order.
    pub fn families(&self) -> &IndexMap<String, FamilySchema> {
        &self.families
    }

    /// Field bindings in catalog order.
    pub fn bindings(&self) -> &[FieldBinding] {
        &self.bindings
    }

    /// Whether `bean` belongs to this submodule.
    pub fn selects(&self, bean: &Bean) -> bool {
        self.rules.selector.matches(&self.name, bean)
    }

    /// Add families from `other` whose keys are not already present, together
    /// with the bindings that feed them.
    fn absorb(&mut self, other: SubmoduleSchema) {
        let SubmoduleSchema {
            families, bindings, ..
        } = other;
        let mut added = Vec::new();
        for (key, family) in families {
            if !self.families.contains_key(&key) {
                added.push(key.clone());
                self.families.insert(key, family);
            }
        }
        self.bindings
            .extend(bindings.into_iter().filter(|b| added.contains(&b.key)));
    }
}

/// Build the schema of one submodule from its declared fields.
///
/// The first field classified under a key defines the family's name and help;
/// later fields only add bindings. Fields no rule accepts are ignored.
pub fn build_schema(
    service: ServiceKind,
    submodule: &str,
    fields: &[RawFieldDescriptor],
) -> SubmoduleSchema {
    build_with(ruleset(service, submodule), service, submodule, fields)
}

fn build_with(
    rules: &'static SubmoduleRules,
    service: ServiceKind,
    submodule: &str,
    fields: &[RawFieldDescriptor],
) -> SubmoduleSchema {
    let prefix = service.metric_prefix();
    let mut families: IndexMap<String, FamilySchema> = IndexMap::new();
    let mut bindings = Vec::with_capacity(fields.len());

    for field in fields {
        let Some(rule) = rules.rule_for(&field.name) else {
            tracing::trace!(%service, submodule, field = %field.name, "Field matches no rule");
            continue;
        };
        let key = rule.family_key(&field.name);
        let family = families.entry(key.clone()).or_insert_with(|| FamilySchema {
            key: FamilyKey::new(submodule, key.as_str()),
            name: format!("{prefix}{}", rule.exposed_name(submodule, &field.name)),
            help: rule.help_text(submodule, &field.name, &field.help),
            labels: rule.labels,
            kind: rule.kind,
        });
        bindings.push(FieldBinding {
            field: field.name.clone(),
            field_labels: family.field_label_values(&field.name),
            key,
            transform: rule.transform,
        });
    }

    SubmoduleSchema {
        name: submodule.to_string(),
        rules,
        families,
        bindings,
    }
}

/// All submodule schemas of one service.
#[derive(Debug, Clone)]
pub struct ServiceSchema {
    service: ServiceKind,
    submodules: Vec<SubmoduleSchema>,
}

impl ServiceSchema {
    /// Build from the service catalog merged with the common catalog.
    ///
    /// Common submodules use the common rules. Where both catalogs declare the
    /// same submodule, the service's families win and common families only
    /// fill in keys the service lacks.
    pub fn build(service: ServiceKind, catalog: &ServiceCatalog, common: &ServiceCatalog) -> Self {
        let mut submodules: Vec<SubmoduleSchema> = catalog
            .iter()
            .map(|(name, fields)| build_schema(service, name, fields))
            .collect();

        for (name, fields) in common.iter() {
            let rules = common::ruleset(name).unwrap_or(&rules::GENERIC);
            let schema = build_with(rules, service, name, fields);
            match submodules.iter_mut().find(|s| s.name == *name) {
                Some(existing) => existing.absorb(schema),
                None => submodules.push(schema),
            }
        }

        let schema = Self {
            service,
            submodules,
        };
        tracing::debug!(
            %service,
            submodules = schema.submodules.len(),
            families = schema.family_count(),
            "Built service schema"
        );
        schema
    }

    /// Service the schema belongs to.
    pub fn service(&self) -> ServiceKind {
        self.service
    }

    /// Submodule schemas in declaration order.
    pub fn submodules(&self) -> &[SubmoduleSchema] {
        &self.submodules
    }

    /// All families in emission order.
    pub fn families(&self) -> impl Iterator<Item = &FamilySchema> {
        self.submodules.iter().flat_map(|s| s.families.values())
    }

    /// Number of families.
    pub fn family_count(&self) -> usize {
        self.submodules.iter().map(|s| s.families.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(names: &[&str]) -> Vec<RawFieldDescriptor> {
        names
            .iter()
            .map(|n| RawFieldDescriptor::new(*n, format!("{n} help")))
            .collect()
    }

    #[test]
    fn test_first_field_defines_family() {
        let schema = build_schema(
            ServiceKind::NameNode,
            "JvmMetrics",
            &fields(&["MemNonHeapUsedM", "MemHeapUsedM", "GcCountParNew"]),
        );

        assert_eq!(schema.families().len(), 2);
        let used = &schema.families()["jvm_mem_used_mebibytes"];
        assert_eq!(used.name, "hadoop_namenode_jvm_mem_used_mebibytes");
        assert_eq!(used.label_names(), vec!["cluster", "mode"]);
        assert_eq!(used.key, FamilyKey::new("JvmMetrics", "jvm_mem_used_mebibytes"));

        assert_eq!(schema.bindings().len(), 3);
        assert_eq!(schema.bindings()[0].field_labels, vec!["nonheap"]);
        assert_eq!(schema.bindings()[1].field_labels, vec!["heap"]);
        assert_eq!(schema.bindings()[2].field_labels, vec!["ParNew"]);
    }

    #[test]
    fn test_catalog_help_is_used_for_per_field_families() {
        let schema = build_schema(
            ServiceKind::DataNode,
            "DataNodeActivity",
            &fields(&["BytesWritten"]),
        );
        let family = &schema.families()["BytesWritten"];
        assert_eq!(family.name, "hadoop_datanode_data_node_activity_bytes_written");
        assert_eq!(family.help, "BytesWritten help");
        assert_eq!(family.kind, MetricKind::Gauge);
    }

    #[test]
    fn test_service_rules_take_precedence() {
        assert!(std::ptr::eq(
            ruleset(ServiceKind::NameNode, "JvmMetrics"),
            ruleset(ServiceKind::DataNode, "JvmMetrics")
        ));
        assert!(std::ptr::eq(
            ruleset(ServiceKind::DataNode, "FSNamesystem"),
            &rules::GENERIC
        ));
        assert!(!std::ptr::eq(
            ruleset(ServiceKind::NameNode, "FSNamesystem"),
            &rules::GENERIC
        ));
    }

    #[test]
    fn test_service_schema_merges_common() {
        let catalog = ServiceCatalog::from_yaml(
            "namenode",
            "JvmMetrics:\n  MemHeapUsedM: heap used\nRetryCache:\n  CacheHit: hits\n",
        )
        .unwrap();
        let common = ServiceCatalog::from_yaml(
            "common",
            "JvmMetrics:\n  MemHeapUsedM: common\n  ThreadsNew: new threads\nUgiMetrics:\n  GetGroupsNumOps: groups\n",
        )
        .unwrap();

        let schema = ServiceSchema::build(ServiceKind::NameNode, &catalog, &common);
        let names: Vec<&str> = schema.submodules().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["JvmMetrics", "RetryCache", "UgiMetrics"]);

        let jvm = &schema.submodules()[0];
        assert_eq!(jvm.families().len(), 2);
        assert_eq!(jvm.bindings().len(), 2);
        assert!(jvm.families().contains_key("jvm_threads_state_total"));
        assert_eq!(schema.family_count(), 4);
    }

    #[test]
    fn test_sample_labels_fill_placeholders() {
        let schema = build_schema(
            ServiceKind::NameNode,
            "RpcActivity",
            &fields(&["RpcQueueTimeNumOps"]),
        );
        let family = &schema.families()["MethodNumOps"];
        let bean = Bean::from(json!({"name": "Hadoop:service=NameNode,name=RpcActivityForPort8020"}));

        let labels = family.sample_labels("c1", &schema.bindings()[0].field_labels, &bean, None);
        assert_eq!(labels, vec!["c1", "", "RpcQueueTime"]);
    }

    #[test]
    fn test_peer_labels() {
        let schema = build_schema(ServiceKind::ResourceManager, "RMNMInfo", &fields(&["NumContainers"]));
        let family = &schema.families()["NumContainers"];
        let peer = json!({"HostName": "nm1", "Rack": "/default", "NumContainers": 3});
        let labels = family.sample_labels("c1", &[], &Bean::default(), peer.as_object());
        assert_eq!(labels, vec!["c1", "nm1", "", "/default"]);
    }
}
