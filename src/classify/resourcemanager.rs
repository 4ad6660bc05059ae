//! ResourceManager rules.

use super::rules::{
    Extract, FieldSource, LabelSpec, Matcher, Rule, Selector, SubmoduleRules, ValueTransform,
};

/// Bean attribute holding the serialized list of live NodeManagers.
pub const LIVE_NODE_MANAGERS: &str = "LiveNodeManagers";

pub fn ruleset(submodule: &str) -> Option<&'static SubmoduleRules> {
    match submodule {
        "RMNMInfo" => Some(&RM_NM_INFO),
        "QueueMetrics" => Some(&QUEUE_METRICS),
        "ClusterMetrics" => Some(&CLUSTER_METRICS),
        _ => None,
    }
}

const NODE_LABELS: &[LabelSpec] = &[
    LabelSpec::peer("host", "HostName"),
    LabelSpec::peer("version", "NodeManagerVersion"),
    LabelSpec::peer("rack", "Rack"),
];

static RM_NM_INFO: SubmoduleRules = SubmoduleRules {
    selector: Selector::by_name(),
    fields: FieldSource::PeerList(LIVE_NODE_MANAGERS),
    rules: &[
        Rule::per_field(Matcher::Contains("NumContainers"), "")
            .named("node_containers_total")
            .labels(NODE_LABELS),
        Rule::per_field(Matcher::Contains("State"), "")
            .named("node_state")
            .labels(NODE_LABELS)
            .transform(ValueTransform::NodeState),
        Rule::per_field(Matcher::Contains("UsedMemoryMB"), "")
            .named("node_memory_used_mebibytes")
            .labels(NODE_LABELS),
        Rule::per_field(Matcher::Contains("AvailableMemoryMB"), "")
            .named("node_memory_available_mebibytes")
            .labels(NODE_LABELS),
        Rule::per_field(Matcher::Contains("UsedVirtualCores"), "")
            .named("node_virtual_cores_used")
            .labels(NODE_LABELS),
        Rule::per_field(Matcher::Contains("AvailableVirtualCores"), "")
            .named("node_virtual_cores_available")
            .labels(NODE_LABELS),
        Rule::fallback("node_").labels(NODE_LABELS),
    ],
};

const RUNNING_APP_BUCKETS: &[(&str, &str)] = &[
    ("running_0", "0to60"),
    ("running_60", "60to300"),
    ("running_300", "300to1440"),
    ("running_1440", "1440up"),
];

static QUEUE_METRICS: SubmoduleRules = SubmoduleRules {
    selector: Selector {
        exclude: None,
        qualifier: None,
        tag: Some(("tag.Queue", "root")),
    },
    fields: FieldSource::Catalog,
    rules: &[
        Rule::family(
            Matcher::Contains("running_"),
            "running_app",
            "running_app_total",
            "Current number of running applications in each elapsed time ( < 60min, 60min < x < 300min, 300min < x < 1440min and x > 1440min )",
        )
        .labels(&[LabelSpec::field(
            "elapsed_time",
            Extract::Lookup(RUNNING_APP_BUCKETS),
        )]),
        Rule::fallback(""),
    ],
};

static CLUSTER_METRICS: SubmoduleRules = SubmoduleRules {
    selector: Selector::by_name(),
    fields: FieldSource::Catalog,
    rules: &[
        Rule::family(
            Matcher::Contains("NMs"),
            "NMs",
            "nodemanager_total",
            "Current number of NodeManagers in each status.",
        )
        .labels(&[LabelSpec::field("status", Extract::Between("Num", "NMs"))]),
        Rule::family(
            Matcher::Contains("NumOps"),
            "NumOps",
            "ams_total",
            "Total number of Applications Masters in each operation.",
        )
        .labels(&[LabelSpec::field("oper", Extract::Between("AM", "DelayNumOps"))]),
        Rule::family(
            Matcher::Contains("AvgTime"),
            "AvgTime",
            "average_time_milliseconds",
            "Average time in milliseconds AM spends in each operation.",
        )
        .labels(&[LabelSpec::field("oper", Extract::Between("AM", "DelayAvgTime"))]),
        Rule::fallback("cluster_"),
    ],
};
