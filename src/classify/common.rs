//! Rules for submodules shared by every Hadoop daemon.

use super::rules::{
    Extract, FieldSource, LabelSpec, Matcher, Rule, Selector, SubmoduleRules,
};

/// Ruleset for a common submodule, if it has dedicated rules.
pub fn ruleset(submodule: &str) -> Option<&'static SubmoduleRules> {
    match submodule {
        "JvmMetrics" => Some(&JVM_METRICS),
        "RpcActivity" => Some(&RPC_ACTIVITY),
        "RpcDetailedActivity" => Some(&RPC_DETAILED_ACTIVITY),
        "UgiMetrics" => Some(&UGI_METRICS),
        "MetricsSystem" => Some(&METRICS_SYSTEM),
        _ => None,
    }
}

// ============================================================================
// JvmMetrics
// ============================================================================

const MEM_MODE: &[LabelSpec] = &[LabelSpec::field("mode", Extract::With(jvm_mem_mode))];

static JVM_METRICS: SubmoduleRules = SubmoduleRules {
    selector: Selector::by_name(),
    fields: FieldSource::Catalog,
    rules: &[
        Rule::family(
            Matcher::ContainsAll(&["Mem", "Used"]),
            "jvm_mem_used_mebibytes",
            "jvm_mem_used_mebibytes",
            "Current memory used in mebibytes.",
        )
        .labels(MEM_MODE),
        Rule::family(
            Matcher::ContainsAll(&["Mem", "Committed"]),
            "jvm_mem_committed_mebibytes",
            "jvm_mem_committed_mebibytes",
            "Current memory committed in mebibytes.",
        )
        .labels(MEM_MODE),
        Rule::family(
            Matcher::ContainsAll(&["Mem", "Max"]),
            "jvm_mem_max_size_mebibytes",
            "jvm_mem_max_size_mebibytes",
            "Current max memory size in mebibytes.",
        )
        .labels(MEM_MODE),
        Rule::per_field(Matcher::Contains("Mem"), "jvm_")
            .suffixed("ebibytes")
            .labels(MEM_MODE),
        Rule::family(
            Matcher::Contains("GcCount"),
            "jvm_gc_count",
            "jvm_gc_count",
            "GC count of each type GC.",
        )
        .labels(&[LabelSpec::field("type", Extract::Remove("GcCount"))]),
        Rule::family(
            Matcher::Contains("GcTimeMillis"),
            "jvm_gc_time_milliseconds",
            "jvm_gc_time_milliseconds",
            "Each type GC time in milliseconds.",
        )
        .labels(&[LabelSpec::field("type", Extract::Remove("GcTimeMillis"))]),
        Rule::family(
            Matcher::Contains("ThresholdExceeded"),
            "jvm_gc_exceeded_threshold_total",
            "jvm_gc_exceeded_threshold_total",
            "Number of times that the GC threshold is exceeded.",
        )
        .labels(&[LabelSpec::field(
            "type",
            Extract::Between("GcNum", "ThresholdExceeded"),
        )]),
        Rule::family(
            Matcher::Contains("Threads"),
            "jvm_threads_state_total",
            "jvm_threads_state_total",
            "Current number of different threads.",
        )
        .labels(&[LabelSpec::field("state", Extract::After("Threads"))]),
        Rule::family(
            Matcher::Contains("Log"),
            "jvm_log_level_total",
            "jvm_log_level_total",
            "Total number of each level logs.",
        )
        .labels(&[LabelSpec::field("level", Extract::After("Log"))]),
        Rule::fallback("jvm_"),
    ],
};

/// Memory area of a `Mem*` attribute: `nonheap`, `heap`, `max` or empty.
fn jvm_mem_mode(field: &str) -> String {
    if field.contains("NonHeap") {
        "nonheap"
    } else if field.contains("MemHeap") {
        "heap"
    } else if field.contains("Max") {
        "max"
    } else {
        ""
    }
    .to_string()
}

// ============================================================================
// RPC
// ============================================================================

const RPC_PORT: LabelSpec = LabelSpec::tag("tag", "tag.port");

static RPC_ACTIVITY: SubmoduleRules = SubmoduleRules {
    selector: Selector::by_name(),
    fields: FieldSource::Catalog,
    rules: &[
        Rule::family(
            Matcher::Contains("NumOps"),
            "MethodNumOps",
            "rpc_method_called_total",
            "Total number of the times the method is called.",
        )
        .labels(&[RPC_PORT, LabelSpec::field("method", Extract::Before("NumOps"))]),
        Rule::family(
            Matcher::Contains("AvgTime"),
            "MethodAvgTime",
            "rpc_method_avg_time_milliseconds",
            "Average turn around time of the method in milliseconds.",
        )
        .labels(&[RPC_PORT, LabelSpec::field("method", Extract::Before("AvgTime"))]),
        Rule::fallback("rpc_").labels(&[RPC_PORT]),
    ],
};

/// Per-method RPC counters. Fields are discovered on the bean at scrape time.
static RPC_DETAILED_ACTIVITY: SubmoduleRules = SubmoduleRules {
    selector: Selector::by_name(),
    fields: FieldSource::Bean,
    rules: &[
        Rule::family(
            Matcher::Contains("NumOps"),
            "NumOps",
            "rpc_detailed_method_called_total",
            "Total number of the times the method is called.",
        )
        .labels(&[RPC_PORT, LabelSpec::field("method", Extract::Before("NumOps"))]),
        Rule::family(
            Matcher::Contains("AvgTime"),
            "AvgTime",
            "rpc_detailed_method_avg_time_milliseconds",
            "Average turn around time of the method in milliseconds.",
        )
        .labels(&[RPC_PORT, LabelSpec::field("method", Extract::Before("AvgTime"))]),
    ],
};

// ============================================================================
// UgiMetrics
// ============================================================================

const UGI_LABELS: &[LabelSpec] = &[
    LabelSpec::field("method", Extract::With(ugi_method)),
    LabelSpec::field("state", Extract::With(ugi_state)),
];

static UGI_METRICS: SubmoduleRules = SubmoduleRules {
    selector: Selector::by_name(),
    fields: FieldSource::Catalog,
    rules: &[
        Rule::family(
            Matcher::Contains("NumOps"),
            "NumOps",
            "ugi_method_called_total",
            "Total number of the times the method is called.",
        )
        .labels(UGI_LABELS),
        Rule::family(
            Matcher::Contains("AvgTime"),
            "AvgTime",
            "ugi_method_avg_time_milliseconds",
            "Average turn around time of the method in milliseconds.",
        )
        .labels(UGI_LABELS),
        Rule::fallback("ugi_"),
    ],
};

fn ugi_operation(field: &str) -> &str {
    ["NumOps", "AvgTime"]
        .iter()
        .find_map(|marker| field.split_once(marker).map(|(head, _)| head))
        .unwrap_or(field)
}

/// `Login` for login operations, the operation name otherwise.
fn ugi_method(field: &str) -> String {
    if field.contains("Login") {
        "Login".to_string()
    } else {
        ugi_operation(field).to_string()
    }
}

/// Login outcome (`Success`, `Failure`); empty for other operations.
fn ugi_state(field: &str) -> String {
    ugi_operation(field)
        .split_once("Login")
        .map(|(_, state)| state.to_string())
        .unwrap_or_default()
}

// ============================================================================
// MetricsSystem
// ============================================================================

static METRICS_SYSTEM: SubmoduleRules = SubmoduleRules {
    selector: Selector {
        exclude: None,
        qualifier: Some("sub=Stats"),
        tag: None,
    },
    fields: FieldSource::Catalog,
    rules: &[
        Rule::family(
            Matcher::Contains("NumOps"),
            "NumOps",
            "metrics_operations_total",
            "Total number of operations.",
        )
        .labels(&[LabelSpec::field("oper", Extract::Before("NumOps"))]),
        Rule::family(
            Matcher::Contains("AvgTime"),
            "AvgTime",
            "metrics_method_avg_time_milliseconds",
            "Average turn around time of the operations in milliseconds.",
        )
        .labels(&[LabelSpec::field("oper", Extract::Before("AvgTime"))]),
        Rule::fallback("metrics_"),
    ],
};
