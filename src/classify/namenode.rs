//! NameNode rules.

use super::rules::{
    Extract, FieldSource, LabelSpec, Matcher, Rule, Selector, SubmoduleRules, ValueTransform,
};

pub fn ruleset(submodule: &str) -> Option<&'static SubmoduleRules> {
    match submodule {
        "NameNodeActivity" => Some(&NAMENODE_ACTIVITY),
        "StartupProgress" => Some(&STARTUP_PROGRESS),
        "FSNamesystem" => Some(&FS_NAMESYSTEM),
        "FSNamesystemState" => Some(&FS_NAMESYSTEM_STATE),
        "RetryCache" => Some(&RETRY_CACHE),
        _ => None,
    }
}

static NAMENODE_ACTIVITY: SubmoduleRules = SubmoduleRules {
    selector: Selector::by_name(),
    fields: FieldSource::Catalog,
    rules: &[
        Rule::family(
            Matcher::Contains("NumOps"),
            "MethodNumOps",
            "nnactivity_method_ops_total",
            "Total number of the times the method is called.",
        )
        .labels(&[LabelSpec::field("method", Extract::Before("NumOps"))]),
        Rule::family(
            Matcher::Contains("AvgTime"),
            "MethodAvgTime",
            "nnactivity_method_avg_time_milliseconds",
            "Average turn around time of the method in milliseconds.",
        )
        .labels(&[LabelSpec::field("method", Extract::Before("AvgTime"))]),
        Rule::family(
            Matcher::Any,
            "Operations",
            "nnactivity_operations_total",
            "Total number of each operation.",
        )
        .labels(&[LabelSpec::field("method", Extract::Before("Ops"))]),
    ],
};

static STARTUP_PROGRESS: SubmoduleRules = SubmoduleRules {
    selector: Selector::by_name(),
    fields: FieldSource::Catalog,
    rules: &[
        Rule::family(
            Matcher::Exact("ElapsedTime"),
            "ElapsedTime",
            "startup_process_total_elapsed_time_milliseconds",
            "Total elapsed time in milliseconds.",
        ),
        Rule::family(
            Matcher::Exact("PercentComplete"),
            "PercentComplete",
            "startup_process_complete_rate",
            "Current rate completed in NameNode startup progress (The max value is not 100 but 1.0).",
        ),
        Rule::family(
            Matcher::Contains("Count"),
            "PhaseCount",
            "startup_process_phase_count",
            "Total number of steps completed in the phase.",
        )
        .labels(&[LabelSpec::field("phase", Extract::Before("Count"))]),
        Rule::family(
            Matcher::Contains("ElapsedTime"),
            "PhaseElapsedTime",
            "startup_process_phase_elapsed_time_milliseconds",
            "Total elapsed time in the phase in milliseconds.",
        )
        .labels(&[LabelSpec::field("phase", Extract::Before("ElapsedTime"))]),
        Rule::family(
            Matcher::Contains("Total"),
            "PhaseTotal",
            "startup_process_phase_total",
            "Total number of steps in the phase.",
        )
        .labels(&[LabelSpec::field("phase", Extract::Before("Total"))]),
        Rule::family(
            Matcher::Contains("PercentComplete"),
            "PhasePercentComplete",
            "startup_process_phase_complete_rate",
            "Current rate completed in the phase (The max value is not 100 but 1.0).",
        )
        .labels(&[LabelSpec::field("phase", Extract::Before("PercentComplete"))]),
        Rule::fallback("startup_process_"),
    ],
};

static FS_NAMESYSTEM: SubmoduleRules = SubmoduleRules {
    selector: Selector {
        exclude: Some("FSNamesystemState"),
        qualifier: None,
        tag: None,
    },
    fields: FieldSource::Catalog,
    rules: &[
        Rule::family(
            Matcher::Contains("HAState"),
            "HAState",
            "fsname_system_ha_state",
            "Current state of the NameNode: 0.0 (for initializing) or 1.0 (for active) or 2.0 (for standby) or 3.0 (for stopping) state",
        )
        .transform(ValueTransform::HaState),
        Rule::family(
            Matcher::StartsWith("Capacity"),
            "capacity",
            "fsname_system_capacity_bytes",
            "Current DataNodes capacity in each mode in bytes",
        )
        .labels(&[LabelSpec::field("mode", Extract::After("Capacity"))]),
        Rule::fallback("fsname_system_"),
    ],
};

static FS_NAMESYSTEM_STATE: SubmoduleRules = SubmoduleRules {
    selector: Selector::by_name(),
    fields: FieldSource::Catalog,
    rules: &[
        Rule::family(
            Matcher::Contains("FSState"),
            "FSState",
            "fsname_system_fs_state",
            "Current state of the file system: 0 (for Safemode) or 1(Operational)",
        )
        .transform(ValueTransform::FsState),
        Rule::per_field(Matcher::Contains("TotalSyncTimes"), "")
            .named("fsname_system_total_sync_times")
            .transform(ValueTransform::StripWhitespace),
        Rule::family(
            Matcher::Contains("DataNodes"),
            "datanodes_num",
            "fsname_system_datanodes_count",
            "Number of datanodes in each state",
        )
        .labels(&[LabelSpec::field("state", Extract::Between("Num", "DataNodes"))]),
        Rule::fallback("fsname_system_"),
    ],
};

static RETRY_CACHE: SubmoduleRules = SubmoduleRules {
    selector: Selector::by_name(),
    fields: FieldSource::Catalog,
    rules: &[Rule::family(
        Matcher::Any,
        "cache",
        "cache_total",
        "Total number of RetryCache in each mode",
    )
    .labels(&[LabelSpec::field("mode", Extract::After("Cache"))])],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_progress_exact_before_phase() {
        let rule = STARTUP_PROGRESS.rule_for("ElapsedTime").unwrap();
        assert_eq!(rule.family_key("ElapsedTime"), "ElapsedTime");
        assert!(rule.labels.is_empty());

        let rule = STARTUP_PROGRESS.rule_for("LoadingEditsElapsedTime").unwrap();
        assert_eq!(rule.family_key(""), "PhaseElapsedTime");
        assert_eq!(rule.labels[0].name, "phase");

        let rule = STARTUP_PROGRESS.rule_for("SavingCheckpointPercentComplete").unwrap();
        assert_eq!(rule.family_key(""), "PhasePercentComplete");
    }

    #[test]
    fn test_fs_namesystem_rules() {
        let rule = FS_NAMESYSTEM.rule_for("tag.HAState").unwrap();
        assert_eq!(rule.transform, ValueTransform::HaState);

        let rule = FS_NAMESYSTEM.rule_for("CapacityRemaining").unwrap();
        assert_eq!(rule.exposed_name("FSNamesystem", ""), "fsname_system_capacity_bytes");

        let rule = FS_NAMESYSTEM.rule_for("BlocksTotal").unwrap();
        assert_eq!(
            rule.exposed_name("FSNamesystem", "BlocksTotal"),
            "fsname_system_blocks_total"
        );
        assert_eq!(FS_NAMESYSTEM.selector.exclude, Some("FSNamesystemState"));
    }

    #[test]
    fn test_fs_namesystem_state_rules() {
        let rule = FS_NAMESYSTEM_STATE.rule_for("NumLiveDataNodes").unwrap();
        assert_eq!(rule.family_key("NumLiveDataNodes"), "datanodes_num");

        let rule = FS_NAMESYSTEM_STATE.rule_for("TotalSyncTimes").unwrap();
        assert_eq!(rule.transform, ValueTransform::StripWhitespace);
        assert_eq!(
            rule.exposed_name("FSNamesystemState", "TotalSyncTimes"),
            "fsname_system_total_sync_times"
        );
    }

    #[test]
    fn test_activity_operations() {
        let rule = NAMENODE_ACTIVITY.rule_for("CreateFileOps").unwrap();
        assert_eq!(rule.family_key("CreateFileOps"), "Operations");
        assert_eq!(
            Extract::Before("Ops").apply("CreateFileOps"),
            "CreateFile"
        );
        assert!(ruleset("RetryCache").is_some());
        assert!(ruleset("JvmMetrics").is_none());
    }
}
