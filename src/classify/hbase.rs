//! HBase rules.

use super::rules::{FieldSource, Matcher, Rule, Selector, SubmoduleRules};

pub fn ruleset(submodule: &str) -> Option<&'static SubmoduleRules> {
    match submodule {
        "IPC" => Some(&IPC),
        _ => None,
    }
}

static IPC: SubmoduleRules = SubmoduleRules {
    selector: Selector::by_name(),
    fields: FieldSource::Catalog,
    rules: &[
        Rule::family(
            Matcher::ContainsAll(&["TotalCallTime", "percentile"]),
            "TotalCallTime",
            "call_time_total",
            "Total call time counts in each quantile",
        )
        .histogram(),
        Rule::fallback("ipc_"),
    ],
};
