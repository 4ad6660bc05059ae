//! Declarative rule vocabulary.
//!
//! A submodule's ruleset is an ordered slice of [`Rule`]s. Classification walks
//! the slice and the first rule whose [`Matcher`] accepts the raw field name
//! decides the family key, exposed name, labels and value transform.

use std::sync::OnceLock;

use regex::Regex;

use crate::bean::Bean;
use crate::metrics::MetricKind;

/// Predicate over a raw field name.
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// Matches every field.
    Any,
    /// Field name equals the marker.
    Exact(&'static str),
    /// Field name contains the marker.
    Contains(&'static str),
    /// Field name contains every marker.
    ContainsAll(&'static [&'static str]),
    /// Field name starts with the marker.
    StartsWith(&'static str),
}

impl Matcher {
    /// Whether `field` satisfies this matcher.
    pub fn matches(&self, field: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(m) => field == *m,
            Self::Contains(m) => field.contains(m),
            Self::ContainsAll(ms) => ms.iter().all(|m| field.contains(m)),
            Self::StartsWith(m) => field.starts_with(m),
        }
    }
}

/// How the family key is derived.
#[derive(Debug, Clone, Copy)]
pub enum KeyRule {
    /// All matching fields collapse into one family.
    Fixed(&'static str),
    /// Each field is its own family.
    Field,
}

/// How the exposed name (without service prefix) is derived.
#[derive(Debug, Clone, Copy)]
pub enum NameRule {
    /// Fixed name.
    Fixed(&'static str),
    /// `prefix + snake(field) + suffix`.
    Snake {
        /// Leading text.
        prefix: &'static str,
        /// Trailing text.
        suffix: &'static str,
    },
    /// `snake(submodule) + "_" + snake(field)`.
    Qualified,
}

/// Source of the family's help text.
#[derive(Debug, Clone, Copy)]
pub enum HelpRule {
    /// Fixed help text.
    Fixed(&'static str),
    /// Help text declared in the catalog for the defining field.
    Catalog,
}

/// Derivation of a label value from the raw field name.
#[derive(Debug, Clone, Copy)]
pub enum Extract {
    /// Text before the first occurrence of the marker (whole name if absent).
    Before(&'static str),
    /// Text after the first occurrence of the marker, up to the next one.
    After(&'static str),
    /// Text before `end`, then after `start` within that.
    Between(&'static str, &'static str),
    /// Field name with the first occurrence of the marker removed.
    Remove(&'static str),
    /// First table entry whose needle occurs in the field name.
    Lookup(&'static [(&'static str, &'static str)]),
    /// Custom extraction.
    With(fn(&str) -> String),
}

impl Extract {
    /// Apply to a raw field name. Missing tokens yield the empty placeholder.
    pub fn apply(&self, field: &str) -> String {
        match self {
            Self::Before(m) => field.split(m).next().unwrap_or_default().to_string(),
            Self::After(m) => field.split(m).nth(1).unwrap_or_default().to_string(),
            Self::Between(start, end) => {
                let head = field.split(end).next().unwrap_or_default();
                match head.split_once(start) {
                    Some((_, rest)) => rest.split(start).next().unwrap_or_default().to_string(),
                    None => head.to_string(),
                }
            }
            Self::Remove(m) => field.replacen(m, "", 1),
            Self::Lookup(table) => table
                .iter()
                .find(|(needle, _)| field.contains(needle))
                .map(|(_, value)| (*value).to_string())
                .unwrap_or_default(),
            Self::With(f) => f(field),
        }
    }
}

/// Where a label value comes from.
#[derive(Debug, Clone, Copy)]
pub enum LabelSource {
    /// Derived from the raw field name.
    Field(Extract),
    /// A `tag.*` attribute of the bean.
    BeanTag(&'static str),
    /// An attribute of a peer record (see [`FieldSource::PeerList`]).
    Peer(&'static str),
}

/// One label after the leading `cluster` label.
#[derive(Debug, Clone, Copy)]
pub struct LabelSpec {
    /// Label name.
    pub name: &'static str,
    /// Value source.
    pub source: LabelSource,
}

impl LabelSpec {
    /// Label derived from the field name.
    pub const fn field(name: &'static str, extract: Extract) -> Self {
        Self {
            name,
            source: LabelSource::Field(extract),
        }
    }

    /// Label read from a bean tag.
    pub const fn tag(name: &'static str, tag: &'static str) -> Self {
        Self {
            name,
            source: LabelSource::BeanTag(tag),
        }
    }

    /// Label read from a peer record.
    pub const fn peer(name: &'static str, attribute: &'static str) -> Self {
        Self {
            name,
            source: LabelSource::Peer(attribute),
        }
    }
}

/// Conversion applied to the raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTransform {
    /// Numeric value as reported.
    Identity,
    /// Remove all whitespace from a string before parsing.
    StripWhitespace,
    /// HA state string read from `tag.HAState`.
    HaState,
    /// Filesystem operational state string.
    FsState,
    /// Node lifecycle state; out-of-domain values are errors.
    NodeState,
    /// Contributes one observation to a histogram sample.
    Observation,
}

impl ValueTransform {
    /// Bean attribute holding the raw value for `field`.
    pub fn source_field<'a>(&self, field: &'a str) -> &'a str {
        match self {
            Self::HaState => "tag.HAState",
            _ => field,
        }
    }
}

/// One classification rule.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Field name predicate.
    pub matcher: Matcher,
    /// Family key derivation.
    pub key: KeyRule,
    /// Exposed name derivation.
    pub name: NameRule,
    /// Help text source.
    pub help: HelpRule,
    /// Labels after `cluster`.
    pub labels: &'static [LabelSpec],
    /// Value conversion.
    pub transform: ValueTransform,
    /// Family kind.
    pub kind: MetricKind,
}

impl Rule {
    /// Gauge rule collapsing matching fields under a fixed key and name.
    pub const fn family(
        matcher: Matcher,
        key: &'static str,
        name: &'static str,
        help: &'static str,
    ) -> Self {
        Self {
            matcher,
            key: KeyRule::Fixed(key),
            name: NameRule::Fixed(name),
            help: HelpRule::Fixed(help),
            labels: &[],
            transform: ValueTransform::Identity,
            kind: MetricKind::Gauge,
        }
    }

    /// Gauge rule giving each matching field its own family named
    /// `prefix + snake(field)`, documented by the catalog.
    pub const fn per_field(matcher: Matcher, prefix: &'static str) -> Self {
        Self {
            matcher,
            key: KeyRule::Field,
            name: NameRule::Snake { prefix, suffix: "" },
            help: HelpRule::Catalog,
            labels: &[],
            transform: ValueTransform::Identity,
            kind: MetricKind::Gauge,
        }
    }

    /// Catch-all rule: `prefix + snake(field)`.
    pub const fn fallback(prefix: &'static str) -> Self {
        Self::per_field(Matcher::Any, prefix)
    }

    /// Per-field family with a fixed exposed name.
    pub const fn named(mut self, name: &'static str) -> Self {
        self.name = NameRule::Fixed(name);
        self
    }

    /// Name the family `snake(submodule)_snake(field)`.
    pub const fn qualified(mut self) -> Self {
        self.name = NameRule::Qualified;
        self
    }

    /// Replace the exposed name suffix of a snake-case rule.
    pub const fn suffixed(mut self, suffix: &'static str) -> Self {
        if let NameRule::Snake { prefix, .. } = self.name {
            self.name = NameRule::Snake { prefix, suffix };
        }
        self
    }

    /// Set the labels after `cluster`.
    pub const fn labels(mut self, labels: &'static [LabelSpec]) -> Self {
        self.labels = labels;
        self
    }

    /// Set the value transform.
    pub const fn transform(mut self, transform: ValueTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Turn the rule into a histogram of observations.
    pub const fn histogram(mut self) -> Self {
        self.kind = MetricKind::Histogram;
        self.transform = ValueTransform::Observation;
        self
    }

    /// Family key for `field`.
    pub fn family_key(&self, field: &str) -> String {
        match self.key {
            KeyRule::Fixed(key) => key.to_string(),
            KeyRule::Field => field.to_string(),
        }
    }

    /// Exposed name for `field`, without the service prefix.
    pub fn exposed_name(&self, submodule: &str, field: &str) -> String {
        match self.name {
            NameRule::Fixed(name) => name.to_string(),
            NameRule::Snake { prefix, suffix } => format!("{prefix}{}{suffix}", snake_case(field)),
            NameRule::Qualified => format!("{}_{}", snake_case(submodule), snake_case(field)),
        }
    }

    /// Help text for the family defined by `field`.
    pub fn help_text(&self, submodule: &str, field: &str, catalog_help: &str) -> String {
        match self.help {
            HelpRule::Fixed(help) => help.to_string(),
            HelpRule::Catalog if !catalog_help.trim().is_empty() => catalog_help.to_string(),
            HelpRule::Catalog => format!("Hadoop {submodule} attribute {field}."),
        }
    }
}

/// Bean selection for a submodule.
///
/// A bean belongs to a submodule when its `name` contains the submodule name
/// and every additional qualifier holds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Selector {
    /// Bean name must not contain this text.
    pub exclude: Option<&'static str>,
    /// Bean name must also contain this text.
    pub qualifier: Option<&'static str>,
    /// Bean tag must equal this value.
    pub tag: Option<(&'static str, &'static str)>,
}

impl Selector {
    /// Select by submodule name only.
    pub const fn by_name() -> Self {
        Self {
            exclude: None,
            qualifier: None,
            tag: None,
        }
    }

    /// Whether `bean` belongs to `submodule`.
    pub fn matches(&self, submodule: &str, bean: &Bean) -> bool {
        let name = bean.name();
        name.contains(submodule)
            && self.exclude.is_none_or(|ex| !name.contains(ex))
            && self.qualifier.is_none_or(|q| name.contains(q))
            && self
                .tag
                .is_none_or(|(tag, value)| bean.tag(tag) == Some(value))
    }
}

/// Where a submodule's raw fields are read from during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// The catalog-declared fields, read from the bean.
    Catalog,
    /// Every capitalised attribute present on the bean.
    Bean,
    /// Catalog-declared fields, read from each record of a serialized
    /// peer list held in the named bean attribute.
    PeerList(&'static str),
}

/// Ruleset of one submodule.
#[derive(Debug, Clone, Copy)]
pub struct SubmoduleRules {
    /// Bean selection.
    pub selector: Selector,
    /// Field source.
    pub fields: FieldSource,
    /// Ordered rules; first match wins.
    pub rules: &'static [Rule],
}

impl SubmoduleRules {
    /// First rule matching `field`, if any.
    pub fn rule_for(&self, field: &str) -> Option<&'static Rule> {
        self.rules.iter().find(|rule| rule.matcher.matches(field))
    }
}

/// Ruleset for submodules without dedicated rules.
pub static GENERIC: SubmoduleRules = SubmoduleRules {
    selector: Selector::by_name(),
    fields: FieldSource::Catalog,
    rules: &[Rule::per_field(Matcher::Any, "").qualified()],
};

/// Convert a camel-case JMX attribute name to a metric-safe snake case name.
///
/// `MemHeapUsedM` becomes `mem_heap_used_m`; characters outside
/// `[a-z0-9_]` become underscores.
pub fn snake_case(name: &str) -> String {
    static CAMEL_BOUNDARY: OnceLock<Regex> = OnceLock::new();

    let regex = CAMEL_BOUNDARY
        .get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").expect("failed to compile camel regex"));

    regex
        .replace_all(name, "${1}_${2}")
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
