//! Monitored Hadoop service kinds.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A Hadoop daemon exposing a `/jmx` endpoint.
///
/// The lowercase form is used for catalog file names, config values and the
/// exposed metric prefix (`hadoop_<service>_`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ServiceKind {
    /// HDFS metadata server.
    NameNode,
    /// HDFS block storage node.
    DataNode,
    /// HDFS shared edits journal.
    JournalNode,
    /// YARN resource scheduler.
    ResourceManager,
    /// YARN per-host agent.
    NodeManager,
    /// MapReduce job history server.
    MapReduce,
    /// HBase master.
    HBase,
}

impl ServiceKind {
    /// Prefix for every family exposed by this service.
    pub fn metric_prefix(&self) -> String {
        format!("hadoop_{}_", self.as_ref())
    }
}
