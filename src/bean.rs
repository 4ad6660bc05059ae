//! JMX bean records as returned by a Hadoop `/jmx` endpoint.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Attribute holding the bean's object name.
pub const NAME_ATTRIBUTE: &str = "name";

/// One JMX bean: a flat attribute map with a `name` and `tag.*` attributes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Bean(Map<String, Value>);

impl Bean {
    /// Wrap an attribute map.
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self(attributes)
    }

    /// Object name, e.g. `Hadoop:service=NameNode,name=JvmMetrics`.
    /// Beans without a name yield an empty string and match no submodule.
    pub fn name(&self) -> &str {
        self.0
            .get(NAME_ATTRIBUTE)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Raw attribute value.
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.0.get(attribute)
    }

    /// Tag attribute rendered as text.
    pub fn tag(&self, tag: &str) -> Option<&str> {
        self.0.get(tag).and_then(Value::as_str)
    }

    /// All attributes in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<Value> for Bean {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bean_accessors() {
        let bean = Bean::from(json!({
            "name": "Hadoop:service=NameNode,name=RpcActivityForPort8020",
            "tag.port": "8020",
            "NumOpenConnections": 4
        }));

        assert_eq!(bean.name(), "Hadoop:service=NameNode,name=RpcActivityForPort8020");
        assert_eq!(bean.tag("tag.port"), Some("8020"));
        assert_eq!(bean.get("NumOpenConnections"), Some(&json!(4)));
        assert_eq!(bean.attributes().count(), 3);
    }

    #[test]
    fn test_bean_without_name() {
        let bean = Bean::from(json!({"modelerType": "x"}));
        assert_eq!(bean.name(), "");
        assert_eq!(Bean::from(json!([1, 2])).attributes().count(), 0);
    }
}
