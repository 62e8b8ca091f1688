//! Generic configuration tree
//!
//! Deployment values arrive as loosely-typed YAML or JSON documents. This module
//! models them as a closed sum type so every consumer matches exhaustively
//! instead of guessing at runtime types. [`Path`] addresses a location inside a
//! tree and the [`accessor`] functions read and write through it.

pub mod accessor;
pub mod path;

pub use accessor::{get, set};
pub use path::{Path, Segment};

use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered record with string keys, as produced by the deserializer.
pub type Record = IndexMap<String, Node>;

/// One node of a deployment configuration tree.
///
/// Records keep insertion order so detection results follow document order.
/// `Clone` is a deep copy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    #[default]
    Empty,
    Bool(bool),
    Num(serde_json::Number),
    Str(String),
    List(Vec<Node>),
    Record(Record),
}

impl Node {
    /// Parse a YAML document into a tree. An empty document yields [`Node::Empty`].
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Node::Empty);
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Parse a JSON document into a tree.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// An empty record, the usual root of an output tree.
    pub fn empty_record() -> Self {
        Node::Record(Record::new())
    }

    /// Short type name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Empty => "null",
            Node::Bool(_) => "boolean",
            Node::Num(_) => "number",
            Node::Str(_) => "string",
            Node::List(_) => "list",
            Node::Record(_) => "record",
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Node::Record(_) | Node::List(_))
    }

    pub fn is_empty_scalar(&self) -> bool {
        matches!(self, Node::Empty)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Node::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    /// Field lookup that yields `None` for non-records.
    pub fn field(&self, name: &str) -> Option<&Node> {
        self.as_record().and_then(|r| r.get(name))
    }

    /// Compact single-line rendering used for diagnostics and `original` text.
    pub fn to_compact_string(&self) -> String {
        match self {
            Node::Str(s) => s.clone(),
            other => serde_json::to_string(other).unwrap_or_else(|_| format!("{:?}", other)),
        }
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Str(value.to_string())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Str(value)
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Bool(value)
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::Num(value.into())
    }
}

impl From<Vec<Node>> for Node {
    fn from(value: Vec<Node>) -> Self {
        Node::List(value)
    }
}

impl From<Record> for Node {
    fn from(value: Record) -> Self {
        Node::Record(value)
    }
}

impl<K: Into<String>> FromIterator<(K, Node)> for Node {
    fn from_iter<I: IntoIterator<Item = (K, Node)>>(iter: I) -> Self {
        Node::Record(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_shapes() {
        let node = Node::from_yaml_str(
            "image:\n  repository: nginx\n  tag: \"1.23\"\nreplicas: 2\nenabled: true\nextra: ~\nports: [80, 443]\n",
        )
        .unwrap();

        let record = node.as_record().unwrap();
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["image", "replicas", "enabled", "extra", "ports"]);
        assert_eq!(record["image"].field("tag").and_then(Node::as_str), Some("1.23"));
        assert_eq!(record["replicas"].kind_name(), "number");
        assert_eq!(record["enabled"], Node::Bool(true));
        assert_eq!(record["extra"], Node::Empty);
        assert_eq!(record["ports"].as_list().map(<[Node]>::len), Some(2));
    }

    #[test]
    fn test_unquoted_number_tag_stays_number() {
        let node = Node::from_yaml_str("tag: 1.0\n").unwrap();
        assert_eq!(node.field("tag").map(Node::kind_name), Some("number"));
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(Node::from_yaml_str("  \n").unwrap(), Node::Empty);
    }

    #[test]
    fn test_json_round_trip_preserves_order() {
        let node = Node::from_json_str(r#"{"b":1,"a":{"c":"x"}}"#).unwrap();
        let keys: Vec<&str> = node.as_record().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(serde_json::to_string(&node).unwrap(), r#"{"b":1,"a":{"c":"x"}}"#);
    }

    #[test]
    fn test_compact_string() {
        let node: Node = [("repository", Node::from("app"))].into_iter().collect();
        assert_eq!(node.to_compact_string(), r#"{"repository":"app"}"#);
        assert_eq!(Node::from("nginx").to_compact_string(), "nginx");
    }
}
