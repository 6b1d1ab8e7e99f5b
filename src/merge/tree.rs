//! Tree capabilities the merge engine needs.
//!
//! The engine never touches a concrete document type. A `TreeProvider`
//! exposes the handful of operations it uses, and one zero-sized provider
//! exists per document representation.

use crate::value::Value;

/// Structural operations over one document representation.
///
/// Methods that only make sense for one node kind (`put` on objects, `push`
/// on arrays) are no-ops when given the other kind.
pub trait TreeProvider {
    type Node: Clone + PartialEq;

    fn is_object(node: &Self::Node) -> bool;

    fn is_array(node: &Self::Node) -> bool;

    /// Member `key` of an object node.
    fn get<'a>(node: &'a Self::Node, key: &str) -> Option<&'a Self::Node>;

    /// Members of an object node in iteration order. Empty for other nodes.
    fn entries(node: &Self::Node) -> Vec<(&str, &Self::Node)>;

    /// Elements of an array node. Empty for other nodes.
    fn elements(node: &Self::Node) -> &[Self::Node];

    fn new_object() -> Self::Node;

    fn new_array() -> Self::Node;

    fn put(object: &mut Self::Node, key: String, value: Self::Node);

    fn push(array: &mut Self::Node, value: Self::Node);

    /// Whether an array node holds an element equal to `value`.
    fn contains(array: &Self::Node, value: &Self::Node) -> bool {
        Self::elements(array).contains(value)
    }
}

/// Provider for the crate's own [`Value`] tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueTree;

impl TreeProvider for ValueTree {
    type Node = Value;

    fn is_object(node: &Value) -> bool {
        node.is_table()
    }

    fn is_array(node: &Value) -> bool {
        node.is_array()
    }

    fn get<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
        node.as_table().and_then(|table| table.get(key))
    }

    fn entries(node: &Value) -> Vec<(&str, &Value)> {
        match node {
            Value::Table(table) => table.iter().map(|(k, v)| (k.as_str(), v)).collect(),
            _ => Vec::new(),
        }
    }

    fn elements(node: &Value) -> &[Value] {
        node.as_array().unwrap_or(&[])
    }

    fn new_object() -> Value {
        Value::table()
    }

    fn new_array() -> Value {
        Value::Array(Vec::new())
    }

    fn put(object: &mut Value, key: String, value: Value) {
        if let Value::Table(table) = object {
            table.insert(key, value);
        }
    }

    fn push(array: &mut Value, value: Value) {
        if let Value::Array(items) = array {
            items.push(value);
        }
    }
}

/// Provider for `serde_json::Value` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTree;

impl TreeProvider for JsonTree {
    type Node = serde_json::Value;

    fn is_object(node: &serde_json::Value) -> bool {
        node.is_object()
    }

    fn is_array(node: &serde_json::Value) -> bool {
        node.is_array()
    }

    fn get<'a>(node: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
        node.as_object().and_then(|map| map.get(key))
    }

    fn entries(node: &serde_json::Value) -> Vec<(&str, &serde_json::Value)> {
        node.as_object()
            .map(|map| map.iter().map(|(k, v)| (k.as_str(), v)).collect())
            .unwrap_or_default()
    }

    fn elements(node: &serde_json::Value) -> &[serde_json::Value] {
        node.as_array().map(Vec::as_slice).unwrap_or(&[])
    }

    fn new_object() -> serde_json::Value {
        serde_json::Value::Object(serde_json::Map::new())
    }

    fn new_array() -> serde_json::Value {
        serde_json::Value::Array(Vec::new())
    }

    fn put(object: &mut serde_json::Value, key: String, value: serde_json::Value) {
        if let Some(map) = object.as_object_mut() {
            map.insert(key, value);
        }
    }

    fn push(array: &mut serde_json::Value, value: serde_json::Value) {
        if let Some(items) = array.as_array_mut() {
            items.push(value);
        }
    }
}
