//! Value tree for loaded configuration documents.
//!
//! Every mapper produces a `Value`; accessors read from it and the merge
//! engine combines two of them.

use std::collections::BTreeMap;

use crate::path::{CompiledPath, Segment};

/// A parsed configuration document node.
///
/// Tables keep their keys sorted, so walking a document is deterministic no
/// matter which format it was loaded from.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Null/missing value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// String value
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Table/object of key-value pairs
    Table(BTreeMap<String, Value>),
}

impl Value {
    /// An empty table.
    pub fn table() -> Self {
        Value::Table(BTreeMap::new())
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a table.
    pub fn is_table(&self) -> bool {
        matches!(self, Value::Table(_))
    }

    /// Check if this value is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to get this value as a table.
    pub fn as_table(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Get a value by dot-notation path (e.g., "database.host").
    ///
    /// Only table keys are followed; use [`Value::get_compiled`] for paths
    /// with array indices or quoted keys.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let parts: Vec<&str> = path.split('.').collect();
        self.get_path_parts(&parts)
    }

    fn get_path_parts(&self, parts: &[&str]) -> Option<&Value> {
        let Some((first, rest)) = parts.split_first() else {
            return Some(self);
        };

        match self {
            Value::Table(table) => table.get(*first).and_then(|v| v.get_path_parts(rest)),
            _ => None,
        }
    }

    /// Get a value by compiled path.
    pub fn get_compiled(&self, path: &CompiledPath) -> Option<&Value> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| match (segment, node) {
                (Segment::Key(key), Value::Table(table)) => table.get(key),
                (Segment::Index(index), Value::Array(items)) => items.get(*index),
                _ => None,
            })
    }

    /// Convert to a `serde_json::Value`.
    ///
    /// Non-finite floats have no JSON form and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(arr) => serde_json::Value::Array(arr.iter().map(Value::to_json).collect()),
            Value::Table(table) => serde_json::Value::Object(
                table
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Convert from a `serde_json::Value`.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                // Try integer first, fall back to float
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::String(n.to_string())
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(obj) => Value::Table(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(m: BTreeMap<String, T>) -> Self {
        Value::Table(m.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        let mut inner = BTreeMap::new();
        inner.insert("host".to_string(), Value::String("localhost".to_string()));
        inner.insert("port".to_string(), Value::Integer(5432));
        inner.insert(
            "replicas".to_string(),
            Value::from(vec!["r1", "r2"]),
        );

        let mut root = BTreeMap::new();
        root.insert("database".to_string(), Value::Table(inner));
        Value::Table(root)
    }

    #[test]
    fn test_value_type_checks() {
        assert!(Value::Null.is_null());
        assert!(!Value::Bool(true).is_null());
        assert!(Value::table().is_table());
        assert!(Value::Array(vec![]).is_array());

        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Integer(42).as_integer(), Some(42));
        assert_eq!(Value::Float(2.71).as_float(), Some(2.71));
        assert_eq!(Value::Integer(42).as_float(), Some(42.0));
        assert_eq!(Value::String("hello".to_string()).as_str(), Some("hello"));
    }

    #[test]
    fn test_value_get_path() {
        let value = sample();

        assert_eq!(
            value.get_path("database.host").and_then(|v| v.as_str()),
            Some("localhost")
        );
        assert_eq!(
            value.get_path("database.port").and_then(|v| v.as_integer()),
            Some(5432)
        );
        assert!(value.get_path("database.password").is_none());
        assert!(value.get_path("other").is_none());
    }

    #[test]
    fn test_value_get_compiled() {
        let value = sample();
        let path = CompiledPath::compile("$.database.replicas[1]").unwrap();
        assert_eq!(value.get_compiled(&path).and_then(|v| v.as_str()), Some("r2"));

        let missing = CompiledPath::compile("database.replicas[5]").unwrap();
        assert!(value.get_compiled(&missing).is_none());

        assert_eq!(value.get_compiled(&CompiledPath::root()), Some(&value));
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({
            "name": "svc",
            "ratio": 0.5,
            "tags": ["a", "b"],
            "nested": { "enabled": true, "missing": null }
        });

        let value = Value::from_json(&json);
        assert_eq!(value.get_path("name").and_then(Value::as_str), Some("svc"));
        assert_eq!(value.get_path("ratio").and_then(Value::as_float), Some(0.5));
        assert_eq!(
            value.get_path("nested.enabled").and_then(Value::as_bool),
            Some(true)
        );
        assert!(value.get_path("nested.missing").is_some_and(Value::is_null));
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn test_non_finite_float_to_json() {
        assert_eq!(Value::Float(f64::NAN).to_json(), serde_json::Value::Null);
    }
}
