//! Typed read access over loaded documents.
//!
//! An `Accessor` answers typed lookups by key and never fails: a key that is
//! missing, or whose value cannot be read as the requested type, yields the
//! sentinel for that type (see [`NullValues`]).

use std::sync::Arc;

use crate::null_value::NullValues;
use crate::path::CompiledPath;
use crate::value::Value;

/// Read interface over one loaded document.
pub trait Accessor: Send + Sync {
    fn get_bool(&self, key: &str) -> bool;

    fn get_int(&self, key: &str) -> i32;

    fn get_long(&self, key: &str) -> i64;

    fn get_double(&self, key: &str) -> f64;

    fn get_string(&self, key: &str) -> String;

    /// The parsed tree behind this accessor, if it has one.
    ///
    /// Only tree-backed documents can take part in a merge.
    fn tree(&self) -> Option<&Value> {
        None
    }
}

impl std::fmt::Debug for dyn Accessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.tree() {
            Some(tree) => f.debug_tuple("Accessor").field(tree).finish(),
            None => f.write_str("Accessor(<opaque>)"),
        }
    }
}

/// Accessor over a [`Value`] tree.
///
/// Keys are looked up first as a literal top-level member (so a JSON key
/// such as `"app.name"` stays reachable), then as a path expression
/// (`database.host`, `servers[0].port`, `$['a']['b']`).
#[derive(Debug, Clone)]
pub struct TreeAccessor {
    root: Value,
    null_values: NullValues,
}

impl TreeAccessor {
    pub fn new(root: Value) -> Self {
        Self::with_null_values(root, NullValues::default())
    }

    /// Create an accessor that answers misses with `null_values`.
    pub fn with_null_values(root: Value, null_values: NullValues) -> Self {
        Self { root, null_values }
    }

    pub fn into_arc(self) -> Arc<dyn Accessor> {
        Arc::new(self)
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        if let Value::Table(table) = &self.root {
            if let Some(value) = table.get(key) {
                return Some(value);
            }
        }

        CompiledPath::compile(key)
            .ok()
            .and_then(|path| self.root.get_compiled(&path))
    }
}

impl Accessor for TreeAccessor {
    fn get_bool(&self, key: &str) -> bool {
        self.lookup(key)
            .and_then(coerce_bool)
            .unwrap_or(self.null_values.boolean)
    }

    fn get_int(&self, key: &str) -> i32 {
        self.lookup(key)
            .and_then(coerce_long)
            .and_then(|i| i32::try_from(i).ok())
            .unwrap_or(self.null_values.int)
    }

    fn get_long(&self, key: &str) -> i64 {
        self.lookup(key)
            .and_then(coerce_long)
            .unwrap_or(self.null_values.long)
    }

    fn get_double(&self, key: &str) -> f64 {
        self.lookup(key)
            .and_then(coerce_double)
            .unwrap_or(self.null_values.double)
    }

    fn get_string(&self, key: &str) -> String {
        self.lookup(key)
            .and_then(coerce_string)
            .unwrap_or_else(|| self.null_values.string.clone())
    }

    fn tree(&self) -> Option<&Value> {
        Some(&self.root)
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Integer(i) => Some(*i != 0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_long(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(*f as i64),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_double(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) => Some(*f),
        Value::Integer(i) => Some(*i as f64),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Null | Value::Array(_) | Value::Table(_) => None,
    }
}

/// Accessor with no values; every lookup yields the sentinel.
///
/// Optional entries whose source could not be loaded hold one of these.
#[derive(Debug, Clone, Default)]
pub struct EmptyAccessor {
    null_values: NullValues,
}

impl EmptyAccessor {
    pub fn new(null_values: NullValues) -> Self {
        Self { null_values }
    }
}

impl Accessor for EmptyAccessor {
    fn get_bool(&self, _key: &str) -> bool {
        self.null_values.boolean
    }

    fn get_int(&self, _key: &str) -> i32 {
        self.null_values.int
    }

    fn get_long(&self, _key: &str) -> i64 {
        self.null_values.long
    }

    fn get_double(&self, _key: &str) -> f64 {
        self.null_values.double
    }

    fn get_string(&self, _key: &str) -> String {
        self.null_values.string.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accessor() -> TreeAccessor {
        TreeAccessor::new(Value::from_json(&serde_json::json!({
            "app.name": "literal-dotted",
            "app": { "name": "nested", "debug": "yes", "workers": 8, "ratio": 0.25 },
            "limits": { "big": 10_000_000_000i64, "whole": 3.0, "text": " 12 " },
            "servers": [ { "host": "a", "port": 80 }, { "host": "b", "port": 81 } ]
        })))
    }

    #[test]
    fn test_literal_key_wins_over_path() {
        assert_eq!(accessor().get_string("app.name"), "literal-dotted");
        assert_eq!(accessor().get_string("$.app.name"), "nested");
    }

    #[test]
    fn test_typed_getters() {
        let acc = accessor();
        assert!(acc.get_bool("app.debug"));
        assert_eq!(acc.get_int("app.workers"), 8);
        assert_eq!(acc.get_long("limits.big"), 10_000_000_000);
        assert_eq!(acc.get_double("app.ratio"), 0.25);
        assert_eq!(acc.get_double("app.workers"), 8.0);
        assert_eq!(acc.get_string("app.workers"), "8");
        assert_eq!(acc.get_int("servers[1].port"), 81);
        assert_eq!(acc.get_string("$['servers'][0]['host']"), "a");
    }

    #[test]
    fn test_coercions() {
        let acc = accessor();
        assert_eq!(acc.get_int("limits.whole"), 3);
        assert_eq!(acc.get_int("limits.text"), 12);
        // Does not fit in i32
        assert_eq!(acc.get_int("limits.big"), 0);
    }

    #[test]
    fn test_missing_keys_yield_natural_zero() {
        let acc = accessor();
        assert!(!acc.get_bool("missing"));
        assert_eq!(acc.get_int("missing"), 0);
        assert_eq!(acc.get_long("app"), 0);
        assert_eq!(acc.get_double("servers"), 0.0);
        assert_eq!(acc.get_string("app"), "");
        assert_eq!(acc.get_string("$..broken"), "");
    }

    #[test]
    fn test_missing_keys_yield_custom_sentinel() {
        let acc = TreeAccessor::with_null_values(
            Value::table(),
            NullValues::new().with_int(-1).with_string("-"),
        );
        assert_eq!(acc.get_int("port"), -1);
        assert_eq!(acc.get_string("host"), "-");
    }

    #[test]
    fn test_tree_exposed() {
        assert!(accessor().tree().is_some_and(Value::is_table));
        assert!(EmptyAccessor::default().tree().is_none());
    }

    #[test]
    fn test_empty_accessor() {
        let acc = EmptyAccessor::new(NullValues::new().with_boolean(true));
        assert!(acc.get_bool("anything"));
        assert_eq!(acc.get_long("anything"), 0);
    }
}
