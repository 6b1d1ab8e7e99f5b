//! TOML mapper.

use toml_edit::{ImDocument, Item};

use crate::error::{ConfigError, ConfigErrors, SourceErrorKind};
use crate::mapper::{line_from_offset, Mapper};
use crate::source::RawDocument;
use crate::value::Value;

/// Parses TOML documents with `toml_edit`.
///
/// Datetimes are kept as their string form.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlMapper;

impl Mapper for TomlMapper {
    fn apply(&self, raw: &RawDocument) -> Result<Value, ConfigErrors> {
        let content = raw.content.as_str();
        let document: ImDocument<&str> =
            ImDocument::parse(content).map_err(|e: toml_edit::TomlError| {
                let (line, column) = e
                    .span()
                    .map(|s| {
                        let line = line_from_offset(content, s.start);
                        let start = s.start.min(content.len());
                        let last_newline = content[..start].rfind('\n').map(|p| p + 1).unwrap_or(0);
                        (Some(line), Some((start - last_newline + 1) as u32))
                    })
                    .unwrap_or((None, None));

                ConfigErrors::single(ConfigError::SourceError {
                    source_name: raw.origin.clone(),
                    kind: SourceErrorKind::ParseError {
                        message: e.message().to_string(),
                        line,
                        column,
                    },
                })
            })?;

        Ok(item_to_value(document.as_item()))
    }

    fn name(&self) -> &str {
        "toml"
    }
}

fn item_to_value(item: &Item) -> Value {
    match item {
        Item::Table(table) => Value::Table(
            table
                .iter()
                .map(|(k, v)| (k.to_string(), item_to_value(v)))
                .collect(),
        ),
        Item::ArrayOfTables(arr) => Value::Array(
            arr.iter()
                .map(|table| {
                    Value::Table(
                        table
                            .iter()
                            .map(|(k, v)| (k.to_string(), item_to_value(v)))
                            .collect(),
                    )
                })
                .collect(),
        ),
        Item::Value(v) => toml_value_to_value(v),
        Item::None => Value::Null,
    }
}

fn toml_value_to_value(v: &toml_edit::Value) -> Value {
    match v {
        toml_edit::Value::String(s) => Value::String(s.value().to_string()),
        toml_edit::Value::Integer(i) => Value::Integer(*i.value()),
        toml_edit::Value::Float(f) => Value::Float(*f.value()),
        toml_edit::Value::Boolean(b) => Value::Bool(*b.value()),
        toml_edit::Value::Datetime(dt) => Value::String(dt.value().to_string()),
        toml_edit::Value::Array(arr) => Value::Array(arr.iter().map(toml_value_to_value).collect()),
        toml_edit::Value::InlineTable(t) => Value::Table(
            t.iter()
                .map(|(k, v)| (k.to_string(), toml_value_to_value(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_tables_and_arrays() {
        let raw = RawDocument::new(
            "app.toml",
            r#"
name = "svc"
ports = [80, 443]
point = { x = 1, y = 2 }

[database]
host = "localhost"

[[servers]]
id = 1

[[servers]]
id = 2
"#,
        );

        let value = TomlMapper.apply(&raw).unwrap();
        assert_eq!(value.get_path("name").and_then(Value::as_str), Some("svc"));
        assert_eq!(
            value.get_path("database.host").and_then(Value::as_str),
            Some("localhost")
        );
        assert_eq!(value.get_path("point.y").and_then(Value::as_integer), Some(2));
        assert_eq!(
            value.get_path("ports"),
            Some(&Value::Array(vec![Value::Integer(80), Value::Integer(443)]))
        );

        let servers = value.get_path("servers").and_then(Value::as_array).unwrap();
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[1].get_path("id").and_then(Value::as_integer), Some(2));
    }

    #[test]
    fn test_toml_parse_error_with_location() {
        let raw = RawDocument::new("bad.toml", "a = 1\nb = = 2\n");
        let errors = TomlMapper.apply(&raw).unwrap_err();

        match errors.first() {
            ConfigError::SourceError {
                kind: SourceErrorKind::ParseError { line, .. },
                ..
            } => assert_eq!(*line, Some(2)),
            other => panic!("Expected ParseError, got {:?}", other),
        }
    }
}
