//! YAML mapper.

use crate::error::{ConfigError, ConfigErrors, SourceErrorKind};
use crate::mapper::Mapper;
use crate::source::RawDocument;
use crate::value::Value;

/// Parses YAML documents with `serde_yaml`.
///
/// Mapping keys that are numbers or booleans are stringified; other
/// complex keys are skipped. Tags are dropped in favour of the tagged value.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlMapper;

impl Mapper for YamlMapper {
    fn apply(&self, raw: &RawDocument) -> Result<Value, ConfigErrors> {
        let document: serde_yaml::Value =
            serde_yaml::from_str(&raw.content).map_err(|e: serde_yaml::Error| {
                let (line, column) = e.location().map_or((None, None), |loc| {
                    (Some(loc.line() as u32), Some(loc.column() as u32))
                });
                ConfigErrors::single(ConfigError::SourceError {
                    source_name: raw.origin.clone(),
                    kind: SourceErrorKind::ParseError {
                        message: e.to_string(),
                        line,
                        column,
                    },
                })
            })?;

        Ok(yaml_to_value(&document))
    }

    fn name(&self) -> &str {
        "yaml"
    }
}

fn yaml_to_value(yaml: &serde_yaml::Value) -> Value {
    match yaml {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(*b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        serde_yaml::Value::String(s) => Value::String(s.clone()),
        serde_yaml::Value::Sequence(seq) => Value::Array(seq.iter().map(yaml_to_value).collect()),
        serde_yaml::Value::Mapping(map) => Value::Table(
            map.iter()
                .filter_map(|(k, v)| {
                    let key = match k {
                        serde_yaml::Value::String(s) => s.clone(),
                        serde_yaml::Value::Number(n) => n.to_string(),
                        serde_yaml::Value::Bool(b) => b.to_string(),
                        _ => return None,
                    };
                    Some((key, yaml_to_value(v)))
                })
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => yaml_to_value(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_document() {
        let raw = RawDocument::new(
            "app.yaml",
            "database:\n  host: localhost\n  port: 5432\nitems:\n  - id: 1\n  - id: 2\n",
        );

        let value = YamlMapper.apply(&raw).unwrap();
        assert_eq!(
            value.get_path("database.port").and_then(Value::as_integer),
            Some(5432)
        );
        assert_eq!(value.get_path("items").and_then(Value::as_array).map(<[Value]>::len), Some(2));
    }

    #[test]
    fn test_yaml_parse_error() {
        let raw = RawDocument::new("bad.yaml", "a: [1, 2\n");
        let errors = YamlMapper.apply(&raw).unwrap_err();
        assert!(matches!(
            errors.first(),
            ConfigError::SourceError {
                kind: SourceErrorKind::ParseError { .. },
                ..
            }
        ));
    }
}
