//! JSON mapper.

use crate::error::{ConfigError, ConfigErrors, SourceErrorKind};
use crate::mapper::Mapper;
use crate::source::RawDocument;
use crate::value::Value;

/// Parses JSON documents with `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMapper;

impl Mapper for JsonMapper {
    fn apply(&self, raw: &RawDocument) -> Result<Value, ConfigErrors> {
        let document: serde_json::Value =
            serde_json::from_str(&raw.content).map_err(|e: serde_json::Error| {
                ConfigErrors::single(ConfigError::SourceError {
                    source_name: raw.origin.clone(),
                    kind: SourceErrorKind::ParseError {
                        message: e.to_string(),
                        line: Some(e.line() as u32),
                        column: Some(e.column() as u32),
                    },
                })
            })?;

        Ok(Value::from_json(&document))
    }

    fn name(&self) -> &str {
        "json"
    }
}
