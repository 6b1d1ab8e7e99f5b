//! Mapper trait.
//!
//! A `Mapper` turns a [`RawDocument`] into a [`Value`] tree and wraps the
//! tree in an [`Accessor`]. Mappers are pure: all I/O happened in the
//! [`Source`](crate::source::Source).

use std::sync::Arc;

use crate::accessor::{Accessor, TreeAccessor};
use crate::error::ConfigErrors;
use crate::null_value::NullValues;
use crate::source::RawDocument;
use crate::value::Value;

/// Converts raw document text into a typed document.
pub trait Mapper: Send + Sync {
    /// Parse the raw document.
    ///
    /// # Errors
    ///
    /// A `SourceError` with `SourceErrorKind::ParseError`, naming the
    /// document's origin.
    fn apply(&self, raw: &RawDocument) -> Result<Value, ConfigErrors>;

    /// Wrap a parsed document in an accessor answering misses with
    /// `null_values`.
    fn accessor_for(&self, document: Value, null_values: &NullValues) -> Arc<dyn Accessor> {
        Arc::new(TreeAccessor::with_null_values(document, null_values.clone()))
    }

    fn name(&self) -> &str;
}

impl<M: Mapper + ?Sized> Mapper for Box<M> {
    fn apply(&self, raw: &RawDocument) -> Result<Value, ConfigErrors> {
        (**self).apply(raw)
    }

    fn accessor_for(&self, document: Value, null_values: &NullValues) -> Arc<dyn Accessor> {
        (**self).accessor_for(document, null_values)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Convert a byte offset into a 1-indexed line number.
pub(crate) fn line_from_offset(content: &str, offset: usize) -> u32 {
    let end = offset.min(content.len());
    content
        .as_bytes()
        .iter()
        .take(end)
        .filter(|&&b| b == b'\n')
        .count() as u32
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_from_offset() {
        let content = "a\nb\nc";
        assert_eq!(line_from_offset(content, 0), 1);
        assert_eq!(line_from_offset(content, 2), 2);
        assert_eq!(line_from_offset(content, 4), 3);
        assert_eq!(line_from_offset(content, 99), 3);
    }
}
