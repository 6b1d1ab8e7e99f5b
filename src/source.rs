//! Source trait and raw documents.
//!
//! A `Source` performs the I/O half of loading an entry: it produces the raw
//! text of a document. A [`Mapper`](crate::mapper::Mapper) then parses that
//! text into a tree. Keeping the two apart lets any format be read from any
//! location.

use crate::env::ConfigEnv;
use crate::error::ConfigErrors;

/// Unparsed document content together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// Human-readable origin used in error messages (a path, `env:APP_`, ...)
    pub origin: String,
    pub content: String,
}

impl RawDocument {
    pub fn new(origin: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            content: content.into(),
        }
    }
}

/// Trait for configuration sources.
///
/// Sources perform I/O through the `ConfigEnv` trait so tests can inject a
/// [`MockEnv`](crate::env::MockEnv).
///
/// # Example Implementation
///
/// ```ignore
/// impl Source for Fixed {
///     fn load(&self, _env: &dyn ConfigEnv) -> Result<RawDocument, ConfigErrors> {
///         Ok(RawDocument::new("fixed", "port=8080"))
///     }
///
///     fn name(&self) -> &str {
///         "fixed"
///     }
/// }
/// ```
pub trait Source: Send + Sync {
    /// Load the raw document.
    fn load(&self, env: &dyn ConfigEnv) -> Result<RawDocument, ConfigErrors>;

    /// Load the raw document, swallowing any failure.
    fn load_optionally(&self, env: &dyn ConfigEnv) -> Option<RawDocument> {
        self.load(env).ok()
    }

    /// Human-readable name of this source for error messages.
    fn name(&self) -> &str;
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn load(&self, env: &dyn ConfigEnv) -> Result<RawDocument, ConfigErrors> {
        (**self).load(env)
    }

    fn load_optionally(&self, env: &dyn ConfigEnv) -> Option<RawDocument> {
        (**self).load_optionally(env)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
