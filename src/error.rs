//! Error types for the strata configuration library.
//!
//! Failures are concentrated at two points: building an entry (the source or
//! mapper failed) and building merge options (the path did not compile).
//! Lookups and merges never fail. Errors accumulate through stillwater's
//! `NonEmptyVec` so that loading many entries reports every failure at once.

use std::collections::BTreeMap;
use std::fmt;

use stillwater::{NonEmptyVec, Semigroup};
use thiserror::Error;

/// Kinds of source loading errors.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceErrorKind {
    /// Source file was not found
    NotFound { path: String },
    /// Source file could not be read
    IoError { message: String },
    /// Source content could not be parsed
    ParseError {
        message: String,
        line: Option<u32>,
        column: Option<u32>,
    },
    /// Other source-specific error
    Other { message: String },
}

impl fmt::Display for SourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceErrorKind::NotFound { path } => write!(f, "file not found: {}", path),
            SourceErrorKind::IoError { message } => write!(f, "I/O error: {}", message),
            SourceErrorKind::ParseError {
                message,
                line,
                column,
            } => {
                write!(f, "parse error: {}", message)?;
                if let Some(l) = line {
                    write!(f, " at line {}", l)?;
                    if let Some(c) = column {
                        write!(f, ", column {}", c)?;
                    }
                }
                Ok(())
            }
            SourceErrorKind::Other { message } => write!(f, "{}", message),
        }
    }
}

/// Errors raised while building entries, paths and merge options.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A source or mapper failed to produce a document
    #[error("{source_name}: {kind}")]
    SourceError {
        source_name: String,
        kind: SourceErrorKind,
    },

    /// A path expression could not be compiled
    #[error("invalid path '{path}'{}: {message}", offset_suffix(.position))]
    PathError {
        path: String,
        position: Option<usize>,
        message: String,
    },

    /// A merge option is structurally invalid
    #[error("invalid merge option for '{path}': {message}")]
    MergeOptionError { path: String, message: String },

    /// A caller-controlled precondition was violated
    #[error("configuration error: {message}")]
    Precondition { message: String },

    /// Registry settings could not be read from a document
    #[error("invalid registry settings: {message}")]
    SettingsError { message: String },
}

fn offset_suffix(position: &Option<usize>) -> String {
    position
        .map(|p| format!(" at offset {}", p))
        .unwrap_or_default()
}

impl ConfigError {
    /// Get the path expression this error relates to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            ConfigError::PathError { path, .. } => Some(path),
            ConfigError::MergeOptionError { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Get the name of the failing source, if any.
    pub fn source_name(&self) -> Option<&str> {
        match self {
            ConfigError::SourceError { source_name, .. } => Some(source_name),
            _ => None,
        }
    }

    /// Check if this error came from the source/mapper layer.
    pub fn is_source_error(&self) -> bool {
        matches!(self, ConfigError::SourceError { .. })
    }
}

/// A non-empty collection of configuration errors.
///
/// Uses `NonEmptyVec` from stillwater to guarantee at least one error exists.
#[derive(Debug, Clone)]
pub struct ConfigErrors(pub NonEmptyVec<ConfigError>);

impl ConfigErrors {
    /// Create from a single error.
    pub fn single(error: ConfigError) -> Self {
        Self(NonEmptyVec::singleton(error))
    }

    /// Create from a non-empty vec.
    pub fn from_nonempty(errors: NonEmptyVec<ConfigError>) -> Self {
        Self(errors)
    }

    /// Try to create from a vec, returning None if empty.
    pub fn from_vec(errors: Vec<ConfigError>) -> Option<Self> {
        NonEmptyVec::from_vec(errors).map(Self)
    }

    /// Get the first error (always exists).
    pub fn first(&self) -> &ConfigError {
        self.0.head()
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over errors.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigError> {
        self.0.iter()
    }

}

impl Semigroup for ConfigErrors {
    fn combine(self, other: Self) -> Self {
        Self(self.0.combine(other.0))
    }
}

impl From<ConfigError> for ConfigErrors {
    fn from(error: ConfigError) -> Self {
        Self::single(error)
    }
}

impl IntoIterator for ConfigErrors {
    type Item = ConfigError;
    type IntoIter = std::vec::IntoIter<ConfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration errors ({}):", self.len())?;
        for error in self.iter() {
            writeln!(f, "  {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigErrors {}

/// Collect accumulated errors, returning `Ok(value)` when there are none.
pub(crate) fn finish<T>(value: T, errors: Vec<ConfigError>) -> Result<T, ConfigErrors> {
    match ConfigErrors::from_vec(errors) {
        Some(errors) => Err(errors),
        None => Ok(value),
    }
}

/// Group errors by the source that raised them.
///
/// Errors without a source (paths, merge options, preconditions) land under
/// `"(general)"`.
pub fn group_by_source(errors: &ConfigErrors) -> BTreeMap<String, Vec<&ConfigError>> {
    let mut groups: BTreeMap<String, Vec<&ConfigError>> = BTreeMap::new();

    for error in errors.iter() {
        let source = error
            .source_name()
            .map(str::to_string)
            .unwrap_or_else(|| "(general)".to_string());

        groups.entry(source).or_default().push(error);
    }

    groups
}
