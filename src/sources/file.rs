//! File and inline sources.
//!
//! # Example
//!
//! ```ignore
//! use strata::sources::{File, Inline};
//!
//! let base = File::new("config/base.json");
//! let local = File::new("config/local.json").named("local overrides");
//! let fixed = Inline::new("port=8080");
//! ```

use std::path::PathBuf;

use crate::env::ConfigEnv;
use crate::error::{ConfigError, ConfigErrors, SourceErrorKind};
use crate::source::{RawDocument, Source};

/// Reads a document from a file through the injected [`ConfigEnv`].
#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
    name: String,
}

impl File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    /// Set a custom name for this source in error messages.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Source for File {
    fn load(&self, env: &dyn ConfigEnv) -> Result<RawDocument, ConfigErrors> {
        match env.read_file(&self.path) {
            Ok(content) => Ok(RawDocument::new(self.name.clone(), content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ConfigErrors::single(ConfigError::SourceError {
                    source_name: self.name.clone(),
                    kind: SourceErrorKind::NotFound {
                        path: self.path.display().to_string(),
                    },
                }))
            }
            Err(e) => Err(ConfigErrors::single(ConfigError::SourceError {
                source_name: self.name.clone(),
                kind: SourceErrorKind::IoError {
                    message: e.to_string(),
                },
            })),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A document held in memory.
#[derive(Debug, Clone)]
pub struct Inline {
    content: String,
    name: String,
}

impl Inline {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            name: "<inline>".to_string(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Source for Inline {
    fn load(&self, _env: &dyn ConfigEnv) -> Result<RawDocument, ConfigErrors> {
        Ok(RawDocument::new(self.name.clone(), self.content.clone()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
