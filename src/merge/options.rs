//! Identity keys for array merges.
//!
//! ```ignore
//! use strata::merge::MergeOptions;
//!
//! let options = MergeOptions::from_pairs([
//!     ("$.servers", vec!["host", "port"]),
//!     ("plugins", vec!["name"]),
//! ])?;
//! ```

use std::collections::BTreeMap;

use stillwater::Semigroup;

use crate::error::{finish, ConfigError, ConfigErrors};
use crate::path::CompiledPath;

/// The identity keys used to recognise "the same element" in the arrays at
/// one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOption {
    path: CompiledPath,
    keys: Vec<String>,
}

impl MergeOption {
    /// Compile `path` and validate `keys`.
    ///
    /// # Errors
    ///
    /// A `PathError` when `path` does not compile, and a `MergeOptionError`
    /// when no keys are given or a key name is empty. Both are reported
    /// together.
    pub fn new<I, K>(path: &str, keys: I) -> Result<Self, ConfigErrors>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut errors = Vec::new();
        let mut names: Vec<String> = Vec::new();
        for key in keys {
            let key = key.into();
            if key.is_empty() {
                errors.push(ConfigError::MergeOptionError {
                    path: path.to_string(),
                    message: "identity key names must not be empty".to_string(),
                });
            } else if !names.contains(&key) {
                names.push(key);
            }
        }
        if names.is_empty() && errors.is_empty() {
            errors.push(ConfigError::MergeOptionError {
                path: path.to_string(),
                message: "at least one identity key is required".to_string(),
            });
        }

        match CompiledPath::compile(path) {
            Ok(path) => finish(Self { path, keys: names }, errors),
            Err(path_errors) => Err(match ConfigErrors::from_vec(errors) {
                Some(key_errors) => path_errors.combine(key_errors),
                None => path_errors,
            }),
        }
    }

    pub fn path(&self) -> &CompiledPath {
        &self.path
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

/// Merge options keyed by canonical path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOptions {
    by_path: BTreeMap<CompiledPath, MergeOption>,
}

impl MergeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(path, keys)` pairs, collecting every invalid pair.
    ///
    /// Two pairs naming the same canonical path are an error.
    pub fn from_pairs<I, P, K, S>(pairs: I) -> Result<Self, ConfigErrors>
    where
        I: IntoIterator<Item = (P, K)>,
        P: AsRef<str>,
        K: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = Self::new();
        let mut errors = Vec::new();

        for (path, keys) in pairs {
            match MergeOption::new(path.as_ref(), keys) {
                Ok(option) if options.by_path.contains_key(option.path()) => {
                    errors.push(ConfigError::MergeOptionError {
                        path: path.as_ref().to_string(),
                        message: format!("duplicate merge option for {}", option.path()),
                    });
                }
                Ok(option) => {
                    options.add(option);
                }
                Err(e) => errors.extend(e),
            }
        }

        finish(options, errors)
    }

    /// Register `option`, returning the option it replaced at the same path.
    pub fn add(&mut self, option: MergeOption) -> Option<MergeOption> {
        self.by_path.insert(option.path.clone(), option)
    }

    pub fn with(mut self, option: MergeOption) -> Self {
        self.add(option);
        self
    }

    /// Identity keys registered for the arrays at `path`.
    pub fn identity_keys(&self, path: &CompiledPath) -> Option<&[String]> {
        self.by_path.get(path).map(MergeOption::keys)
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MergeOption> {
        self.by_path.values()
    }
}
