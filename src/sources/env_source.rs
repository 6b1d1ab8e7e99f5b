//! Environment variable source.
//!
//! Variables matching a prefix are rendered as a properties document, so an
//! `Env` source pairs with [`PropertiesMapper`](crate::mappers::PropertiesMapper).
//!
//! ```ignore
//! use strata::sources::Env;
//!
//! // APP_DATABASE_HOST=db  -> database.host=db
//! // APP_SERVERS_0_PORT=81 -> servers[0].port=81
//! let source = Env::prefix("APP_");
//!
//! // APP__DB__HOST -> db.host
//! let source = Env::prefix("APP__").separator("__");
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::env::ConfigEnv;
use crate::error::ConfigErrors;
use crate::mappers::properties::escape;
use crate::source::{RawDocument, Source};

/// Environment variable configuration source.
#[derive(Debug, Clone)]
pub struct Env {
    prefix: String,
    name: String,
    separator: String,
    custom_mappings: BTreeMap<String, String>,
    excluded: BTreeSet<String>,
}

impl Env {
    /// Create an env source for variables starting with `prefix`.
    ///
    /// The prefix is stripped before the name is mapped to a key.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            name: format!("env:{}", prefix),
            prefix,
            separator: "_".to_string(),
            custom_mappings: BTreeMap::new(),
            excluded: BTreeSet::new(),
        }
    }

    /// Set the separator that splits a variable name into key segments.
    pub fn separator(mut self, sep: impl Into<String>) -> Self {
        self.separator = sep.into();
        self
    }

    /// Map a variable suffix (the part after the prefix) to an explicit key.
    pub fn map(mut self, env_suffix: impl Into<String>, key: impl Into<String>) -> Self {
        self.custom_mappings.insert(env_suffix.into(), key.into());
        self
    }

    /// Skip a variable, by full name.
    pub fn exclude(mut self, var: impl Into<String>) -> Self {
        self.excluded.insert(var.into());
        self
    }
}

impl Source for Env {
    fn load(&self, env: &dyn ConfigEnv) -> Result<RawDocument, ConfigErrors> {
        let mut vars = env.env_vars_with_prefix(&self.prefix);
        vars.sort();

        let mut content = String::new();
        for (var, value) in vars {
            if self.excluded.contains(&var) {
                continue;
            }
            let Some(suffix) = var.strip_prefix(&self.prefix) else {
                continue;
            };
            if suffix.is_empty() {
                continue;
            }

            let key = match self.custom_mappings.get(suffix) {
                Some(mapped) => mapped.clone(),
                None => suffix_to_key(suffix, &self.separator),
            };

            content.push_str(&key);
            content.push('=');
            content.push_str(&escape(&value));
            content.push('\n');
        }

        Ok(RawDocument::new(self.name.clone(), content))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Convert `DATABASE_HOST` to `database.host`; numeric segments become
/// indices on the preceding segment (`SERVERS_0_PORT` -> `servers[0].port`).
fn suffix_to_key(suffix: &str, separator: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for part in suffix.split(separator).filter(|p| !p.is_empty()) {
        let lower = part.to_lowercase();
        if let Ok(idx) = lower.parse::<usize>() {
            if let Some(last) = parts.last_mut() {
                last.push_str(&format!("[{}]", idx));
                continue;
            }
        }
        parts.push(lower);
    }

    parts.join(".")
}
