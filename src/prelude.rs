//! Convenient re-exports for common strata usage.
//!
//! ```ignore
//! use strata::prelude::*;
//!
//! let registry = ConfigurationRegistry::builder()
//!     .entry(ConfigurationEntry::builder(File::new("app.json"), JsonMapper))
//!     .build()?;
//! ```
//!
//! Format mappers behind cargo features (`TomlMapper`, `YamlMapper`) are
//! included when their feature is enabled.

pub use crate::accessor::Accessor;
pub use crate::entry::ConfigurationEntry;
pub use crate::env::{ConfigEnv, MockEnv, RealEnv};
pub use crate::error::{ConfigError, ConfigErrors, SourceErrorKind};
pub use crate::mapper::Mapper;
pub use crate::mappers::{JsonMapper, PropertiesMapper};
pub use crate::merge::{merge_entries, MergeOption, MergeOptions};
pub use crate::null_value::NullValues;
pub use crate::path::CompiledPath;
pub use crate::registry::{ConfigurationRegistry, RegistrySettings};
pub use crate::source::Source;
pub use crate::sources::{Env, File, Inline};
pub use crate::strategy::FetchStrategy;
pub use crate::value::Value;

#[cfg(feature = "toml")]
pub use crate::mappers::TomlMapper;
#[cfg(feature = "yaml")]
pub use crate::mappers::YamlMapper;

pub use stillwater::Semigroup;
