// Allow large error types - detailed config errors are expected
#![allow(clippy::result_large_err)]

//! Strata: layered configuration with precedence resolution and tree merging.
//!
//! Configuration usually comes from several places at once: shipped
//! defaults, a file per environment, a local override, environment
//! variables. Strata keeps each of those as a separate *entry* with a
//! namespace and a precedence, and answers lookups by asking the entries in
//! precedence order until one of them actually has the key.
//!
//! # Core Concepts
//!
//! - **Entries**: a loaded document plus namespace, precedence, optionality
//!   and its own sentinel policy ([`ConfigurationEntry`])
//! - **Sentinels**: "key not found" is a value, not an error ([`NullValues`])
//! - **Strategies**: which entries a lookup sees and in what order
//!   ([`FetchStrategy`])
//! - **Merging**: combine whole documents with the same "highest precedence
//!   wins" rule, deduplicating arrays by identity keys ([`merge`])
//! - **Testable I/O**: dependency injection via the `ConfigEnv` trait
//!
//! # Quick Start
//!
//! ```ignore
//! use strata::prelude::*;
//!
//! fn main() -> Result<(), ConfigErrors> {
//!     let registry = ConfigurationRegistry::builder()
//!         .entry(ConfigurationEntry::builder(File::new("defaults.json"), JsonMapper))
//!         .entry(
//!             ConfigurationEntry::builder(File::new("local.properties"), PropertiesMapper)
//!                 .precedence(10)
//!                 .optional(),
//!         )
//!         .entry(
//!             ConfigurationEntry::builder(Env::prefix("APP_"), PropertiesMapper)
//!                 .precedence(100),
//!         )
//!         .build()?;
//!
//!     let host = registry.get_string("server.host");
//!     let port = registry.get_int("server.port");
//!     println!("Running on {}:{}", host, port);
//!     Ok(())
//! }
//! ```
//!
//! All entries that fail to load are reported together:
//!
//! ```text
//! Configuration errors (2):
//!   defaults.json: file not found: defaults.json
//!   local.properties: parse error: invalid unicode escape '\u12' at line 3
//! ```
//!
//! # Architecture
//!
//! Strata follows the "pure core, imperative shell" pattern:
//!
//! - **Pure Core**: resolution, path compilation and merging are pure functions
//! - **Imperative Shell**: sources do their I/O through the `ConfigEnv` trait
//!
//! # Module Structure
//!
//! - [`prelude`]: Convenient re-exports for common usage
//! - [`registry`]: `ConfigurationRegistry`, its builder and settings
//! - [`entry`]: `ConfigurationEntry` and its builder
//! - [`strategy`]: `FetchStrategy`
//! - [`merge`]: structural merge engine and merge options
//! - [`path`]: `CompiledPath`
//! - [`source`] / [`sources`]: where documents come from
//! - [`mapper`] / [`mappers`]: how documents are parsed
//! - [`accessor`]: typed reads over a document
//! - [`mod@env`]: `ConfigEnv` trait and `MockEnv` for testing
//! - [`error`]: `ConfigError` and `ConfigErrors`
//!
//! # Stillwater Integration
//!
//! | Type | Usage |
//! |------|-------|
//! | `NonEmptyVec<T>` | Guaranteed non-empty error lists |
//! | `Semigroup` | Combining errors from multiple entries and merge options |

pub mod accessor;
pub mod entry;
pub mod env;
pub mod error;
pub mod mapper;
pub mod mappers;
pub mod merge;
pub mod null_value;
pub mod path;
pub mod prelude;
pub mod registry;
pub mod source;
pub mod sources;
pub mod strategy;
pub mod value;

// Re-exports for convenience
pub use accessor::{Accessor, EmptyAccessor, TreeAccessor};
pub use entry::{ConfigurationEntry, EntryBuilder, DEFAULT_NAMESPACE};
pub use env::{ConfigEnv, MockEnv, RealEnv};
pub use error::{group_by_source, ConfigError, ConfigErrors, SourceErrorKind};
pub use mapper::Mapper;
pub use merge::{merge_entries, MergeEngine, MergeOption, MergeOptions, TreeProvider};
pub use null_value::{NullValues, Scalar};
pub use path::{CompiledPath, Segment};
pub use registry::{ConfigurationRegistry, Probe, RegistryBuilder, RegistrySettings, Resolution};
pub use source::{RawDocument, Source};
pub use strategy::FetchStrategy;
pub use value::Value;

// Re-export stillwater types that are commonly used
pub use stillwater::{NonEmptyVec, Semigroup};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports() {
        let registry = ConfigurationRegistry::default();
        assert_eq!(registry.strategy(), FetchStrategy::Strict);
        let _: Option<ConfigErrors> = ConfigErrors::from_vec(Vec::new());
    }
}
