//! Mapper implementations.
//!
//! JSON and properties are always available; TOML and YAML sit behind the
//! `toml` and `yaml` features.

mod json;
pub(crate) mod properties;
#[cfg(feature = "toml")]
mod toml;
#[cfg(feature = "yaml")]
mod yaml;

pub use json::JsonMapper;
pub use properties::PropertiesMapper;
#[cfg(feature = "toml")]
pub use toml::TomlMapper;
#[cfg(feature = "yaml")]
pub use yaml::YamlMapper;
