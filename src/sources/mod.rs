//! Source implementations.
//!
//! - [`File`]: a document read from a path
//! - [`Inline`]: a document held in memory
//! - [`Env`]: environment variables rendered as properties

mod env_source;
mod file;

pub use env_source::Env;
pub use file::{File, Inline};
