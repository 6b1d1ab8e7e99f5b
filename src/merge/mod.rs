//! Structural merging of configuration documents.
//!
//! Where the registry answers one key at a time, the merge engine combines
//! two whole documents into one, again letting the higher precedence win:
//!
//! ```ignore
//! use strata::merge::{merge_entries, MergeOptions};
//!
//! let options = MergeOptions::from_pairs([("$.servers", ["name"])])?;
//! let merged = merge_entries(&defaults, &overrides, &options)?;
//! registry.add(merged);
//! ```
//!
//! The algorithm is written once against [`TreeProvider`]; [`ValueTree`]
//! merges the crate's own [`Value`](crate::value::Value) documents and
//! [`JsonTree`] merges `serde_json::Value` directly.

mod engine;
mod options;
mod tree;

pub use engine::{merge_entries, MergeEngine};
pub use options::{MergeOption, MergeOptions};
pub use tree::{JsonTree, TreeProvider, ValueTree};
