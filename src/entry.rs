//! Configuration entries.
//!
//! A `ConfigurationEntry` pairs one loaded document with the metadata the
//! registry resolves by: namespace, precedence, optionality and the
//! document's own sentinel policy.
//!
//! # Example
//!
//! ```ignore
//! use strata::{ConfigurationEntry, mappers::JsonMapper, sources::File};
//!
//! let defaults = ConfigurationEntry::builder(File::new("defaults.json"), JsonMapper)
//!     .precedence(0)
//!     .build()?;
//!
//! let overrides = ConfigurationEntry::builder(File::new("local.json"), JsonMapper)
//!     .precedence(10)
//!     .optional()
//!     .build()?;
//! ```

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::accessor::{Accessor, EmptyAccessor, TreeAccessor};
use crate::env::{ConfigEnv, RealEnv};
use crate::error::ConfigErrors;
use crate::mapper::Mapper;
use crate::null_value::{NullValues, Scalar};
use crate::source::Source;
use crate::value::Value;

/// Namespace of entries added without one.
pub const DEFAULT_NAMESPACE: &str = "";

struct Loader {
    source: Box<dyn Source>,
    mapper: Box<dyn Mapper>,
    env: Arc<dyn ConfigEnv>,
}

enum Document {
    Loaded(Arc<dyn Accessor>),
    Lazy {
        loader: Arc<Loader>,
        cell: OnceLock<Result<Arc<dyn Accessor>, ConfigErrors>>,
    },
}

/// An immutable document plus its resolution metadata.
///
/// Cloning is cheap: clones share the document. Two entries are equal when
/// their metadata matches and their documents are equal: the same trees for
/// tree-backed documents, the same shared document otherwise. A lazy entry
/// is never loaded just to compare it.
#[derive(Clone)]
pub struct ConfigurationEntry {
    namespace: String,
    precedence: i32,
    optional: bool,
    null_values: NullValues,
    origin: String,
    document: Arc<Document>,
}

impl ConfigurationEntry {
    /// Start building an entry that loads `source` and parses it with `mapper`.
    pub fn builder<S, M>(source: S, mapper: M) -> EntryBuilder
    where
        S: Source + 'static,
        M: Mapper + 'static,
    {
        EntryBuilder::new(Box::new(source), Box::new(mapper))
    }

    /// An already-loaded entry over a tree. No source or mapper is involved.
    ///
    /// Metadata defaults to the default namespace, precedence 0, required,
    /// natural-zero sentinels.
    pub fn from_tree(tree: Value) -> Self {
        Self::loaded(
            "<tree>",
            Arc::new(TreeAccessor::new(tree)),
            NullValues::default(),
        )
    }

    /// An already-loaded entry over any accessor.
    pub fn from_accessor(accessor: Arc<dyn Accessor>) -> Self {
        Self::loaded("<accessor>", accessor, NullValues::default())
    }

    fn loaded(origin: &str, accessor: Arc<dyn Accessor>, null_values: NullValues) -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            precedence: 0,
            optional: false,
            null_values,
            origin: origin.to_string(),
            document: Arc::new(Document::Loaded(accessor)),
        }
    }

    /// Copy of this entry in `namespace`, sharing the document.
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_precedence(mut self, precedence: i32) -> Self {
        self.precedence = precedence;
        self
    }

    /// Copy of this entry using `null_values` as its sentinel policy.
    ///
    /// For tree-backed entries the accessor is rebuilt so that misses answer
    /// with the new sentinels; the copy then no longer shares the document.
    /// A lazy entry stays lazy: the copy gets its own unloaded cell over the
    /// same source and mapper.
    pub fn with_null_values(mut self, null_values: NullValues) -> Self {
        let document = match &*self.document {
            Document::Lazy { loader, .. } => Some(Document::Lazy {
                loader: Arc::clone(loader),
                cell: OnceLock::new(),
            }),
            Document::Loaded(accessor) => accessor.tree().map(|tree| {
                Document::Loaded(Arc::new(TreeAccessor::with_null_values(
                    tree.clone(),
                    null_values.clone(),
                )))
            }),
        };
        if let Some(document) = document {
            self.document = Arc::new(document);
        }
        self.null_values = null_values;
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn marked_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn precedence(&self) -> i32 {
        self.precedence
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn null_values(&self) -> &NullValues {
        &self.null_values
    }

    /// Where the document came from (source name, or `<tree>` for synthetic entries).
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn is_lazy(&self) -> bool {
        matches!(*self.document, Document::Lazy { .. })
    }

    /// Whether the document has been loaded (always true for eager entries).
    pub fn is_loaded(&self) -> bool {
        match &*self.document {
            Document::Loaded(_) => true,
            Document::Lazy { cell, .. } => cell.get().is_some(),
        }
    }

    /// The document accessor, loading it first if the entry is lazy.
    ///
    /// # Errors
    ///
    /// For a lazy, required entry whose source or mapper failed. The failure
    /// is cached; later calls return the same errors without reloading.
    pub fn document(&self) -> Result<&Arc<dyn Accessor>, ConfigErrors> {
        match &*self.document {
            Document::Loaded(accessor) => Ok(accessor),
            Document::Lazy { loader, cell } => cell
                .get_or_init(|| {
                    let result = load_document(loader, self.optional, &self.null_values);
                    if let Err(errors) = &result {
                        warn!(
                            origin = %self.origin,
                            namespace = %self.namespace,
                            error = %errors.first(),
                            "lazy configuration entry failed to load"
                        );
                    }
                    result
                })
                .as_ref()
                .map_err(Clone::clone),
        }
    }

    /// Force loading. A no-op for eager entries.
    pub fn load(&self) -> Result<(), ConfigErrors> {
        self.document().map(|_| ())
    }

    /// The parsed tree, if the document is loaded and tree-backed.
    pub fn tree(&self) -> Option<&Value> {
        self.document().ok().and_then(|accessor| accessor.tree())
    }

    /// The tree of an already-materialized document. Never triggers a load.
    fn materialized_tree(&self) -> Option<&Value> {
        match &*self.document {
            Document::Loaded(accessor) => accessor.tree(),
            Document::Lazy { cell, .. } => match cell.get() {
                Some(Ok(accessor)) => accessor.tree(),
                _ => None,
            },
        }
    }

    fn same_document(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.document, &other.document) {
            return true;
        }
        match (self.materialized_tree(), other.materialized_tree()) {
            (Some(left), Some(right)) => left == right,
            _ => false,
        }
    }

    /// Read `key` as `T`, or `None` when the document has no real value for it.
    ///
    /// A value equal to this entry's own sentinel counts as absent. A lazy
    /// entry that failed to load has no values.
    pub fn lookup<T: Scalar>(&self, key: &str) -> Option<T> {
        let accessor = self.document().ok()?;
        let value = T::read(accessor.as_ref(), key);
        if value.is_null(&self.null_values) {
            None
        } else {
            Some(value)
        }
    }
}

fn load_document(
    loader: &Loader,
    optional: bool,
    null_values: &NullValues,
) -> Result<Arc<dyn Accessor>, ConfigErrors> {
    let env = loader.env.as_ref();
    let raw = if optional {
        match loader.source.load_optionally(env) {
            Some(raw) => raw,
            None => {
                debug!(
                    source = loader.source.name(),
                    "optional source unavailable; using empty document"
                );
                return Ok(Arc::new(EmptyAccessor::new(null_values.clone())));
            }
        }
    } else {
        loader.source.load(env)?
    };

    let document = loader.mapper.apply(&raw)?;
    debug!(
        source = loader.source.name(),
        mapper = loader.mapper.name(),
        "loaded configuration document"
    );
    Ok(loader.mapper.accessor_for(document, null_values))
}

impl PartialEq for ConfigurationEntry {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace
            && self.precedence == other.precedence
            && self.optional == other.optional
            && self.null_values == other.null_values
            && self.same_document(other)
    }
}

impl fmt::Debug for ConfigurationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationEntry")
            .field("namespace", &self.namespace)
            .field("precedence", &self.precedence)
            .field("optional", &self.optional)
            .field("origin", &self.origin)
            .field("lazy", &self.is_lazy())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// Builder for source-backed entries.
pub struct EntryBuilder {
    source: Box<dyn Source>,
    mapper: Box<dyn Mapper>,
    namespace: String,
    precedence: i32,
    optional: bool,
    null_values: NullValues,
    lazy: bool,
    env: Arc<dyn ConfigEnv>,
}

impl EntryBuilder {
    pub fn new(source: Box<dyn Source>, mapper: Box<dyn Mapper>) -> Self {
        Self {
            source,
            mapper,
            namespace: DEFAULT_NAMESPACE.to_string(),
            precedence: 0,
            optional: false,
            null_values: NullValues::default(),
            lazy: false,
            env: Arc::new(RealEnv::new()),
        }
    }

    /// Namespace bucket for the entry; empty means the default namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Higher precedence wins on key collisions.
    pub fn precedence(mut self, precedence: i32) -> Self {
        self.precedence = precedence;
        self
    }

    /// Tolerate source failures: the entry then holds an empty document.
    ///
    /// Parse failures of content that *was* loaded are still errors.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Fail when the source cannot be loaded (default).
    pub fn required(mut self) -> Self {
        self.optional = false;
        self
    }

    /// Sentinel policy of this document.
    pub fn null_values(mut self, null_values: NullValues) -> Self {
        self.null_values = null_values;
        self
    }

    /// Defer loading to first access.
    ///
    /// `build` then never fails; source and mapper errors surface from
    /// [`ConfigurationEntry::document`] / [`ConfigurationEntry::load`].
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    /// Load during `build` (default).
    pub fn eager(mut self) -> Self {
        self.lazy = false;
        self
    }

    /// Environment used for I/O. Defaults to [`RealEnv`].
    pub fn env(mut self, env: Arc<dyn ConfigEnv>) -> Self {
        self.env = env;
        self
    }

    pub fn build(self) -> Result<ConfigurationEntry, ConfigErrors> {
        let origin = self.source.name().to_string();
        let loader = Arc::new(Loader {
            source: self.source,
            mapper: self.mapper,
            env: self.env,
        });

        let document = if self.lazy {
            Document::Lazy {
                loader,
                cell: OnceLock::new(),
            }
        } else {
            Document::Loaded(load_document(&loader, self.optional, &self.null_values)?)
        };

        Ok(ConfigurationEntry {
            namespace: self.namespace,
            precedence: self.precedence,
            optional: self.optional,
            null_values: self.null_values,
            origin,
            document: Arc::new(document),
        })
    }
}
