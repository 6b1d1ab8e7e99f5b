//! The configuration registry.
//!
//! A registry holds entries grouped by namespace and answers typed lookups
//! by asking its [`FetchStrategy`] for the probe order and returning the
//! first value that is not the probed entry's own sentinel.
//!
//! # Example
//!
//! ```ignore
//! use strata::{ConfigurationEntry, ConfigurationRegistry};
//! use strata::mappers::{JsonMapper, PropertiesMapper};
//! use strata::sources::{Env, File};
//!
//! let registry = ConfigurationRegistry::builder()
//!     .entry(ConfigurationEntry::builder(File::new("defaults.json"), JsonMapper))
//!     .entry(
//!         ConfigurationEntry::builder(Env::prefix("APP_"), PropertiesMapper)
//!             .precedence(100),
//!     )
//!     .build()?;
//!
//! let port = registry.get_int("server.port");
//! ```

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, trace};

use crate::entry::{ConfigurationEntry, EntryBuilder, DEFAULT_NAMESPACE};
use crate::env::ConfigEnv;
use crate::error::{finish, ConfigError, ConfigErrors};
use crate::merge::{merge_entries, MergeOptions};
use crate::null_value::{NullValues, Scalar};
use crate::strategy::{EntryIndex, FetchStrategy};
use crate::value::Value;

/// Behaviour of a registry, fixed at construction.
///
/// Can itself be read from a configuration document:
///
/// ```text
/// strategy = "lenient"
///
/// [null_values]
/// int = -1
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    pub strategy: FetchStrategy,
    /// The value a lookup returns when no entry has the key.
    pub null_values: NullValues,
}

impl RegistrySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: FetchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_null_values(mut self, null_values: NullValues) -> Self {
        self.null_values = null_values;
        self
    }

    /// Read settings from a document tree. Missing fields keep their defaults.
    pub fn from_tree(tree: &Value) -> Result<Self, ConfigErrors> {
        serde_json::from_value(tree.to_json()).map_err(|e| {
            ConfigErrors::single(ConfigError::SettingsError {
                message: e.to_string(),
            })
        })
    }
}

/// Entries grouped by namespace plus the settings used to resolve them.
///
/// Reads take `&self` and never lock. To change a registry that other
/// threads read, build a new one and publish it by swapping an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationRegistry {
    settings: RegistrySettings,
    index: EntryIndex,
}

impl ConfigurationRegistry {
    pub fn new(settings: RegistrySettings) -> Self {
        Self {
            settings,
            index: EntryIndex::new(),
        }
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn strategy(&self) -> FetchStrategy {
        self.settings.strategy
    }

    pub fn null_values(&self) -> &NullValues {
        &self.settings.null_values
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// Register an entry in its own namespace.
    ///
    /// Returns `false` (and changes nothing) if an equal entry is already
    /// registered.
    pub fn add(&mut self, entry: ConfigurationEntry) -> bool {
        let bucket = self.index.entry(entry.namespace().to_string()).or_default();
        if bucket.contains(&entry) {
            trace!(origin = entry.origin(), "entry already registered");
            return false;
        }

        debug!(
            origin = entry.origin(),
            namespace = entry.namespace(),
            precedence = entry.precedence(),
            "registered configuration entry"
        );
        bucket.push(entry);
        true
    }

    /// Copy every entry of `other` into this registry.
    pub fn add_all(&mut self, other: &ConfigurationRegistry) {
        for entry in other.index.values().flatten() {
            self.add(entry.clone());
        }
    }

    pub fn clear(&mut self) {
        debug!(entries = self.len(), "cleared configuration registry");
        self.index.clear();
    }

    /// How many entries a lookup in `namespace` can probe.
    pub fn size(&self, namespace: &str) -> usize {
        self.entries(namespace).len()
    }

    /// The entries a lookup in `namespace` probes, in probe order.
    pub fn entries(&self, namespace: &str) -> Vec<&ConfigurationEntry> {
        self.settings.strategy.resolve(namespace, &self.index)
    }

    /// Namespaces holding at least one entry, sorted.
    pub fn namespaces(&self) -> Vec<&str> {
        self.index
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(namespace, _)| namespace.as_str())
            .collect()
    }

    /// Total number of registered entries.
    pub fn len(&self) -> usize {
        self.index.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up `key` in the default namespace.
    pub fn get<T: Scalar>(&self, key: &str) -> T {
        self.get_in(DEFAULT_NAMESPACE, key)
    }

    /// Look up `key` in `namespace`.
    ///
    /// Entries are probed in strategy order and probing stops at the first
    /// entry whose value is not its own sentinel. When none has one, the
    /// registry's sentinel is returned.
    pub fn get_in<T: Scalar>(&self, namespace: &str, key: &str) -> T {
        self.entries(namespace)
            .into_iter()
            .find_map(|entry| entry.lookup::<T>(key))
            .unwrap_or_else(|| self.settings.null_values.sentinel())
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
    }

    pub fn get_bool_in(&self, namespace: &str, key: &str) -> bool {
        self.get_in(namespace, key)
    }

    pub fn get_int(&self, key: &str) -> i32 {
        self.get(key)
    }

    pub fn get_int_in(&self, namespace: &str, key: &str) -> i32 {
        self.get_in(namespace, key)
    }

    pub fn get_long(&self, key: &str) -> i64 {
        self.get(key)
    }

    pub fn get_long_in(&self, namespace: &str, key: &str) -> i64 {
        self.get_in(namespace, key)
    }

    pub fn get_double(&self, key: &str) -> f64 {
        self.get(key)
    }

    pub fn get_double_in(&self, namespace: &str, key: &str) -> f64 {
        self.get_in(namespace, key)
    }

    pub fn get_string(&self, key: &str) -> String {
        self.get(key)
    }

    pub fn get_string_in(&self, namespace: &str, key: &str) -> String {
        self.get_in(namespace, key)
    }

    /// Resolve `key` like [`get_in`](Self::get_in), recording every probe.
    ///
    /// Probing stops at the winner exactly as a lookup does, so entries after
    /// it do not appear.
    pub fn explain<T: Scalar>(&self, namespace: &str, key: &str) -> Resolution<T> {
        let mut probes = Vec::new();

        for entry in self.entries(namespace) {
            let read = entry.document().ok().map(|doc| T::read(doc.as_ref(), key));
            let hit = read
                .as_ref()
                .is_some_and(|value| !value.is_null(entry.null_values()));
            trace!(origin = entry.origin(), key, hit, "probed entry");

            probes.push(Probe {
                origin: entry.origin().to_string(),
                namespace: entry.namespace().to_string(),
                precedence: entry.precedence(),
                value: read,
                hit,
            });
            if hit {
                break;
            }
        }

        let value = probes
            .last()
            .filter(|probe| probe.hit)
            .and_then(|probe| probe.value.clone())
            .unwrap_or_else(|| self.settings.null_values.sentinel());

        Resolution {
            namespace: namespace.to_string(),
            key: key.to_string(),
            value,
            probes,
        }
    }

    /// Merge every entry of `namespace` into one, in probe order.
    ///
    /// Entries without a document tree are skipped. Returns `Ok(None)` when
    /// no entry can be merged.
    ///
    /// # Errors
    ///
    /// The load errors of lazy entries that failed, all of them together.
    pub fn merged(
        &self,
        namespace: &str,
        options: &MergeOptions,
    ) -> Result<Option<ConfigurationEntry>, ConfigErrors> {
        let mut errors = Vec::new();
        let mut merged: Option<ConfigurationEntry> = None;

        for entry in self.entries(namespace) {
            match entry.document() {
                Err(e) => {
                    errors.extend(e);
                    continue;
                }
                Ok(doc) if doc.tree().is_none() => {
                    debug!(origin = entry.origin(), "skipping entry without a tree in merge");
                    continue;
                }
                Ok(_) => {}
            }

            merged = Some(match merged {
                None => entry.clone(),
                Some(acc) => merge_entries(&acc, entry, options)?,
            });
        }

        finish(merged, errors)
    }
}

/// Outcome of [`ConfigurationRegistry::explain`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<T> {
    pub namespace: String,
    pub key: String,
    /// What a lookup returns
    pub value: T,
    /// Entries probed, in order
    pub probes: Vec<Probe<T>>,
}

/// One entry consulted during a lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Probe<T> {
    pub origin: String,
    pub namespace: String,
    pub precedence: i32,
    /// The raw value read, or `None` if the entry's document failed to load.
    pub value: Option<T>,
    /// Whether this probe ended the lookup.
    pub hit: bool,
}

impl<T> Resolution<T> {
    /// The probe that supplied the value.
    pub fn winner(&self) -> Option<&Probe<T>> {
        self.probes.last().filter(|probe| probe.hit)
    }

    /// Whether no entry had the key and the registry's sentinel was used.
    pub fn is_fallback(&self) -> bool {
        self.winner().is_none()
    }
}

impl<T: fmt::Debug> fmt::Display for Resolution<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let namespace = if self.namespace.is_empty() {
            "(default)"
        } else {
            &self.namespace
        };
        writeln!(f, "{} in {} = {:?}", self.key, namespace, self.value)?;

        for probe in &self.probes {
            let marker = if probe.hit { "<- used" } else { "" };
            match &probe.value {
                Some(value) => writeln!(
                    f,
                    "  {} (precedence {}): {:?} {}",
                    probe.origin, probe.precedence, value, marker
                )?,
                None => writeln!(
                    f,
                    "  {} (precedence {}): <failed to load>",
                    probe.origin, probe.precedence
                )?,
            }
        }

        if self.is_fallback() {
            writeln!(f, "  no entry has this key; registry sentinel used")?;
        }
        Ok(())
    }
}

enum Pending {
    Build(EntryBuilder),
    Ready(ConfigurationEntry),
}

/// Builds a registry from entry builders, collecting every load failure.
pub struct RegistryBuilder {
    settings: RegistrySettings,
    pending: Vec<Pending>,
    env: Option<Arc<dyn ConfigEnv>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            settings: RegistrySettings::default(),
            pending: Vec::new(),
            env: None,
        }
    }

    pub fn settings(mut self, settings: RegistrySettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn strategy(mut self, strategy: FetchStrategy) -> Self {
        self.settings.strategy = strategy;
        self
    }

    pub fn null_values(mut self, null_values: NullValues) -> Self {
        self.settings.null_values = null_values;
        self
    }

    /// Environment used by every entry builder added to this registry.
    pub fn env(mut self, env: Arc<dyn ConfigEnv>) -> Self {
        self.env = Some(env);
        self
    }

    /// Add an entry to be built by [`build`](Self::build).
    pub fn entry(mut self, builder: EntryBuilder) -> Self {
        self.pending.push(Pending::Build(builder));
        self
    }

    /// Add an entry that is already built.
    pub fn add(mut self, entry: ConfigurationEntry) -> Self {
        self.pending.push(Pending::Ready(entry));
        self
    }

    /// Build every entry and register them in order.
    ///
    /// # Errors
    ///
    /// All entry failures, not just the first.
    pub fn build(self) -> Result<ConfigurationRegistry, ConfigErrors> {
        let mut registry = ConfigurationRegistry::new(self.settings);
        let mut errors = Vec::new();

        for pending in self.pending {
            let built = match pending {
                Pending::Ready(entry) => Ok(entry),
                Pending::Build(builder) => match &self.env {
                    Some(env) => builder.env(Arc::clone(env)).build(),
                    None => builder.build(),
                },
            };

            match built {
                Ok(entry) => {
                    registry.add(entry);
                }
                Err(e) => errors.extend(e),
            }
        }

        finish(registry, errors)
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::{Accessor, EmptyAccessor};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use crate::env::MockEnv;
    use crate::mappers::JsonMapper;
    use crate::merge::MergeOption;
    use crate::sources::File;
    use serde_json::json;

    fn tree(json: serde_json::Value) -> ConfigurationEntry {
        ConfigurationEntry::from_tree(Value::from_json(&json))
    }

    fn registry(strategy: FetchStrategy) -> ConfigurationRegistry {
        ConfigurationRegistry::new(RegistrySettings::new().with_strategy(strategy))
    }

    #[test]
    fn test_highest_precedence_wins() {
        let mut reg = ConfigurationRegistry::default();
        reg.add(tree(json!({"port": 80})).with_precedence(1).with_origin("low"));
        reg.add(tree(json!({"port": 8080})).with_precedence(10).with_origin("high"));

        assert_eq!(reg.get_int("port"), 8080);
        assert_eq!(reg.get_string("port"), "8080");
    }

    #[test]
    fn test_falls_through_entries_without_the_key() {
        let mut reg = ConfigurationRegistry::default();
        reg.add(tree(json!({"a": "top"})).with_precedence(10));
        reg.add(tree(json!({"b": "bottom"})).with_precedence(1));

        assert_eq!(reg.get_string("a"), "top");
        assert_eq!(reg.get_string("b"), "bottom");
    }

    #[test]
    fn test_fallback_uses_registry_sentinel() {
        let reg = ConfigurationRegistry::new(
            RegistrySettings::new()
                .with_null_values(NullValues::new().with_int(-1).with_string("?")),
        );
        assert_eq!(reg.get_int("missing"), -1);
        assert_eq!(reg.get_string_in("nowhere", "missing"), "?");
    }

    #[test]
    fn test_entry_sentinel_is_treated_as_absent() {
        let mut reg = ConfigurationRegistry::default();
        reg.add(
            tree(json!({"workers": -1}))
                .with_precedence(10)
                .with_null_values(NullValues::new().with_int(-1)),
        );
        reg.add(tree(json!({"workers": 4})).with_precedence(1));

        assert_eq!(reg.get_int("workers"), 4);
    }

    #[test]
    fn test_namespace_isolation_under_strict() {
        let mut reg = ConfigurationRegistry::default();
        reg.add(tree(json!({"secret": "x"})).in_namespace("x"));

        assert_eq!(reg.get_string("secret"), "");
        assert_eq!(reg.get_string_in("y", "secret"), "");
        assert_eq!(reg.get_string_in("x", "secret"), "x");
    }

    #[test]
    fn test_lenient_default_namespace_sees_named_entries() {
        let mut reg = registry(FetchStrategy::Lenient);
        reg.add(tree(json!({"k": "named"})).in_namespace("x").with_precedence(5));
        reg.add(tree(json!({"k": "default"})).with_precedence(1));

        assert_eq!(reg.get_string("k"), "named");
        assert_eq!(reg.get_string_in("y", "k"), "");
        assert_eq!(reg.size(""), 2);
        assert_eq!(reg.size("x"), 1);
    }

    #[test]
    fn test_unsorted_strict_uses_insertion_order() {
        let mut reg = registry(FetchStrategy::UnsortedStrict);
        reg.add(tree(json!({"k": "first"})).with_precedence(1));
        reg.add(tree(json!({"k": "second"})).with_precedence(100));

        assert_eq!(reg.get_string("k"), "first");
    }

    #[test]
    fn test_equal_precedence_keeps_insertion_order() {
        let mut reg = ConfigurationRegistry::default();
        reg.add(tree(json!({"k": "first"})));
        reg.add(tree(json!({"k": "second"})));

        assert_eq!(reg.get_string("k"), "first");
    }

    #[test]
    fn test_add_dedups_equal_entries() {
        let mut reg = ConfigurationRegistry::default();
        let entry = tree(json!({"a": 1}));

        assert!(reg.add(entry.clone()));
        assert!(!reg.add(entry.clone()));
        assert!(!reg.add(tree(json!({"a": 1}))));
        assert!(reg.add(tree(json!({"a": 1})).with_precedence(2)));
        assert!(reg.add(tree(json!({"a": 2}))));
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn test_add_all_clear_and_namespaces() {
        let mut source = ConfigurationRegistry::default();
        source.add(tree(json!({})).in_namespace("b"));
        source.add(tree(json!({})).in_namespace("a"));
        source.add(tree(json!({})));

        let mut target = ConfigurationRegistry::default();
        target.add_all(&source);
        target.add_all(&source);

        assert_eq!(target.len(), 3);
        assert_eq!(target.namespaces(), vec!["", "a", "b"]);

        target.clear();
        assert!(target.is_empty());
        assert!(target.namespaces().is_empty());
        assert_eq!(target.size(""), 0);
        assert_eq!(source.len(), 3);
    }

    #[test]
    fn test_typed_getters() {
        let mut reg = ConfigurationRegistry::default();
        reg.add(
            tree(json!({
                "flag": true,
                "count": 3,
                "big": 5_000_000_000i64,
                "ratio": 0.5,
                "name": "n"
            }))
            .in_namespace("ns"),
        );

        assert!(reg.get_bool_in("ns", "flag"));
        assert_eq!(reg.get_int_in("ns", "count"), 3);
        assert_eq!(reg.get_long_in("ns", "big"), 5_000_000_000);
        assert_eq!(reg.get_double_in("ns", "ratio"), 0.5);
        assert_eq!(reg.get_string_in("ns", "name"), "n");
        assert!(!reg.get_bool("flag"));
        assert_eq!(reg.get_long("big"), 0);
        assert_eq!(reg.get_double("ratio"), 0.0);
    }

    #[test]
    fn test_explain_stops_at_winner() {
        let mut reg = ConfigurationRegistry::default();
        reg.add(tree(json!({"other": 1})).with_precedence(10).with_origin("top"));
        reg.add(tree(json!({"port": 81})).with_precedence(5).with_origin("middle"));
        reg.add(tree(json!({"port": 82})).with_precedence(1).with_origin("bottom"));

        let resolution = reg.explain::<i32>("", "port");
        assert_eq!(resolution.value, 81);
        assert_eq!(resolution.probes.len(), 2);
        assert_eq!(resolution.probes[0].value, Some(0));
        assert!(!resolution.probes[0].hit);
        assert_eq!(resolution.winner().map(|p| p.origin.as_str()), Some("middle"));
        assert!(!resolution.is_fallback());
        assert!(resolution.to_string().contains("middle (precedence 5): 81 <- used"));
    }

    #[derive(Default)]
    struct CountingAccessor {
        reads: AtomicUsize,
    }

    impl Accessor for CountingAccessor {
        fn get_bool(&self, _key: &str) -> bool {
            self.reads.fetch_add(1, Ordering::SeqCst);
            true
        }

        fn get_int(&self, _key: &str) -> i32 {
            self.reads.fetch_add(1, Ordering::SeqCst);
            7
        }

        fn get_long(&self, _key: &str) -> i64 {
            self.reads.fetch_add(1, Ordering::SeqCst);
            7
        }

        fn get_double(&self, _key: &str) -> f64 {
            self.reads.fetch_add(1, Ordering::SeqCst);
            7.0
        }

        fn get_string(&self, _key: &str) -> String {
            self.reads.fetch_add(1, Ordering::SeqCst);
            "7".to_string()
        }
    }

    #[test]
    fn test_lookup_stops_at_first_hit() {
        let counters: Vec<Arc<CountingAccessor>> =
            (0..6).map(|_| Arc::new(CountingAccessor::default())).collect();

        let mut reg = ConfigurationRegistry::default();
        for (i, counter) in counters.iter().enumerate() {
            let accessor: Arc<dyn Accessor> = Arc::clone(counter) as Arc<dyn Accessor>;
            reg.add(ConfigurationEntry::from_accessor(accessor).with_precedence(10 - i as i32));
        }

        assert_eq!(reg.get_int("anything"), 7);
        let reads: Vec<usize> = counters
            .iter()
            .map(|c| c.reads.load(Ordering::SeqCst))
            .collect();
        assert_eq!(reads, vec![1, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_explain_fallback() {
        let mut reg = ConfigurationRegistry::default();
        reg.add(tree(json!({})));

        let resolution = reg.explain::<String>("", "missing");
        assert!(resolution.is_fallback());
        assert_eq!(resolution.value, "");
        assert_eq!(resolution.probes.len(), 1);
    }

    #[test]
    fn test_lazy_failure_is_skipped_by_lookups() {
        let env: Arc<dyn ConfigEnv> =
            Arc::new(MockEnv::new().with_file("ok.json", r#"{"k": "ok"}"#));
        let reg = ConfigurationRegistry::builder()
            .env(env)
            .entry(
                ConfigurationEntry::builder(File::new("missing.json"), JsonMapper)
                    .precedence(10)
                    .lazy(),
            )
            .entry(ConfigurationEntry::builder(File::new("ok.json"), JsonMapper))
            .build()
            .unwrap();

        assert_eq!(reg.get_string("k"), "ok");
        let resolution = reg.explain::<String>("", "k");
        assert_eq!(resolution.probes[0].value, None);
    }

    #[test]
    fn test_builder_accumulates_all_errors() {
        let env: Arc<dyn ConfigEnv> = Arc::new(MockEnv::new().with_file("bad.json", "{"));
        let errors = ConfigurationRegistry::builder()
            .env(env)
            .entry(ConfigurationEntry::builder(File::new("missing.json"), JsonMapper))
            .entry(ConfigurationEntry::builder(File::new("bad.json"), JsonMapper))
            .entry(ConfigurationEntry::builder(File::new("optional.json"), JsonMapper).optional())
            .build()
            .unwrap_err();

        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_merged_folds_namespace() {
        let mut reg = ConfigurationRegistry::default();
        reg.add(tree(json!({"items": [{"id": 1, "v": "low"}], "a": 1})).with_precedence(1));
        reg.add(tree(json!({"items": [{"id": 1, "v": "high"}, {"id": 2}]})).with_precedence(9));
        reg.add(tree(json!({"b": 2})).with_precedence(5));
        reg.add(ConfigurationEntry::from_accessor(Arc::new(EmptyAccessor::default())));

        let options = MergeOptions::new().with(MergeOption::new("items", ["id"]).unwrap());
        let merged = reg.merged("", &options).unwrap().unwrap();

        assert_eq!(merged.precedence(), 9);
        assert_eq!(
            merged.tree().map(Value::to_json),
            Some(json!({"items": [{"id": 1, "v": "high"}, {"id": 2}], "a": 1, "b": 2}))
        );
        assert!(reg.merged("empty", &options).unwrap().is_none());
    }

    #[test]
    fn test_settings_from_tree() {
        let settings = RegistrySettings::from_tree(&Value::from_json(&json!({
            "strategy": "unsorted_lenient",
            "null_values": {"int": -1}
        })))
        .unwrap();

        assert_eq!(settings.strategy, FetchStrategy::UnsortedLenient);
        assert_eq!(settings.null_values.int, -1);
        assert_eq!(settings.null_values.string, "");

        let defaults = RegistrySettings::from_tree(&Value::table()).unwrap();
        assert_eq!(defaults, RegistrySettings::default());

        let bad = RegistrySettings::from_tree(&Value::from_json(&json!({"strategy": "fastest"})));
        assert!(matches!(
            bad.unwrap_err().first(),
            ConfigError::SettingsError { .. }
        ));
    }

    #[test]
    fn test_registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConfigurationRegistry>();
    }
}
