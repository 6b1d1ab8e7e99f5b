//! Precedence resolution.
//!
//! A `FetchStrategy` decides which entries a lookup probes and in what
//! order. The set of strategies is closed: four pure functions over the
//! registry's namespace index, selected by tag.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entry::{ConfigurationEntry, DEFAULT_NAMESPACE};
use crate::error::{ConfigError, ConfigErrors};

/// Entries grouped by namespace. Each bucket keeps insertion order.
pub type EntryIndex = BTreeMap<String, Vec<ConfigurationEntry>>;

/// Ordering policy used by a registry for every lookup.
///
/// | strategy           | namespace scope                        | order               |
/// |--------------------|----------------------------------------|---------------------|
/// | `UnsortedStrict`   | requested namespace only               | insertion           |
/// | `Strict`           | requested namespace only               | precedence, desc    |
/// | `UnsortedLenient`  | default namespace sees every namespace | insertion           |
/// | `Lenient`          | default namespace sees every namespace | precedence, desc    |
///
/// The lenient variants only widen the default namespace; any other
/// namespace resolves exactly as `Strict` does. Equal precedences keep
/// insertion order, with namespaces visited in sorted order for the union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    UnsortedStrict,
    #[default]
    Strict,
    UnsortedLenient,
    Lenient,
}

impl FetchStrategy {
    pub const ALL: [FetchStrategy; 4] = [
        FetchStrategy::UnsortedStrict,
        FetchStrategy::Strict,
        FetchStrategy::UnsortedLenient,
        FetchStrategy::Lenient,
    ];

    /// The entries a lookup in `namespace` probes, in probe order.
    ///
    /// Never mutates `index`. An unknown namespace yields an empty vector.
    pub fn resolve<'a>(
        &self,
        namespace: &str,
        index: &'a EntryIndex,
    ) -> Vec<&'a ConfigurationEntry> {
        match self {
            FetchStrategy::UnsortedStrict => bucket(namespace, index),
            FetchStrategy::Strict => sorted(bucket(namespace, index)),
            FetchStrategy::UnsortedLenient if namespace == DEFAULT_NAMESPACE => union(index),
            FetchStrategy::Lenient if namespace == DEFAULT_NAMESPACE => sorted(union(index)),
            FetchStrategy::UnsortedLenient | FetchStrategy::Lenient => {
                sorted(bucket(namespace, index))
            }
        }
    }

    /// Whether this strategy orders by precedence.
    pub fn is_sorted(&self) -> bool {
        matches!(self, FetchStrategy::Strict | FetchStrategy::Lenient)
    }

    pub fn is_lenient(&self) -> bool {
        matches!(
            self,
            FetchStrategy::UnsortedLenient | FetchStrategy::Lenient
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStrategy::UnsortedStrict => "unsorted_strict",
            FetchStrategy::Strict => "strict",
            FetchStrategy::UnsortedLenient => "unsorted_lenient",
            FetchStrategy::Lenient => "lenient",
        }
    }
}

fn bucket<'a>(namespace: &str, index: &'a EntryIndex) -> Vec<&'a ConfigurationEntry> {
    index
        .get(namespace)
        .map(|entries| entries.iter().collect())
        .unwrap_or_default()
}

fn union(index: &EntryIndex) -> Vec<&ConfigurationEntry> {
    index.values().flatten().collect()
}

// `sort_by` is stable, so ties keep their incoming order.
fn sorted(mut entries: Vec<&ConfigurationEntry>) -> Vec<&ConfigurationEntry> {
    entries.sort_by(|a, b| b.precedence().cmp(&a.precedence()));
    entries
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FetchStrategy {
    type Err = ConfigErrors;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FetchStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s.trim())
            .ok_or_else(|| {
                ConfigErrors::single(ConfigError::SettingsError {
                    message: format!(
                        "unknown fetch strategy '{}' (expected one of: {})",
                        s,
                        FetchStrategy::ALL
                            .iter()
                            .map(FetchStrategy::as_str)
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn entry(namespace: &str, precedence: i32, origin: &str) -> ConfigurationEntry {
        ConfigurationEntry::from_tree(Value::table())
            .in_namespace(namespace)
            .with_precedence(precedence)
            .with_origin(origin)
    }

    fn index() -> EntryIndex {
        let mut index = EntryIndex::new();
        index.insert(
            String::new(),
            vec![entry("", 1, "d1"), entry("", 5, "d5"), entry("", 1, "d1b")],
        );
        index.insert(
            "svc".to_string(),
            vec![entry("svc", 3, "s3"), entry("svc", 9, "s9")],
        );
        index
    }

    fn origins(entries: Vec<&ConfigurationEntry>) -> Vec<&str> {
        entries.into_iter().map(ConfigurationEntry::origin).collect()
    }

    #[test]
    fn test_unsorted_strict_keeps_insertion_order() {
        let index = index();
        assert_eq!(
            origins(FetchStrategy::UnsortedStrict.resolve("", &index)),
            vec!["d1", "d5", "d1b"]
        );
    }

    #[test]
    fn test_strict_sorts_descending_with_stable_ties() {
        let index = index();
        assert_eq!(
            origins(FetchStrategy::Strict.resolve("", &index)),
            vec!["d5", "d1", "d1b"]
        );
        assert_eq!(
            origins(FetchStrategy::Strict.resolve("svc", &index)),
            vec!["s9", "s3"]
        );
    }

    #[test]
    fn test_lenient_default_namespace_sees_everything() {
        let index = index();
        assert_eq!(
            origins(FetchStrategy::UnsortedLenient.resolve("", &index)),
            vec!["d1", "d5", "d1b", "s3", "s9"]
        );
        assert_eq!(
            origins(FetchStrategy::Lenient.resolve("", &index)),
            vec!["s9", "d5", "s3", "d1", "d1b"]
        );
    }

    #[test]
    fn test_lenient_named_namespace_behaves_like_strict() {
        let index = index();
        for strategy in [FetchStrategy::UnsortedLenient, FetchStrategy::Lenient] {
            assert_eq!(origins(strategy.resolve("svc", &index)), vec!["s9", "s3"]);
        }
    }

    #[test]
    fn test_unknown_namespace_is_empty() {
        let index = index();
        for strategy in FetchStrategy::ALL {
            assert!(strategy.resolve("nope", &index).is_empty());
        }
        assert!(FetchStrategy::Lenient.resolve("", &EntryIndex::new()).is_empty());
    }

    #[test]
    fn test_resolve_does_not_mutate_index() {
        let index = index();
        let before = origins(FetchStrategy::UnsortedStrict.resolve("", &index))
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        let _ = FetchStrategy::Strict.resolve("", &index);
        assert_eq!(
            origins(FetchStrategy::UnsortedStrict.resolve("", &index)),
            before
        );
    }

    #[test]
    fn test_names_round_trip() {
        for strategy in FetchStrategy::ALL {
            assert_eq!(strategy.to_string().parse::<FetchStrategy>().unwrap(), strategy);
        }
        assert!("sorted".parse::<FetchStrategy>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let parsed: FetchStrategy = serde_json::from_str("\"unsorted_lenient\"").unwrap();
        assert_eq!(parsed, FetchStrategy::UnsortedLenient);
        assert_eq!(
            serde_json::to_string(&FetchStrategy::Strict).unwrap(),
            "\"strict\""
        );
    }

    #[test]
    fn test_default_is_strict() {
        assert_eq!(FetchStrategy::default(), FetchStrategy::Strict);
        assert!(FetchStrategy::Strict.is_sorted());
        assert!(!FetchStrategy::Strict.is_lenient());
    }
}
