use std::marker::PhantomData;

use stillwater::Semigroup;
use tracing::{debug, trace};

use crate::entry::ConfigurationEntry;
use crate::error::{ConfigError, ConfigErrors};
use crate::merge::options::MergeOptions;
use crate::merge::tree::{TreeProvider, ValueTree};
use crate::path::CompiledPath;
use crate::value::Value;

/// Precedence-aware structural merge over any [`TreeProvider`].
///
/// Objects merge recursively. Arrays merge by union: the higher-precedence
/// array first, then the lower-precedence elements it does not already hold,
/// compared by identity keys when [`MergeOptions`] registers some for the
/// array's path and by whole value otherwise. Everything else, including
/// type mismatches, resolves to the higher-precedence side.
///
/// Inputs are never modified; the result shares nothing with them.
pub struct MergeEngine<P>(PhantomData<P>);

impl<P: TreeProvider> MergeEngine<P> {
    /// Merge two documents. On equal precedence `left` wins.
    pub fn merge(
        left: &P::Node,
        right: &P::Node,
        left_precedence: i32,
        right_precedence: i32,
        options: &MergeOptions,
    ) -> P::Node {
        let (hi, lo) = if right_precedence > left_precedence {
            (right, left)
        } else {
            (left, right)
        };
        Self::merge_node(hi, lo, &CompiledPath::root(), options)
    }

    /// Like [`merge`](Self::merge), with either side possibly absent.
    ///
    /// One absent side yields a copy of the other.
    pub fn merge_optional(
        left: Option<&P::Node>,
        right: Option<&P::Node>,
        left_precedence: i32,
        right_precedence: i32,
        options: &MergeOptions,
    ) -> Option<P::Node> {
        match (left, right) {
            (Some(left), Some(right)) => Some(Self::merge(
                left,
                right,
                left_precedence,
                right_precedence,
                options,
            )),
            (Some(only), None) | (None, Some(only)) => Some(only.clone()),
            (None, None) => None,
        }
    }

    fn merge_node(
        hi: &P::Node,
        lo: &P::Node,
        path: &CompiledPath,
        options: &MergeOptions,
    ) -> P::Node {
        if P::is_object(hi) && P::is_object(lo) {
            Self::merge_objects(hi, lo, path, options)
        } else if P::is_array(hi) && P::is_array(lo) {
            Self::merge_arrays(hi, lo, path, options)
        } else {
            hi.clone()
        }
    }

    fn merge_objects(
        hi: &P::Node,
        lo: &P::Node,
        path: &CompiledPath,
        options: &MergeOptions,
    ) -> P::Node {
        let mut result = P::new_object();

        for (key, hi_value) in P::entries(hi) {
            let merged = match P::get(lo, key) {
                Some(lo_value) => Self::merge_node(hi_value, lo_value, &path.child(key), options),
                None => hi_value.clone(),
            };
            P::put(&mut result, key.to_string(), merged);
        }

        for (key, lo_value) in P::entries(lo) {
            if P::get(hi, key).is_none() {
                P::put(&mut result, key.to_string(), lo_value.clone());
            }
        }

        result
    }

    fn merge_arrays(
        hi: &P::Node,
        lo: &P::Node,
        path: &CompiledPath,
        options: &MergeOptions,
    ) -> P::Node {
        let mut result = hi.clone();
        let keys = options.identity_keys(path);

        for element in P::elements(lo) {
            let duplicate = match keys {
                Some(keys) if P::is_object(element) => {
                    let identity = identity_of::<P>(element, keys);
                    if identity.iter().all(Option::is_none) {
                        trace!(path = %path, "skipping element without identity keys");
                        continue;
                    }
                    P::elements(&result).iter().any(|existing| {
                        P::is_object(existing) && identity_of::<P>(existing, keys) == identity
                    })
                }
                _ => P::contains(&result, element),
            };

            if duplicate {
                trace!(path = %path, "dropping duplicate array element");
            } else {
                P::push(&mut result, element.clone());
            }
        }

        result
    }
}

fn identity_of<'a, P: TreeProvider>(
    node: &'a P::Node,
    keys: &[String],
) -> Vec<Option<&'a P::Node>> {
    keys.iter().map(|key| P::get(node, key)).collect()
}

/// Merge two entries into a new, already-loaded entry.
///
/// The result carries the namespace, precedence, optionality and sentinel
/// policy of the higher-precedence side (`left` on a tie). Lazy entries are
/// loaded first.
///
/// # Errors
///
/// The load errors of a lazy entry, or a `Precondition` error for an entry
/// whose document is not tree-backed. Problems with both sides are reported
/// together.
pub fn merge_entries(
    left: &ConfigurationEntry,
    right: &ConfigurationEntry,
    options: &MergeOptions,
) -> Result<ConfigurationEntry, ConfigErrors> {
    let (left_tree, right_tree) = match (tree_of(left), tree_of(right)) {
        (Ok(l), Ok(r)) => (l, r),
        (Err(e), Ok(_)) | (Ok(_), Err(e)) => return Err(e),
        (Err(l), Err(r)) => return Err(l.combine(r)),
    };

    let merged = MergeEngine::<ValueTree>::merge(
        left_tree,
        right_tree,
        left.precedence(),
        right.precedence(),
        options,
    );

    let (hi, lo) = if right.precedence() > left.precedence() {
        (right, left)
    } else {
        (left, right)
    };
    debug!(hi = hi.origin(), lo = lo.origin(), "merged configuration entries");

    Ok(ConfigurationEntry::from_tree(merged)
        .in_namespace(hi.namespace())
        .with_precedence(hi.precedence())
        .marked_optional(hi.is_optional())
        .with_null_values(hi.null_values().clone())
        .with_origin(format!("merge({}, {})", hi.origin(), lo.origin())))
}

fn tree_of(entry: &ConfigurationEntry) -> Result<&Value, ConfigErrors> {
    entry.document()?.tree().ok_or_else(|| {
        ConfigErrors::single(ConfigError::Precondition {
            message: format!(
                "entry '{}' is not backed by a document tree and cannot be merged",
                entry.origin()
            ),
        })
    })
}
