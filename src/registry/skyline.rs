// src/registry/skyline.rs

//! Candidate lists ordered by supported size with dominance pruning.
//!
//! For one (source, target) pair the registry keeps the smallest ordered
//! candidate list such that scanning from the front and taking the first
//! entry whose ceiling covers the input size always yields the best
//! available priority for that size. Entries are kept in non-decreasing
//! size-ceiling order with the unlimited ceiling (`-1`) last, and an entry
//! is dropped when a later-or-equal-sized entry has equal-or-better
//! priority (it could always be used instead). A lower envelope over the
//! two objectives, maintained incrementally at insertion time.

use std::cmp::Ordering;

use crate::config::{TransformOptionGroup, UNLIMITED_SIZE};

/// One selectable candidate: a transformer able to perform a specific
/// (source, target) conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedTransform {
    pub name: String,

    /// Root option group, logically required so that children are optional
    /// or required based on their own settings.
    pub options: TransformOptionGroup,

    /// Largest source the transformer accepts, `-1` for unlimited.
    pub max_source_size_bytes: i64,

    /// Lower is more preferred.
    pub priority: i32,

    pub core_version: Option<String>,
}

impl SupportedTransform {
    /// Whether this candidate's ceiling covers a source of `size` bytes.
    /// A negative `size` means "unknown" and is covered by everything.
    pub fn covers(&self, size: i64) -> bool {
        self.max_source_size_bytes == UNLIMITED_SIZE || self.max_source_size_bytes >= size
    }
}

impl std::fmt::Display for SupportedTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.name, self.max_source_size_bytes, self.priority
        )
    }
}

/// Compare two size ceilings where `-1` is unlimited and sorts greatest.
pub(crate) fn compare_max_size(a: i64, b: i64) -> Ordering {
    match (a == UNLIMITED_SIZE, b == UNLIMITED_SIZE) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.cmp(&b),
    }
}

/// Insert `new` into `list`, keeping increasing size order and discarding
/// dominated entries.
///
/// Tie-breaks at an equal ceiling: strictly better priority replaces the
/// existing entry and re-prunes forward; strictly worse is discarded; equal
/// priority overwrites in place, so the most recently registered candidate
/// wins the niche (a later-loaded engine replacing an earlier declaration).
pub(crate) fn add_to_supported_list(
    list: &mut Vec<SupportedTransform>,
    new: SupportedTransform,
) {
    if list.is_empty() {
        list.push(new);
        return;
    }

    for i in 0..list.len() {
        let existing = &list[i];
        let size_order = compare_max_size(new.max_source_size_bytes, existing.max_source_size_bytes);
        // Positive when the new candidate has the better (lower) priority.
        let priority_gain = existing.priority - new.priority;

        match size_order {
            Ordering::Equal => {
                match priority_gain.cmp(&0) {
                    Ordering::Equal => {
                        // Same niche: treat as a re-declaration and replace.
                        list[i] = new;
                    }
                    Ordering::Greater => {
                        list[i] = new;
                        discard_dominated(list, i);
                    }
                    Ordering::Less => {} // worse priority at the same size
                }
                return;
            }
            Ordering::Less => {
                if priority_gain > 0 {
                    list.insert(i, new);
                    discard_dominated(list, i);
                }
                // Otherwise an equal-or-better priority already covers a
                // larger size; the new candidate would never be picked.
                return;
            }
            Ordering::Greater => {
                if priority_gain < 0 {
                    // Larger ceiling but worse priority: may still be the
                    // only cover for big inputs, keep looking rightwards.
                    if i + 1 == list.len() {
                        list.push(new);
                        return;
                    }
                    continue;
                }
                // Equal-or-better priority with a larger ceiling dominates.
                list[i] = new;
                discard_dominated(list, i);
                return;
            }
        }
    }
}

/// After placing a candidate at `i`, remove following entries it dominates:
/// those with equal-or-smaller ceiling and equal-or-worse priority.
fn discard_dominated(list: &mut Vec<SupportedTransform>, i: usize) {
    let mut j = i + 1;
    while j < list.len() {
        let winner = &list[i];
        let existing = &list[j];
        let covered =
            compare_max_size(winner.max_source_size_bytes, existing.max_source_size_bytes)
                != Ordering::Less;
        if covered && existing.priority >= winner.priority {
            list.remove(j);
        } else {
            break;
        }
    }
}
