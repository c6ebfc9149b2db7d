// src/registry/options.rs

//! Option tree flattening and matching.
//!
//! A transformer's option tree nests named options inside groups that may
//! themselves be optional. For one concrete request the tree is flattened
//! into a `name -> required` map: a group contributes its direct options
//! when it is unconditionally required (itself and every ancestor required)
//! or when the caller supplied at least one option from anywhere inside it,
//! including from a nested sub-group that was itself triggered. A
//! contributed option keeps its *own* required flag; sitting in a triggered
//! group never makes an optional option mandatory.
//!
//! The flattened map is then matched strictly in both directions against
//! the caller's actual options: every required name must be supplied, and
//! every supplied name must be known to the candidate.

use std::collections::{BTreeMap, HashMap};

use crate::config::{TransformOption, TransformOptionGroup};
use crate::registry::TIMEOUT_OPTION;

/// Flatten `root` for a request carrying `actual` option values.
///
/// Returns every option name in play for this request mapped to whether it
/// is required. It is possible for a required option to be returned without
/// being in `actual`; [`options_match`] then rejects the candidate.
pub fn possible_options(
    root: &TransformOptionGroup,
    actual: &HashMap<String, String>,
) -> BTreeMap<String, bool> {
    let (flattened, _added) = flatten_group(root, true, actual);
    flattened
}

/// Post-order recursion over one group. `parent_required` is true only when
/// every ancestor group is required, so a required group below an optional
/// one stays conditional. Returns the flattened entries plus whether this
/// group contributed any, which is what triggers an enclosing optional
/// group.
fn flatten_group(
    group: &TransformOptionGroup,
    parent_required: bool,
    actual: &HashMap<String, String>,
) -> (BTreeMap<String, bool>, bool) {
    let mut flattened = BTreeMap::new();
    if group.transform_options.is_empty() {
        return (flattened, false);
    }

    let group_required = group.required && parent_required;
    let mut triggered = false;
    let mut added = false;

    for child in &group.transform_options {
        match child {
            TransformOption::Group(sub_group) => {
                let (sub_flattened, sub_added) = flatten_group(sub_group, group_required, actual);
                if sub_added {
                    added = true;
                    triggered = true;
                }
                flattened.extend(sub_flattened);
            }
            TransformOption::Value(value) => {
                if actual.contains_key(&value.name) {
                    triggered = true;
                }
            }
        }
    }

    if triggered || group_required {
        for child in &group.transform_options {
            if let TransformOption::Value(value) = child {
                flattened.insert(value.name.clone(), value.required);
                added = true;
            }
        }
    }

    (flattened, added)
}

/// Strict two-directional match: every required flattened option is
/// supplied, and every supplied option is known. Callers strip the reserved
/// `timeout` key before matching; see [`filter_timeout`].
pub fn options_match(
    flattened: &BTreeMap<String, bool>,
    actual: &HashMap<String, String>,
) -> bool {
    let required_supplied = flattened
        .iter()
        .filter(|(_, required)| **required)
        .all(|(name, _)| actual.contains_key(name));

    required_supplied && actual.keys().all(|name| flattened.contains_key(name))
}

/// Drop the reserved `timeout` option. It is a transport concern and never
/// takes part in selection.
pub fn filter_timeout(actual: &HashMap<String, String>) -> HashMap<String, String> {
    if !actual.contains_key(TIMEOUT_OPTION) {
        return actual.clone();
    }
    actual
        .iter()
        .filter(|(name, _)| name.as_str() != TIMEOUT_OPTION)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransformOptionValue;

    fn value(name: &str, required: bool) -> TransformOption {
        TransformOption::Value(TransformOptionValue {
            name: name.to_string(),
            required,
        })
    }

    fn group(required: bool, children: Vec<TransformOption>) -> TransformOptionGroup {
        TransformOptionGroup::new(required, children)
    }

    fn actual(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_required_group_contributes_unconditionally() {
        let root = group(true, vec![value("width", true), value("height", false)]);
        let flattened = possible_options(&root, &actual(&[]));
        assert_eq!(flattened.get("width"), Some(&true));
        assert_eq!(flattened.get("height"), Some(&false));
    }

    #[test]
    fn test_optional_group_silent_without_trigger() {
        let root = group(
            true,
            vec![TransformOption::Group(group(
                false,
                vec![value("startPage", false), value("endPage", true)],
            ))],
        );
        let flattened = possible_options(&root, &actual(&[]));
        assert!(flattened.is_empty());
    }

    #[test]
    fn test_optional_group_triggered_by_member() {
        // Worked example: optional group {startPage optional, endPage
        // required}, caller supplies startPage only.
        let root = group(
            true,
            vec![TransformOption::Group(group(
                false,
                vec![value("startPage", false), value("endPage", true)],
            ))],
        );

        let supplied = actual(&[("startPage", "1")]);
        let flattened = possible_options(&root, &supplied);
        assert_eq!(flattened.get("startPage"), Some(&false));
        assert_eq!(flattened.get("endPage"), Some(&true));

        // endPage is required but missing.
        assert!(!options_match(&flattened, &supplied));

        let complete = actual(&[("startPage", "1"), ("endPage", "2")]);
        let flattened = possible_options(&root, &complete);
        assert!(options_match(&flattened, &complete));
    }

    #[test]
    fn test_triggered_subgroup_triggers_parent() {
        // Supplying an option of a nested optional sub-group pulls the
        // enclosing group's direct options into play too.
        let root = group(
            true,
            vec![TransformOption::Group(group(
                false,
                vec![
                    value("outer", true),
                    TransformOption::Group(group(false, vec![value("inner", false)])),
                ],
            ))],
        );
        let supplied = actual(&[("inner", "x")]);
        let flattened = possible_options(&root, &supplied);
        assert_eq!(flattened.get("inner"), Some(&false));
        assert_eq!(flattened.get("outer"), Some(&true));
    }

    #[test]
    fn test_required_group_under_optional_parent_stays_conditional() {
        let root = group(
            true,
            vec![TransformOption::Group(group(
                false,
                vec![TransformOption::Group(group(
                    true,
                    vec![value("deep", true)],
                ))],
            ))],
        );
        // Nothing supplied: the required inner group must not leak through
        // its optional parent.
        assert!(possible_options(&root, &actual(&[])).is_empty());

        // Supplying the deep option triggers the chain.
        let supplied = actual(&[("deep", "x")]);
        let flattened = possible_options(&root, &supplied);
        assert_eq!(flattened.get("deep"), Some(&true));
    }

    #[test]
    fn test_match_rejects_unknown_option() {
        let root = group(true, vec![value("width", false)]);
        let supplied = actual(&[("width", "100"), ("rotate", "90")]);
        let flattened = possible_options(&root, &supplied);
        assert!(!options_match(&flattened, &supplied));
    }

    #[test]
    fn test_empty_tree_matches_empty_options_only() {
        let root = group(true, vec![]);
        assert!(options_match(
            &possible_options(&root, &actual(&[])),
            &actual(&[])
        ));

        let supplied = actual(&[("width", "100")]);
        assert!(!options_match(&possible_options(&root, &supplied), &supplied));
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let root = group(
            true,
            vec![
                value("width", false),
                TransformOption::Group(group(
                    false,
                    vec![value("startPage", false), value("endPage", true)],
                )),
            ],
        );
        let supplied = actual(&[("width", "100"), ("startPage", "1")]);
        let first = possible_options(&root, &supplied);
        let second = possible_options(&root, &supplied);
        assert_eq!(first, second);
    }

    #[test]
    fn test_filter_timeout() {
        let supplied = actual(&[("timeout", "30000"), ("width", "100")]);
        let filtered = filter_timeout(&supplied);
        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains_key("width"));

        // No allocation churn when timeout is absent.
        let plain = actual(&[("width", "100")]);
        assert_eq!(filter_timeout(&plain), plain);
    }
}
