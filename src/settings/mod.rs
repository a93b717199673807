//! Layered settings with explicit override markers.
//!
//! Studio defaults are stored as a directory tree of JSON/YAML documents; projects (and
//! optionally the studio) store override documents with the same shape. This module merges
//! those layers into one effective settings document.
//!
//! # Override markers
//!
//! An override layer may contain two reserved markers:
//!
//! - `"__overriden_keys__": ["key", ...]` - the listed sibling keys replace the base value
//!   wholesale instead of deep-merging into it
//! - `"__pop_key__"` as a value - the key is deleted from the merged result
//!
//! Markers are honoured at every nesting level and never appear in the merged output.
//!
//! # Examples
//!
//! ```rust
//! use anatomy_cli::settings::apply_overrides;
//! use serde_json::json;
//!
//! let defaults = json!({"publish": {"padding": 3, "ext": "ma"}});
//! let project = json!({"publish": {"padding": 4}});
//!
//! let merged = apply_overrides(&defaults, Some(&project));
//! assert_eq!(merged, json!({"publish": {"padding": 4, "ext": "ma"}}));
//! // Defaults are untouched
//! assert_eq!(defaults["publish"]["padding"], 3);
//! ```

pub mod loader;

pub use loader::{SettingsSource, load_documents_from_dir, load_json_file, read_document, subkey_merge};

use crate::constants::{OVERRIDDEN_KEYS_MARKER, POP_KEY_MARKER};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Merge one override layer into `base` and return the result.
///
/// `base` is taken by value: callers that need to keep the original (e.g. cached studio
/// defaults shared between projects) clone it first, or use [`apply_overrides`].
///
/// For each `(key, value)` of `overrides`:
/// 1. `value == "__pop_key__"` removes `key`
/// 2. `key` listed in `__overriden_keys__`, or absent from `base`, is set directly
/// 3. both sides objects: merged recursively
/// 4. anything else overwrites
///
/// Malformed marker lists are tolerated: non-string entries are ignored and a
/// force-replace key that does not exist in `base` is simply added.
#[must_use]
pub fn merge_overrides(mut base: Map<String, Value>, mut overrides: Map<String, Value>) -> Map<String, Value> {
    let replaced = take_overridden_keys(&mut overrides);

    for (key, value) in overrides {
        if is_pop_marker(&value) {
            base.shift_remove(&key);
            continue;
        }

        let Some(slot) = base.get_mut(&key).filter(|_| !replaced.contains(&key)) else {
            base.insert(key, strip_markers(value));
            continue;
        };

        match (slot, value) {
            (Value::Object(base_obj), Value::Object(override_obj)) => {
                let current = std::mem::take(base_obj);
                *base_obj = merge_overrides(current, override_obj);
            }
            (slot, value) => *slot = strip_markers(value),
        }
    }

    base
}

/// Apply an optional override layer on top of `source` without mutating it.
///
/// An absent or empty override returns a copy of `source`. When either side is not an
/// object the override value wins, matching how a scalar override replaces a scalar
/// default.
#[must_use]
pub fn apply_overrides(source: &Value, overrides: Option<&Value>) -> Value {
    match overrides {
        None => source.clone(),
        Some(Value::Object(obj)) if obj.is_empty() => source.clone(),
        Some(Value::Object(obj)) => {
            let base = source.as_object().cloned().unwrap_or_default();
            Value::Object(merge_overrides(base, obj.clone()))
        }
        Some(Value::Null) => source.clone(),
        Some(other) => strip_markers(other.clone()),
    }
}

/// Apply several override layers in order (e.g. studio overrides, then project overrides).
#[must_use]
pub fn apply_override_layers<'a>(source: &Value, layers: impl IntoIterator<Item = &'a Value>) -> Value {
    layers.into_iter().fold(source.clone(), |acc, layer| apply_overrides(&acc, Some(layer)))
}

fn take_overridden_keys(overrides: &mut Map<String, Value>) -> HashSet<String> {
    match overrides.remove(OVERRIDDEN_KEYS_MARKER) {
        Some(Value::Array(keys)) => {
            keys.into_iter().filter_map(|k| k.as_str().map(str::to_string)).collect()
        }
        Some(other) => {
            tracing::warn!("Ignoring malformed {} marker: {}", OVERRIDDEN_KEYS_MARKER, other);
            HashSet::new()
        }
        None => HashSet::new(),
    }
}

fn is_pop_marker(value: &Value) -> bool {
    value.as_str() == Some(POP_KEY_MARKER)
}

/// Remove override markers from a value that is inserted without merging.
fn strip_markers(value: Value) -> Value {
    match value {
        Value::Object(obj) => Value::Object(
            obj.into_iter()
                .filter(|(key, value)| key != OVERRIDDEN_KEYS_MARKER && !is_pop_marker(value))
                .map(|(key, value)| (key, strip_markers(value)))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_deep_merge_preserves_siblings() {
        let merged = merge_overrides(obj(json!({"x": {"y": 1, "z": 2}})), obj(json!({"x": {"y": 5}})));
        assert_eq!(Value::Object(merged), json!({"x": {"y": 5, "z": 2}}));
    }

    #[test]
    fn test_overridden_key_replaces_whole_value() {
        let merged = merge_overrides(
            obj(json!({"x": {"y": 1, "z": 2}})),
            obj(json!({"x": {"y": 2}, "__overriden_keys__": ["x"]})),
        );
        assert_eq!(Value::Object(merged), json!({"x": {"y": 2}}));
    }

    #[test]
    fn test_pop_key_removes_entry() {
        let merged = merge_overrides(
            obj(json!({"a": 1, "b": {"c": 1, "d": 2}})),
            obj(json!({"a": "__pop_key__", "b": {"d": "__pop_key__"}})),
        );
        assert_eq!(Value::Object(merged), json!({"b": {"c": 1}}));
    }

    #[test]
    fn test_pop_missing_key_is_noop() {
        let merged = merge_overrides(obj(json!({"a": 1})), obj(json!({"b": "__pop_key__"})));
        assert_eq!(Value::Object(merged), json!({"a": 1}));
    }

    #[test]
    fn test_unknown_keys_are_added() {
        let merged = merge_overrides(obj(json!({"a": 1})), obj(json!({"b": {"c": 2}})));
        assert_eq!(Value::Object(merged), json!({"a": 1, "b": {"c": 2}}));
    }

    #[test]
    fn test_force_replace_of_absent_key_is_added() {
        let merged = merge_overrides(obj(json!({})), obj(json!({"q": 1, "__overriden_keys__": ["q", "missing"]})));
        assert_eq!(Value::Object(merged), json!({"q": 1}));
    }

    #[test]
    fn test_scalar_overrides_object_and_back() {
        let merged = merge_overrides(obj(json!({"a": {"b": 1}, "c": 3})), obj(json!({"a": 5, "c": {"d": 1}})));
        assert_eq!(Value::Object(merged), json!({"a": 5, "c": {"d": 1}}));
    }

    #[test]
    fn test_markers_never_leak_into_result() {
        let merged = merge_overrides(
            obj(json!({"a": {"b": 1}})),
            obj(json!({"new": {"__overriden_keys__": ["x"], "x": 1, "gone": "__pop_key__"}})),
        );
        assert_eq!(Value::Object(merged), json!({"a": {"b": 1}, "new": {"x": 1}}));
    }

    #[test]
    fn test_nested_overridden_keys() {
        let merged = merge_overrides(
            obj(json!({"templates": {"publish": {"path": "a", "file": "b"}, "work": {"path": "w"}}})),
            obj(json!({"templates": {"__overriden_keys__": ["publish"], "publish": {"path": "c"}}})),
        );
        assert_eq!(
            Value::Object(merged),
            json!({"templates": {"publish": {"path": "c"}, "work": {"path": "w"}}})
        );
    }

    #[test]
    fn test_malformed_marker_is_ignored() {
        let merged = merge_overrides(
            obj(json!({"x": {"y": 1, "z": 2}})),
            obj(json!({"x": {"y": 3}, "__overriden_keys__": "x"})),
        );
        assert_eq!(Value::Object(merged), json!({"x": {"y": 3, "z": 2}}));
    }

    #[test]
    fn test_apply_overrides_does_not_mutate_source() {
        let source = json!({"x": {"y": 1}});
        let merged = apply_overrides(&source, Some(&json!({"x": {"y": 2}})));
        assert_eq!(merged, json!({"x": {"y": 2}}));
        assert_eq!(source, json!({"x": {"y": 1}}));
    }

    #[test]
    fn test_apply_overrides_empty_or_absent() {
        let source = json!({"x": 1});
        assert_eq!(apply_overrides(&source, None), source);
        assert_eq!(apply_overrides(&source, Some(&json!({}))), source);
        assert_eq!(apply_overrides(&source, Some(&Value::Null)), source);
    }

    #[test]
    fn test_layers_apply_in_order() {
        let defaults = json!({"a": 1, "b": 1});
        let studio = json!({"a": 2, "b": 2});
        let project = json!({"a": 3});
        let merged = apply_override_layers(&defaults, [&studio, &project]);
        assert_eq!(merged, json!({"a": 3, "b": 2}));
    }

    #[test]
    fn test_layered_merge_equals_sequential_merge() {
        let defaults = json!({"a": {"b": 1, "c": 1}, "d": 1});
        let first = json!({"a": {"b": 2}});
        let second = json!({"a": {"c": 3}, "d": "__pop_key__"});

        let layered = apply_override_layers(&defaults, [&first, &second]);
        let stepwise = apply_overrides(&apply_overrides(&defaults, Some(&first)), Some(&second));
        assert_eq!(layered, stepwise);
        assert_eq!(layered, json!({"a": {"b": 2, "c": 3}}));
    }
}
