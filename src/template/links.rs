//! Inner links between anatomy templates.
//!
//! A template value may embed another template of the same set with `{@name}`:
//!
//! ```text
//! version: "v{version:0>3}"
//! publish:
//!   folder: "{root[work]}/{project[name]}/{asset}/publish/{subset}/{@version}"
//!   file:   "{subset}.{representation}"
//!   path:   "{@folder}/{@file}"
//! ```
//!
//! Global entries (top-level non-object values) are visible from every group unless the
//! group defines an entry with the same name. Links are substituted textually before any
//! data is formatted, so the solved set contains ordinary templates only.

use crate::core::{AnatomyError, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

fn link_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{@([^{}]+)\}").ok()).as_ref()
}

/// Replace every `{@name}` link in `templates`.
///
/// Groups come back with the global entries merged in, followed by the solved globals.
///
/// # Errors
///
/// [`AnatomyError::TemplateLinkError`] when a link refers to its own entry, to an
/// entry that does not exist, to a value that is not a string or number, or when links
/// form a cycle.
///
/// # Examples
///
/// ```rust
/// use anatomy_cli::template::solve_template_links;
/// use serde_json::json;
///
/// let raw = json!({
///     "version": "v{version:0>3}",
///     "publish": {"folder": "{asset}/{@version}", "path": "{@folder}/{subset}.ma"}
/// });
/// let solved = solve_template_links(raw.as_object().unwrap())?;
/// assert_eq!(solved["publish"]["path"], "{asset}/v{version:0>3}/{subset}.ma");
/// # Ok::<(), anatomy_cli::core::AnatomyError>(())
/// ```
pub fn solve_template_links(templates: &Map<String, Value>) -> Result<Map<String, Value>> {
    let globals: Map<String, Value> =
        templates.iter().filter(|(_, value)| !value.is_object()).map(|(k, v)| (k.clone(), v.clone())).collect();

    let mut solved = Map::new();
    for (name, value) in templates {
        let Value::Object(group) = value else {
            continue;
        };
        let mut entries = globals.clone();
        for (key, entry) in group {
            entries.insert(key.clone(), entry.clone());
        }
        solved.insert(name.clone(), Value::Object(solve_entries(entries, Some(name))?));
    }

    for (name, value) in solve_entries(globals, None)? {
        solved.insert(name, value);
    }

    Ok(solved)
}

fn solve_entries(mut entries: Map<String, Value>, group: Option<&str>) -> Result<Map<String, Value>> {
    let Some(pattern) = link_pattern() else {
        return Ok(entries);
    };
    let keys: Vec<String> = entries.keys().cloned().collect();

    // Each pass resolves at least one level of nesting; more passes than entries means a cycle
    for _ in 0..=keys.len() {
        let mut changed = false;

        for key in &keys {
            match entries.get(key) {
                Some(Value::String(value)) if pattern.is_match(value) => {
                    let replaced = replace_links(pattern, value, &entries, key, &qualified(group, key))?;
                    entries.insert(key.clone(), Value::String(replaced));
                    changed = true;
                }
                Some(Value::Object(nested)) => {
                    let mut nested = nested.clone();
                    let mut nested_changed = false;
                    for (sub_key, sub_value) in nested.iter_mut() {
                        let Value::String(text) = sub_value else {
                            continue;
                        };
                        if !pattern.is_match(text) {
                            continue;
                        }
                        let label = qualified(group, &format!("{key}.{sub_key}"));
                        *text = replace_links(pattern, text, &entries, &format!("{key}.{sub_key}"), &label)?;
                        nested_changed = true;
                    }
                    if nested_changed {
                        entries.insert(key.clone(), Value::Object(nested));
                        changed = true;
                    }
                }
                _ => {}
            }
        }

        if !changed {
            return Ok(entries);
        }
    }

    let unsolved = keys
        .iter()
        .find(|key| entries.get(*key).and_then(Value::as_str).is_some_and(|v| pattern.is_match(v)))
        .cloned()
        .unwrap_or_default();
    Err(AnatomyError::TemplateLinkError {
        key: qualified(group, &unsolved),
        reason: "links form a cycle".to_string(),
    })
}

fn replace_links(
    pattern: &Regex,
    value: &str,
    entries: &Map<String, Value>,
    own_key: &str,
    label: &str,
) -> Result<String> {
    let mut output = String::with_capacity(value.len());
    let mut last = 0;

    for captures in pattern.captures_iter(value) {
        let (Some(whole), Some(target)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let target = target.as_str();
        if target == own_key {
            return Err(AnatomyError::TemplateLinkError {
                key: label.to_string(),
                reason: "the template links to itself".to_string(),
            });
        }

        let replacement = match entries.get(target) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(AnatomyError::TemplateLinkError {
                    key: label.to_string(),
                    reason: format!("linked template '{target}' is a {}, not a string", super::value_type_name(other)),
                });
            }
            None => {
                return Err(AnatomyError::TemplateLinkError {
                    key: label.to_string(),
                    reason: format!("linked template '{target}' does not exist"),
                });
            }
        };

        output.push_str(&value[last..whole.start()]);
        output.push_str(&replacement);
        last = whole.end();
    }

    output.push_str(&value[last..]);
    Ok(output)
}

fn qualified(group: Option<&str>, key: &str) -> String {
    match group {
        Some(group) => format!("{group}.{key}"),
        None => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn solve(value: Value) -> Result<Map<String, Value>> {
        solve_template_links(value.as_object().unwrap())
    }

    #[test]
    fn test_globals_are_inherited_unless_overridden() {
        let solved = solve(json!({
            "key_1": "value_1",
            "key_2": "{@key_1}/{filling_key}",
            "group_1": {"key_3": "value_3/{@key_2}"},
            "group_2": {"key_2": "value_2", "key_4": "value_4/{@key_2}"}
        }))
        .unwrap();

        assert_eq!(solved["key_2"], "value_1/{filling_key}");
        assert_eq!(solved["group_1"]["key_1"], "value_1");
        assert_eq!(solved["group_1"]["key_3"], "value_3/value_1/{filling_key}");
        assert_eq!(solved["group_2"]["key_2"], "value_2");
        assert_eq!(solved["group_2"]["key_4"], "value_4/value_2");
    }

    #[test]
    fn test_chained_links() {
        let solved = solve(json!({
            "version": "v{version:0>3}",
            "publish": {
                "folder": "{root}/{asset}/{@version}",
                "file": "{subset}.{representation}",
                "path": "{@folder}/{@file}"
            }
        }))
        .unwrap();
        assert_eq!(solved["publish"]["path"], "{root}/{asset}/v{version:0>3}/{subset}.{representation}");
    }

    #[test]
    fn test_numeric_link_target() {
        let solved = solve(json!({"padding": 3, "g": {"path": "x{@padding}"}})).unwrap();
        assert_eq!(solved["g"]["path"], "x3");
    }

    #[test]
    fn test_self_reference_is_an_error() {
        let err = solve(json!({"g": {"path": "{@path}/x"}})).unwrap_err();
        assert!(matches!(err, AnatomyError::TemplateLinkError { ref key, .. } if key == "g.path"));
    }

    #[test]
    fn test_unknown_link_is_an_error() {
        let err = solve(json!({"g": {"path": "{@nope}"}})).unwrap_err();
        match err {
            AnatomyError::TemplateLinkError { reason, .. } => assert!(reason.contains("nope")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mutual_links_are_an_error() {
        assert!(solve(json!({"g": {"a": "{@b}", "b": "{@a}"}})).is_err());
    }

    #[test]
    fn test_templates_without_links_are_unchanged() {
        let raw = json!({"publish": {"path": "{root}/{asset}"}});
        assert_eq!(Value::Object(solve(raw.clone()).unwrap()), raw);
    }
}
