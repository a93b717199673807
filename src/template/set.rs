//! Named templates of a project anatomy.

use super::links::solve_template_links;
use crate::constants::TEMPLATE_GROUP_PATH_KEY;
use crate::core::{AnatomyError, Result};
use serde_json::{Map, Value};
use strsim::levenshtein;

/// Maximum edit distance, as a percentage of the requested name, for "did you mean" hints.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Solved anatomy templates, addressable by dotted name.
///
/// Templates are either global strings or grouped:
///
/// ```text
/// {
///   "version": "v{version:0>3}",
///   "publish": {"folder": "...", "file": "...", "path": "{@folder}/{@file}"},
///   "thumbnail": "{root}/{project[name]}/thumbnails/{asset}_{subset}.jpg"
/// }
/// ```
///
/// `get("publish.folder")` returns one entry of a group and `get("publish")` returns the
/// group's `path` entry. Links (`{@name}`) are solved on construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateSet {
    templates: Map<String, Value>,
}

impl TemplateSet {
    /// Build a set from raw templates, solving inner links.
    ///
    /// # Errors
    ///
    /// Returns [`AnatomyError::TemplateLinkError`] when a link cannot be solved.
    pub fn new(raw: &Map<String, Value>) -> Result<Self> {
        Ok(Self {
            templates: solve_template_links(raw)?,
        })
    }

    /// Build a set from `name → template` pairs without any links.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            templates: pairs.into_iter().map(|(k, v)| (k.into(), Value::String(v.into()))).collect(),
        }
    }

    /// Look up a template by name.
    ///
    /// # Errors
    ///
    /// Returns [`AnatomyError::MissingTemplate`], with close names as suggestions, when
    /// no string template exists under `name`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use anatomy_cli::template::TemplateSet;
    /// use serde_json::json;
    ///
    /// let raw = json!({"publish": {"folder": "{asset}/publish", "path": "{@folder}/{subset}.ma"}});
    /// let set = TemplateSet::new(raw.as_object().unwrap())?;
    /// assert_eq!(set.get("publish")?, "{asset}/publish/{subset}.ma");
    /// assert_eq!(set.get("publish.folder")?, "{asset}/publish");
    /// assert!(set.get("pubilsh").is_err());
    /// # Ok::<(), anatomy_cli::core::AnatomyError>(())
    /// ```
    pub fn get(&self, name: &str) -> Result<&str> {
        self.lookup(name).ok_or_else(|| AnatomyError::MissingTemplate {
            name: name.to_string(),
            suggestions: self.suggest(name),
        })
    }

    /// Whether a template is defined under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Every addressable template name, groups included, in definition order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for (key, value) in &self.templates {
            match value {
                Value::String(_) => names.push(key.clone()),
                Value::Object(group) => {
                    if group.get(TEMPLATE_GROUP_PATH_KEY).is_some_and(Value::is_string) {
                        names.push(key.clone());
                    }
                    for (entry, entry_value) in group {
                        if entry_value.is_string() {
                            names.push(format!("{key}.{entry}"));
                        }
                    }
                }
                _ => {}
            }
        }
        names
    }

    /// The solved templates as a JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.templates
    }

    /// Number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the set has no templates at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        let mut current = self.templates.get(name).or_else(|| {
            let (group, entry) = name.split_once('.')?;
            self.templates.get(group)?.get(entry)
        })?;
        if current.is_object() {
            current = current.get(TEMPLATE_GROUP_PATH_KEY)?;
        }
        current.as_str()
    }

    fn suggest(&self, name: &str) -> Vec<String> {
        let mut scored: Vec<(String, usize)> = self
            .names()
            .into_iter()
            .map(|candidate| {
                let distance = levenshtein(name, &candidate);
                (candidate, distance)
            })
            .collect();
        scored.sort_by_key(|(_, distance)| *distance);

        scored
            .into_iter()
            .filter(|(_, distance)| *distance <= name.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
            .take(3)
            .map(|(candidate, _)| candidate)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(value: Value) -> TemplateSet {
        TemplateSet::new(value.as_object().unwrap()).unwrap()
    }

    #[test]
    fn test_group_name_resolves_to_path_entry() {
        let templates = set(json!({
            "publish": {"folder": "{root}/{asset}", "path": "{@folder}/{subset}.{representation}"},
            "thumbnail": "{root}/thumbs/{asset}.jpg"
        }));
        assert_eq!(templates.get("publish").unwrap(), "{root}/{asset}/{subset}.{representation}");
        assert_eq!(templates.get("publish.path").unwrap(), "{root}/{asset}/{subset}.{representation}");
        assert_eq!(templates.get("publish.folder").unwrap(), "{root}/{asset}");
        assert_eq!(templates.get("thumbnail").unwrap(), "{root}/thumbs/{asset}.jpg");
    }

    #[test]
    fn test_group_without_path_is_not_a_template() {
        let templates = set(json!({"work": {"folder": "{root}/work"}}));
        assert!(!templates.contains("work"));
        assert!(templates.contains("work.folder"));
    }

    #[test]
    fn test_missing_template_suggests_close_names() {
        let templates = set(json!({"publish": {"path": "x"}, "render": "y"}));
        match templates.get("pubilsh").unwrap_err() {
            AnatomyError::MissingTemplate { name, suggestions } => {
                assert_eq!(name, "pubilsh");
                assert_eq!(suggestions, vec!["publish".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_names_lists_groups_and_entries() {
        let templates = set(json!({"version": "v{version}", "publish": {"path": "p", "folder": "f"}}));
        assert_eq!(
            templates.names(),
            vec!["publish", "publish.version", "publish.path", "publish.folder", "version"]
        );
    }

    #[test]
    fn test_from_pairs() {
        let templates = TemplateSet::from_pairs([("publish", "{root}/{asset}")]);
        assert_eq!(templates.get("publish").unwrap(), "{root}/{asset}");
        assert_eq!(templates.len(), 1);
    }
}
