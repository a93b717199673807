//! Loading settings documents from disk.
//!
//! Studio defaults live in a directory tree; every document becomes a nested key built
//! from its directory segments and file stem:
//!
//! ```text
//! defaults/
//! ├── anatomy/
//! │   ├── templates.json   -> {"anatomy": {"templates": ...}}
//! │   └── roots.yaml       -> {"anatomy": {"roots": ...}}
//! └── global.json          -> {"global": ...}
//! ```
//!
//! Malformed or unreadable files inside the tree are skipped with a warning rather than
//! failing the whole load; a publish only fails later if a template it needs is missing.

use super::apply_override_layers;
use crate::core::{AnatomyError, Result};
use anyhow::Context;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Where effective settings come from.
///
/// `defaults_dir` is loaded with [`load_documents_from_dir`]; each file in
/// `override_files` is then applied on top, in order (typically studio overrides first,
/// project overrides last).
///
/// # Examples
///
/// ```rust,no_run
/// use anatomy_cli::settings::SettingsSource;
///
/// # fn example() -> anyhow::Result<()> {
/// let source = SettingsSource::new("/studio/settings/defaults")
///     .with_override_file("/studio/settings/projects/demo.json")
///     .with_subkeys(["anatomy"]);
/// let anatomy = source.load()?;
/// println!("{}", anatomy["templates"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SettingsSource {
    /// Directory tree of studio default documents
    pub defaults_dir: PathBuf,
    /// Override documents applied in order on top of the defaults
    pub override_files: Vec<PathBuf>,
    /// Nested key path selecting part of the effective settings (e.g. `["anatomy"]`)
    pub subkeys: Vec<String>,
}

impl SettingsSource {
    /// Create a source reading defaults from `defaults_dir` with no overrides.
    pub fn new(defaults_dir: impl Into<PathBuf>) -> Self {
        Self {
            defaults_dir: defaults_dir.into(),
            override_files: Vec::new(),
            subkeys: Vec::new(),
        }
    }

    /// Add an override document applied after every previously added one.
    #[must_use]
    pub fn with_override_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_files.push(path.into());
        self
    }

    /// Select a nested part of the effective settings.
    #[must_use]
    pub fn with_subkeys<I, S>(mut self, subkeys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subkeys = subkeys.into_iter().map(Into::into).collect();
        self
    }

    /// Load defaults, apply every override layer and select [`subkeys`](Self::subkeys).
    ///
    /// # Errors
    ///
    /// Returns an error only if the defaults directory itself cannot be walked. Broken
    /// documents are skipped with a warning.
    pub fn load(&self) -> anyhow::Result<Value> {
        let defaults = load_documents_from_dir(&self.defaults_dir, &[]).with_context(|| {
            format!("Failed to load settings defaults from {}", self.defaults_dir.display())
        })?;

        let overrides: Vec<Value> = self
            .override_files
            .iter()
            .map(|path| {
                if path.exists() {
                    load_json_file(path)
                } else {
                    tracing::warn!("Override file {} does not exist, skipping", path.display());
                    Value::Object(Map::new())
                }
            })
            .collect();

        let effective = apply_override_layers(&defaults, overrides.iter());
        tracing::debug!(
            "Loaded settings from {} with {} override layer(s)",
            self.defaults_dir.display(),
            overrides.len()
        );

        Ok(select_subkeys(effective, &self.subkeys))
    }
}

/// Read and parse a single JSON or YAML document.
///
/// Files ending in `.yaml`/`.yml` are parsed as YAML, everything else as JSON.
///
/// # Errors
///
/// Returns [`AnatomyError::ConfigLoadError`] naming the file when it cannot be read or
/// parsed.
pub fn read_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| AnatomyError::ConfigLoadError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let parsed = if is_yaml(path) {
        serde_yaml::from_str::<Value>(&content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str::<Value>(&content).map_err(|e| e.to_string())
    };

    parsed.map_err(|reason| AnatomyError::ConfigLoadError {
        path: path.display().to_string(),
        reason,
    })
}

/// Read a document, returning an empty object (and logging a warning) when it is broken.
#[must_use]
pub fn load_json_file(path: &Path) -> Value {
    match read_document(path) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("{}", e);
            Value::Object(Map::new())
        }
    }
}

/// Recursively load every `.json`/`.yaml`/`.yml` document below `path` into one object.
///
/// `subkeys` first descends into matching sub-directories (so only that part of the tree
/// is read); any subkeys without a matching directory then index into the loaded result.
/// A missing root directory or an unmatched subkey yields an empty object.
///
/// Files are visited in sorted order so the result is identical on every platform.
///
/// # Errors
///
/// Returns an error if a directory entry cannot be read while walking the tree.
pub fn load_documents_from_dir(path: &Path, subkeys: &[&str]) -> anyhow::Result<Value> {
    if !path.exists() {
        tracing::warn!("Settings directory {} does not exist", path.display());
        return Ok(Value::Object(Map::new()));
    }

    let mut root = path.to_path_buf();
    let mut remaining: Vec<String> = subkeys.iter().map(|s| (*s).to_string()).collect();
    while let Some(first) = remaining.first() {
        let candidate = root.join(first);
        if !candidate.is_dir() {
            break;
        }
        root = candidate;
        remaining.remove(0);
    }

    let mut output = Map::new();
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        let file_path = entry.path();
        if !entry.file_type().is_file() || !is_settings_document(file_path) {
            continue;
        }

        let relative = file_path.strip_prefix(&root).unwrap_or(file_path);
        let mut keys: Vec<String> = relative
            .parent()
            .map(|parent| {
                parent.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect()
            })
            .unwrap_or_default();
        let Some(stem) = file_path.file_stem() else {
            continue;
        };
        keys.push(stem.to_string_lossy().into_owned());

        let value = load_json_file(file_path);
        subkey_merge(&mut output, value, &keys);
    }

    Ok(select_subkeys(Value::Object(output), &remaining))
}

/// Store `value` at the nested key path `keys`, creating intermediate objects.
///
/// An existing non-object value on the path is replaced by an object.
pub fn subkey_merge(target: &mut Map<String, Value>, value: Value, keys: &[String]) {
    let Some((last, parents)) = keys.split_last() else {
        return;
    };

    let mut current = target;
    for key in parents {
        let slot = current.entry(key.clone()).or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(next) = slot else {
            return;
        };
        current = next;
    }
    current.insert(last.clone(), value);
}

fn select_subkeys(value: Value, subkeys: &[impl AsRef<str>]) -> Value {
    let mut current = value;
    for key in subkeys {
        current = match current {
            Value::Object(mut obj) => obj.shift_remove(key.as_ref()).unwrap_or_else(|| {
                tracing::warn!("Settings key '{}' not found", key.as_ref());
                Value::Object(Map::new())
            }),
            _ => Value::Object(Map::new()),
        };
    }
    current
}

fn is_yaml(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("yaml" | "yml"))
}

fn is_settings_document(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("json" | "yaml" | "yml"))
}
