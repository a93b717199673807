//! Project roots: the per-platform mount points every published path starts with.
//!
//! A project has either one root, formatted as `{root}`, or several named roots formatted
//! as `{root[work]}`, `{root[render]}`... Each root carries one value per platform:
//!
//! ```json
//! {
//!   "work": {"windows": "P:/projects", "linux": "/mnt/share/projects", "darwin": "/Volumes/projects"},
//!   "render": {"windows": "R:/render", "linux": "/mnt/render"}
//! }
//! ```
//!
//! Values are cleaned on load: backslashes become `/` and trailing separators are
//! stripped, so `P:\projects\` and `P:/projects` are the same root.
//!
//! Paths stored for other tools are kept *rootless* (`{root[work]}/demo/...`) so they can
//! be resolved on any platform; [`Roots::find_root_template`] produces them and
//! [`Roots::remap`] moves a path from one platform to another.

use crate::core::{AnatomyError, EntityKind, Result};
use crate::template::StringTemplate;
use crate::utils::clean_root;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Operating system family a root value applies to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Windows
    Windows,
    /// Linux
    Linux,
    /// macOS
    Darwin,
}

impl Platform {
    /// Every platform, in the order root values are searched.
    pub const ALL: [Self; 3] = [Self::Windows, Self::Linux, Self::Darwin];

    /// Platform this binary was compiled for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::Darwin
        } else {
            Self::Linux
        }
    }

    /// Key used for this platform in root documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Darwin => "darwin",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = AnatomyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "windows" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            "darwin" | "macos" => Ok(Self::Darwin),
            other => Err(AnatomyError::Other {
                message: format!("Unknown platform '{other}'"),
            }),
        }
    }
}

/// One root with its per-platform values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootItem {
    name: Option<String>,
    values: BTreeMap<Platform, String>,
}

impl RootItem {
    /// Create a root from `platform → path` values; `name` is `None` for a single root.
    pub fn new<I, S>(name: Option<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (Platform, S)>,
        S: AsRef<str>,
    {
        Self {
            name,
            values: values.into_iter().map(|(platform, value)| (platform, clean_root(value.as_ref()))).collect(),
        }
    }

    /// Root name, `None` for a single unnamed root.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Template key for this root: `root` or `root[name]`.
    #[must_use]
    pub fn full_key(&self) -> String {
        match &self.name {
            Some(name) => format!("root[{name}]"),
            None => "root".to_string(),
        }
    }

    /// Cleaned value for `platform`.
    ///
    /// # Errors
    ///
    /// [`AnatomyError::RootNotFound`] when the root has no value for `platform`.
    pub fn value(&self, platform: Platform) -> Result<&str> {
        self.values.get(&platform).map(String::as_str).ok_or_else(|| AnatomyError::RootNotFound {
            name: self.full_key(),
            platform: platform.to_string(),
        })
    }

    /// Replace a matching root value at the start of `path` with `{root...}`.
    ///
    /// Only whole path segments match: `/mnt/proj` is not a prefix of `/mnt/projects`.
    fn rootless(&self, path: &str, only: Option<Platform>) -> Option<String> {
        self.values
            .iter()
            .filter(|(platform, _)| only.is_none_or(|p| p == **platform))
            .find_map(|(_, root)| {
                let rest = path.strip_prefix(root.as_str())?;
                (rest.is_empty() || rest.starts_with('/') || root.ends_with('/'))
                    .then(|| format!("{{{}}}{rest}", self.full_key()))
            })
    }
}

/// All roots of a project.
///
/// # Examples
///
/// ```rust
/// use anatomy_cli::roots::{Platform, Roots};
/// use serde_json::json;
///
/// let roots = Roots::from_value(&json!({
///     "work": {"windows": "P:\\projects\\", "linux": "/mnt/projects"}
/// }))?;
///
/// let rootless = roots.find_root_template(r"P:\projects\demo\bob\v001\bob.ma");
/// assert_eq!(rootless.as_deref(), Some("{root[work]}/demo/bob/v001/bob.ma"));
///
/// let on_linux = roots.remap("P:/projects/demo/bob.ma", None, Platform::Linux);
/// assert_eq!(on_linux.as_deref(), Some("/mnt/projects/demo/bob.ma"));
/// # Ok::<(), anatomy_cli::core::AnatomyError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Roots {
    items: Vec<RootItem>,
}

impl Roots {
    /// A single unnamed root.
    #[must_use]
    pub fn single(item: RootItem) -> Self {
        Self {
            items: vec![RootItem {
                name: None,
                ..item
            }],
        }
    }

    /// Named roots.
    #[must_use]
    pub fn named(items: Vec<RootItem>) -> Self {
        Self {
            items,
        }
    }

    /// The same path for every platform, as a single root.
    #[must_use]
    pub fn uniform(path: &str) -> Self {
        Self::single(RootItem::new(None, Platform::ALL.map(|p| (p, path))))
    }

    /// Parse a roots document.
    ///
    /// Accepted shapes:
    /// - `"P:/projects"`: one root, same value everywhere
    /// - `{"windows": "...", "linux": "..."}`: one root
    /// - `{"work": {"windows": "...", ...}, ...}`: named roots
    /// - `{}`: no roots
    ///
    /// Unknown platform keys are ignored with a warning.
    ///
    /// # Errors
    ///
    /// [`AnatomyError::InvalidDocument`] for any other shape.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(path) => Ok(Self::uniform(path)),
            Value::Object(map) if map.is_empty() => Ok(Self::default()),
            Value::Object(map) if map.values().all(Value::is_string) => {
                Ok(Self::single(parse_root_item(None, map)?))
            }
            Value::Object(map) if map.values().all(Value::is_object) => {
                let mut items = Vec::with_capacity(map.len());
                for (name, entry) in map {
                    if let Value::Object(platforms) = entry {
                        items.push(parse_root_item(Some(name.clone()), platforms)?);
                    }
                }
                Ok(Self::named(items))
            }
            Value::Object(_) => Err(invalid_roots("cannot mix platform values and named roots".to_string())),
            other => Err(invalid_roots(format!("expected an object, found {}", crate::template::value_type_name(other)))),
        }
    }

    /// Every root.
    #[must_use]
    pub fn items(&self) -> &[RootItem] {
        &self.items
    }

    /// Whether no root is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Value of the `root` template key on `platform`.
    ///
    /// A single root gives a string, named roots give an object keyed by root name.
    /// Roots without a value for `platform` are left out, so only a template that uses
    /// one of them fails to format. `None` when no root has a value for `platform`.
    #[must_use]
    pub fn template_value(&self, platform: Platform) -> Option<Value> {
        match self.items.as_slice() {
            [] => None,
            [single] if single.name.is_none() => {
                let value = single.value(platform).ok()?;
                Some(Value::String(value.to_string()))
            }
            items => {
                let mut named = Map::new();
                for item in items {
                    match item.value(platform) {
                        Ok(value) => {
                            let name = item.name.clone().unwrap_or_else(|| "root".to_string());
                            named.insert(name, Value::String(value.to_string()));
                        }
                        Err(_) => tracing::debug!("Root '{}' has no value for {}", item.full_key(), platform),
                    }
                }
                (!named.is_empty()).then_some(Value::Object(named))
            }
        }
    }

    /// Replace the root at the start of `path` with its template key.
    ///
    /// Every platform value of every root is tried; `None` when no root matches.
    #[must_use]
    pub fn find_root_template(&self, path: &str) -> Option<String> {
        self.find_root_template_on(path, None)
    }

    fn find_root_template_on(&self, path: &str, only: Option<Platform>) -> Option<String> {
        let cleaned = path.replace('\\', "/");
        let found = self.items.iter().find_map(|item| item.rootless(&cleaned, only));
        match &found {
            Some(rootless) => tracing::debug!("Found root in '{}' -> '{}'", path, rootless),
            None => tracing::debug!("No root matches '{}'", path),
        }
        found
    }

    /// Rewrite `path` for `dst`.
    ///
    /// `path` may be rootless (`{root[work]}/...`) or start with any platform's root value
    /// (restricted to `src` when given). Returns `None` when no root matches or the
    /// matching root has no value for `dst`.
    #[must_use]
    pub fn remap(&self, path: &str, src: Option<Platform>, dst: Platform) -> Option<String> {
        let rootless = if path.contains("{root") {
            path.replace('\\', "/")
        } else {
            self.find_root_template_on(path, src)?
        };

        // Only the root used by the path needs a value on `dst`
        let Some(root_value) = self.template_value(dst) else {
            tracing::warn!("Cannot remap '{}': no root has a value for platform {}", path, dst);
            return None;
        };
        let mut data = Map::new();
        data.insert("root".to_string(), root_value);

        let result = StringTemplate::new(rootless).format(&data);
        if !result.solved {
            tracing::warn!("Cannot remap '{}': missing {} for platform {}", path, result.missing_keys.join(", "), dst);
            return None;
        }
        Some(result.output)
    }
}

fn parse_root_item(name: Option<String>, platforms: &Map<String, Value>) -> Result<RootItem> {
    let mut values = Vec::new();
    for (key, value) in platforms {
        let Ok(platform) = key.parse::<Platform>() else {
            tracing::warn!("Ignoring unknown platform '{}' in roots", key);
            continue;
        };
        let Some(path) = value.as_str() else {
            return Err(invalid_roots(format!("value of '{key}' must be a path string")));
        };
        values.push((platform, path));
    }
    Ok(RootItem::new(name, values))
}

fn invalid_roots(reason: String) -> AnatomyError {
    AnatomyError::InvalidDocument {
        entity: EntityKind::Project,
        reason: format!("roots: {reason}"),
    }
}
