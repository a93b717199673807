//! Context records a publish runs against.
//!
//! These are read once from project and asset documents and never change during a publish
//! run. [`PublishSession`] bundles them with the user, task and platform so nothing is
//! read from ambient process state.

use crate::constants::{ROOTS_SETTINGS_KEY, TEMPLATES_SETTINGS_KEY};
use crate::core::{AnatomyError, EntityKind, Result};
use crate::roots::{Platform, Roots};
use crate::template::TemplateSet;
use serde_json::{Map, Value, json};

/// Project anatomy: identity, templates and roots.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    /// Project name (`{project[name]}`)
    pub name: String,
    /// Short project code (`{project[code]}`)
    pub code: String,
    /// Named path templates
    pub templates: TemplateSet,
    /// Root mount points (`{root}` / `{root[name]}`)
    pub roots: Roots,
}

impl ProjectConfig {
    /// Create a project from already parsed parts.
    pub fn new(name: impl Into<String>, code: impl Into<String>, templates: TemplateSet, roots: Roots) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            templates,
            roots,
        }
    }

    /// Read a project document.
    ///
    /// Both the legacy and the current layouts are accepted:
    ///
    /// ```json
    /// {"name": "demo", "data": {"code": "dm"},
    ///  "config": {"template": {"publish": "{root}/..."}, "roots": {"windows": "P:/", "linux": "/mnt"}}}
    ///
    /// {"name": "demo", "data": {"code": "dm"},
    ///  "templates": {"publish": {"path": "{root[work]}/..."}}, "roots": {"work": {...}}}
    /// ```
    ///
    /// # Errors
    ///
    /// [`AnatomyError::InvalidDocument`] when `name`, the project code or the templates are
    /// missing or mistyped; link errors from [`TemplateSet::new`].
    pub fn from_document(document: &Value) -> Result<Self> {
        let name = required_str(document, "name", EntityKind::Project)?;
        let code = document
            .pointer("/data/code")
            .or_else(|| document.get("code"))
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(EntityKind::Project, "missing string field 'data.code'"))?;

        let templates = document
            .get(TEMPLATES_SETTINGS_KEY)
            .or_else(|| document.pointer("/config/template"))
            .or_else(|| document.pointer("/config/templates"))
            .ok_or_else(|| invalid(EntityKind::Project, "no 'templates' or 'config.template' section"))?;
        let roots = document.get(ROOTS_SETTINGS_KEY).or_else(|| document.pointer("/config/roots"));

        Self::from_parts(name, code, templates, roots)
    }

    /// Build a project from merged anatomy settings (`{"templates": ..., "roots": ...}`).
    ///
    /// # Errors
    ///
    /// Same as [`from_document`](Self::from_document).
    pub fn from_settings(name: &str, code: &str, anatomy: &Value) -> Result<Self> {
        let templates = anatomy
            .get(TEMPLATES_SETTINGS_KEY)
            .ok_or_else(|| invalid(EntityKind::Project, "anatomy settings have no 'templates' section"))?;
        Self::from_parts(name, code, templates, anatomy.get(ROOTS_SETTINGS_KEY))
    }

    fn from_parts(name: &str, code: &str, templates: &Value, roots: Option<&Value>) -> Result<Self> {
        let Value::Object(raw_templates) = templates else {
            return Err(invalid(EntityKind::Project, "templates must be an object"));
        };
        let roots = match roots {
            Some(value) => Roots::from_value(value)?,
            None => {
                tracing::warn!("Project '{}' defines no roots", name);
                Roots::default()
            }
        };

        Ok(Self::new(name, code, TemplateSet::new(raw_templates)?, roots))
    }

    /// `project` and `root` entries of the template data.
    ///
    /// Roots without a value for `platform` are left out of `root`.
    #[must_use]
    pub fn template_data(&self, platform: Platform) -> Map<String, Value> {
        let mut data = Map::new();
        if let Some(root) = self.roots.template_value(platform) {
            data.insert("root".to_string(), root);
        }
        data.insert("project".to_string(), json!({"name": self.name, "code": self.code}));
        data
    }
}

/// The asset (shot, character, ...) being published under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetContext {
    /// Asset name
    pub name: String,
    /// Ancestor names, outermost first
    pub parents: Vec<String>,
    /// Legacy grouping key
    pub silo: Option<String>,
}

impl AssetContext {
    /// Asset without parents or silo.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the ancestor names, outermost first.
    #[must_use]
    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents = parents.into_iter().map(Into::into).collect();
        self
    }

    /// Set the legacy silo.
    #[must_use]
    pub fn with_silo(mut self, silo: impl Into<String>) -> Self {
        self.silo = Some(silo.into());
        self
    }

    /// Read an asset document (`name`, `data.parents`, optional `silo`).
    ///
    /// # Errors
    ///
    /// [`AnatomyError::InvalidDocument`] when `name` is missing or `data.parents` is not a
    /// list of strings.
    pub fn from_document(document: &Value) -> Result<Self> {
        let name = required_str(document, "name", EntityKind::Asset)?;

        let parents = match document.pointer("/data/parents") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| invalid(EntityKind::Asset, "'data.parents' must only contain strings"))
                })
                .collect::<Result<Vec<_>>>()?,
            Some(_) => return Err(invalid(EntityKind::Asset, "'data.parents' must be a list")),
        };

        let silo = document
            .get("silo")
            .or_else(|| document.pointer("/data/silo"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self {
            name: name.to_string(),
            parents,
            silo,
        })
    }

    /// Parents joined with `/`, empty for a top-level asset.
    #[must_use]
    pub fn hierarchy(&self) -> String {
        self.parents.join("/")
    }
}

/// Task the artist works in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskContext {
    /// Task name (`{task[name]}`)
    pub name: String,
    /// Task type (`{task[type]}`)
    pub task_type: Option<String>,
    /// Short task type code (`{task[short]}`)
    pub short: Option<String>,
}

impl TaskContext {
    /// Task with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the task type and its short code.
    #[must_use]
    pub fn with_type(mut self, task_type: impl Into<String>, short: Option<String>) -> Self {
        self.task_type = Some(task_type.into());
        self.short = short;
        self
    }
}

/// Everything a publish run knows about where it is running.
///
/// # Examples
///
/// ```rust
/// use anatomy_cli::anatomy::{AssetContext, ProjectConfig, PublishSession, TaskContext};
/// use anatomy_cli::roots::{Platform, Roots};
/// use anatomy_cli::template::TemplateSet;
///
/// let project = ProjectConfig::new(
///     "demo",
///     "dm",
///     TemplateSet::from_pairs([("publish", "{root}/{project[name]}/{asset}/{subset}.{representation}")]),
///     Roots::uniform("/mnt/projects"),
/// );
/// let session = PublishSession::new(project, AssetContext::new("bob"))
///     .with_task(TaskContext::new("modeling"))
///     .with_username("jane")
///     .with_platform(Platform::Linux);
/// assert_eq!(session.platform, Platform::Linux);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PublishSession {
    /// Project anatomy
    pub project: ProjectConfig,
    /// Asset being published under
    pub asset: AssetContext,
    /// Current task, if any
    pub task: Option<TaskContext>,
    /// Publishing user, if known
    pub username: Option<String>,
    /// Platform whose root values are used
    pub platform: Platform,
}

impl PublishSession {
    /// Session on the current platform without task or user.
    #[must_use]
    pub fn new(project: ProjectConfig, asset: AssetContext) -> Self {
        Self {
            project,
            asset,
            task: None,
            username: None,
            platform: Platform::current(),
        }
    }

    /// Set the task.
    #[must_use]
    pub fn with_task(mut self, task: TaskContext) -> Self {
        self.task = Some(task);
        self
    }

    /// Set the publishing user.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Use another platform's root values.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }
}

fn required_str<'a>(document: &'a Value, field: &str, entity: EntityKind) -> Result<&'a str> {
    document
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid(entity, &format!("missing string field '{field}'")))
}

fn invalid(entity: EntityKind, reason: &str) -> AnatomyError {
    AnatomyError::InvalidDocument {
        entity,
        reason: reason.to_string(),
    }
}
