//! The publish entry point: version, filled templates and file transfers in one call.
//!
//! A publish plugin hands over the session (project, asset, task, user, platform) and a
//! request (subset, family, optional version, templates, resources). The facade then
//! runs, in order:
//!
//! 1. build the template data from the session and request
//! 2. query the version history through a [`VersionLookup`] and resolve the version
//! 3. fill every requested template
//! 4. plan resource transfers next to the filled `publish` path
//!
//! and returns a [`PublishContext`]. Nothing is cached between calls; either the whole
//! context is computed or an error names what is missing.
//!
//! # Template data
//!
//! | key | value |
//! |-----|-------|
//! | `root` | root value(s) for the session platform |
//! | `project` | `{name, code}` |
//! | `asset`, `folder[name]` | asset name |
//! | `hierarchy` | parents joined with `/` |
//! | `parent` | last parent, or the project name for top-level assets |
//! | `silo` | asset silo, when [`AnatomyOptions::include_silo`] is set |
//! | `subset`, `family` | from the request |
//! | `task` | `{name, type, short}` when the session has a task |
//! | `user` | publishing user, when known |
//! | `version` | resolved version number |
//! | `representation` | request data, or [`AnatomyOptions::representation_placeholder`] |
//!
//! # Examples
//!
//! ```rust
//! use anatomy_cli::anatomy::{Anatomy, AssetContext, InMemoryVersionStore, ProjectConfig, PublishRequest, PublishSession};
//! use anatomy_cli::roots::{Platform, Roots};
//! use anatomy_cli::template::TemplateSet;
//!
//! let project = ProjectConfig::new(
//!     "demo",
//!     "dm",
//!     TemplateSet::from_pairs([(
//!         "publish",
//!         "{root}/{project[name]}/{asset}/publish/{subset}/v{version:0>3}/{subset}.{representation}",
//!     )]),
//!     Roots::uniform("/mnt/projects"),
//! );
//! let session = PublishSession::new(project, AssetContext::new("bob")).with_platform(Platform::Linux);
//! let store = InMemoryVersionStore::new().with_asset("bob");
//!
//! let context = Anatomy::default().compute_publish_context(&session, &PublishRequest::new("modelMain", "model"), &store)?;
//! assert_eq!(context.resolved_version.number, 1);
//! assert_eq!(context.filled_paths["publish"], "/mnt/projects/demo/bob/publish/modelMain/v001/modelMain.TEMP");
//! # Ok::<(), anatomy_cli::core::AnatomyError>(())
//! ```

pub mod lookup;
pub mod project;

pub use lookup::{InMemoryVersionStore, LookupFailure, VersionLookup};
pub use project::{AssetContext, ProjectConfig, PublishSession, TaskContext};

use crate::constants::{DEFAULT_REPRESENTATION_PLACEHOLDER, DEFAULT_VERSIONING_START, REPRESENTATION_KEY};
use crate::core::{AnatomyError, Result};
use crate::template::{StringTemplate, TemplateResult};
use crate::transfer::{Resource, Transfer, plan_transfers};
use crate::utils::normalize_path_str;
use crate::version::{ResolvedVersion, VersionResolver};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// Name of the template whose folder receives resources.
pub const PUBLISH_TEMPLATE: &str = "publish";

/// Per-host variations of the anatomy data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnatomyOptions {
    /// Value of `representation` until an extractor knows the real extension
    pub representation_placeholder: String,
    /// Whether the asset silo is exposed as `silo`
    pub include_silo: bool,
    /// First version of a never-published subset
    pub versioning_start: u32,
}

impl Default for AnatomyOptions {
    fn default() -> Self {
        Self {
            representation_placeholder: DEFAULT_REPRESENTATION_PLACEHOLDER.to_string(),
            include_silo: false,
            versioning_start: DEFAULT_VERSIONING_START,
        }
    }
}

impl AnatomyOptions {
    /// Read options from merged anatomy settings.
    ///
    /// Recognised keys: `versioning.start`, `representation_placeholder` and `include_silo`;
    /// anything absent keeps its default.
    #[must_use]
    pub fn from_settings(anatomy: &Value) -> Self {
        let defaults = Self::default();
        Self {
            representation_placeholder: anatomy
                .get("representation_placeholder")
                .and_then(Value::as_str)
                .map_or(defaults.representation_placeholder, str::to_string),
            include_silo: anatomy.get("include_silo").and_then(Value::as_bool).unwrap_or(defaults.include_silo),
            versioning_start: anatomy
                .pointer("/versioning/start")
                .and_then(Value::as_u64)
                .and_then(|start| u32::try_from(start).ok())
                .unwrap_or(defaults.versioning_start),
        }
    }
}

/// How strictly a template must be solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateMode {
    /// Every key must have a real value
    Final,
    /// The `representation` may still be the placeholder; every other key must be set
    #[default]
    Assumed,
}

/// A template to fill, by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRequest {
    /// Template name (`publish`, `publish.folder`, `thumbnail`...)
    pub name: String,
    /// How strictly it must be solved
    pub mode: TemplateMode,
}

impl TemplateRequest {
    /// A template that may keep the representation placeholder.
    pub fn assumed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: TemplateMode::Assumed,
        }
    }

    /// A template that must be fully solved.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: TemplateMode::Final,
        }
    }
}

/// What is being published.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishRequest {
    /// Subset (product) name
    pub subset: String,
    /// Family of the subset
    pub family: String,
    /// Version pinned by upstream data
    pub explicit_version: Option<u32>,
    /// Templates to fill; `publish` is always filled
    pub templates: Vec<TemplateRequest>,
    /// Secondary files copied next to the published file
    pub resources: Vec<Resource>,
    /// Additional template data such as `representation`, `output` or `frame`.
    /// Computed keys take precedence, except `representation`.
    pub additional_data: Map<String, Value>,
}

impl PublishRequest {
    /// Request the assumed `publish` template for `subset` of `family`.
    pub fn new(subset: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            subset: subset.into(),
            family: family.into(),
            explicit_version: None,
            templates: vec![TemplateRequest::assumed(PUBLISH_TEMPLATE)],
            resources: Vec::new(),
            additional_data: Map::new(),
        }
    }

    /// Pin the version.
    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.explicit_version = Some(version);
        self
    }

    /// Also fill `template`; a repeated name replaces the earlier request.
    #[must_use]
    pub fn with_template(mut self, template: TemplateRequest) -> Self {
        self.templates.retain(|existing| existing.name != template.name);
        self.templates.push(template);
        self
    }

    /// Add a resource.
    #[must_use]
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Add template data.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.additional_data.insert(key.into(), value.into());
        self
    }
}

/// Everything later publish stages need.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishContext {
    /// The data every template was filled with
    pub template_data: Map<String, Value>,
    /// Template name → filled path
    pub filled_paths: BTreeMap<String, String>,
    /// Template name → path with the root replaced by its template key
    pub rootless_paths: BTreeMap<String, String>,
    /// Version the publish goes to
    pub resolved_version: ResolvedVersion,
    /// `resources` folder next to the published file
    pub destination_root: String,
    /// Resources with their planned destinations
    pub resources: Vec<Resource>,
    /// File copies to perform
    pub transfers: Vec<Transfer>,
}

/// Anatomy facade, parameterised by host options.
#[derive(Debug, Clone, Default)]
pub struct Anatomy {
    options: AnatomyOptions,
}

impl Anatomy {
    /// Facade with the given options.
    #[must_use]
    pub fn new(options: AnatomyOptions) -> Self {
        Self {
            options,
        }
    }

    /// The options in use.
    #[must_use]
    pub fn options(&self) -> &AnatomyOptions {
        &self.options
    }

    /// Compute version, filled templates and transfers for one publish instance.
    ///
    /// # Errors
    ///
    /// - [`AnatomyError::EntityNotFound`] when the lookup does not know the asset
    /// - [`AnatomyError::InvalidVersion`] for an explicit version of 0
    /// - [`AnatomyError::MissingTemplate`] for an undefined template
    /// - [`AnatomyError::MissingTemplateKey`] / [`AnatomyError::InvalidTemplateValue`] when
    ///   a template cannot be solved in its mode
    /// - [`AnatomyError::DestinationCollision`] when resource files collide
    pub fn compute_publish_context(
        &self,
        session: &PublishSession,
        request: &PublishRequest,
        lookup: &impl VersionLookup,
    ) -> Result<PublishContext> {
        let (mut template_data, representation_is_placeholder) = self.build_template_data(session, request);

        let existing = lookup.existing_versions(&session.asset.name, &request.subset).map_err(AnatomyError::from)?;
        let resolved_version = VersionResolver::with_start(self.options.versioning_start)
            .resolve(&existing, request.explicit_version)?;
        template_data.insert("version".to_string(), json!(resolved_version.number));

        let mut filled_paths = BTreeMap::new();
        let mut rootless_paths = BTreeMap::new();
        for template in requested_templates(request) {
            let raw = session.project.templates.get(&template.name)?;
            let result = StringTemplate::new(raw).format(&template_data);
            check_solved(&result, template.mode, representation_is_placeholder)?;

            let filled = normalize_path_str(&result.output);
            tracing::debug!("Filled template '{}': {}", template.name, filled);
            if let Some(rootless) = session.project.roots.find_root_template(&filled) {
                rootless_paths.insert(template.name.clone(), rootless);
            }
            filled_paths.insert(template.name, filled);
        }

        let publish_path = filled_paths.get(PUBLISH_TEMPLATE).map(String::as_str).unwrap_or_default();
        let plan = plan_transfers(publish_path, &request.resources)?;

        Ok(PublishContext {
            template_data,
            filled_paths,
            rootless_paths,
            resolved_version,
            destination_root: plan.destination_root,
            resources: plan.resources,
            transfers: plan.transfers,
        })
    }

    /// Template data without `version`, and whether `representation` is the placeholder.
    fn build_template_data(&self, session: &PublishSession, request: &PublishRequest) -> (Map<String, Value>, bool) {
        let project = &session.project;
        let asset = &session.asset;

        let mut data = request.additional_data.clone();
        let representation_is_placeholder = !data.contains_key(REPRESENTATION_KEY);
        if representation_is_placeholder {
            data.insert(REPRESENTATION_KEY.to_string(), json!(self.options.representation_placeholder));
        }

        data.extend(project.template_data(session.platform));
        data.insert("asset".to_string(), json!(asset.name));
        data.insert("folder".to_string(), json!({"name": asset.name}));
        data.insert("hierarchy".to_string(), json!(asset.hierarchy()));
        data.insert("parent".to_string(), json!(asset.parents.last().unwrap_or(&project.name)));
        if self.options.include_silo {
            if let Some(silo) = &asset.silo {
                data.insert("silo".to_string(), json!(silo));
            }
        }
        data.insert("subset".to_string(), json!(request.subset));
        data.insert("family".to_string(), json!(request.family));

        if let Some(task) = &session.task {
            let mut task_data = Map::new();
            task_data.insert("name".to_string(), json!(task.name));
            if let Some(task_type) = &task.task_type {
                task_data.insert("type".to_string(), json!(task_type));
            }
            if let Some(short) = &task.short {
                task_data.insert("short".to_string(), json!(short));
            }
            data.insert("task".to_string(), Value::Object(task_data));
        }
        if let Some(username) = &session.username {
            data.insert("user".to_string(), json!(username));
        }

        (data, representation_is_placeholder)
    }
}

/// Requested templates with `publish` first, added as assumed if missing.
fn requested_templates(request: &PublishRequest) -> Vec<TemplateRequest> {
    let mut templates = Vec::with_capacity(request.templates.len() + 1);
    if !request.templates.iter().any(|t| t.name == PUBLISH_TEMPLATE) {
        templates.push(TemplateRequest::assumed(PUBLISH_TEMPLATE));
    }
    templates.extend(request.templates.iter().cloned());
    templates
}

fn check_solved(result: &TemplateResult, mode: TemplateMode, representation_is_placeholder: bool) -> Result<()> {
    result.validate()?;

    if mode == TemplateMode::Final && representation_is_placeholder && result.used_values.contains_key(REPRESENTATION_KEY) {
        return Err(AnatomyError::MissingTemplateKey {
            key: REPRESENTATION_KEY.to_string(),
            template: result.template.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roots::{Platform, Roots};
    use crate::template::TemplateSet;

    const PUBLISH: &str = "{root}/{project[name]}/{asset}/publish/{subset}/v{version:0>3}/{subset}.{representation}";

    fn session(templates: TemplateSet) -> PublishSession {
        let project = ProjectConfig::new("demo", "dm", templates, Roots::uniform("/mnt/projects"));
        PublishSession::new(project, AssetContext::new("bob")).with_platform(Platform::Linux)
    }

    fn store() -> InMemoryVersionStore {
        InMemoryVersionStore::new().with_asset("bob")
    }

    #[test]
    fn test_first_publish() {
        let session = session(TemplateSet::from_pairs([("publish", PUBLISH)]));
        let context = Anatomy::default()
            .compute_publish_context(&session, &PublishRequest::new("modelMain", "model"), &store())
            .unwrap();

        assert_eq!(context.resolved_version.number, 1);
        assert!(context.filled_paths["publish"].ends_with("/bob/publish/modelMain/v001/modelMain.TEMP"));
        assert_eq!(context.rootless_paths["publish"], "{root}/demo/bob/publish/modelMain/v001/modelMain.TEMP");
        assert_eq!(context.template_data["parent"], "demo");
        assert_eq!(context.template_data["hierarchy"], "");
        assert_eq!(context.template_data["version"], 1);
    }

    #[test]
    fn test_existing_versions_are_continued() {
        let session = session(TemplateSet::from_pairs([("publish", PUBLISH)]));
        let lookup = store().with_versions("bob", "modelMain", [1, 2, 5]);
        let context = Anatomy::default()
            .compute_publish_context(&session, &PublishRequest::new("modelMain", "model"), &lookup)
            .unwrap();
        assert_eq!(context.resolved_version.number, 6);
        assert!(context.filled_paths["publish"].contains("/v006/"));
    }

    #[test]
    fn test_unknown_asset_fails_fast() {
        let session = session(TemplateSet::from_pairs([("publish", PUBLISH)]));
        let err = Anatomy::default()
            .compute_publish_context(&session, &PublishRequest::new("modelMain", "model"), &InMemoryVersionStore::new())
            .unwrap_err();
        assert!(matches!(err, AnatomyError::EntityNotFound { .. }));
    }

    #[test]
    fn test_final_template_requires_representation() {
        let session = session(TemplateSet::from_pairs([("publish", PUBLISH)]));
        let request = PublishRequest::new("modelMain", "model").with_template(TemplateRequest::required("publish"));
        let err = Anatomy::default().compute_publish_context(&session, &request, &store()).unwrap_err();
        assert!(matches!(err, AnatomyError::MissingTemplateKey { ref key, .. } if key == "representation"));

        let request = request.with_data("representation", "abc");
        let context = Anatomy::default().compute_publish_context(&session, &request, &store()).unwrap();
        assert!(context.filled_paths["publish"].ends_with("modelMain.abc"));
    }

    #[test]
    fn test_missing_key_outside_representation_fails() {
        let templates = TemplateSet::from_pairs([("publish", PUBLISH), ("render", "{root}/{asset}/{output}.exr")]);
        let request = PublishRequest::new("renderMain", "render").with_template(TemplateRequest::assumed("render"));
        let err = Anatomy::default().compute_publish_context(&session(templates), &request, &store()).unwrap_err();
        assert!(matches!(err, AnatomyError::MissingTemplateKey { ref key, .. } if key == "output"));
    }

    #[test]
    fn test_resources_land_next_to_publish() {
        let session = session(TemplateSet::from_pairs([("publish", PUBLISH)]));
        let request = PublishRequest::new("lookMain", "look").with_resource(Resource::new("/textures/diffuse.png"));
        let context = Anatomy::default().compute_publish_context(&session, &request, &store()).unwrap();
        assert_eq!(context.destination_root, "/mnt/projects/demo/bob/publish/lookMain/v001/resources");
        assert_eq!(
            context.transfers[0].as_pair(),
            ("/textures/diffuse.png", "/mnt/projects/demo/bob/publish/lookMain/v001/resources/diffuse.png")
        );
    }

    #[test]
    fn test_options_change_data() {
        let templates = TemplateSet::from_pairs([("publish", "{root}/{silo}/{asset}/v{version:0>3}/{subset}.{representation}")]);
        let mut session = session(templates);
        session.asset = AssetContext::new("bob").with_silo("assets");
        let anatomy = Anatomy::new(AnatomyOptions {
            representation_placeholder: "EXT".to_string(),
            include_silo: true,
            versioning_start: 10,
        });
        let context = anatomy.compute_publish_context(&session, &PublishRequest::new("modelMain", "model"), &store()).unwrap();
        assert_eq!(context.filled_paths["publish"], "/mnt/projects/assets/bob/v010/modelMain.EXT");
    }

    #[test]
    fn test_options_from_settings() {
        let options = AnatomyOptions::from_settings(&json!({"versioning": {"start": 0}, "include_silo": true}));
        assert_eq!(options.versioning_start, 0);
        assert!(options.include_silo);
        assert_eq!(options.representation_placeholder, "TEMP");
    }

    #[test]
    fn test_task_and_user_data() {
        let templates = TemplateSet::from_pairs([("publish", PUBLISH), ("work", "{root}/{asset}/work/{task[name]}/{user}")]);
        let session = session(templates)
            .with_task(TaskContext::new("modeling").with_type("Modeling", Some("mdl".to_string())))
            .with_username("jane");
        let request = PublishRequest::new("modelMain", "model").with_template(TemplateRequest::required("work"));
        let context = Anatomy::default().compute_publish_context(&session, &request, &store()).unwrap();
        assert_eq!(context.filled_paths["work"], "/mnt/projects/bob/work/modeling/jane");
        assert_eq!(context.template_data["task"], json!({"name": "modeling", "type": "Modeling", "short": "mdl"}));
    }

    #[test]
    fn test_root_missing_on_platform_only_fails_templates_using_it() {
        let roots = Roots::from_value(&json!({
            "work": {"windows": "P:/work", "linux": "/mnt/work"},
            "render": {"linux": "/mnt/render"}
        }))
        .unwrap();
        let templates = TemplateSet::from_pairs([
            ("publish", "{root[work]}/{project[name]}/{asset}/v{version:0>3}/{subset}.{representation}"),
            ("render", "{root[render]}/{project[name]}/{asset}/{subset}"),
        ]);
        let project = ProjectConfig::new("demo", "dm", templates, roots);
        let session = PublishSession::new(project, AssetContext::new("bob")).with_platform(Platform::Windows);

        let context = Anatomy::default()
            .compute_publish_context(&session, &PublishRequest::new("modelMain", "model"), &store())
            .unwrap();
        assert_eq!(context.filled_paths["publish"], "P:/work/demo/bob/v001/modelMain.TEMP");
        assert_eq!(context.template_data["root"], json!({"work": "P:/work"}));

        let request = PublishRequest::new("modelMain", "model").with_template(TemplateRequest::assumed("render"));
        let err = Anatomy::default().compute_publish_context(&session, &request, &store()).unwrap_err();
        assert!(matches!(err, AnatomyError::MissingTemplateKey { ref key, .. } if key == "root[render]"));
    }

    #[test]
    fn test_empty_roots_only_fail_templates_using_root() {
        let roots = Roots::from_value(&json!({})).unwrap();
        let templates = TemplateSet::from_pairs([("publish", "/mnt/fixed/{asset}/v{version:0>3}/{subset}.{representation}")]);
        let session = PublishSession::new(ProjectConfig::new("demo", "dm", templates, roots), AssetContext::new("bob"));

        let context = Anatomy::default()
            .compute_publish_context(&session, &PublishRequest::new("modelMain", "model"), &store())
            .unwrap();
        assert_eq!(context.filled_paths["publish"], "/mnt/fixed/bob/v001/modelMain.TEMP");
        assert!(!context.template_data.contains_key("root"));
    }
}
