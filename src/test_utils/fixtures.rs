//! Test fixtures for creating sample projects and settings trees
//!
//! This module provides builders for anatomy settings on disk and ready-made
//! project, asset and session values.

use crate::anatomy::{AssetContext, ProjectConfig, PublishSession};
use crate::roots::{Platform, Roots};
use crate::template::TemplateSet;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Publish template used by the demo fixtures.
pub const DEMO_PUBLISH_TEMPLATE: &str =
    "{root}/{project[name]}/{hierarchy}/{asset}/publish/{subset}/v{version:0>3}/{subset}.{representation}";

/// Project `demo` (code `dm`) rooted at `/mnt/projects` on every platform.
#[must_use]
pub fn demo_project() -> ProjectConfig {
    ProjectConfig::new(
        "demo",
        "dm",
        TemplateSet::from_pairs([
            ("publish", DEMO_PUBLISH_TEMPLATE),
            ("thumbnail", "{root}/{project[name]}/thumbnails/{asset}_{subset}_v{version:0>3}.jpg"),
        ]),
        Roots::uniform("/mnt/projects"),
    )
}

/// Top-level asset `bob`.
#[must_use]
pub fn demo_asset() -> AssetContext {
    AssetContext::new("bob")
}

/// Session publishing `bob` in `demo` on Linux.
#[must_use]
pub fn demo_session() -> PublishSession {
    PublishSession::new(demo_project(), demo_asset()).with_platform(Platform::Linux)
}

/// Test fixture for a studio settings tree
#[derive(Clone, Debug)]
pub struct SettingsFixture {
    /// `(relative path, content)` of every document
    pub files: Vec<(String, String)>,
    /// Fixture name, shown in write errors
    pub name: String,
}

impl SettingsFixture {
    /// Anatomy defaults: templates (JSON), roots (YAML) and versioning
    pub fn basic() -> Self {
        Self {
            name: "basic".to_string(),
            files: vec![
                (
                    "anatomy/templates.json".to_string(),
                    r#"{"publish": {"folder": "{root}/{project[name]}/{asset}/publish/{subset}/v{version:0>3}", "path": "{@folder}/{subset}.{representation}"}}"#
                        .to_string(),
                ),
                (
                    "anatomy/roots.yaml".to_string(),
                    "windows: P:/projects\nlinux: /mnt/projects\ndarwin: /Volumes/projects\n".to_string(),
                ),
                ("anatomy/versioning.json".to_string(), r#"{"start": 1}"#.to_string()),
                ("global/general.json".to_string(), r#"{"studio_name": "Test Studio"}"#.to_string()),
            ],
        }
    }

    /// Settings tree with a document that is not valid JSON
    pub fn with_broken_document() -> Self {
        let mut fixture = Self::basic();
        fixture.name = "broken".to_string();
        fixture.files.push(("anatomy/broken.json".to_string(), "{ not json".to_string()));
        fixture
    }

    /// Write every document below `dir`, returning `dir`
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        for (relative, content) in &self.files {
            let path = dir.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {} for fixture '{}'", parent.display(), self.name))?;
            }
            fs::write(&path, content)
                .with_context(|| format!("Failed to write {} of fixture '{}'", path.display(), self.name))?;
        }
        Ok(dir.to_path_buf())
    }
}
