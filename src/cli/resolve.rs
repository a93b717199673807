//! `anatomy resolve`: compute a publish context from settings on disk.

use super::OutputFormat;
use super::settings::source;
use crate::anatomy::{
    Anatomy, AnatomyOptions, AssetContext, InMemoryVersionStore, ProjectConfig, PublishContext, PublishRequest,
    PublishSession, TaskContext, TemplateRequest,
};
use crate::constants::ANATOMY_SETTINGS_KEY;
use crate::roots::Platform;
use crate::transfer::Resource;
use crate::version::validate_explicit_version;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::Value;
use std::path::PathBuf;

/// Resolve version, filled templates and transfers for one subset.
///
/// The project anatomy is read from the `anatomy` section of the effective settings
/// (`templates`, `roots`, `versioning`). Existing versions are passed with `--existing`
/// since the binary has no database access.
#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// Directory tree of studio default documents
    #[arg(long, value_name = "DIR")]
    pub settings_dir: PathBuf,

    /// Override document applied on top, in the order given
    #[arg(long = "overrides", value_name = "FILE")]
    pub overrides: Vec<PathBuf>,

    /// Project name
    #[arg(long)]
    pub project: String,

    /// Project code
    #[arg(long)]
    pub code: String,

    /// Asset name
    #[arg(long)]
    pub asset: String,

    /// Asset parents, outermost first
    #[arg(long = "parent", value_name = "NAME")]
    pub parents: Vec<String>,

    /// Subset name
    #[arg(long)]
    pub subset: String,

    /// Subset family
    #[arg(long)]
    pub family: String,

    /// Publish under this version instead of the next free one
    #[arg(long, allow_negative_numbers = true)]
    pub version: Option<i64>,

    /// Version already published for the subset
    #[arg(long = "existing", value_name = "N")]
    pub existing: Vec<u32>,

    /// Additional template to fill (the `publish` template is always filled)
    #[arg(long = "template", value_name = "NAME")]
    pub templates: Vec<String>,

    /// Resource file copied next to the published file
    #[arg(long = "resource", value_name = "FILE")]
    pub resources: Vec<String>,

    /// Representation (file extension); templates must then be fully solved
    #[arg(long)]
    pub representation: Option<String>,

    /// Task name
    #[arg(long)]
    pub task: Option<String>,

    /// Publishing user
    #[arg(long)]
    pub user: Option<String>,

    /// Platform whose root values are used (defaults to the current one)
    #[arg(long, value_enum)]
    pub platform: Option<Platform>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl ResolveCommand {
    /// Print the publish context.
    ///
    /// # Errors
    ///
    /// Settings that cannot be loaded, an invalid `--version`, or any facade error.
    pub fn execute(self) -> Result<()> {
        let context = self.resolve()?;
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&context)?),
            OutputFormat::Text => print_context(&context),
        }
        Ok(())
    }

    /// The publish context without printing it.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub fn resolve(&self) -> Result<PublishContext> {
        let anatomy_settings = source(&self.settings_dir, &self.overrides)
            .with_subkeys([ANATOMY_SETTINGS_KEY])
            .load()
            .context("Failed to load anatomy settings")?;

        let project = ProjectConfig::from_settings(&self.project, &self.code, &anatomy_settings)
            .with_context(|| format!("Invalid anatomy for project '{}'", self.project))?;
        let session = self.session(project);
        let request = self.request()?;

        let store = InMemoryVersionStore::new().with_asset(&self.asset).with_versions(
            &self.asset,
            &self.subset,
            self.existing.iter().copied(),
        );

        let anatomy = Anatomy::new(AnatomyOptions::from_settings(&anatomy_settings));
        Ok(anatomy.compute_publish_context(&session, &request, &store)?)
    }

    fn session(&self, project: ProjectConfig) -> PublishSession {
        let asset = AssetContext::new(&self.asset).with_parents(self.parents.iter().cloned());
        let mut session = PublishSession::new(project, asset);
        if let Some(task) = &self.task {
            session = session.with_task(TaskContext::new(task));
        }
        if let Some(user) = &self.user {
            session = session.with_username(user);
        }
        if let Some(platform) = self.platform {
            session = session.with_platform(platform);
        }
        session
    }

    fn request(&self) -> Result<PublishRequest> {
        let mut request = PublishRequest::new(&self.subset, &self.family);
        if let Some(version) = self.version {
            request = request.with_version(validate_explicit_version(version)?);
        }

        let representation_known = self.representation.is_some();
        if let Some(representation) = &self.representation {
            request = request.with_data("representation", Value::String(representation.clone()));
        }
        let mode = |name: &str| {
            if representation_known {
                TemplateRequest::required(name)
            } else {
                TemplateRequest::assumed(name)
            }
        };

        request = request.with_template(mode("publish"));
        for name in &self.templates {
            request = request.with_template(mode(name.as_str()));
        }
        for path in &self.resources {
            request = request.with_resource(Resource::new(path));
        }
        Ok(request)
    }
}

fn print_context(context: &PublishContext) {
    let version = &context.resolved_version;
    let status = if version.is_new {
        "new".green()
    } else {
        "overwrite".yellow()
    };
    println!("{} v{:03} ({})", "Version".bold(), version.number, status);

    println!("{}", "Paths".bold());
    for (name, path) in &context.filled_paths {
        println!("  {name}: {path}");
        if let Some(rootless) = context.rootless_paths.get(name) {
            println!("  {}: {}", format!("{name} (rootless)").dimmed(), rootless);
        }
    }

    if !context.transfers.is_empty() {
        println!("{}", "Transfers".bold());
        for transfer in &context.transfers {
            println!("  {} -> {}", transfer.source, transfer.destination);
        }
    }
}
