//! Anatomy - publish path, version and transfer resolution for studio pipelines
//!
//! Every published file in a studio pipeline lands at a path built from a project's
//! *anatomy*: named path templates, per-platform roots and versioning rules, layered from
//! studio defaults and project overrides. This crate answers, for one publish, "which
//! version is this, where does it go, and where do its secondary files go?".
//!
//! # Architecture Overview
//!
//! ```text
//! settings dir + overrides ──► settings ──► ProjectConfig (templates, roots)
//!                                                  │
//! session + request ──► anatomy::Anatomy ◄─────────┘
//!                        │   ├─ version   (next or explicit version)
//!                        │   ├─ template  (fill templates, {@links}, <optional>)
//!                        │   └─ transfer  (resources next to the publish file)
//!                        ▼
//!                  PublishContext
//! ```
//!
//! Computation is pure: nothing is read from ambient process state, and the version
//! history is queried through the [`anatomy::VersionLookup`] trait so hosts plug in their
//! own database.
//!
//! # Core Modules
//!
//! - [`anatomy`] - The facade computing a [`anatomy::PublishContext`]
//! - [`settings`] - Layered settings with `__overriden_keys__` / `__pop_key__` markers
//! - [`template`] - Template formatting, format specs, optional segments and links
//! - [`roots`] - Per-platform project roots and rootless paths
//! - [`version`] - Version resolution and write-time conflict checks
//! - [`transfer`] - Resource destination and transfer planning
//!
//! ## Supporting Modules
//! - [`core`] - Error types and user-facing error context
//! - [`cli`] - The `anatomy` binary's commands
//! - [`utils`] - Path normalization
//! - [`constants`] - Reserved markers and defaults
//!
//! # Example
//!
//! ```rust
//! use anatomy_cli::anatomy::{Anatomy, AssetContext, InMemoryVersionStore, ProjectConfig, PublishRequest, PublishSession};
//! use anatomy_cli::roots::{Platform, Roots};
//! use anatomy_cli::template::TemplateSet;
//! use anatomy_cli::transfer::Resource;
//!
//! let project = ProjectConfig::new(
//!     "demo",
//!     "dm",
//!     TemplateSet::from_pairs([("publish", "{root}/{project[name]}/{asset}/publish/{subset}/v{version:0>3}/{subset}.{representation}")]),
//!     Roots::uniform("/mnt/projects"),
//! );
//! let session = PublishSession::new(project, AssetContext::new("bob")).with_platform(Platform::Linux);
//! let history = InMemoryVersionStore::new().with_versions("bob", "lookMain", [1, 2]);
//!
//! let request = PublishRequest::new("lookMain", "look")
//!     .with_data("representation", "ma")
//!     .with_resource(Resource::new("/textures/diffuse.png"));
//! let context = Anatomy::default().compute_publish_context(&session, &request, &history)?;
//!
//! assert_eq!(context.filled_paths["publish"], "/mnt/projects/demo/bob/publish/lookMain/v003/lookMain.ma");
//! assert_eq!(context.transfers[0].destination, "/mnt/projects/demo/bob/publish/lookMain/v003/resources/diffuse.png");
//! # Ok::<(), anatomy_cli::core::AnatomyError>(())
//! ```

pub mod anatomy;
pub mod cli;
pub mod constants;
pub mod core;
pub mod roots;
pub mod settings;
pub mod template;
pub mod transfer;
pub mod utils;
pub mod version;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
