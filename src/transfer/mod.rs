//! Destination and transfer planning for publish resources.
//!
//! Secondary files of a publish (textures, caches, sequences) are copied into a
//! `resources` folder next to the main published file:
//!
//! ```text
//! /mnt/projects/demo/bob/publish/look/v001/
//! ├── look.ma                 <- filled "publish" template
//! └── resources/
//!     ├── tex_a.png
//!     └── caches/             <- Resource::destination_subfolder
//!         └── sim.0001.bgeo
//! ```
//!
//! Planning is pure: the same inputs always give the same transfers and the filesystem
//! is never touched. Every planned path is normalized to forward slashes.

use crate::constants::RESOURCES_DIR_NAME;
use crate::core::{AnatomyError, Result};
use crate::utils::{basename, dirname, join_path, normalize_path_str};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// A secondary file or file sequence published alongside the main file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Representative file of the resource (first frame, UDIM tile, or the file itself)
    ///
    /// Usually one of `files`. When it is not, no transfer is planned for it but its
    /// destination is still reserved against other files.
    pub source_path: String,
    /// Every file belonging to the resource, in copy order
    #[serde(default)]
    pub files: Vec<String>,
    /// Folder below `resources/` receiving the files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_subfolder: Option<String>,
    /// Free-form labels set by collectors
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    /// Planned destination of `source_path`, set by [`plan_transfers`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

impl Resource {
    /// A single-file resource.
    pub fn new(source_path: impl Into<String>) -> Self {
        let source_path = source_path.into();
        Self {
            files: vec![source_path.clone()],
            source_path,
            ..Self::default()
        }
    }

    /// A resource made of several files (sequence or UDIM set) represented by `source_path`.
    pub fn sequence<I, S>(source_path: impl Into<String>, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source_path: source_path.into(),
            files: files.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Place the files under `resources/<subfolder>/`.
    #[must_use]
    pub fn with_subfolder(mut self, subfolder: impl Into<String>) -> Self {
        self.destination_subfolder = Some(subfolder.into());
        self
    }

    /// Add a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }
}

/// One file copy: `source` to `destination`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transfer {
    /// File to copy
    pub source: String,
    /// Where it is copied to
    pub destination: String,
}

impl Transfer {
    /// The transfer as a `(source, destination)` pair.
    #[must_use]
    pub fn as_pair(&self) -> (&str, &str) {
        (&self.source, &self.destination)
    }
}

/// Result of [`plan_transfers`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPlan {
    /// `resources` folder next to the published file
    pub destination_root: String,
    /// Input resources with [`Resource::destination`] filled in
    pub resources: Vec<Resource>,
    /// One transfer per distinct resource file, in input order
    pub transfers: Vec<Transfer>,
}

/// Plan where every resource file goes, given the filled `publish` path.
///
/// Each file lands in `dirname(filled_publish_path)/resources[/<subfolder>]/<basename>`.
/// A file listed twice (in one resource or across resources) is transferred once.
/// [`Resource::destination`] is derived from `source_path` the same way.
///
/// # Errors
///
/// [`AnatomyError::DestinationCollision`] when two different source files share a
/// destination, e.g. two `diffuse.png` textures from different folders. A
/// `source_path` outside `files` takes part in this check.
///
/// # Examples
///
/// ```rust
/// use anatomy_cli::transfer::{Resource, plan_transfers};
///
/// let plan = plan_transfers(
///     r"C:\proj\asset\publish\look\v001\look.ma",
///     &[Resource::new("tex_a.png")],
/// )?;
/// assert_eq!(plan.destination_root, "C:/proj/asset/publish/look/v001/resources");
/// assert_eq!(
///     plan.transfers[0].as_pair(),
///     ("tex_a.png", "C:/proj/asset/publish/look/v001/resources/tex_a.png")
/// );
/// # Ok::<(), anatomy_cli::core::AnatomyError>(())
/// ```
pub fn plan_transfers(filled_publish_path: &str, resources: &[Resource]) -> Result<TransferPlan> {
    let destination_root = join_path(&dirname(filled_publish_path), RESOURCES_DIR_NAME);

    let mut claims: HashMap<String, String> = HashMap::new();
    let mut transferred = HashSet::new();
    let mut transfers = Vec::new();
    let mut updated = Vec::with_capacity(resources.len());

    for resource in resources {
        let folder = match resource.destination_subfolder.as_deref().map(sanitize_subfolder) {
            Some(sub) if !sub.is_empty() => join_path(&destination_root, &sub),
            _ => destination_root.clone(),
        };

        for file in &resource.files {
            let source = normalize_path_str(file);
            let destination = join_path(&folder, &basename(file));
            claim(&mut claims, &destination, &source)?;

            if transferred.insert(destination.clone()) {
                transfers.push(Transfer {
                    source,
                    destination,
                });
            } else {
                tracing::debug!("Skipping duplicate transfer of {}", source);
            }
        }

        let destination = join_path(&folder, &basename(&resource.source_path));
        claim(&mut claims, &destination, &normalize_path_str(&resource.source_path))?;

        let mut resource = resource.clone();
        resource.destination = Some(destination);
        updated.push(resource);
    }

    tracing::debug!("Planned {} transfer(s) into {}", transfers.len(), destination_root);
    Ok(TransferPlan {
        destination_root,
        resources: updated,
        transfers,
    })
}

/// Reserve `destination` for `source`; the same source may claim it again.
fn claim(claims: &mut HashMap<String, String>, destination: &str, source: &str) -> Result<()> {
    match claims.get(destination) {
        Some(existing) if existing != source => Err(AnatomyError::DestinationCollision {
            destination: destination.to_string(),
            first: existing.clone(),
            second: source.to_string(),
        }),
        Some(_) => Ok(()),
        None => {
            claims.insert(destination.to_string(), source.to_string());
            Ok(())
        }
    }
}

/// Keep a subfolder inside the resources folder: no absolute paths, no leading `..`.
fn sanitize_subfolder(subfolder: &str) -> String {
    let normalized = normalize_path_str(subfolder);
    let inside: Vec<&str> =
        normalized.split('/').filter(|segment| !segment.is_empty() && *segment != "..").collect();
    let sanitized = inside.join("/");
    if sanitized != normalized {
        tracing::warn!("Resource subfolder '{}' was reduced to '{}'", subfolder, sanitized);
    }
    sanitized
}
