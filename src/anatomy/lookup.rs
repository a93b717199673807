//! Version history lookups against the backing store.

use crate::core::{AnatomyError, EntityKind, Result};
use crate::version::ResolvedVersion;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Why a boundary query returned nothing usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupFailure {
    /// The queried entity does not exist
    #[error("{kind} '{name}' was not found")]
    NotFound {
        /// Entity type
        kind: EntityKind,
        /// Entity name
        name: String,
    },
    /// The store could not answer
    #[error("version store unavailable: {0}")]
    Unavailable(String),
}

impl From<LookupFailure> for AnatomyError {
    fn from(failure: LookupFailure) -> Self {
        match failure {
            LookupFailure::NotFound {
                kind,
                name,
            } => Self::EntityNotFound {
                kind,
                name,
            },
            LookupFailure::Unavailable(reason) => Self::Other {
                message: format!("Version lookup failed: {reason}"),
            },
        }
    }
}

/// Source of published version numbers.
///
/// Implementations return every version published for `subset` under `asset`, or an empty
/// list when the subset has never been published. An unknown asset is a
/// [`LookupFailure::NotFound`].
///
/// Closures with the matching signature implement the trait:
///
/// ```rust
/// use anatomy_cli::anatomy::{LookupFailure, VersionLookup};
///
/// let lookup = |_asset: &str, subset: &str| -> Result<Vec<u32>, LookupFailure> {
///     Ok(if subset == "modelMain" { vec![1, 2] } else { vec![] })
/// };
/// assert_eq!(lookup.existing_versions("bob", "modelMain").unwrap(), vec![1, 2]);
/// ```
pub trait VersionLookup {
    /// Every published version of `subset` under `asset`.
    fn existing_versions(&self, asset: &str, subset: &str) -> std::result::Result<Vec<u32>, LookupFailure>;
}

impl<F> VersionLookup for F
where
    F: Fn(&str, &str) -> std::result::Result<Vec<u32>, LookupFailure>,
{
    fn existing_versions(&self, asset: &str, subset: &str) -> std::result::Result<Vec<u32>, LookupFailure> {
        self(asset, subset)
    }
}

/// Version history kept in memory, for tests and offline resolution.
///
/// # Examples
///
/// ```rust
/// use anatomy_cli::anatomy::{InMemoryVersionStore, VersionLookup};
/// use anatomy_cli::version::resolve_version;
///
/// let mut store = InMemoryVersionStore::new().with_asset("bob");
/// let resolved = resolve_version(&store.existing_versions("bob", "modelMain")?, None)?;
/// store.claim("bob", "modelMain", &resolved)?;
/// assert_eq!(store.existing_versions("bob", "modelMain")?, vec![1]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryVersionStore {
    assets: BTreeSet<String>,
    versions: BTreeMap<(String, String), BTreeSet<u32>>,
}

impl InMemoryVersionStore {
    /// Empty store without assets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset with no published subsets.
    #[must_use]
    pub fn with_asset(mut self, asset: impl Into<String>) -> Self {
        self.assets.insert(asset.into());
        self
    }

    /// Record published versions, registering the asset if needed.
    #[must_use]
    pub fn with_versions(mut self, asset: &str, subset: &str, versions: impl IntoIterator<Item = u32>) -> Self {
        for version in versions {
            self.record(asset, subset, version);
        }
        self
    }

    /// Record one published version.
    pub fn record(&mut self, asset: &str, subset: &str, version: u32) {
        self.assets.insert(asset.to_string());
        self.versions.entry((asset.to_string(), subset.to_string())).or_default().insert(version);
    }

    /// Claim a resolved version: check it is still free, then record it.
    ///
    /// # Errors
    ///
    /// [`AnatomyError::VersionConflict`] when another publish got there first, or
    /// [`AnatomyError::EntityNotFound`] for an unknown asset.
    pub fn claim(&mut self, asset: &str, subset: &str, resolved: &ResolvedVersion) -> Result<()> {
        let current = self.existing_versions(asset, subset)?;
        resolved.verify_claim(asset, subset, &current)?;
        self.record(asset, subset, resolved.number);
        Ok(())
    }
}

impl VersionLookup for InMemoryVersionStore {
    fn existing_versions(&self, asset: &str, subset: &str) -> std::result::Result<Vec<u32>, LookupFailure> {
        if !self.assets.contains(asset) {
            return Err(LookupFailure::NotFound {
                kind: EntityKind::Asset,
                name: asset.to_string(),
            });
        }
        Ok(self
            .versions
            .get(&(asset.to_string(), subset.to_string()))
            .map(|versions| versions.iter().copied().collect())
            .unwrap_or_default())
    }
}
