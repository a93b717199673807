//! Publish version resolution.
//!
//! Versions are positive integers that only ever grow: the next publish of a subset gets
//! the highest existing version plus one, or the configured start version when the subset
//! has never been published. Upstream data may pin an explicit version instead.
//!
//! Resolution is pure. Reading the existing versions is the caller's job, and so is
//! claiming the number when the version document is written; [`ResolvedVersion::verify_claim`]
//! is the check to run at that write boundary.
//!
//! # Examples
//!
//! ```rust
//! use anatomy_cli::version::resolve_version;
//!
//! assert_eq!(resolve_version(&[], None)?.number, 1);
//! assert_eq!(resolve_version(&[1, 2, 5], None)?.number, 6);
//!
//! let pinned = resolve_version(&[1, 2, 3], Some(10))?;
//! assert_eq!(pinned.number, 10);
//! assert!(pinned.is_new);
//! # Ok::<(), anatomy_cli::core::AnatomyError>(())
//! ```

use crate::constants::DEFAULT_VERSIONING_START;
use crate::core::{AnatomyError, Result};
use serde::{Deserialize, Serialize};

/// Outcome of version resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedVersion {
    /// Version number to publish under
    pub number: u32,
    /// `false` only when an explicit version re-publishes an existing one
    pub is_new: bool,
    /// Highest version that existed at resolution time
    pub latest_existing: Option<u32>,
    /// Whether the number came from upstream data rather than the history
    pub explicit: bool,
}

impl ResolvedVersion {
    /// Check, right before writing, that nobody claimed this version in the meantime.
    ///
    /// `current_existing` is the version history re-read at write time. An automatically
    /// resolved version conflicts when it now exists or is no longer above every existing
    /// version. An explicit version conflicts only when it was new at resolution time and
    /// exists now.
    ///
    /// # Errors
    ///
    /// [`AnatomyError::VersionConflict`] naming `asset`, `subset` and the version.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use anatomy_cli::version::resolve_version;
    ///
    /// let resolved = resolve_version(&[1, 2], None)?;
    /// assert!(resolved.verify_claim("bob", "modelMain", &[1, 2]).is_ok());
    /// // A concurrent publish wrote v3 first
    /// assert!(resolved.verify_claim("bob", "modelMain", &[1, 2, 3]).is_err());
    /// # Ok::<(), anatomy_cli::core::AnatomyError>(())
    /// ```
    pub fn verify_claim(&self, asset: &str, subset: &str, current_existing: &[u32]) -> Result<()> {
        let taken = current_existing.contains(&self.number);
        let overtaken = current_existing.iter().any(|v| *v > self.number);

        let conflict = if self.explicit {
            self.is_new && taken
        } else {
            taken || overtaken
        };

        if conflict {
            tracing::warn!("Version {} of {}/{} was claimed by another publish", self.number, asset, subset);
            return Err(AnatomyError::VersionConflict {
                asset: asset.to_string(),
                subset: subset.to_string(),
                version: self.number,
            });
        }
        Ok(())
    }
}

/// Resolves version numbers from a subset's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionResolver {
    /// Version given to the first publish of a subset
    pub start: u32,
}

impl Default for VersionResolver {
    fn default() -> Self {
        Self {
            start: DEFAULT_VERSIONING_START,
        }
    }
}

impl VersionResolver {
    /// Resolver whose first version is `start` (clamped to at least 1).
    #[must_use]
    pub fn with_start(start: u32) -> Self {
        Self {
            start: start.max(1),
        }
    }

    /// Compute the version to publish under.
    ///
    /// - `explicit` set: used verbatim; `is_new` tells whether it already existed
    /// - otherwise: highest existing version + 1, or `start` when there is none
    ///
    /// # Errors
    ///
    /// [`AnatomyError::InvalidVersion`] for an explicit version of 0, or when the
    /// history already holds `u32::MAX`.
    pub fn resolve(&self, existing: &[u32], explicit: Option<u32>) -> Result<ResolvedVersion> {
        let latest_existing = existing.iter().copied().max();

        let resolved = match explicit {
            Some(0) => {
                return Err(AnatomyError::InvalidVersion {
                    value: 0,
                });
            }
            Some(number) => ResolvedVersion {
                number,
                is_new: !existing.contains(&number),
                latest_existing,
                explicit: true,
            },
            None => {
                let number = match latest_existing {
                    Some(latest) => latest.checked_add(1).ok_or(AnatomyError::InvalidVersion {
                        value: i64::from(latest) + 1,
                    })?,
                    None => self.start,
                };
                ResolvedVersion {
                    number,
                    is_new: true,
                    latest_existing,
                    explicit: false,
                }
            }
        };

        tracing::debug!(
            "Resolved version {} (latest existing: {:?}, explicit: {})",
            resolved.number,
            resolved.latest_existing,
            resolved.explicit
        );
        Ok(resolved)
    }
}

/// Resolve with the default start version of 1.
///
/// # Errors
///
/// See [`VersionResolver::resolve`].
pub fn resolve_version(existing: &[u32], explicit: Option<u32>) -> Result<ResolvedVersion> {
    VersionResolver::default().resolve(existing, explicit)
}

/// Validate an explicit version coming from untyped upstream data.
///
/// # Errors
///
/// [`AnatomyError::InvalidVersion`] unless `1 <= value <= u32::MAX`.
pub fn validate_explicit_version(value: i64) -> Result<u32> {
    match u32::try_from(value) {
        Ok(number) if number > 0 => Ok(number),
        _ => Err(AnatomyError::InvalidVersion {
            value,
        }),
    }
}
