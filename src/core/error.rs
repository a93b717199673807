//! Error handling for anatomy
//!
//! This module provides the error type shared by every anatomy operation and the
//! user-facing error reporting used by the `anatomy` binary. The error system follows
//! two principles:
//! 1. **Strongly-typed errors** so publish plugins can match on the failure mode
//! 2. **User-friendly messages** with actionable suggestions for pipeline users
//!
//! # Architecture
//!
//! - [`AnatomyError`] - Enumerated error types for every failure in the core
//! - [`ErrorContext`] - Wrapper that adds user-friendly details and suggestions
//!
//! # Error Categories
//!
//! - **Configuration**: [`AnatomyError::ConfigLoadError`], [`AnatomyError::MissingTemplate`]
//! - **Templates**: [`AnatomyError::MissingTemplateKey`], [`AnatomyError::InvalidTemplateValue`],
//!   [`AnatomyError::TemplateLinkError`]
//! - **Entities**: [`AnatomyError::EntityNotFound`], [`AnatomyError::InvalidDocument`]
//! - **Versioning**: [`AnatomyError::InvalidVersion`], [`AnatomyError::VersionConflict`]
//! - **Transfers**: [`AnatomyError::DestinationCollision`], [`AnatomyError::RootNotFound`]
//!
//! Nothing in the core retries. Every error propagates synchronously to the caller, which
//! is expected to fail the publish instance and move on to the next one.
//!
//! # Examples
//!
//! ```rust,no_run
//! use anatomy_cli::core::{AnatomyError, ErrorContext, user_friendly_error};
//!
//! let error = AnatomyError::MissingTemplateKey {
//!     key: "subset".to_string(),
//!     template: "{root}/{subset}".to_string(),
//! };
//!
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // colored error with suggestion on stderr
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Result alias used by the anatomy core.
pub type Result<T> = std::result::Result<T, AnatomyError>;

/// Kind of backing-store entity a lookup refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Project document
    Project,
    /// Asset (folder) document
    Asset,
    /// Subset (product) document
    Subset,
    /// Version document
    Version,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Project => "project",
            Self::Asset => "asset",
            Self::Subset => "subset",
            Self::Version => "version",
        };
        f.write_str(name)
    }
}

/// The main error type for anatomy operations
///
/// Each variant names the specific entity, key or path involved so the message shown to
/// a pipeline user points directly at what has to be fixed.
///
/// # Examples
///
/// ```rust,no_run
/// use anatomy_cli::core::{AnatomyError, EntityKind};
///
/// fn describe(error: &AnatomyError) -> &'static str {
///     match error {
///         AnatomyError::MissingTemplateKey { .. } => "template data is incomplete",
///         AnatomyError::EntityNotFound { kind: EntityKind::Asset, .. } => "unknown asset",
///         _ => "publish failed",
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum AnatomyError {
    /// A configuration file could not be read or parsed
    ///
    /// The directory loader downgrades this to a warning and skips the file; it only
    /// surfaces as an error when an explicitly requested file is broken.
    #[error("Failed to load configuration from {path}: {reason}")]
    ConfigLoadError {
        /// Path of the offending file
        path: String,
        /// Underlying parse or I/O failure
        reason: String,
    },

    /// A named template is not defined in the project anatomy
    #[error("Template '{name}' is not defined in the project anatomy")]
    MissingTemplate {
        /// Requested template name (e.g. `publish`, `publish.folder`)
        name: String,
        /// Defined template names close to the requested one
        suggestions: Vec<String>,
    },

    /// Strict formatting referenced a key absent from the template data
    #[error("Template key '{key}' is missing from data for template \"{template}\"")]
    MissingTemplateKey {
        /// First missing key, in `project[name]` notation for nested keys
        key: String,
        /// The template being formatted
        template: String,
    },

    /// A template key resolved to a value that cannot be written into a path
    #[error("Template key '{key}' has unsupported value type {found} in template \"{template}\"")]
    InvalidTemplateValue {
        /// Key whose value had the wrong type
        key: String,
        /// The template being formatted
        template: String,
        /// JSON type name of the offending value
        found: String,
    },

    /// An inner `{@name}` link between templates could not be solved
    #[error("Cannot solve template link in '{key}': {reason}")]
    TemplateLinkError {
        /// Template whose value contains the link
        key: String,
        /// Why the link is unsolvable
        reason: String,
    },

    /// A project, asset or subset document is missing from the backing store
    #[error("{kind} '{name}' was not found")]
    EntityNotFound {
        /// Entity type
        kind: EntityKind,
        /// Entity name
        name: String,
    },

    /// A document had an unexpected shape
    #[error("Invalid {entity} document: {reason}")]
    InvalidDocument {
        /// Which document type was being read
        entity: EntityKind,
        /// What was wrong with it
        reason: String,
    },

    /// A version number is not a positive integer
    #[error("Invalid version number: {value}")]
    InvalidVersion {
        /// The rejected value
        value: i64,
    },

    /// Another publish claimed the resolved version number first
    #[error("Version {version} of '{subset}' under asset '{asset}' was already claimed")]
    VersionConflict {
        /// Asset name
        asset: String,
        /// Subset name
        subset: String,
        /// The contested version number
        version: u32,
    },

    /// Two different source files would be copied to the same destination
    #[error("Destination '{destination}' is targeted by both '{first}' and '{second}'")]
    DestinationCollision {
        /// The shared destination path
        destination: String,
        /// Source file planned first
        first: String,
        /// Source file that collided
        second: String,
    },

    /// A root referenced by name or platform is not configured
    #[error("Root '{name}' has no value for platform '{platform}'")]
    RootNotFound {
        /// Root name (`root` for an unnamed single root)
        name: String,
        /// Platform that was requested
        platform: String,
    },

    /// IO error from the standard library
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Generic error for cases not covered by specific variants
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl Clone for AnatomyError {
    fn clone(&self) -> Self {
        match self {
            Self::ConfigLoadError {
                path,
                reason,
            } => Self::ConfigLoadError {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::MissingTemplate {
                name,
                suggestions,
            } => Self::MissingTemplate {
                name: name.clone(),
                suggestions: suggestions.clone(),
            },
            Self::MissingTemplateKey {
                key,
                template,
            } => Self::MissingTemplateKey {
                key: key.clone(),
                template: template.clone(),
            },
            Self::InvalidTemplateValue {
                key,
                template,
                found,
            } => Self::InvalidTemplateValue {
                key: key.clone(),
                template: template.clone(),
                found: found.clone(),
            },
            Self::TemplateLinkError {
                key,
                reason,
            } => Self::TemplateLinkError {
                key: key.clone(),
                reason: reason.clone(),
            },
            Self::EntityNotFound {
                kind,
                name,
            } => Self::EntityNotFound {
                kind: *kind,
                name: name.clone(),
            },
            Self::InvalidDocument {
                entity,
                reason,
            } => Self::InvalidDocument {
                entity: *entity,
                reason: reason.clone(),
            },
            Self::InvalidVersion {
                value,
            } => Self::InvalidVersion {
                value: *value,
            },
            Self::VersionConflict {
                asset,
                subset,
                version,
            } => Self::VersionConflict {
                asset: asset.clone(),
                subset: subset.clone(),
                version: *version,
            },
            Self::DestinationCollision {
                destination,
                first,
                second,
            } => Self::DestinationCollision {
                destination: destination.clone(),
                first: first.clone(),
                second: second.clone(),
            },
            Self::RootNotFound {
                name,
                platform,
            } => Self::RootNotFound {
                name: name.clone(),
                platform: platform.clone(),
            },
            // For errors that don't implement Clone, convert to Other
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::JsonError(e) => Self::Other {
                message: format!("JSON error: {e}"),
            },
            Self::YamlError(e) => Self::Other {
                message: format!("YAML error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// `ErrorContext` wraps an [`AnatomyError`] and adds optional details and a suggestion
/// for resolution. This is how the `anatomy` binary presents errors.
///
/// When displayed, errors show:
/// 1. **Error**: The main error message in red
/// 2. **Details**: Additional context in yellow (optional)
/// 3. **Suggestion**: Actionable steps in green (optional)
///
/// # Examples
///
/// ```rust,no_run
/// use anatomy_cli::core::{AnatomyError, ErrorContext};
///
/// let context = ErrorContext::new(AnatomyError::MissingTemplate {
///     name: "render".into(),
///     suggestions: vec![],
/// })
///     .with_suggestion("Add a 'render' template to the project anatomy")
///     .with_details("Templates are read from the merged anatomy settings");
///
/// println!("{}", context);
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying anatomy error
    pub error: AnatomyError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: AnatomyError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error context to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`AnatomyError`] anywhere in the error chain (so errors wrapped with
/// `anyhow::Context` still get tailored suggestions), standard I/O errors, and falls back
/// to a generic message that includes the full cause chain.
///
/// # Examples
///
/// ```rust,no_run
/// use anatomy_cli::core::{AnatomyError, EntityKind, user_friendly_error};
///
/// let error = AnatomyError::EntityNotFound { kind: EntityKind::Asset, name: "bob".into() };
/// let context = user_friendly_error(anyhow::Error::from(error));
/// assert!(context.suggestion.is_some());
/// ```
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(anatomy_error) =
        error.chain().find_map(|cause| cause.downcast_ref::<AnatomyError>())
    {
        return create_error_context(anatomy_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(AnatomyError::Other {
                    message: format!("Permission denied: {io_error}"),
                })
                .with_suggestion("Check the ownership and permissions of the settings directory")
                .with_details("anatomy only reads configuration; it never writes to it");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(AnatomyError::Other {
                    message: format!("File not found: {io_error}"),
                })
                .with_suggestion("Check that the settings directory and override file exist");
            }
            _ => {}
        }
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(AnatomyError::Other {
        message,
    })
}

/// Map each [`AnatomyError`] variant to an [`ErrorContext`] with tailored suggestions.
fn create_error_context(error: AnatomyError) -> ErrorContext {
    match &error {
        AnatomyError::ConfigLoadError { path, .. } => {
            let suggestion = format!("Fix the JSON/YAML syntax in {path} or remove the file");
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("Malformed files inside the defaults directory are skipped; explicitly passed files must be valid")
        }
        AnatomyError::MissingTemplate { name, suggestions } => {
            let suggestion = if suggestions.is_empty() {
                format!("Add a '{name}' entry to the 'templates' section of the project anatomy")
            } else {
                format!("Did you mean: {}?", suggestions.join(", "))
            };
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("Template names may address a group ('publish') or a key inside it ('publish.folder')")
        }
        AnatomyError::MissingTemplateKey { key, .. } => {
            let suggestion = format!("Provide '{key}' in the publish context or remove it from the template");
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("Final templates must be fully solved before files can be published")
        }
        AnatomyError::InvalidTemplateValue { .. } => ErrorContext::new(error)
            .with_suggestion("Template values must be strings or numbers; address nested values with 'key[subkey]'")
            .with_details("Objects, lists, booleans and null cannot be written into a path"),
        AnatomyError::TemplateLinkError { .. } => ErrorContext::new(error)
            .with_suggestion("Check '{@name}' references in the anatomy templates")
            .with_details("A link must name a string template defined globally or in the same group, and must not refer to itself"),
        AnatomyError::EntityNotFound { kind, name } => {
            let suggestion = format!("Create the {kind} '{name}' in the project before publishing");
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("Entities are looked up once per publish instance and the lookup is not retried")
        }
        AnatomyError::InvalidDocument { .. } => ErrorContext::new(error)
            .with_suggestion("Check the document layout against the supported project/asset schemas"),
        AnatomyError::InvalidVersion { .. } => ErrorContext::new(error)
            .with_suggestion("Versions are positive integers starting at 1"),
        AnatomyError::VersionConflict { .. } => ErrorContext::new(error)
            .with_suggestion("Publish again to resolve the next free version number")
            .with_details("Another publish of the same subset claimed this version after it was resolved"),
        AnatomyError::DestinationCollision { .. } => ErrorContext::new(error)
            .with_suggestion("Rename one of the files or give the resources different destination subfolders")
            .with_details("Resource files are copied into a shared 'resources' folder next to the published file"),
        AnatomyError::RootNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Add the missing platform value to the 'roots' section of the project anatomy"),
        AnatomyError::IoError(_)
        | AnatomyError::JsonError(_)
        | AnatomyError::YamlError(_)
        | AnatomyError::Other { .. } => ErrorContext::new(error),
    }
}
