//! Core types for anatomy
//!
//! This module holds the error type shared by every anatomy operation and the helpers
//! that turn those errors into messages for pipeline users.
//!
//! - [`AnatomyError`] - Enumerated error types covering every failure mode
//! - [`ErrorContext`] - User-friendly wrapper with details and suggestions
//! - [`user_friendly_error`] - Convert any error to a user-friendly format
//!
//! # Examples
//!
//! ```rust,no_run
//! use anatomy_cli::core::{AnatomyError, user_friendly_error};
//!
//! fn publish() -> anyhow::Result<()> {
//!     Err(AnatomyError::MissingTemplate { name: "publish".into(), suggestions: Vec::new() }.into())
//! }
//!
//! if let Err(e) = publish() {
//!     user_friendly_error(e).display();
//! }
//! ```

pub mod error;

pub use error::{AnatomyError, EntityKind, ErrorContext, Result, user_friendly_error};
