//! Test utilities for anatomy
//!
//! This module provides utilities for writing tests: logging setup, settings trees
//! written to temporary directories, and ready-made project and session values.
//!
//! # Example
//!
//! ```rust,no_run
//! use anatomy_cli::test_utils::{SettingsFixture, demo_session, init_test_logging};
//!
//! init_test_logging(None);
//! let temp = tempfile::TempDir::new().unwrap();
//! SettingsFixture::basic().write_to(temp.path()).unwrap();
//! let session = demo_session();
//! assert_eq!(session.asset.name, "bob");
//! ```

pub mod fixtures;

pub use fixtures::{DEMO_PUBLISH_TEMPLATE, SettingsFixture, demo_asset, demo_project, demo_session};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. `level` wins over `RUST_LOG`; with neither,
/// logging stays off.
///
/// ```bash
/// RUST_LOG=anatomy_cli=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
