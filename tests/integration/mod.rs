//! Integration test suite for anatomy
//!
//! End-to-end tests of the library facade, the settings loader on real directory
//! trees and the `anatomy` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **publish_context**: Facade scenarios from settings to transfers
//! - **settings_loader**: Defaults directory + override layers on disk
//! - **cli**: The `anatomy` binary via `assert_cmd`
//! - **properties**: Property tests for versioning and partial formatting

mod cli;
mod properties;
mod publish_context;
mod settings_loader;
