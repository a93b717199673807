//! Cross-platform utilities shared by the anatomy modules.
//!
//! - [`path`] - Lexical, forward-slash path normalization used for every planned path

pub mod path;

pub use path::{basename, clean_root, dirname, join_path, normalize_path_str};
