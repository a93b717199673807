//! Defaults directory and override layers on disk.

use anatomy_cli::core::AnatomyError;
use anatomy_cli::settings::{SettingsSource, load_documents_from_dir, read_document};
use anatomy_cli::test_utils::{SettingsFixture, init_test_logging};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_tree_becomes_nested_keys() {
    init_test_logging(None);
    let temp = TempDir::new().unwrap();
    SettingsFixture::basic().write_to(temp.path()).unwrap();

    let settings = load_documents_from_dir(temp.path(), &[]).unwrap();
    assert_eq!(settings["global"]["general"]["studio_name"], "Test Studio");
    assert_eq!(settings["anatomy"]["roots"]["linux"], "/mnt/projects");
    assert_eq!(settings["anatomy"]["versioning"], json!({"start": 1}));
}

#[test]
fn test_broken_document_is_skipped() {
    let temp = TempDir::new().unwrap();
    SettingsFixture::with_broken_document().write_to(temp.path()).unwrap();

    let anatomy = load_documents_from_dir(temp.path(), &["anatomy"]).unwrap();
    assert_eq!(anatomy["broken"], json!({}));
    assert!(anatomy["templates"]["publish"].is_object());
}

#[test]
fn test_override_markers_across_layers() {
    let temp = TempDir::new().unwrap();
    let defaults = SettingsFixture::basic().write_to(&temp.path().join("defaults")).unwrap();

    let studio = temp.path().join("studio.json");
    fs::write(
        &studio,
        r#"{"anatomy": {"templates": {"thumbnail": "{root}/thumbs/{asset}.jpg"}}, "global": "__pop_key__"}"#,
    )
    .unwrap();
    let project = temp.path().join("project.json");
    fs::write(
        &project,
        r#"{"anatomy": {"__overriden_keys__": ["roots"], "roots": {"linux": "/proj/demo"}}}"#,
    )
    .unwrap();

    let settings = SettingsSource::new(defaults)
        .with_override_file(studio)
        .with_override_file(project)
        .with_override_file(temp.path().join("missing.json"))
        .load()
        .unwrap();

    assert!(settings.get("global").is_none());
    assert_eq!(settings["anatomy"]["roots"], json!({"linux": "/proj/demo"}));
    assert!(settings["anatomy"]["templates"]["publish"].is_object());
    assert_eq!(settings["anatomy"]["templates"]["thumbnail"], "{root}/thumbs/{asset}.jpg");
    assert!(!settings.to_string().contains("__overriden_keys__"));
}

#[test]
fn test_read_document_is_strict() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("project.json");
    fs::write(&path, "{ nope").unwrap();

    let err = read_document(&path).unwrap_err();
    assert!(matches!(err, AnatomyError::ConfigLoadError { .. }));
    assert!(read_document(&temp.path().join("absent.yaml")).is_err());
}
