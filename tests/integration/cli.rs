//! The `anatomy` binary.

use anatomy_cli::test_utils::SettingsFixture;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn anatomy() -> Command {
    let mut cmd = Command::cargo_bin("anatomy").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn resolve_args(settings_dir: &Path) -> Vec<String> {
    [
        "resolve",
        "--settings-dir",
        settings_dir.to_str().unwrap(),
        "--project",
        "demo",
        "--code",
        "dm",
        "--asset",
        "bob",
        "--subset",
        "modelMain",
        "--family",
        "model",
        "--platform",
        "linux",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

#[test]
fn test_format_command() {
    anatomy()
        .args(["format", "{asset}/v{version:0>3}", "--data", r#"{"asset": "bob", "version": 12}"#])
        .assert()
        .success()
        .stdout("bob/v012\n");
}

#[test]
fn test_format_strict_reports_missing_key() {
    anatomy()
        .args(["format", "{asset}/{subset}", "--data", r#"{"asset": "bob"}"#, "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("subset"));
}

#[test]
fn test_format_rejects_object_value_without_strict() {
    anatomy()
        .args(["format", "{a}", "--data", r#"{"a": {"x": 1}}"#])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("'a'").and(predicate::str::contains("object")));
}

#[test]
fn test_resolve_json_output() {
    let temp = TempDir::new().unwrap();
    SettingsFixture::basic().write_to(temp.path()).unwrap();

    let output = anatomy()
        .args(resolve_args(temp.path()))
        .args(["--existing", "1", "--existing", "2", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let context: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(context["resolved_version"]["number"], 3);
    assert_eq!(
        context["filled_paths"]["publish"],
        "/mnt/projects/demo/bob/publish/modelMain/v003/modelMain.TEMP"
    );
}

#[test]
fn test_resolve_text_output() {
    let temp = TempDir::new().unwrap();
    SettingsFixture::basic().write_to(temp.path()).unwrap();

    anatomy()
        .args(resolve_args(temp.path()))
        .args(["--representation", "abc", "--resource", "/tex/a.png"])
        .assert()
        .success()
        .stdout(predicate::str::contains("v001"))
        .stdout(predicate::str::contains("/mnt/projects/demo/bob/publish/modelMain/v001/modelMain.abc"))
        .stdout(predicate::str::contains("/tex/a.png -> /mnt/projects/demo/bob/publish/modelMain/v001/resources/a.png"));
}

#[test]
fn test_resolve_unknown_template_fails() {
    let temp = TempDir::new().unwrap();
    SettingsFixture::basic().write_to(temp.path()).unwrap();

    anatomy()
        .args(resolve_args(temp.path()))
        .args(["--template", "pubish.folder"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pubish.folder"));
}

#[test]
fn test_settings_command() {
    let temp = TempDir::new().unwrap();
    SettingsFixture::basic().write_to(temp.path()).unwrap();

    anatomy()
        .args(["settings", "--settings-dir", temp.path().to_str().unwrap(), "--subkey", "anatomy", "--subkey", "roots"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""linux": "/mnt/projects""#));
}
