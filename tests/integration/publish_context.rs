//! Facade scenarios: settings to publish context.

use anatomy_cli::anatomy::{
    Anatomy, AnatomyOptions, AssetContext, InMemoryVersionStore, LookupFailure, ProjectConfig, PublishRequest,
    PublishSession, TemplateRequest, VersionLookup,
};
use anatomy_cli::core::{AnatomyError, EntityKind};
use anatomy_cli::roots::Platform;
use anatomy_cli::settings::SettingsSource;
use anatomy_cli::test_utils::{SettingsFixture, demo_session, init_test_logging};
use anatomy_cli::transfer::Resource;
use anatomy_cli::version::resolve_version;
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_first_publish_of_subset() {
    init_test_logging(None);

    let store = InMemoryVersionStore::new().with_asset("bob");
    let context = Anatomy::default()
        .compute_publish_context(&demo_session(), &PublishRequest::new("modelMain", "model"), &store)
        .unwrap();

    assert_eq!(context.resolved_version.number, 1);
    assert!(context.resolved_version.is_new);
    assert!(context.filled_paths["publish"].ends_with("/bob/publish/modelMain/v001/modelMain.TEMP"));
}

#[test]
fn test_project_from_settings_tree() {
    init_test_logging(None);
    let temp = TempDir::new().unwrap();
    let defaults = SettingsFixture::basic().write_to(&temp.path().join("defaults")).unwrap();
    let project_overrides = temp.path().join("demo.json");
    std::fs::write(&project_overrides, r#"{"anatomy": {"roots": {"windows": "Q:/demo_root"}}}"#).unwrap();

    let anatomy_settings = SettingsSource::new(defaults)
        .with_override_file(&project_overrides)
        .with_subkeys(["anatomy"])
        .load()
        .unwrap();
    let project = ProjectConfig::from_settings("demo", "dm", &anatomy_settings).unwrap();
    let session = PublishSession::new(project, AssetContext::new("bob")).with_platform(Platform::Windows);

    let store = InMemoryVersionStore::new().with_versions("bob", "modelMain", [1, 2]);
    let request = PublishRequest::new("modelMain", "model")
        .with_data("representation", "ma")
        .with_template(TemplateRequest::required("publish.folder"));
    let context = Anatomy::new(AnatomyOptions::from_settings(&anatomy_settings))
        .compute_publish_context(&session, &request, &store)
        .unwrap();

    assert_eq!(context.filled_paths["publish"], "Q:/demo_root/demo/bob/publish/modelMain/v003/modelMain.ma");
    assert_eq!(context.filled_paths["publish.folder"], "Q:/demo_root/demo/bob/publish/modelMain/v003");
    assert_eq!(context.rootless_paths["publish"], "{root}/demo/bob/publish/modelMain/v003/modelMain.ma");

    // The same publish seen from Linux
    let on_linux = session.project.roots.remap(&context.filled_paths["publish"], None, Platform::Linux);
    assert_eq!(on_linux.as_deref(), Some("/mnt/projects/demo/bob/publish/modelMain/v003/modelMain.ma"));
}

#[test]
fn test_hierarchy_and_resources() {
    let mut session = demo_session();
    session.asset = AssetContext::new("sh010").with_parents(["seq01"]);

    let store = InMemoryVersionStore::new().with_asset("sh010");
    let request = PublishRequest::new("lookMain", "look")
        .with_resource(Resource::new(r"D:\textures\diffuse.png"))
        .with_resource(
            Resource::sequence("/cache/sim.1001.bgeo", ["/cache/sim.1001.bgeo", "/cache/sim.1002.bgeo"])
                .with_subfolder("caches"),
        );
    let context = Anatomy::default().compute_publish_context(&session, &request, &store).unwrap();

    let root = "/mnt/projects/demo/seq01/sh010/publish/lookMain/v001";
    assert_eq!(context.filled_paths["publish"], format!("{root}/lookMain.TEMP"));
    assert_eq!(context.template_data["parent"], "seq01");
    assert_eq!(context.destination_root, format!("{root}/resources"));

    let pairs: Vec<(&str, &str)> = context.transfers.iter().map(|t| t.as_pair()).collect();
    let expected_destinations = [
        format!("{root}/resources/diffuse.png"),
        format!("{root}/resources/caches/sim.1001.bgeo"),
        format!("{root}/resources/caches/sim.1002.bgeo"),
    ];
    assert_eq!(pairs.len(), 3);
    assert_eq!(pairs[0].0, "D:/textures/diffuse.png");
    for ((_, destination), expected) in pairs.iter().zip(&expected_destinations) {
        assert_eq!(destination, expected);
    }
}

#[test]
fn test_colliding_resources_fail_the_publish() {
    let store = InMemoryVersionStore::new().with_asset("bob");
    let request = PublishRequest::new("lookMain", "look")
        .with_resource(Resource::new("/a/diffuse.png"))
        .with_resource(Resource::new("/b/diffuse.png"));
    let err = Anatomy::default().compute_publish_context(&demo_session(), &request, &store).unwrap_err();
    assert!(matches!(err, AnatomyError::DestinationCollision { .. }));
}

#[test]
fn test_explicit_version_overwrites() {
    let store = InMemoryVersionStore::new().with_versions("bob", "modelMain", [1, 2, 3]);
    let request = PublishRequest::new("modelMain", "model").with_version(2);
    let context = Anatomy::default().compute_publish_context(&demo_session(), &request, &store).unwrap();
    assert_eq!(context.resolved_version.number, 2);
    assert!(!context.resolved_version.is_new);
    assert!(context.filled_paths["publish"].contains("/v002/"));
}

#[test]
fn test_concurrent_publishes_conflict_at_claim() {
    let mut store = InMemoryVersionStore::new().with_asset("bob");
    let request = PublishRequest::new("modelMain", "model");

    let first = Anatomy::default().compute_publish_context(&demo_session(), &request, &store).unwrap();
    let second = Anatomy::default().compute_publish_context(&demo_session(), &request, &store).unwrap();
    assert_eq!(first.resolved_version.number, second.resolved_version.number);

    store.claim("bob", "modelMain", &first.resolved_version).unwrap();
    let err = store.claim("bob", "modelMain", &second.resolved_version).unwrap_err();
    assert!(matches!(err, AnatomyError::VersionConflict { version: 1, .. }));

    // A retry resolves past the claimed version
    let retry = resolve_version(&store.existing_versions("bob", "modelMain").unwrap(), None).unwrap();
    assert_eq!(retry.number, 2);
}

#[test]
fn test_closure_lookup_and_missing_asset() {
    let lookup = |asset: &str, _subset: &str| -> Result<Vec<u32>, LookupFailure> {
        if asset == "bob" {
            Ok(vec![4])
        } else {
            Err(LookupFailure::NotFound {
                kind: EntityKind::Asset,
                name: asset.to_string(),
            })
        }
    };
    let request = PublishRequest::new("modelMain", "model");

    let context = Anatomy::default().compute_publish_context(&demo_session(), &request, &lookup).unwrap();
    assert_eq!(context.resolved_version.number, 5);

    let mut session = demo_session();
    session.asset = AssetContext::new("alice");
    let err = Anatomy::default().compute_publish_context(&session, &request, &lookup).unwrap_err();
    assert!(matches!(err, AnatomyError::EntityNotFound { kind: EntityKind::Asset, ref name } if name == "alice"));
}

#[test]
fn test_missing_template_suggests_names() {
    let store = InMemoryVersionStore::new().with_asset("bob");
    let request = PublishRequest::new("modelMain", "model").with_template(TemplateRequest::assumed("thumbnial"));
    let err = Anatomy::default().compute_publish_context(&demo_session(), &request, &store).unwrap_err();
    match err {
        AnatomyError::MissingTemplate { name, suggestions } => {
            assert_eq!(name, "thumbnial");
            assert!(suggestions.contains(&"thumbnail".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_context_serializes_to_json() {
    let store = InMemoryVersionStore::new().with_asset("bob");
    let context = Anatomy::default()
        .compute_publish_context(&demo_session(), &PublishRequest::new("modelMain", "model"), &store)
        .unwrap();
    let value = serde_json::to_value(&context).unwrap();
    assert_eq!(value["resolved_version"]["number"], json!(1));
    assert_eq!(value["template_data"]["project"], json!({"name": "demo", "code": "dm"}));
    assert!(value["transfers"].as_array().unwrap().is_empty());
}
