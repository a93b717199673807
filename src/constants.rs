//! Constants shared across anatomy modules.
//!
//! Reserved configuration markers, default placeholder values and folder names live here
//! so the merge engine, the template formatter and the facade agree on them.

/// Override-layer key listing sibling keys that replace instead of deep-merging.
///
/// The spelling matches the marker persisted in existing studio settings documents.
pub const OVERRIDDEN_KEYS_MARKER: &str = "__overriden_keys__";

/// Override-layer value that deletes the key from the merged result.
pub const POP_KEY_MARKER: &str = "__pop_key__";

/// Value written into the `representation` slot until an extractor picks the extension.
pub const DEFAULT_REPRESENTATION_PLACEHOLDER: &str = "TEMP";

/// Folder, next to the published file, that receives resource files.
pub const RESOURCES_DIR_NAME: &str = "resources";

/// Template key that assumed templates may leave unsolved.
pub const REPRESENTATION_KEY: &str = "representation";

/// First version number when a subset has never been published.
pub const DEFAULT_VERSIONING_START: u32 = 1;

/// Template entry used when a template group is requested by its name.
pub const TEMPLATE_GROUP_PATH_KEY: &str = "path";

/// Settings key holding anatomy templates.
pub const TEMPLATES_SETTINGS_KEY: &str = "templates";

/// Settings key holding anatomy roots.
pub const ROOTS_SETTINGS_KEY: &str = "roots";

/// Settings key holding the anatomy section (templates, roots, versioning).
pub const ANATOMY_SETTINGS_KEY: &str = "anatomy";
