pub mod add;
pub mod check;
pub mod groups;
pub mod hash;

use depgroups_schema::ManifestDocument;
use std::path::Path;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_STALE_LOCK: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn load_manifest(path: &Path) -> Result<ManifestDocument, String> {
    tracing::debug!("loading manifest {}", path.display());
    ManifestDocument::load(path).map_err(|e| e.to_string())
}
