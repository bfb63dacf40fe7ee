//! Seam for foreign manifest formats (for example poetry or flit metadata).
//!
//! Converters are supplied by the caller; this crate only decides when to ask
//! them and where their output lands.

use std::path::Path;
use toml_edit::Table;

/// Output of a successful conversion.
#[derive(Debug, Clone, Default)]
pub struct ConvertedMetadata {
    /// Becomes the `[project]` table.
    pub metadata: Table,
    /// Merged key by key into `[tool.pdm]` when present.
    pub settings: Option<Table>,
}

pub trait MetadataConverter {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Whether this converter recognizes the file at `path`.
    fn check_fingerprint(&self, path: &Path) -> bool;

    fn convert(
        &self,
        path: &Path,
    ) -> Result<ConvertedMetadata, Box<dyn std::error::Error + Send + Sync>>;
}
