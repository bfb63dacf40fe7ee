use crate::convert::MetadataConverter;
use crate::groups::item_to_plain;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use toml_edit::{Array, DocumentMut, Item, Table, TableLike};
use tracing::debug;

pub const PROJECT: &[&str] = &["project"];
pub const OPTIONAL_DEPENDENCIES: &[&str] = &["project", "optional-dependencies"];
pub const DEPENDENCY_GROUPS: &[&str] = &["dependency-groups"];
pub const SETTINGS: &[&str] = &["tool", "pdm"];
pub const DEV_DEPENDENCIES: &[&str] = &["tool", "pdm", "dev-dependencies"];
pub const RESOLUTION: &[&str] = &["tool", "pdm", "resolution"];
pub const BUILD_SYSTEM: &[&str] = &["build-system"];

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest: {0}")]
    Parse(#[from] toml_edit::TomlError),
    #[error("failed to convert manifest with {converter}: {source}")]
    Conversion {
        converter: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// An owned, format-preserving pyproject document.
///
/// Read accessors never change the document. Write accessors
/// (`get_or_create_*`) create every missing table along the requested path.
/// Nothing is persisted until [`ManifestDocument::write`] is called.
#[derive(Debug, Clone, Default)]
pub struct ManifestDocument {
    doc: DocumentMut,
}

impl ManifestDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(input: &str) -> Result<Self, ManifestError> {
        Ok(Self { doc: input.parse()? })
    }

    /// Load a manifest. A missing file yields an empty document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        Self::load_with_converters(path, &[])
    }

    /// Load a manifest, falling back to the first converter that recognizes
    /// the file when it has no `[project]` table.
    pub fn load_with_converters(
        path: impl AsRef<Path>,
        converters: &[&dyn MetadataConverter],
    ) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let mut manifest = match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("manifest {} not found, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };

        if !manifest.doc.as_table().contains_key("project") {
            manifest.seed_from_converters(path, converters)?;
        }
        Ok(manifest)
    }

    fn seed_from_converters(
        &mut self,
        path: &Path,
        converters: &[&dyn MetadataConverter],
    ) -> Result<(), ManifestError> {
        let Some(converter) = converters.iter().find(|c| c.check_fingerprint(path)) else {
            return Ok(());
        };
        debug!("converting {} with {}", path.display(), converter.name());
        let converted = converter
            .convert(path)
            .map_err(|source| ManifestError::Conversion {
                converter: converter.name().to_owned(),
                source,
            })?;

        self.doc.insert("project", Item::Table(converted.metadata));
        if let Some(settings) = converted.settings {
            let target = self.get_or_create_table(SETTINGS);
            for (key, item) in settings.iter() {
                target.insert(key, item.clone());
            }
        }
        Ok(())
    }

    /// Return the table at `path`, or an empty table if any segment is absent
    /// or not a table.
    pub fn get_table(&self, path: &[&str]) -> Table {
        let mut table = Table::new();
        if let Some(source) = self.table_like(path) {
            for (key, item) in source.iter() {
                table.insert(key, item.clone());
            }
        }
        table
    }

    /// Return the item at `path`, if present.
    pub fn get_item(&self, path: &[&str]) -> Option<&Item> {
        let (last, parents) = path.split_last()?;
        self.table_like(parents)?.get(last)
    }

    fn table_like(&self, path: &[&str]) -> Option<&dyn TableLike> {
        let mut current: &dyn TableLike = self.doc.as_table();
        for key in path {
            current = current.get(key)?.as_table_like()?;
        }
        Some(current)
    }

    /// Return the table at `path`, creating every missing table on the way.
    ///
    /// A non-table value sitting on the path is replaced by an empty table.
    pub fn get_or_create_table(&mut self, path: &[&str]) -> &mut dyn TableLike {
        let mut current: &mut dyn TableLike = self.doc.as_table_mut();
        for key in path {
            let item = current.entry(key).or_insert_with(implicit_table);
            if !item.is_table_like() {
                *item = implicit_table();
            }
            let Some(table) = item.as_table_like_mut() else {
                unreachable!("non-table items are replaced above");
            };
            current = table;
        }
        current
    }

    /// Return the array `key` inside the table at `path`, creating the table
    /// path and an empty array as needed.
    pub fn get_or_create_array(&mut self, path: &[&str], key: &str) -> &mut Array {
        array_entry(self.get_or_create_table(path), key)
    }

    /// Recursively drop every table left empty by edits, so that sections
    /// such as an emptied `[tool.pdm]` are not persisted.
    pub fn normalize_before_write(&mut self) {
        remove_empty_tables(self.doc.as_table_mut());
    }

    /// Normalize and atomically write the document to `path`.
    pub fn write(&mut self, path: impl AsRef<Path>) -> Result<(), ManifestError> {
        let path = path.as_ref();
        self.normalize_before_write();
        let content = self.doc.to_string();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::io::Write::write_all(&mut tmp, content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| ManifestError::Io(e.error))?;
        debug!("wrote manifest {}", path.display());
        Ok(())
    }

    pub fn as_document(&self) -> &DocumentMut {
        &self.doc
    }

    /// A manifest is usable when it carries a non-empty `[project]` table.
    pub fn is_valid(&self) -> bool {
        !self.get_table(PROJECT).is_empty()
    }

    pub fn metadata(&self) -> Table {
        self.get_table(PROJECT)
    }

    pub fn settings(&self) -> Table {
        self.get_table(SETTINGS)
    }

    pub fn build_system(&self) -> Table {
        self.get_table(BUILD_SYSTEM)
    }

    /// Resolution overrides from `[tool.pdm.resolution]`.
    pub fn resolution(&self) -> Table {
        self.get_table(RESOLUTION)
    }

    pub fn allow_prereleases(&self) -> Option<bool> {
        self.get_item(&["tool", "pdm", "resolution", "allow-prereleases"])
            .and_then(Item::as_bool)
    }

    pub fn plugins(&self) -> Vec<String> {
        self.get_item(&["tool", "pdm", "plugins"])
            .and_then(Item::as_array)
            .map(|plugins| {
                plugins
                    .iter()
                    .filter_map(|p| p.as_str().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Configured package sources, in declaration order.
    pub fn sources(&self) -> Vec<serde_json::Value> {
        match self.get_item(&["tool", "pdm", "source"]).map(item_to_plain) {
            Some(serde_json::Value::Array(sources)) => sources,
            Some(serde_json::Value::Null) | None => Vec::new(),
            Some(other) => vec![other],
        }
    }
}

impl FromStr for ManifestDocument {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ManifestDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.doc)
    }
}

fn implicit_table() -> Item {
    let mut table = Table::new();
    table.set_implicit(true);
    Item::Table(table)
}

/// Return the array stored under `key`, replacing any non-array value.
pub(crate) fn array_entry<'a>(table: &'a mut dyn TableLike, key: &str) -> &'a mut Array {
    let item = table
        .entry(key)
        .or_insert_with(|| toml_edit::value(Array::new()));
    if !item.is_array() {
        *item = toml_edit::value(Array::new());
    }
    let Some(array) = item.as_array_mut() else {
        unreachable!("non-array items are replaced above");
    };
    array
}

fn remove_empty_tables(table: &mut dyn TableLike) {
    let keys: Vec<String> = table.iter().map(|(key, _)| key.to_owned()).collect();
    for key in keys {
        let Some(child) = table.get_mut(&key).and_then(Item::as_table_like_mut) else {
            continue;
        };
        remove_empty_tables(child);
        if child.is_empty() {
            table.remove(&key);
        }
    }
}
