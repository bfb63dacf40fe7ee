//! Merge of the three dependency group locations and the lock fingerprint.
//!
//! Groups may be declared in:
//! - `[tool.pdm.dev-dependencies]` (legacy, requirement strings only),
//! - `[dependency-groups]` (modern, strings or `{include-group = ...}`),
//! - `[project.optional-dependencies]` (read-only, only as an include target).
//!
//! Legacy wins for any group name present in both legacy and modern tables.

use crate::document::{
    array_entry, ManifestDocument, DEPENDENCY_GROUPS, DEV_DEPENDENCIES, OPTIONAL_DEPENDENCIES,
    RESOLUTION,
};
use crate::fingerprint::{canonical_json, FingerprintError, HashAlgorithm};
use crate::groups::{
    entry_list, item_to_plain, normalize_name, requirement_list, GroupEntry, GroupError, RawGroup,
    ResolvedGroupSet,
};
use crate::types::{GroupName, HexDigest};
use serde_json::json;
use std::borrow::{Borrow, BorrowMut};
use std::fmt;
use toml_edit::{Array, Item, Table, TableLike};
use tracing::{debug, warn};

/// Which table [`DependencyGroupResolver::dependency_groups_table`] selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupsLocation {
    /// `[dependency-groups]`
    Modern,
    /// `[tool.pdm.dev-dependencies]`
    Legacy,
}

impl GroupsLocation {
    pub fn path(self) -> &'static [&'static str] {
        match self {
            Self::Modern => DEPENDENCY_GROUPS,
            Self::Legacy => DEV_DEPENDENCIES,
        }
    }
}

/// Non-fatal findings raised while selecting the groups table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupsAdvisory {
    BothSchemasPresent,
}

impl fmt::Display for GroupsAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BothSchemasPresent => f.write_str(
                "both [dependency-groups] and [tool.pdm.dev-dependencies] tables exist, \
                 using [dependency-groups]",
            ),
        }
    }
}

/// The outcome of table selection, without touching the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupsSelection {
    pub location: GroupsLocation,
    pub advisory: Option<GroupsAdvisory>,
}

/// Write handle on the selected dependency groups table.
pub struct GroupsTable<'a> {
    table: &'a mut dyn TableLike,
    selection: GroupsSelection,
}

impl GroupsTable<'_> {
    pub fn location(&self) -> GroupsLocation {
        self.selection.location
    }

    pub fn advisory(&self) -> Option<GroupsAdvisory> {
        self.selection.advisory
    }

    pub fn table(&mut self) -> &mut dyn TableLike {
        &mut *self.table
    }

    /// Return the list for `name`, creating it when missing.
    ///
    /// An existing key that differs from `name` only in case or separators
    /// is reused rather than duplicated.
    pub fn group_mut(&mut self, name: &str) -> &mut Array {
        let wanted = normalize_name(name);
        let key = self
            .table
            .iter()
            .map(|(key, _)| key)
            .find(|key| normalize_name(key) == wanted)
            .map_or_else(|| name.to_owned(), str::to_owned);
        array_entry(&mut *self.table, &key)
    }
}

/// Reads dependency groups out of a [`ManifestDocument`].
///
/// Holds either a shared or an exclusive borrow (or an owned document);
/// table selection needs exclusive access because it may create the modern
/// table.
#[derive(Debug)]
pub struct DependencyGroupResolver<M> {
    manifest: M,
}

impl<M: Borrow<ManifestDocument>> DependencyGroupResolver<M> {
    pub fn new(manifest: M) -> Self {
        Self { manifest }
    }

    pub fn manifest(&self) -> &ManifestDocument {
        self.manifest.borrow()
    }

    pub fn into_inner(self) -> M {
        self.manifest
    }

    /// Groups from `[tool.pdm.dev-dependencies]`, names as written.
    pub fn legacy_groups(&self) -> Vec<RawGroup<GroupEntry>> {
        raw_groups(
            &self.manifest().get_table(DEV_DEPENDENCIES),
            requirement_list,
        )
    }

    /// Groups from `[dependency-groups]`, names as written.
    pub fn modern_groups(&self) -> Vec<RawGroup<GroupEntry>> {
        raw_groups(&self.manifest().get_table(DEPENDENCY_GROUPS), entry_list)
    }

    /// Extras from `[project.optional-dependencies]`, names as written.
    pub fn optional_groups(&self) -> Vec<RawGroup<GroupEntry>> {
        raw_groups(
            &self.manifest().get_table(OPTIONAL_DEPENDENCIES),
            requirement_list,
        )
    }

    /// Report which table `dependency_groups_table` would hand out.
    pub fn groups_location(&self) -> GroupsSelection {
        let manifest = self.manifest();
        let modern = !manifest.get_table(DEPENDENCY_GROUPS).is_empty();
        let legacy = !manifest.get_table(DEV_DEPENDENCIES).is_empty();
        match (modern, legacy) {
            (true, true) => GroupsSelection {
                location: GroupsLocation::Modern,
                advisory: Some(GroupsAdvisory::BothSchemasPresent),
            },
            (false, true) => GroupsSelection {
                location: GroupsLocation::Legacy,
                advisory: None,
            },
            (true, false) | (false, false) => GroupsSelection {
                location: GroupsLocation::Modern,
                advisory: None,
            },
        }
    }

    /// Merge legacy and modern groups into the installable set.
    ///
    /// Legacy groups are seeded first and concatenate when several raw names
    /// normalize to the same group. A modern group whose name already exists
    /// is skipped entirely. `{include-group = ...}` entries are expanded one
    /// level deep from legacy or optional-dependencies groups only; a target
    /// that exists solely in `[dependency-groups]` is rejected. Any entry that
    /// is not a requirement string or an include fails the whole call.
    pub fn resolved_groups(&self) -> Result<ResolvedGroupSet, GroupError> {
        let legacy = canonical_groups(self.legacy_groups())?;
        let optional = canonical_groups(self.optional_groups())?;
        let mut resolved = legacy.clone();

        for group in self.modern_groups() {
            let name = GroupName::normalized(&group.name);
            if resolved.contains_key(&name) {
                debug!("group '{name}' is shadowed by tool.pdm.dev-dependencies");
                continue;
            }

            let mut requirements = Vec::with_capacity(group.entries.len());
            for entry in group.entries {
                match entry {
                    GroupEntry::Requirement(requirement) => requirements.push(requirement),
                    GroupEntry::Include(target) => {
                        let key = normalize_name(&target);
                        let Some(included) = legacy
                            .get(key.as_str())
                            .or_else(|| optional.get(key.as_str()))
                        else {
                            return Err(GroupError::MissingReference(target));
                        };
                        requirements.extend(included.iter().cloned());
                    }
                    GroupEntry::Unsupported(value) => {
                        return Err(invalid_entry(group.name, &value));
                    }
                }
            }
            resolved.insert(name, requirements);
        }

        Ok(resolved)
    }

    /// Look up one group by name in optional-dependencies, then legacy, then
    /// modern tables. Entries are returned unexpanded; an unknown group
    /// yields an empty list.
    pub fn group_dependencies(&self, name: &str) -> Vec<GroupEntry> {
        let wanted = normalize_name(name);
        for groups in [self.optional_groups(), self.legacy_groups()] {
            let mut matched = groups
                .into_iter()
                .filter(|group| normalize_name(&group.name) == wanted)
                .peekable();
            if matched.peek().is_some() {
                return matched.flat_map(|group| group.entries).collect();
            }
        }
        self.modern_groups()
            .into_iter()
            .find(|group| normalize_name(&group.name) == wanted)
            .map(|group| group.entries)
            .unwrap_or_default()
    }

    /// The record hashed by [`Self::content_hash`]: sources, dependencies,
    /// merged dev groups, optional-dependencies, requires-python and
    /// resolution overrides.
    pub fn canonical_record(&self) -> Result<serde_json::Value, GroupError> {
        let manifest = self.manifest();
        let dev_groups = self.resolved_groups()?;
        let field = |path: &[&str], default: serde_json::Value| {
            manifest.get_item(path).map_or(default, item_to_plain)
        };
        Ok(json!({
            "sources": manifest.sources(),
            "dependencies": field(&["project", "dependencies"], json!([])),
            "dev-dependencies": dev_groups,
            "optional-dependencies": field(OPTIONAL_DEPENDENCIES, json!({})),
            "requires-python": field(&["project", "requires-python"], json!("")),
            "resolution": field(RESOLUTION, json!({})),
        }))
    }

    /// Hash of everything that affects resolution. When it changes, the lock
    /// is stale.
    pub fn content_hash(&self, algorithm: HashAlgorithm) -> Result<HexDigest, FingerprintError> {
        let record = self.canonical_record()?;
        let text = canonical_json(&record)?;
        Ok(algorithm.digest_hex(text.as_bytes()))
    }
}

impl<M: BorrowMut<ManifestDocument>> DependencyGroupResolver<M> {
    /// Hand out "the" dependency groups table for reading and writing.
    ///
    /// Modern wins when populated (with an advisory if legacy is populated
    /// too), legacy is used when it is the only populated one, and an empty
    /// manifest gets a fresh `[dependency-groups]` table.
    pub fn dependency_groups_table(&mut self) -> GroupsTable<'_> {
        let selection = self.groups_location();
        if let Some(advisory) = selection.advisory {
            warn!("{advisory}");
        }
        debug!("dependency groups table: {:?}", selection.location);
        let manifest: &mut ManifestDocument = self.manifest.borrow_mut();
        let table = manifest.get_or_create_table(selection.location.path());
        GroupsTable { table, selection }
    }
}

fn raw_groups<T>(table: &Table, read: impl Fn(&Item) -> Vec<T>) -> Vec<RawGroup<T>> {
    table
        .iter()
        .map(|(name, item)| RawGroup {
            name: name.to_owned(),
            entries: read(item),
        })
        .collect()
}

/// Merge legacy or optional-dependencies groups by canonical name. These
/// locations hold requirement strings only.
fn canonical_groups(groups: Vec<RawGroup<GroupEntry>>) -> Result<ResolvedGroupSet, GroupError> {
    let mut out = ResolvedGroupSet::new();
    for group in groups {
        let mut requirements = Vec::with_capacity(group.entries.len());
        for entry in group.entries {
            match entry {
                GroupEntry::Requirement(requirement) => requirements.push(requirement),
                other => return Err(invalid_entry(group.name, &other.to_plain())),
            }
        }
        out.entry(GroupName::normalized(&group.name))
            .or_default()
            .extend(requirements);
    }
    Ok(out)
}

fn invalid_entry(group: String, value: &serde_json::Value) -> GroupError {
    GroupError::InvalidEntry {
        group,
        detail: value.to_string(),
    }
}
