//! Dependency group entries, name canonicalization, and coercion of document
//! nodes into plain values.

use crate::types::GroupName;
use std::collections::BTreeMap;
use thiserror::Error;
use toml_edit::{Item, TableLike, Value};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GroupError {
    #[error("Dependency group '{0}' not found")]
    MissingReference(String),
    #[error("invalid entry in dependency group '{group}': {detail}")]
    InvalidEntry { group: String, detail: String },
}

/// An ordered list of requirement strings after merge and include expansion.
pub type DependencyGroup = Vec<String>;

/// The merged view of every installable group, keyed by canonical name.
pub type ResolvedGroupSet = BTreeMap<GroupName, DependencyGroup>;

/// One entry of a `[dependency-groups]` list.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupEntry {
    /// A plain requirement string such as `pytest>=7`.
    Requirement(String),
    /// `{include-group = "<name>"}`; the name is kept as written.
    Include(String),
    /// Anything else. Carried through so that resolution can reject it.
    Unsupported(serde_json::Value),
}

impl GroupEntry {
    /// The entry as it was written, for error details.
    pub fn to_plain(&self) -> serde_json::Value {
        match self {
            Self::Requirement(requirement) => serde_json::Value::String(requirement.clone()),
            Self::Include(target) => serde_json::json!({ "include-group": target }),
            Self::Unsupported(value) => value.clone(),
        }
    }
}

/// A group as it appears in one manifest location, before canonicalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawGroup<T> {
    pub name: String,
    pub entries: Vec<T>,
}

/// Canonicalize a group name: every run of non-alphanumeric characters becomes
/// a single `-` and the result is lowercased.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            in_separator = false;
        } else if !in_separator {
            out.push('-');
            in_separator = true;
        }
    }
    out
}

/// Convert a document node into a plain ordered value.
///
/// This is the single boundary where data leaves the document layer; comments,
/// whitespace and inline/standard table style are dropped.
pub fn item_to_plain(item: &Item) -> serde_json::Value {
    match item {
        Item::None => serde_json::Value::Null,
        Item::Value(value) => value_to_plain(value),
        Item::Table(table) => table_to_plain(table),
        Item::ArrayOfTables(tables) => {
            serde_json::Value::Array(tables.iter().map(|t| table_to_plain(t)).collect())
        }
    }
}

pub fn value_to_plain(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => serde_json::Value::String(s.value().clone()),
        Value::Integer(i) => serde_json::Value::from(*i.value()),
        Value::Float(f) => serde_json::Number::from_f64(*f.value())
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::Boolean(b) => serde_json::Value::Bool(*b.value()),
        Value::Datetime(dt) => serde_json::Value::String(dt.value().to_string()),
        Value::Array(array) => serde_json::Value::Array(array.iter().map(value_to_plain).collect()),
        Value::InlineTable(table) => table_to_plain(table),
    }
}

pub fn table_to_plain(table: &dyn TableLike) -> serde_json::Value {
    let map = table
        .iter()
        .map(|(key, item)| (key.to_owned(), item_to_plain(item)))
        .collect();
    serde_json::Value::Object(map)
}

/// Read a legacy or optional-dependencies list. A bare scalar becomes a
/// single-element list; tables and nested arrays are not requirements.
pub(crate) fn requirement_list(item: &Item) -> Vec<GroupEntry> {
    match item {
        Item::ArrayOfTables(tables) => tables
            .iter()
            .map(|t| GroupEntry::Unsupported(table_to_plain(t)))
            .collect(),
        _ => match (item.as_array(), item.as_value()) {
            (Some(array), _) => array.iter().map(requirement_entry).collect(),
            (None, Some(value)) => vec![requirement_entry(value)],
            (None, None) => vec![GroupEntry::Unsupported(item_to_plain(item))],
        },
    }
}

/// Read a `[dependency-groups]` list. A bare non-array value becomes a
/// single-element list, and `[[dependency-groups.<name>]]` tables are read
/// like inline `{include-group = ...}` entries.
pub(crate) fn entry_list(item: &Item) -> Vec<GroupEntry> {
    match item {
        Item::ArrayOfTables(tables) => tables.iter().map(|t| table_entry(t)).collect(),
        _ => match (item.as_array(), item.as_value()) {
            (Some(array), _) => array.iter().map(parse_entry).collect(),
            (None, Some(value)) => vec![parse_entry(value)],
            (None, None) => vec![GroupEntry::Unsupported(item_to_plain(item))],
        },
    }
}

fn parse_entry(value: &Value) -> GroupEntry {
    match value {
        Value::String(requirement) => GroupEntry::Requirement(requirement.value().clone()),
        Value::InlineTable(table) => table_entry(table),
        other => GroupEntry::Unsupported(value_to_plain(other)),
    }
}

fn table_entry(table: &dyn TableLike) -> GroupEntry {
    match table.get("include-group").and_then(Item::as_str) {
        Some(target) => GroupEntry::Include(target.to_owned()),
        None => GroupEntry::Unsupported(table_to_plain(table)),
    }
}

fn requirement_entry(value: &Value) -> GroupEntry {
    match value {
        Value::Array(_) | Value::InlineTable(_) => GroupEntry::Unsupported(value_to_plain(value)),
        _ => GroupEntry::Requirement(requirement_text(value)),
    }
}

fn requirement_text(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_owned(),
        None => {
            let mut bare = value.clone();
            bare.decor_mut().clear();
            bare.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toml_edit::DocumentMut;

    fn doc(input: &str) -> DocumentMut {
        input.parse().unwrap()
    }

    #[test]
    fn normalize_collapses_separator_runs() {
        assert_eq!(normalize_name("Foo__Bar"), "foo-bar");
        assert_eq!(normalize_name("foo.-_bar"), "foo-bar");
        assert_eq!(normalize_name("TEST"), "test");
        assert_eq!(normalize_name("already-normal"), "already-normal");
    }

    #[test]
    fn normalize_keeps_digits() {
        assert_eq!(normalize_name("Py3_Compat"), "py3-compat");
    }

    #[test]
    fn entries_distinguish_strings_and_includes() {
        let d = doc(r#"ci = ["ruff", {include-group = "docs"}, {path = "."}, 3]"#);
        let entries = entry_list(&d["ci"]);
        assert_eq!(entries[0], GroupEntry::Requirement("ruff".to_owned()));
        assert_eq!(entries[1], GroupEntry::Include("docs".to_owned()));
        assert!(matches!(entries[2], GroupEntry::Unsupported(_)));
        assert!(matches!(entries[3], GroupEntry::Unsupported(_)));
    }

    #[test]
    fn bare_string_is_wrapped() {
        let d = doc(r#"test = "pytest""#);
        assert_eq!(
            requirement_list(&d["test"]),
            vec![GroupEntry::Requirement("pytest".to_owned())]
        );
        assert_eq!(
            entry_list(&d["test"]),
            vec![GroupEntry::Requirement("pytest".to_owned())]
        );
    }

    #[test]
    fn non_string_requirements_render_without_decor() {
        let d = doc("test = [ 42 ,  true ]");
        assert_eq!(
            requirement_list(&d["test"]),
            vec![
                GroupEntry::Requirement("42".to_owned()),
                GroupEntry::Requirement("true".to_owned()),
            ]
        );
    }

    #[test]
    fn tables_are_not_requirements() {
        let d = doc("test = [\"pytest\", {a = 1}, [\"x\"]]\n[[lint]]\nb = 2\n");
        assert_eq!(
            requirement_list(&d["test"]),
            vec![
                GroupEntry::Requirement("pytest".to_owned()),
                GroupEntry::Unsupported(serde_json::json!({"a": 1})),
                GroupEntry::Unsupported(serde_json::json!(["x"])),
            ]
        );
        assert_eq!(
            requirement_list(&d["lint"]),
            vec![GroupEntry::Unsupported(serde_json::json!({"b": 2}))]
        );
    }

    #[test]
    fn array_of_tables_reads_include_entries() {
        let d = doc("[[ci]]\ninclude-group = \"docs\"\n[[ci]]\npath = \".\"\n");
        assert_eq!(
            entry_list(&d["ci"]),
            vec![
                GroupEntry::Include("docs".to_owned()),
                GroupEntry::Unsupported(serde_json::json!({"path": "."})),
            ]
        );
    }

    #[test]
    fn plain_conversion_ignores_formatting() {
        let a = doc("[t]\n# comment\nb = 1\na = [ \"x\" ,\"y\" ]\n");
        let b = doc("t = {a = [\"x\", \"y\"], b = 1}\n");
        assert_eq!(item_to_plain(&a["t"]), item_to_plain(&b["t"]));
    }

    #[test]
    fn plain_conversion_of_array_of_tables() {
        let d = doc("[[source]]\nname = \"pypi\"\n[[source]]\nname = \"mirror\"\n");
        assert_eq!(
            item_to_plain(&d["source"]),
            serde_json::json!([{"name": "pypi"}, {"name": "mirror"}])
        );
    }
}
