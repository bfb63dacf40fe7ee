//! Dependency group resolution and lock fingerprinting for pyproject manifests.
//!
//! This crate defines the schema layer: format-preserving manifest access
//! (`ManifestDocument`), the three-location dependency group merge
//! (`DependencyGroupResolver`), canonical content hashing used to detect stale
//! locks (`HashAlgorithm`, `canonical_json`), and lock metadata verification
//! (`LockFile`).

pub mod convert;
pub mod document;
pub mod fingerprint;
pub mod groups;
pub mod lock;
pub mod resolver;
pub mod types;

pub use convert::{ConvertedMetadata, MetadataConverter};
pub use document::{ManifestDocument, ManifestError};
pub use fingerprint::{canonical_json, FingerprintError, HashAlgorithm};
pub use groups::{
    normalize_name, DependencyGroup, GroupEntry, GroupError, RawGroup, ResolvedGroupSet,
};
pub use lock::{format_content_hash, Freshness, LockError, LockFile, LockMetadata};
pub use resolver::{
    DependencyGroupResolver, GroupsAdvisory, GroupsLocation, GroupsSelection, GroupsTable,
};
pub use types::{GroupName, HexDigest};
