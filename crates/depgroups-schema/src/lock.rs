use crate::document::ManifestDocument;
use crate::fingerprint::{FingerprintError, HashAlgorithm};
use crate::resolver::DependencyGroupResolver;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("lock file parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("malformed content_hash '{0}', expected '<algorithm>:<hex>'")]
    MalformedContentHash(String),
    #[error(transparent)]
    Fingerprint(#[from] FingerprintError),
}

/// The `[metadata]` table of a lock file. Package entries are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockMetadata {
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub lock_version: Option<String>,
    #[serde(default)]
    pub content_hash: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockFile {
    #[serde(default)]
    pub metadata: LockMetadata,
}

/// Whether a lock still matches the manifest it was generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Freshness {
    Fresh,
    Stale { recorded: String, computed: String },
    /// The lock carries no content hash at all.
    Unrecorded,
}

impl Freshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh)
    }
}

impl LockFile {
    pub fn parse(input: &str) -> Result<Self, LockError> {
        Ok(toml::from_str(input)?)
    }

    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, LockError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Split `content_hash` into algorithm and hex digest.
    pub fn content_hash(&self) -> Result<Option<(HashAlgorithm, &str)>, LockError> {
        let Some(recorded) = self.metadata.content_hash.as_deref() else {
            return Ok(None);
        };
        let Some((algo, hex)) = recorded.split_once(':') else {
            return Err(LockError::MalformedContentHash(recorded.to_owned()));
        };
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(LockError::MalformedContentHash(recorded.to_owned()));
        }
        Ok(Some((algo.parse()?, hex)))
    }

    /// Recompute the manifest hash with the lock's own algorithm and compare.
    pub fn check<M: Borrow<ManifestDocument>>(
        &self,
        resolver: &DependencyGroupResolver<M>,
    ) -> Result<Freshness, LockError> {
        let Some((algorithm, recorded)) = self.content_hash()? else {
            return Ok(Freshness::Unrecorded);
        };
        let computed = resolver.content_hash(algorithm)?;
        if computed.eq_ignore_ascii_case(recorded) {
            Ok(Freshness::Fresh)
        } else {
            tracing::debug!("lock content hash {recorded} differs from manifest {computed}");
            Ok(Freshness::Stale {
                recorded: format!("{algorithm}:{recorded}"),
                computed: format!("{algorithm}:{computed}"),
            })
        }
    }
}

/// Format a digest the way lock files record it.
pub fn format_content_hash(algorithm: HashAlgorithm, digest: &str) -> String {
    format!("{algorithm}:{digest}")
}
