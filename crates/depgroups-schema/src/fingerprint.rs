//! Digest algorithms and the canonical text form of the fingerprint record.

use crate::groups::GroupError;
use crate::types::HexDigest;
use serde::Serialize;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::fmt;
use std::io;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("unsupported hash algorithm: '{0}'")]
    UnknownAlgorithm(String),
    #[error(transparent)]
    Groups(#[from] GroupError),
    #[error("failed to encode fingerprint record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Digest used for the manifest content hash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
    Blake3,
}

impl HashAlgorithm {
    pub const ALL: &'static [HashAlgorithm] = &[
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::Blake3,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
        }
    }

    pub fn digest_hex(self, data: &[u8]) -> HexDigest {
        let hex = match self {
            Self::Sha224 => hex::encode(Sha224::digest(data)),
            Self::Sha256 => hex::encode(Sha256::digest(data)),
            Self::Sha384 => hex::encode(Sha384::digest(data)),
            Self::Sha512 => hex::encode(Sha512::digest(data)),
            Self::Blake3 => blake3::hash(data).to_hex().to_string(),
        };
        HexDigest::from_hex(hex)
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|algo| algo.as_str() == wanted)
            .ok_or_else(|| FingerprintError::UnknownAlgorithm(s.to_owned()))
    }
}

/// Serialize `value` with sorted object keys, `", "` and `": "` separators and
/// every non-printable-ASCII character escaped as `\uXXXX`.
///
/// Object key order comes from `serde_json::Map`, which is sorted by key.
pub fn canonical_json(value: &impl Serialize) -> Result<String, serde_json::Error> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, CanonicalFormatter);
    value.serialize(&mut serializer)?;
    // Formatter output is pure ASCII.
    Ok(String::from_utf8_lossy(&out).into_owned())
}

struct CanonicalFormatter;

impl serde_json::ser::Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        for c in fragment.chars() {
            if (' '..='~').contains(&c) {
                writer.write_all(&[c as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_algorithm_is_sha256() {
        assert_eq!(HashAlgorithm::default(), HashAlgorithm::Sha256);
        assert_eq!(HashAlgorithm::default().to_string(), "sha256");
    }

    #[test]
    fn parses_algorithm_names() {
        assert_eq!("SHA512".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512);
        assert_eq!("blake3".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Blake3);
        assert!(matches!(
            "md4".parse::<HashAlgorithm>(),
            Err(FingerprintError::UnknownAlgorithm(name)) if name == "md4"
        ));
    }

    #[test]
    fn digest_lengths_match_algorithm() {
        let data = b"depgroups";
        assert_eq!(HashAlgorithm::Sha224.digest_hex(data).len(), 56);
        assert_eq!(HashAlgorithm::Sha256.digest_hex(data).len(), 64);
        assert_eq!(HashAlgorithm::Sha384.digest_hex(data).len(), 96);
        assert_eq!(HashAlgorithm::Sha512.digest_hex(data).len(), 128);
        assert_eq!(HashAlgorithm::Blake3.digest_hex(data).len(), 64);
    }

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            HashAlgorithm::Sha256.digest_hex(b"abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn canonical_json_sorts_keys_and_spaces_separators() {
        let value = json!({"b": [1, 2], "a": {"d": true, "c": null}});
        assert_eq!(
            canonical_json(&value).unwrap(),
            r#"{"a": {"c": null, "d": true}, "b": [1, 2]}"#
        );
    }

    #[test]
    fn canonical_json_escapes_non_ascii() {
        let value = json!(["caf\u{e9}", "\u{1F600}", "tab\there", "del\u{7f}"]);
        assert_eq!(
            canonical_json(&value).unwrap(),
            r#"["caf\u00e9", "\ud83d\ude00", "tab\there", "del\u007f"]"#
        );
    }

    #[test]
    fn canonical_json_empty_containers() {
        assert_eq!(canonical_json(&json!({"a": [], "b": {}})).unwrap(), r#"{"a": [], "b": {}}"#);
    }
}
