//! Newtype wrappers for string identifiers, providing compile-time type safety.
//!
//! All newtypes serialize/deserialize as plain strings.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_newtype!(
    /// A dependency group name in canonical form (lowercase, `-` separated).
    ///
    /// Two spellings that differ only in case or separator style map to the
    /// same `GroupName`.
    GroupName
);

string_newtype!(
    /// Lowercase hexadecimal digest of the canonical manifest record.
    HexDigest
);

impl GroupName {
    /// Canonicalize a raw group name as written in a manifest.
    pub fn normalized(raw: &str) -> Self {
        Self(crate::groups::normalize_name(raw))
    }
}

impl HexDigest {
    pub(crate) fn from_hex(hex: String) -> Self {
        Self(hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn group_name_normalizes_case_and_separators() {
        assert_eq!(GroupName::normalized("Docs_Build"), "docs-build");
        assert_eq!(
            GroupName::normalized("lint.strict"),
            GroupName::normalized("LINT-strict")
        );
    }

    #[test]
    fn group_name_serde_is_transparent() {
        let name = GroupName::normalized("Test");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"test\"");
        let back: GroupName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }

    #[test]
    fn group_name_map_lookup_by_str() {
        let mut map = BTreeMap::new();
        map.insert(GroupName::normalized("Docs"), 1);
        assert_eq!(map.get("docs"), Some(&1));
    }

    #[test]
    fn hex_digest_display_and_into_inner() {
        let digest = HexDigest::from_hex("deadbeef".to_owned());
        assert_eq!(digest.to_string(), "deadbeef");
        assert_eq!(digest.into_inner(), "deadbeef");
    }
}
