//! Case-sensitivity policy for category, column and block names

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// How names are compared inside a table or container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CaseSensitivity {
    #[default]
    Sensitive,
    Insensitive,
}

impl CaseSensitivity {
    /// Compare two names under this policy
    pub fn matches(&self, a: &str, b: &str) -> bool {
        match self {
            CaseSensitivity::Sensitive => a == b,
            CaseSensitivity::Insensitive => a.eq_ignore_ascii_case(b),
        }
    }

    /// Normalize a name into the key used for hashing under this policy
    pub fn key<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match self {
            CaseSensitivity::Sensitive => Cow::Borrowed(name),
            CaseSensitivity::Insensitive => {
                if name.bytes().any(|b| b.is_ascii_uppercase()) {
                    Cow::Owned(name.to_ascii_lowercase())
                } else {
                    Cow::Borrowed(name)
                }
            }
        }
    }

    pub fn is_sensitive(&self) -> bool {
        *self == CaseSensitivity::Sensitive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches() {
        assert!(CaseSensitivity::Sensitive.matches("atom_site", "atom_site"));
        assert!(!CaseSensitivity::Sensitive.matches("atom_site", "ATOM_SITE"));
        assert!(CaseSensitivity::Insensitive.matches("atom_site", "ATOM_SITE"));
    }

    #[test]
    fn test_key_normalization() {
        assert_eq!(CaseSensitivity::Insensitive.key("Atom_Site"), "atom_site");
        assert_eq!(CaseSensitivity::Sensitive.key("Atom_Site"), "Atom_Site");
        assert!(matches!(
            CaseSensitivity::Insensitive.key("already_lower"),
            Cow::Borrowed(_)
        ));
    }
}
