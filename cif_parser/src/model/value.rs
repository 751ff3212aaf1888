use serde::{Deserialize, Serialize};
use std::fmt;

/// A single CIF cell value.
///
/// The two sentinels are distinct from any text, including the literal
/// strings `"?"` and `"."` that a quoted value may carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Text(String),
    /// `?`: the value exists but is not known.
    #[default]
    Unknown,
    /// `.`: the item does not apply to this row.
    Inapplicable,
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// The text content, or `None` for either sentinel.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    pub fn is_inapplicable(&self) -> bool {
        matches!(self, Value::Inapplicable)
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Value::Text(_))
    }

    /// Text in single quotes, sentinels bare, so a quoted `'?'` never reads
    /// like the unknown marker in messages
    pub fn quoted(&self) -> String {
        match self {
            Value::Text(s) => format!("'{}'", s),
            sentinel => sentinel.to_string(),
        }
    }

    /// Parse the leading number, ignoring a trailing standard uncertainty
    /// such as the `(4)` in `1.234(4)`.
    pub fn as_f64(&self) -> Option<f64> {
        let s = self.as_str()?;
        let s = match s.find('(') {
            Some(i) => &s[..i],
            None => s,
        };
        s.trim().parse().ok()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_str()?.trim().parse().ok()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Unknown => f.write_str("?"),
            Value::Inapplicable => f.write_str("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_are_distinct() {
        assert_ne!(Value::Unknown, Value::Inapplicable);
        assert_ne!(Value::Unknown, Value::text("?"));
        assert_ne!(Value::Inapplicable, Value::text("."));
        assert!(Value::Unknown.as_str().is_none());
        assert!(Value::Inapplicable.is_sentinel());
        assert_eq!(Value::Unknown.quoted(), "?");
        assert_eq!(Value::text("?").quoted(), "'?'");
    }

    #[test]
    fn test_numeric_access() {
        assert_eq!(Value::text("1.234(4)").as_f64(), Some(1.234));
        assert_eq!(Value::text("42").as_i64(), Some(42));
        assert_eq!(Value::Unknown.as_f64(), None);
        assert_eq!(Value::text("abc").as_i64(), None);
    }
}
