use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar a filter compares against.
///
/// Variant order matters for untagged deserialization: RFC 3339 strings
/// become dates, every other string stays text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterScalar {
    Bool(bool),
    Number(f64),
    Date(DateTime<Utc>),
    Text(String),
}

impl FilterScalar {
    /// Shorthand for a text scalar.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns true for `false` and the string `"false"`.
    #[must_use]
    pub fn is_false_flag(&self) -> bool {
        match self {
            Self::Bool(b) => !b,
            Self::Text(s) => s == "false",
            _ => false,
        }
    }
}

impl fmt::Display for FilterScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Date(d) => write!(f, "{}", d.to_rfc3339()),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<&str> for FilterScalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterScalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FilterScalar {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FilterScalar {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for FilterScalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<DateTime<Utc>> for FilterScalar {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}
