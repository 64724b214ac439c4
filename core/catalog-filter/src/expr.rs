//! Filter expressions as they arrive from callers.

use crate::fields::FieldMap;
use crate::value::FilterScalar;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The recognized operator keys of an operator object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Equal,
    Gt,
    Gte,
    Lt,
    Lte,
    Exists,
}

impl FilterOperator {
    /// Every recognized operator, in wire order.
    pub const ALL: [FilterOperator; 6] = [
        Self::Equal,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Exists,
    ];

    /// The comparison operators (everything but `exists`).
    pub const COMPARISONS: [FilterOperator; 5] =
        [Self::Equal, Self::Gt, Self::Gte, Self::Lt, Self::Lte];

    /// Looks up an operator by its wire key. Unrecognized keys return `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "equal" => Some(Self::Equal),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "exists" => Some(Self::Exists),
            _ => None,
        }
    }

    /// The wire key of this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Exists => "exists",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operator object: `{ gt: 100, lt: 500 }`.
///
/// Keys are kept verbatim and in insertion order, including keys the
/// adapter does not recognize and keys whose value is absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorObject {
    entries: Vec<(String, Option<FilterScalar>)>,
}

impl OperatorObject {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key` with a value, replacing an earlier value for the same key.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterScalar>) -> Self {
        self.set(key, Some(value.into()));
        self
    }

    /// Adds `key` with no value.
    #[must_use]
    pub fn with_absent(mut self, key: impl Into<String>) -> Self {
        self.set(key, None);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: Option<FilterScalar>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&FilterScalar>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A per-field filter: a literal meaning equality, or an operator object.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpression {
    Literal(FilterScalar),
    Operators(OperatorObject),
    /// An explicit null, or a value of a type the DSL does not support.
    Null,
}

impl FilterExpression {
    /// Shorthand for a literal expression.
    pub fn literal(value: impl Into<FilterScalar>) -> Self {
        Self::Literal(value.into())
    }
}

impl From<OperatorObject> for FilterExpression {
    fn from(ops: OperatorObject) -> Self {
        Self::Operators(ops)
    }
}

/// Field name → filter expression, covering any subset of an entity's fields.
pub type EntityFilterSet = FieldMap<FilterExpression>;
