//! Decoding and validation of the bracket-notation list query.
//!
//! ```text
//! filters[price][gt]=100&filters[brand][equal]=Apple&pagination[skip]=0&pagination[limit]=5&order[sku]=ASC
//! ```
//!
//! Unknown keys are stripped. Values are checked against the field's
//! declared [`FieldType`] by a fixed, ordered list of rules; every violation
//! is collected before the request is rejected.

use crate::error::ValidationErrors;
use crate::expr::{EntityFilterSet, FilterExpression, FilterOperator, OperatorObject};
use crate::schema::{FieldType, FilterField, FilterSchema};
use crate::value::FilterScalar;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Pagination defaults and bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            max_limit: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub skip: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: String,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// A validated list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    /// `None` when the request carried no `filters` key at all.
    pub filters: Option<EntityFilterSet>,
    pub pagination: Pagination,
    pub order: Vec<SortOrder>,
}

/// Parses a full list query: filters, pagination and order.
pub fn parse_list_query(
    raw: &str,
    schema: &FilterSchema,
    config: &PaginationConfig,
) -> Result<ListQuery, ValidationErrors> {
    let mut parser = QueryParser::new(schema, Sections::ALL);
    parser.consume(raw);
    parser.finish_list(config)
}

/// Parses only the `filters` part of a query; other keys are stripped.
pub fn parse_filter_query(
    raw: &str,
    schema: &FilterSchema,
) -> Result<Option<EntityFilterSet>, ValidationErrors> {
    let mut parser = QueryParser::new(schema, Sections::FILTERS_ONLY);
    parser.consume(raw);
    parser.finish_filters()
}

#[derive(Debug, Clone, Copy)]
struct Sections {
    pagination: bool,
    order: bool,
}

impl Sections {
    const ALL: Sections = Sections {
        pagination: true,
        order: true,
    };
    const FILTERS_ONLY: Sections = Sections {
        pagination: false,
        order: false,
    };
}

/// What the request said about one field before it becomes an expression.
#[derive(Debug, Default)]
struct FieldInput {
    literal: Option<FilterScalar>,
    ops: OperatorObject,
}

impl FieldInput {
    fn into_expression(self) -> FilterExpression {
        match self.literal {
            Some(literal) if self.ops.is_empty() => FilterExpression::Literal(literal),
            Some(literal) => {
                let mut ops = self.ops;
                if !ops.iter().any(|(k, _)| k == FilterOperator::Equal.as_str()) {
                    ops.set(FilterOperator::Equal.as_str(), Some(literal));
                }
                FilterExpression::Operators(ops)
            }
            None => FilterExpression::Operators(self.ops),
        }
    }
}

struct QueryParser<'a> {
    schema: &'a FilterSchema,
    sections: Sections,
    errors: ValidationErrors,
    filters_seen: bool,
    fields: Vec<(String, FieldInput)>,
    skip: Option<String>,
    limit: Option<String>,
    order: Vec<(String, String)>,
}

impl<'a> QueryParser<'a> {
    fn new(schema: &'a FilterSchema, sections: Sections) -> Self {
        Self {
            schema,
            sections,
            errors: ValidationErrors::default(),
            filters_seen: false,
            fields: Vec::new(),
            skip: None,
            limit: None,
            order: Vec::new(),
        }
    }

    fn consume(&mut self, raw: &str) {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            self.accept_pair(&key, &value);
        }
    }

    fn accept_pair(&mut self, key: &str, value: &str) {
        let Some((head, path)) = split_key(key) else {
            debug!(key, "Stripping malformed query key");
            return;
        };
        match (head, path.as_slice()) {
            ("filters", [field]) => {
                self.filters_seen = true;
                self.accept_filter(field, None, value);
            }
            ("filters", [field, op]) => {
                self.filters_seen = true;
                self.accept_filter(field, Some(*op), value);
            }
            ("pagination", ["skip"]) if self.sections.pagination => {
                self.skip = Some(value.to_string());
            }
            ("pagination", ["limit"]) if self.sections.pagination => {
                self.limit = Some(value.to_string());
            }
            ("order", [field]) if self.sections.order => self.accept_order(field, value),
            _ => debug!(key, "Stripping unknown query key"),
        }
    }

    fn accept_filter(&mut self, field_name: &str, op_key: Option<&str>, raw: &str) {
        let schema = self.schema;
        let Some(field) = schema.field(field_name) else {
            debug!(field = field_name, "Stripping filter on unknown field");
            return;
        };
        let op = match op_key {
            None => FilterOperator::Equal,
            Some(key) => match FilterOperator::from_key(key) {
                Some(op) => op,
                None => {
                    debug!(field = field_name, op = key, "Stripping unknown filter operator");
                    return;
                }
            },
        };
        if !field.allows(op) {
            debug!(field = field_name, %op, "Stripping operator not allowed on field");
            return;
        }

        let path = match op_key {
            Some(key) => format!("filters.{field_name}.{key}"),
            None => format!("filters.{field_name}"),
        };
        let check = ValueCheck {
            field,
            op,
            raw,
            path: &path,
        };
        let scalar = match check.run() {
            Ok(scalar) => scalar,
            Err(message) => {
                self.errors.push(message);
                return;
            }
        };

        let input = self.field_input(field_name);
        match op_key {
            None => input.literal = Some(scalar),
            Some(key) => input.ops.set(key, Some(scalar)),
        }
    }

    fn field_input(&mut self, name: &str) -> &mut FieldInput {
        let idx = match self.fields.iter().position(|(n, _)| n == name) {
            Some(idx) => idx,
            None => {
                self.fields.push((name.to_string(), FieldInput::default()));
                self.fields.len() - 1
            }
        };
        &mut self.fields[idx].1
    }

    fn accept_order(&mut self, field_name: &str, raw: &str) {
        let schema = self.schema;
        match schema.field(field_name) {
            Some(field) if field.sortable => {
                self.order.retain(|(name, _)| name != field_name);
                self.order.push((field_name.to_string(), raw.to_string()));
            }
            _ => debug!(field = field_name, "Stripping order on non-sortable field"),
        }
    }

    fn take_filters(&mut self) -> Option<EntityFilterSet> {
        if !self.filters_seen {
            return None;
        }
        Some(
            std::mem::take(&mut self.fields)
                .into_iter()
                .map(|(name, input)| (name, input.into_expression()))
                .collect(),
        )
    }

    fn finish_filters(mut self) -> Result<Option<EntityFilterSet>, ValidationErrors> {
        let filters = self.take_filters();
        if self.errors.is_empty() {
            Ok(filters)
        } else {
            Err(self.errors)
        }
    }

    fn finish_list(mut self, config: &PaginationConfig) -> Result<ListQuery, ValidationErrors> {
        let filters = self.take_filters();

        let skip = match self.skip.as_deref() {
            None => 0,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n >= 0 => n as u64,
                Ok(_) => {
                    self.errors.push("pagination.skip must not be less than 0");
                    0
                }
                Err(_) => {
                    self.errors.push("pagination.skip must be an integer number");
                    0
                }
            },
        };

        let limit = match self.limit.as_deref() {
            None => config.default_limit,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n <= 0 => {
                    self.errors.push("pagination.limit must be a positive number");
                    config.default_limit
                }
                Ok(n) if (n as u64) > config.max_limit => {
                    self.errors.push(format!(
                        "pagination.limit must not be greater than {}",
                        config.max_limit
                    ));
                    config.default_limit
                }
                Ok(n) => n as u64,
                Err(_) => {
                    self.errors.push("pagination.limit must be an integer number");
                    config.default_limit
                }
            },
        };

        let mut order = Vec::with_capacity(self.order.len());
        for (field, raw) in &self.order {
            match SortDirection::parse(raw) {
                Some(direction) => order.push(SortOrder::new(field.clone(), direction)),
                None => self.errors.push(format!(
                    "order.{field} must be one of the following values: ASC, DESC"
                )),
            }
        }

        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        Ok(ListQuery {
            filters,
            pagination: Pagination { skip, limit },
            order,
        })
    }
}

/// Splits `filters[price][gt]` into `("filters", ["price", "gt"])`.
fn split_key(key: &str) -> Option<(&str, Vec<&str>)> {
    let open = key.find('[')?;
    let (head, mut rest) = key.split_at(open);
    if head.is_empty() {
        return None;
    }
    let mut path = Vec::new();
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        let segment = &inner[..close];
        if segment.is_empty() {
            return None;
        }
        path.push(segment);
        rest = &inner[close + 1..];
    }
    Some((head, path))
}

// ── Value rules ──────────────────────────────────────────────────

enum Outcome {
    Next,
    Accept(FilterScalar),
    Reject(String),
}

type ValueRule = fn(&ValueCheck<'_>) -> Outcome;

/// Evaluated in order; the first rule that accepts or rejects decides.
const VALUE_RULES: &[ValueRule] = &[
    reject_empty,
    exists_flag,
    exact_length,
    number_value,
    datetime_value,
    text_value,
];

struct ValueCheck<'a> {
    field: &'a FilterField,
    op: FilterOperator,
    raw: &'a str,
    path: &'a str,
}

impl ValueCheck<'_> {
    fn run(&self) -> Result<FilterScalar, String> {
        for rule in VALUE_RULES {
            match rule(self) {
                Outcome::Next => continue,
                Outcome::Accept(value) => return Ok(value),
                Outcome::Reject(message) => return Err(message),
            }
        }
        Err(format!("{} has an unsupported value", self.path))
    }
}

fn reject_empty(check: &ValueCheck<'_>) -> Outcome {
    if check.raw.trim().is_empty() {
        Outcome::Reject(format!("{} should not be empty", check.path))
    } else {
        Outcome::Next
    }
}

fn exists_flag(check: &ValueCheck<'_>) -> Outcome {
    if check.op != FilterOperator::Exists {
        return Outcome::Next;
    }
    match check.raw {
        "true" => Outcome::Accept(FilterScalar::Bool(true)),
        "false" => Outcome::Accept(FilterScalar::Bool(false)),
        _ => Outcome::Reject(format!("{} must be a boolean value", check.path)),
    }
}

fn exact_length(check: &ValueCheck<'_>) -> Outcome {
    match check.field.exact_len {
        Some(len) if check.field.field_type == FieldType::Text
            && check.raw.chars().count() != len =>
        {
            Outcome::Reject(format!(
                "{} must be exactly {len} characters long",
                check.path
            ))
        }
        _ => Outcome::Next,
    }
}

fn number_value(check: &ValueCheck<'_>) -> Outcome {
    if check.field.field_type != FieldType::Number {
        return Outcome::Next;
    }
    match check.raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Outcome::Accept(FilterScalar::Number(n)),
        _ => Outcome::Reject(format!("{} must be a number", check.path)),
    }
}

fn datetime_value(check: &ValueCheck<'_>) -> Outcome {
    if check.field.field_type != FieldType::DateTime {
        return Outcome::Next;
    }
    match parse_iso_date(check.raw) {
        Some(date) => Outcome::Accept(FilterScalar::Date(date)),
        None => Outcome::Reject(format!(
            "{} must be a valid ISO 8601 date string",
            check.path
        )),
    }
}

fn text_value(check: &ValueCheck<'_>) -> Outcome {
    if check.field.field_type != FieldType::Text {
        return Outcome::Next;
    }
    Outcome::Accept(FilterScalar::Text(check.raw.to_string()))
}

/// Full RFC 3339 timestamps, or a bare `YYYY-MM-DD` taken as midnight UTC.
fn parse_iso_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
