//! Predicate → SQL translation.
//!
//! Translates a [`PredicateMap`] into a parameterized `WHERE` clause over
//! the `products` table:
//!
//! ```sql
//! price > ?1 AND price < ?2          -- {price: And(gt(100), lt(500))}
//! deleted_at IS NULL                 -- {deletedAt: IsNull}
//! ```
//!
//! Field names never reach the SQL text directly; they go through the
//! [`column_for`] whitelist and anything else is an error.

use crate::error::{StorageError, StorageResult};
use catalog_filter::{FilterScalar, Predicate, PredicateMap, SortOrder};
use rusqlite::types::{ToSqlOutput, Value};
use rusqlite::ToSql;

/// Maps an API field name to its column.
pub fn column_for(field: &str) -> Option<&'static str> {
    let column = match field {
        "id" => "id",
        "sku" => "sku",
        "name" => "name",
        "brand" => "brand",
        "model" => "model",
        "category" => "category",
        "color" => "color",
        "price" => "price",
        "currency" => "currency",
        "stock" => "stock",
        "externalId" => "external_id",
        "integration" => "integration",
        "createdAt" => "created_at",
        "updatedAt" => "updated_at",
        "deletedAt" => "deleted_at",
        _ => return None,
    };
    Some(column)
}

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Real(f64),
    Integer(i64),
}

impl From<&FilterScalar> for SqlParam {
    fn from(value: &FilterScalar) -> Self {
        match value {
            FilterScalar::Bool(b) => SqlParam::Integer(i64::from(*b)),
            FilterScalar::Number(n) => SqlParam::Real(*n),
            FilterScalar::Date(d) => SqlParam::Text(crate::format_timestamp(d)),
            FilterScalar::Text(s) => SqlParam::Text(s.clone()),
        }
    }
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlParam::Text(s) => ToSqlOutput::Owned(Value::Text(s.clone())),
            SqlParam::Real(n) => ToSqlOutput::Owned(Value::Real(*n)),
            SqlParam::Integer(n) => ToSqlOutput::Owned(Value::Integer(*n)),
        })
    }
}

/// A `WHERE` clause body (without the keyword) and its parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlWhere {
    pub clause: String,
    pub params: Vec<SqlParam>,
}

impl SqlWhere {
    /// ` WHERE <clause>`, or an empty string when unconstrained.
    pub fn to_sql_suffix(&self) -> String {
        if self.clause.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clause)
        }
    }

    /// Parameters in placeholder order, ready for `params_from_iter`.
    pub fn bind(&self) -> impl Iterator<Item = &dyn ToSql> {
        self.params.iter().map(|p| p as &dyn ToSql)
    }
}

/// Translates a predicate map; fields are joined with `AND`.
pub fn translate(predicates: &PredicateMap) -> StorageResult<SqlWhere> {
    let mut params = Vec::new();
    let mut parts = Vec::with_capacity(predicates.len());
    for (field, predicate) in predicates.iter() {
        let column =
            column_for(field).ok_or_else(|| StorageError::UnknownField(field.to_string()))?;
        parts.push(translate_predicate(column, predicate, &mut params)?);
    }
    Ok(SqlWhere {
        clause: parts.join(" AND "),
        params,
    })
}

fn translate_predicate(
    column: &str,
    predicate: &Predicate,
    params: &mut Vec<SqlParam>,
) -> StorageResult<String> {
    let sql = match predicate {
        Predicate::Equal(v) => compare(column, "=", v, params),
        Predicate::GreaterThan(v) => compare(column, ">", v, params),
        Predicate::GreaterOrEqual(v) => compare(column, ">=", v, params),
        Predicate::LessThan(v) => compare(column, "<", v, params),
        Predicate::LessOrEqual(v) => compare(column, "<=", v, params),
        Predicate::IsNull => format!("{column} IS NULL"),
        Predicate::IsNotNull => format!("{column} IS NOT NULL"),
        // An empty conjunction would match every row.
        Predicate::And(inner) if inner.is_empty() => {
            return Err(StorageError::InvalidData(format!(
                "empty conjunction on {column}"
            )));
        }
        Predicate::And(inner) => {
            let mut parts = inner
                .iter()
                .map(|p| translate_predicate(column, p, params))
                .collect::<StorageResult<Vec<String>>>()?;
            if parts.len() == 1 {
                parts.remove(0)
            } else {
                format!("({})", parts.join(" AND "))
            }
        }
    };
    Ok(sql)
}

fn compare(column: &str, op: &str, value: &FilterScalar, params: &mut Vec<SqlParam>) -> String {
    params.push(SqlParam::from(value));
    format!("{column} {op} ?{}", params.len())
}

/// Builds ` ORDER BY ...`, always ending on `id` so paging is stable.
pub fn order_by(orders: &[SortOrder]) -> StorageResult<String> {
    let mut parts = Vec::with_capacity(orders.len() + 1);
    for order in orders {
        let column = column_for(&order.field)
            .ok_or_else(|| StorageError::UnknownField(order.field.clone()))?;
        parts.push(format!("{column} {}", order.direction.as_str()));
    }
    parts.push("id ASC".to_string());
    Ok(format!(" ORDER BY {}", parts.join(", ")))
}
