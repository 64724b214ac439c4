//! Filter expressions for the product catalog.
//!
//! Translates the declarative per-field filter DSL used by list and report
//! requests into backend-neutral predicates:
//! - [`FilterExpression`]: a literal (equality) or an operator object
//!   (`equal`, `gt`, `gte`, `lt`, `lte`, `exists`)
//! - [`Predicate`]: the comparison tree handed to the data-access layer
//! - [`adapt_single`] / [`adapt_all`]: the pure translation
//! - [`FilterSchema`]: per-field type and operator configuration
//! - [`parse_list_query`]: decoding and validation of the bracket-notation
//!   query string (`filters[price][gt]=100&pagination[limit]=5&order[sku]=ASC`)
//!
//! The adapter never fails. A malformed field filter degrades to "no
//! predicate" for that field and never to a broader predicate.

mod adapter;
mod error;
mod expr;
mod fields;
mod predicate;
mod query;
mod schema;
mod value;

pub use adapter::{adapt_all, adapt_single};
pub use error::ValidationErrors;
pub use expr::{EntityFilterSet, FilterExpression, FilterOperator, OperatorObject};
pub use fields::FieldMap;
pub use predicate::{Predicate, PredicateMap};
pub use query::{
    parse_filter_query, parse_list_query, ListQuery, Pagination, PaginationConfig, SortDirection,
    SortOrder,
};
pub use schema::{FieldType, FilterField, FilterSchema};
pub use value::FilterScalar;
