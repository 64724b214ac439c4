//! Pure translation from filter expressions to predicates.

use crate::expr::{EntityFilterSet, FilterExpression, FilterOperator, OperatorObject};
use crate::predicate::{Predicate, PredicateMap};
use crate::value::FilterScalar;

/// Adapts one field's filter expression.
///
/// Returns `None` when the expression carries no usable constraint. The
/// result is never broader than what the caller asked for.
pub fn adapt_single(expr: &FilterExpression) -> Option<Predicate> {
    match expr {
        FilterExpression::Literal(value) => Some(Predicate::Equal(value.clone())),
        FilterExpression::Operators(ops) => adapt_operators(ops),
        FilterExpression::Null => None,
    }
}

/// Adapts a whole filter set, field by field in insertion order.
///
/// `None` in means unconstrained and yields `None`; a present but empty set
/// yields an empty map. Fields whose expression adapts to nothing are
/// dropped, so the output never contains a field the input did not.
pub fn adapt_all(filters: Option<&EntityFilterSet>) -> Option<PredicateMap> {
    let filters = filters?;
    let mut out = PredicateMap::new();
    for (field, expr) in filters.iter() {
        if let Some(predicate) = adapt_single(expr) {
            out.set(field, predicate);
        }
    }
    Some(out)
}

fn adapt_operators(ops: &OperatorObject) -> Option<Predicate> {
    let recognized: Vec<(FilterOperator, Option<&FilterScalar>)> = ops
        .iter()
        .filter_map(|(key, value)| FilterOperator::from_key(key).map(|op| (op, value)))
        .collect();

    match recognized.as_slice() {
        [] => None,
        [(op, value)] => value.map(|v| apply(*op, v)),
        many => {
            let parts: Vec<Predicate> = many
                .iter()
                .filter_map(|(op, value)| value.map(|v| apply(*op, v)))
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(Predicate::And(parts))
            }
        }
    }
}

fn apply(op: FilterOperator, value: &FilterScalar) -> Predicate {
    match op {
        FilterOperator::Equal => Predicate::Equal(value.clone()),
        FilterOperator::Gt => Predicate::GreaterThan(value.clone()),
        FilterOperator::Gte => Predicate::GreaterOrEqual(value.clone()),
        FilterOperator::Lt => Predicate::LessThan(value.clone()),
        FilterOperator::Lte => Predicate::LessOrEqual(value.clone()),
        FilterOperator::Exists if value.is_false_flag() => Predicate::IsNull,
        FilterOperator::Exists => Predicate::IsNotNull,
    }
}
