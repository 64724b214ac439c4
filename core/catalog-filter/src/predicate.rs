use crate::fields::FieldMap;
use crate::value::FilterScalar;

/// A backend-neutral comparison produced by the adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equal(FilterScalar),
    GreaterThan(FilterScalar),
    GreaterOrEqual(FilterScalar),
    LessThan(FilterScalar),
    LessOrEqual(FilterScalar),
    IsNull,
    IsNotNull,
    /// Every inner predicate must hold.
    And(Vec<Predicate>),
}

/// Field name → predicate, the adapter's output for a whole filter set.
pub type PredicateMap = FieldMap<Predicate>;
