use catalog_filter::{
    adapt_all, adapt_single, EntityFilterSet, FilterExpression, FilterScalar, OperatorObject,
    Predicate,
};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn ops() -> OperatorObject {
    OperatorObject::new()
}

// ── adapt_single: literals ───────────────────────────────────────

#[test]
fn text_literal_is_equality() {
    let expr = FilterExpression::literal("Apple");
    assert_eq!(
        adapt_single(&expr),
        Some(Predicate::Equal(FilterScalar::text("Apple")))
    );
}

#[test]
fn numeric_looking_text_is_not_coerced() {
    let expr = FilterExpression::literal("100");
    assert_eq!(
        adapt_single(&expr),
        Some(Predicate::Equal(FilterScalar::text("100")))
    );
}

#[test]
fn number_literal_is_equality() {
    let expr = FilterExpression::literal(42.5);
    assert_eq!(
        adapt_single(&expr),
        Some(Predicate::Equal(FilterScalar::Number(42.5)))
    );
}

#[test]
fn date_literal_is_equality() {
    let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let expr = FilterExpression::literal(date);
    assert_eq!(
        adapt_single(&expr),
        Some(Predicate::Equal(FilterScalar::Date(date)))
    );
}

#[test]
fn null_yields_no_predicate() {
    assert_eq!(adapt_single(&FilterExpression::Null), None);
}

// ── adapt_single: operator objects ───────────────────────────────

#[test]
fn empty_operator_object_yields_nothing() {
    assert_eq!(adapt_single(&ops().into()), None);
}

#[test]
fn unrecognized_key_yields_nothing() {
    assert_eq!(adapt_single(&ops().with("foo", 1i64).into()), None);
}

#[test]
fn single_operator_maps_one_to_one() {
    let cases = [
        ("equal", Predicate::Equal(FilterScalar::Number(5.0))),
        ("gt", Predicate::GreaterThan(FilterScalar::Number(5.0))),
        ("gte", Predicate::GreaterOrEqual(FilterScalar::Number(5.0))),
        ("lt", Predicate::LessThan(FilterScalar::Number(5.0))),
        ("lte", Predicate::LessOrEqual(FilterScalar::Number(5.0))),
    ];
    for (key, expected) in cases {
        assert_eq!(
            adapt_single(&ops().with(key, 5.0).into()),
            Some(expected),
            "operator {key}"
        );
    }
}

#[test]
fn single_operator_with_absent_value_yields_nothing() {
    assert_eq!(adapt_single(&ops().with_absent("gt").into()), None);
}

#[test]
fn exists_false_is_null() {
    assert_eq!(
        adapt_single(&ops().with("exists", false).into()),
        Some(Predicate::IsNull)
    );
    assert_eq!(
        adapt_single(&ops().with("exists", "false").into()),
        Some(Predicate::IsNull)
    );
}

#[test]
fn exists_anything_else_is_not_null() {
    assert_eq!(
        adapt_single(&ops().with("exists", true).into()),
        Some(Predicate::IsNotNull)
    );
    assert_eq!(
        adapt_single(&ops().with("exists", "yes").into()),
        Some(Predicate::IsNotNull)
    );
    assert_eq!(
        adapt_single(&ops().with("exists", 0i64).into()),
        Some(Predicate::IsNotNull)
    );
}

#[test]
fn range_becomes_conjunction_in_key_order() {
    let expr = ops().with("gt", 100i64).with("lt", 500i64).into();
    assert_eq!(
        adapt_single(&expr),
        Some(Predicate::And(vec![
            Predicate::GreaterThan(FilterScalar::Number(100.0)),
            Predicate::LessThan(FilterScalar::Number(500.0)),
        ]))
    );
}

#[test]
fn conjunction_skips_absent_values() {
    let expr = ops()
        .with("gte", 10i64)
        .with_absent("lte")
        .with("exists", true)
        .into();
    assert_eq!(
        adapt_single(&expr),
        Some(Predicate::And(vec![
            Predicate::GreaterOrEqual(FilterScalar::Number(10.0)),
            Predicate::IsNotNull,
        ]))
    );
}

#[test]
fn conjunction_of_only_absent_values_yields_nothing() {
    let expr = ops().with_absent("gt").with_absent("lt").into();
    assert_eq!(adapt_single(&expr), None);
}

#[test]
fn unrecognized_keys_are_ignored_next_to_recognized_ones() {
    let expr = ops().with("foo", "bar").with("gt", 3i64).into();
    assert_eq!(
        adapt_single(&expr),
        Some(Predicate::GreaterThan(FilterScalar::Number(3.0)))
    );
}

// ── adapt_all ────────────────────────────────────────────────────

#[test]
fn absent_filter_set_is_unconstrained() {
    assert_eq!(adapt_all(None), None);
}

#[test]
fn empty_filter_set_is_empty_mapping() {
    let result = adapt_all(Some(&EntityFilterSet::new())).unwrap();
    assert!(result.is_empty());
}

#[test]
fn fields_without_predicate_are_dropped() {
    let filters = EntityFilterSet::new()
        .with("brand", ops().with("equal", "Apple").into())
        .with("price", ops().into());
    let result = adapt_all(Some(&filters)).unwrap();

    assert_eq!(result.keys().collect::<Vec<_>>(), vec!["brand"]);
    assert_eq!(
        result.get("brand"),
        Some(&Predicate::Equal(FilterScalar::text("Apple")))
    );
}

#[test]
fn insertion_order_is_preserved() {
    let filters = EntityFilterSet::new()
        .with("stock", FilterExpression::literal(3i64))
        .with("brand", FilterExpression::literal("Apple"))
        .with("color", ops().with("exists", false).into());
    let result = adapt_all(Some(&filters)).unwrap();
    assert_eq!(
        result.keys().collect::<Vec<_>>(),
        vec!["stock", "brand", "color"]
    );
}

#[test]
fn predicate_map_set_overrides_existing_field() {
    let filters = EntityFilterSet::new()
        .with("deletedAt", ops().with("exists", true).into())
        .with("brand", FilterExpression::literal("Apple"));
    let mut result = adapt_all(Some(&filters)).unwrap();
    result.set("deletedAt", Predicate::IsNull);

    assert_eq!(result.len(), 2);
    assert_eq!(result.get("deletedAt"), Some(&Predicate::IsNull));
    assert_eq!(
        result.keys().collect::<Vec<_>>(),
        vec!["deletedAt", "brand"]
    );
}

// ── Properties ───────────────────────────────────────────────────

fn scalar() -> impl Strategy<Value = FilterScalar> {
    prop_oneof![
        any::<bool>().prop_map(FilterScalar::Bool),
        (-1.0e9f64..1.0e9).prop_map(FilterScalar::Number),
        "[a-zA-Z0-9 ]{0,16}".prop_map(FilterScalar::Text),
    ]
}

fn operator_key() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("equal"),
        Just("gt"),
        Just("gte"),
        Just("lt"),
        Just("lte"),
        Just("exists"),
    ]
}

proptest! {
    #[test]
    fn literal_is_equality_over_exact_value(value in scalar()) {
        let result = adapt_single(&FilterExpression::Literal(value.clone()));
        prop_assert_eq!(result, Some(Predicate::Equal(value)));
    }

    #[test]
    fn conjunction_size_matches_defined_values(
        entries in proptest::collection::vec((operator_key(), proptest::option::of(scalar())), 2..6)
    ) {
        let mut object = OperatorObject::new();
        for (key, value) in &entries {
            object.set(*key, value.clone());
        }
        let defined = object.iter().filter(|(_, v)| v.is_some()).count();
        let distinct = object.len();

        match adapt_single(&FilterExpression::Operators(object)) {
            None => prop_assert_eq!(defined, 0),
            Some(Predicate::And(parts)) => {
                prop_assert!(distinct >= 2);
                prop_assert_eq!(parts.len(), defined);
            }
            Some(_) => {
                prop_assert_eq!(distinct, 1);
                prop_assert_eq!(defined, 1);
            }
        }
    }

    #[test]
    fn output_keys_are_subset_of_input_keys(
        fields in proptest::collection::vec(("[a-z]{1,8}", proptest::option::of(scalar())), 0..8)
    ) {
        let mut filters = EntityFilterSet::new();
        for (name, value) in &fields {
            let expr = match value {
                Some(v) => FilterExpression::Literal(v.clone()),
                None => FilterExpression::Null,
            };
            filters.set(name.clone(), expr);
        }
        let result = adapt_all(Some(&filters)).unwrap();
        for key in result.keys() {
            prop_assert!(filters.contains(key));
        }
        prop_assert!(result.len() <= filters.len());
    }
}
