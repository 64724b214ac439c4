use catalog_filter::{FilterScalar, Predicate, PredicateMap, SortDirection, SortOrder};
use catalog_storage::{ProductStore, StorageError};
use catalog_types::{NewProduct, ProductId, INTEGRATION_CONTENTFUL};
use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;

fn make_product(external_id: &str, sku: &str, price: Option<f64>) -> NewProduct {
    let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
    NewProduct {
        sku: sku.into(),
        name: format!("Product {sku}"),
        brand: "Apple".into(),
        model: "X".into(),
        category: Some("Phones".into()),
        color: None,
        price,
        currency: Some("USD".into()),
        stock: Some(10),
        external_id: external_id.into(),
        integration: INTEGRATION_CONTENTFUL.into(),
        created_at: ts,
        updated_at: ts,
    }
}

fn seeded() -> ProductStore {
    let store = ProductStore::open_in_memory().unwrap();
    store.upsert_by_natural_key(&make_product("e1", "A-1", Some(50.0))).unwrap();
    store.upsert_by_natural_key(&make_product("e2", "B-2", Some(150.0))).unwrap();
    store.upsert_by_natural_key(&make_product("e3", "C-3", Some(700.0))).unwrap();
    store.upsert_by_natural_key(&make_product("e4", "D-4", None)).unwrap();
    store
}

fn live() -> PredicateMap {
    PredicateMap::new().with("deletedAt", Predicate::IsNull)
}

// ── Upsert ───────────────────────────────────────────────────────

#[test]
fn upsert_inserts_new_row() {
    let store = ProductStore::open_in_memory().unwrap();
    let id = store.upsert_by_natural_key(&make_product("e1", "A-1", Some(9.99))).unwrap();

    let product = store.get(&id).unwrap().unwrap();
    assert_eq!(product.sku, "A-1");
    assert_eq!(product.price, Some(9.99));
    assert_eq!(product.external_id.as_deref(), Some("e1"));
    assert_eq!(product.integration.as_deref(), Some(INTEGRATION_CONTENTFUL));
    assert!(!product.is_deleted());
}

#[test]
fn upsert_same_natural_key_updates_in_place() {
    let store = ProductStore::open_in_memory().unwrap();
    let first = store.upsert_by_natural_key(&make_product("e1", "A-1", Some(1.0))).unwrap();
    let second = store.upsert_by_natural_key(&make_product("e1", "A-2", Some(2.0))).unwrap();

    assert_eq!(first, second);
    assert_eq!(store.count_matching(&PredicateMap::new()).unwrap(), 1);
    let product = store.get(&first).unwrap().unwrap();
    assert_eq!(product.sku, "A-2");
    assert_eq!(product.price, Some(2.0));
}

#[test]
fn upsert_is_idempotent() {
    let store = ProductStore::open_in_memory().unwrap();
    let product = make_product("e1", "A-1", Some(1.0));
    for _ in 0..3 {
        store.upsert_by_natural_key(&product).unwrap();
    }
    assert_eq!(store.count_matching(&PredicateMap::new()).unwrap(), 1);
}

#[test]
fn upsert_keeps_soft_delete() {
    let store = ProductStore::open_in_memory().unwrap();
    let id = store.upsert_by_natural_key(&make_product("e1", "A-1", None)).unwrap();
    store.soft_delete(&id).unwrap();
    store.upsert_by_natural_key(&make_product("e1", "A-1b", None)).unwrap();

    let product = store.get(&id).unwrap().unwrap();
    assert!(product.is_deleted());
    assert_eq!(product.sku, "A-1b");
}

#[test]
fn upsert_rounds_price_to_cents() {
    let store = ProductStore::open_in_memory().unwrap();
    let id = store.upsert_by_natural_key(&make_product("e1", "A-1", Some(10.456))).unwrap();
    assert_eq!(store.get(&id).unwrap().unwrap().price, Some(10.46));
}

#[test]
fn upsert_rejects_oversized_fields() {
    let store = ProductStore::open_in_memory().unwrap();
    let mut product = make_product("e1", &"S".repeat(51), None);
    assert!(matches!(
        store.upsert_by_natural_key(&product),
        Err(StorageError::InvalidData(_))
    ));

    product.sku = "ok".into();
    product.currency = Some("EURO".into());
    assert!(matches!(
        store.upsert_by_natural_key(&product),
        Err(StorageError::InvalidData(_))
    ));
}

// ── Queries ──────────────────────────────────────────────────────

#[test]
fn find_with_range_predicate() {
    let store = seeded();
    let predicates = PredicateMap::new().with(
        "price",
        Predicate::And(vec![
            Predicate::GreaterThan(FilterScalar::Number(100.0)),
            Predicate::LessThan(FilterScalar::Number(500.0)),
        ]),
    );
    let (rows, total) = store.find_matching(&predicates, 0, 10, &[]).unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].sku, "B-2");
}

#[test]
fn find_with_null_checks() {
    let store = seeded();
    let without_price = PredicateMap::new().with("price", Predicate::IsNull);
    assert_eq!(store.count_matching(&without_price).unwrap(), 1);

    let with_price = PredicateMap::new().with("price", Predicate::IsNotNull);
    assert_eq!(store.count_matching(&with_price).unwrap(), 3);
}

#[test]
fn find_with_text_equality() {
    let store = seeded();
    let predicates = PredicateMap::new().with("sku", Predicate::Equal(FilterScalar::text("C-3")));
    let (rows, total) = store.find_matching(&predicates, 0, 10, &[]).unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].external_id.as_deref(), Some("e3"));
}

#[test]
fn find_with_date_comparison() {
    let store = seeded();
    let cutoff = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
    let after = PredicateMap::new().with(
        "createdAt",
        Predicate::GreaterThan(FilterScalar::Date(cutoff - Duration::days(1))),
    );
    assert_eq!(store.count_matching(&after).unwrap(), 4);

    let before = PredicateMap::new().with("createdAt", Predicate::LessThan(FilterScalar::Date(cutoff)));
    assert_eq!(store.count_matching(&before).unwrap(), 0);
}

#[test]
fn pagination_reports_total_and_slices_rows() {
    let store = seeded();
    let order = [SortOrder::new("sku", SortDirection::Desc)];
    let (rows, total) = store.find_matching(&PredicateMap::new(), 1, 2, &order).unwrap();

    assert_eq!(total, 4);
    let skus: Vec<&str> = rows.iter().map(|p| p.sku.as_str()).collect();
    assert_eq!(skus, vec!["C-3", "B-2"]);
}

#[test]
fn unknown_field_is_an_error() {
    let store = seeded();
    let predicates = PredicateMap::new().with("password", Predicate::IsNull);
    assert!(matches!(
        store.count_matching(&predicates),
        Err(StorageError::UnknownField(f)) if f == "password"
    ));
}

// ── Deletes ──────────────────────────────────────────────────────

#[test]
fn soft_delete_hides_row_from_live_queries() {
    let store = seeded();
    let (rows, _) = store.find_matching(&live(), 0, 10, &[]).unwrap();
    let id = rows[0].id;

    assert_eq!(store.soft_delete(&id).unwrap(), 1);
    assert_eq!(store.count_matching(&live()).unwrap(), 3);
    assert_eq!(store.count_matching(&PredicateMap::new()).unwrap(), 4);
}

#[test]
fn soft_delete_unknown_id_affects_nothing() {
    let store = seeded();
    assert_eq!(store.soft_delete(&ProductId::new()).unwrap(), 0);
}

#[test]
fn soft_delete_twice_affects_nothing_the_second_time() {
    let store = seeded();
    let (rows, _) = store.find_matching(&live(), 0, 1, &[]).unwrap();
    assert_eq!(store.soft_delete(&rows[0].id).unwrap(), 1);
    assert_eq!(store.soft_delete(&rows[0].id).unwrap(), 0);
}

#[test]
fn soft_delete_by_natural_key() {
    let store = seeded();
    assert_eq!(
        store.soft_delete_by_natural_key(INTEGRATION_CONTENTFUL, "e2").unwrap(),
        1
    );
    assert_eq!(
        store.soft_delete_by_natural_key(INTEGRATION_CONTENTFUL, "missing").unwrap(),
        0
    );
    assert_eq!(store.count_matching(&live()).unwrap(), 3);
}

#[test]
fn delete_all_rows_empties_table() {
    let store = seeded();
    assert_eq!(store.delete_all_rows().unwrap(), 4);
    assert_eq!(store.count_matching(&PredicateMap::new()).unwrap(), 0);
}

// ── Persistence ──────────────────────────────────────────────────

#[test]
fn rows_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.db");
    let id = {
        let store = ProductStore::open(&path).unwrap();
        store.upsert_by_natural_key(&make_product("e1", "A-1", Some(3.5))).unwrap()
    };
    let store = ProductStore::open(&path).unwrap();
    let product = store.get(&id).unwrap().unwrap();
    assert_eq!(product.sku, "A-1");
    assert_eq!(
        product.created_at,
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
    );
}
