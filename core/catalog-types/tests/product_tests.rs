use catalog_types::{NaturalKey, NewProduct, Product, ProductId, SyncCursor, INTEGRATION_CONTENTFUL};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

fn sample_product() -> Product {
    let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
    Product {
        id: ProductId::new(),
        sku: "IPHONE-15-PRO-128GB".into(),
        name: "iPhone 15 Pro 128GB".into(),
        brand: "Apple".into(),
        model: "iPhone 15 Pro".into(),
        category: Some("Electronics".into()),
        color: None,
        price: Some(999.99),
        currency: Some("USD".into()),
        stock: Some(50),
        external_id: Some("ext-1".into()),
        integration: Some(INTEGRATION_CONTENTFUL.into()),
        created_at: ts,
        updated_at: ts,
        deleted_at: None,
    }
}

// ── Product ──────────────────────────────────────────────────────

#[test]
fn product_serializes_camel_case() {
    let json = serde_json::to_value(sample_product()).unwrap();
    assert_eq!(json["externalId"], "ext-1");
    assert_eq!(json["createdAt"], "2024-01-15T10:30:00Z");
    assert!(json["deletedAt"].is_null());
    assert!(json.get("external_id").is_none());
}

#[test]
fn product_natural_key_requires_both_parts() {
    let mut product = sample_product();
    assert_eq!(
        product.natural_key(),
        Some(NaturalKey::new("contentful", "ext-1"))
    );

    product.integration = None;
    assert_eq!(product.natural_key(), None);
}

#[test]
fn product_is_deleted() {
    let mut product = sample_product();
    assert!(!product.is_deleted());
    product.deleted_at = Some(Utc::now());
    assert!(product.is_deleted());
}

// ── NewProduct ───────────────────────────────────────────────────

#[test]
fn new_product_natural_key() {
    let ts = Utc::now();
    let product = NewProduct {
        sku: "SKU".into(),
        name: "Name".into(),
        brand: "Brand".into(),
        model: "Model".into(),
        category: None,
        color: None,
        price: None,
        currency: None,
        stock: None,
        external_id: "abc".into(),
        integration: INTEGRATION_CONTENTFUL.into(),
        created_at: ts,
        updated_at: ts,
    };
    let key = product.natural_key();
    assert_eq!(key.to_string(), "contentful:abc");
}

// ── SyncCursor ───────────────────────────────────────────────────

#[test]
fn sync_cursor_new_stamps_both_times() {
    let cursor = SyncCursor::new("https://cdn.example.com/sync?sync_token=abc");
    assert_eq!(cursor.token, "https://cdn.example.com/sync?sync_token=abc");
    assert_eq!(cursor.created_at, cursor.updated_at);
}
