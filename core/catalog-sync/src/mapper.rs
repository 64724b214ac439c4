//! Entry → product mapping.

use crate::entry::Entry;
use crate::error::{SyncError, SyncResult};
use catalog_types::{NewProduct, INTEGRATION_CONTENTFUL};
use chrono::Utc;
use serde_json::Value;

/// Maps a locale-keyed entry to an upsertable product.
///
/// `sku`, `name`, `brand` and `model` are required. Timestamps come from
/// the entry's `sys` block and fall back to now when the source omits them.
pub fn map_entry(entry: &Entry, locale: &str) -> SyncResult<NewProduct> {
    let id = &entry.sys.id;
    let field = |name: &str| entry.fields.get(name).and_then(|v| v.get(locale));
    let text = |name: &str| field(name).and_then(Value::as_str).map(str::to_string);
    let required = |name: &str| {
        text(name).ok_or_else(|| {
            SyncError::Mapping(format!("entry {id}: missing {locale} value for {name}"))
        })
    };

    let stock = field("stock").and_then(|v| {
        v.as_i64()
            .or_else(|| v.as_f64().map(|f| f.round() as i64))
    });
    let now = Utc::now();

    Ok(NewProduct {
        sku: required("sku")?,
        name: required("name")?,
        brand: required("brand")?,
        model: required("model")?,
        category: text("category"),
        color: text("color"),
        price: field("price").and_then(Value::as_f64),
        currency: text("currency"),
        stock,
        external_id: id.clone(),
        integration: INTEGRATION_CONTENTFUL.to_string(),
        created_at: entry.sys.created_at.unwrap_or(now),
        updated_at: entry.sys.updated_at.unwrap_or(now),
    })
}
