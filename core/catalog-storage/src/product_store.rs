//! Product persistence backed by SQLite.

use crate::error::{StorageError, StorageResult};
use crate::sql::{self, SqlParam, SqlWhere};
use crate::{format_timestamp, lock, parse_timestamp, SharedConnection};
use catalog_filter::{PredicateMap, SortOrder};
use catalog_types::{NewProduct, Product, ProductId};
use chrono::Utc;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use std::path::Path;
use tracing::debug;

const SELECT_COLUMNS: &str = "id, sku, name, brand, model, category, color, price, currency, \
     stock, external_id, integration, created_at, updated_at, deleted_at";

/// Persistent store for products.
#[derive(Clone)]
pub struct ProductStore {
    conn: SharedConnection,
}

impl ProductStore {
    /// Opens (or creates) a product store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let store = Self {
            conn: crate::open_connection(path.as_ref())?,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Opens an in-memory product store.
    pub fn open_in_memory() -> StorageResult<Self> {
        let store = Self {
            conn: crate::open_memory_connection()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StorageResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS products (
                id TEXT PRIMARY KEY,
                sku TEXT NOT NULL,
                name TEXT NOT NULL,
                brand TEXT NOT NULL,
                model TEXT NOT NULL,
                category TEXT,
                color TEXT,
                price REAL,
                currency TEXT,
                stock INTEGER,
                external_id TEXT,
                integration TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted_at TEXT,
                UNIQUE(integration, external_id)
            );

            CREATE INDEX IF NOT EXISTS idx_products_deleted_at ON products(deleted_at);
            CREATE INDEX IF NOT EXISTS idx_products_sku ON products(sku);
            ",
        )?;
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────

    /// Returns one page of rows matching `predicates`, plus the total
    /// number of matching rows ignoring `skip` and `limit`.
    pub fn find_matching(
        &self,
        predicates: &PredicateMap,
        skip: u64,
        limit: u64,
        order: &[SortOrder],
    ) -> StorageResult<(Vec<Product>, u64)> {
        let filter = sql::translate(predicates)?;
        let order_by = sql::order_by(order)?;
        let conn = lock(&self.conn)?;

        let total = count_with(&conn, &filter)?;

        let offset_idx = filter.params.len() + 1;
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM products{}{order_by} LIMIT ?{} OFFSET ?{}",
            filter.to_sql_suffix(),
            offset_idx,
            offset_idx + 1,
        );
        debug!(%query, "find_matching");

        let mut bound = filter.params.clone();
        bound.push(SqlParam::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        bound.push(SqlParam::Integer(i64::try_from(skip).unwrap_or(i64::MAX)));
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
            .query_map(params_from_iter(bound.iter()), ProductRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let products = rows
            .into_iter()
            .map(Product::try_from)
            .collect::<StorageResult<Vec<_>>>()?;
        Ok((products, total))
    }

    /// Counts rows matching `predicates`.
    pub fn count_matching(&self, predicates: &PredicateMap) -> StorageResult<u64> {
        let filter = sql::translate(predicates)?;
        let conn = lock(&self.conn)?;
        count_with(&conn, &filter)
    }

    /// Loads a product by id, deleted or not.
    pub fn get(&self, id: &ProductId) -> StorageResult<Option<Product>> {
        let conn = lock(&self.conn)?;
        let row = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM products WHERE id = ?1"),
                params![id.to_string()],
                ProductRow::from_row,
            )
            .optional()?;
        row.map(Product::try_from).transpose()
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Inserts a product, or updates the row that already carries its
    /// natural key. The id and `deleted_at` of an existing row are kept.
    pub fn upsert_by_natural_key(&self, product: &NewProduct) -> StorageResult<ProductId> {
        validate(product)?;
        let conn = lock(&self.conn)?;
        let id: String = conn.query_row(
            "INSERT INTO products (id, sku, name, brand, model, category, color, price, currency,
                 stock, external_id, integration, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT(integration, external_id) DO UPDATE SET
                 sku = excluded.sku,
                 name = excluded.name,
                 brand = excluded.brand,
                 model = excluded.model,
                 category = excluded.category,
                 color = excluded.color,
                 price = excluded.price,
                 currency = excluded.currency,
                 stock = excluded.stock,
                 created_at = excluded.created_at,
                 updated_at = excluded.updated_at
             RETURNING id",
            params![
                ProductId::new().to_string(),
                product.sku,
                product.name,
                product.brand,
                product.model,
                product.category,
                product.color,
                product.price.map(round_price),
                product.currency,
                product.stock,
                product.external_id,
                product.integration,
                format_timestamp(&product.created_at),
                format_timestamp(&product.updated_at),
            ],
            |row| row.get(0),
        )?;
        ProductId::parse(&id).map_err(|e| StorageError::InvalidData(format!("bad id {id:?}: {e}")))
    }

    /// Hard-deletes every product row. Returns the number of rows removed.
    pub fn delete_all_rows(&self) -> StorageResult<usize> {
        let conn = lock(&self.conn)?;
        Ok(conn.execute("DELETE FROM products", [])?)
    }

    /// Stamps `deleted_at` on a live product. Returns 0 when the id is
    /// unknown or the product is already deleted.
    pub fn soft_delete(&self, id: &ProductId) -> StorageResult<usize> {
        let conn = lock(&self.conn)?;
        Ok(conn.execute(
            "UPDATE products SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![format_timestamp(&Utc::now()), id.to_string()],
        )?)
    }

    /// Soft-deletes the live product carrying the given natural key.
    pub fn soft_delete_by_natural_key(
        &self,
        integration: &str,
        external_id: &str,
    ) -> StorageResult<usize> {
        let conn = lock(&self.conn)?;
        Ok(conn.execute(
            "UPDATE products SET deleted_at = ?1
             WHERE integration = ?2 AND external_id = ?3 AND deleted_at IS NULL",
            params![format_timestamp(&Utc::now()), integration, external_id],
        )?)
    }
}

fn count_with(conn: &rusqlite::Connection, filter: &SqlWhere) -> StorageResult<u64> {
    let query = format!("SELECT COUNT(*) FROM products{}", filter.to_sql_suffix());
    let count: i64 = conn.query_row(&query, params_from_iter(filter.bind()), |row| row.get(0))?;
    Ok(u64::try_from(count).unwrap_or(0))
}

fn round_price(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

/// Enforces the column lengths of the table definition.
fn validate(product: &NewProduct) -> StorageResult<()> {
    let limits: [(&str, Option<&str>, usize); 8] = [
        ("sku", Some(product.sku.as_str()), 50),
        ("name", Some(product.name.as_str()), 255),
        ("brand", Some(product.brand.as_str()), 100),
        ("model", Some(product.model.as_str()), 100),
        ("category", product.category.as_deref(), 100),
        ("color", product.color.as_deref(), 50),
        ("externalId", Some(product.external_id.as_str()), 36),
        ("integration", Some(product.integration.as_str()), 100),
    ];
    for (field, value, max) in limits {
        if value.is_some_and(|v| v.chars().count() > max) {
            return Err(StorageError::InvalidData(format!(
                "{field} must be at most {max} characters"
            )));
        }
    }
    if let Some(currency) = &product.currency {
        if currency.chars().count() != 3 {
            return Err(StorageError::InvalidData(format!(
                "currency must be a 3-letter code, got {currency:?}"
            )));
        }
    }
    Ok(())
}

/// Raw column values, converted to a [`Product`] outside the row callback.
struct ProductRow {
    id: String,
    sku: String,
    name: String,
    brand: String,
    model: String,
    category: Option<String>,
    color: Option<String>,
    price: Option<f64>,
    currency: Option<String>,
    stock: Option<i64>,
    external_id: Option<String>,
    integration: Option<String>,
    created_at: String,
    updated_at: String,
    deleted_at: Option<String>,
}

impl ProductRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            sku: row.get(1)?,
            name: row.get(2)?,
            brand: row.get(3)?,
            model: row.get(4)?,
            category: row.get(5)?,
            color: row.get(6)?,
            price: row.get(7)?,
            currency: row.get(8)?,
            stock: row.get(9)?,
            external_id: row.get(10)?,
            integration: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
            deleted_at: row.get(14)?,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = StorageError;

    fn try_from(row: ProductRow) -> StorageResult<Self> {
        Ok(Product {
            id: ProductId::parse(&row.id)
                .map_err(|e| StorageError::InvalidData(format!("bad id {:?}: {e}", row.id)))?,
            sku: row.sku,
            name: row.name,
            brand: row.brand,
            model: row.model,
            category: row.category,
            color: row.color,
            price: row.price,
            currency: row.currency,
            stock: row.stock,
            external_id: row.external_id,
            integration: row.integration,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            deleted_at: row.deleted_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}
