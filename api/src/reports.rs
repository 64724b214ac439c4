//! Product report: how the filtered catalog splits into deleted and live
//! products, and how many of each carry a price.

use crate::auth::ApiUser;
use crate::error::ApiResult;
use crate::AppState;
use axum::extract::{RawQuery, State};
use axum::Json;
use catalog_filter::{adapt_all, parse_filter_query, Predicate, PredicateMap};
use catalog_storage::{ProductStore, StorageResult};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceReport {
    pub with_price: f64,
    pub without_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductGroupStats {
    /// Share of all matching products, in percent.
    pub percentage: f64,
    /// Price coverage within the group, in percent.
    pub price_report: PriceReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsReport {
    pub deleted_products: ProductGroupStats,
    pub not_deleted_products: ProductGroupStats,
}

/// Row counts for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupCounts {
    pub total: u64,
    pub with_price: u64,
}

impl GroupCounts {
    pub fn without_price(&self) -> u64 {
        self.total.saturating_sub(self.with_price)
    }
}

impl ProductGroupStats {
    fn new(group: GroupCounts, total: u64) -> Self {
        Self {
            percentage: percentage(group.total, total),
            price_report: PriceReport {
                with_price: percentage(group.with_price, group.total),
                without_price: percentage(group.without_price(), group.total),
            },
        }
    }
}

impl ProductsReport {
    /// Builds the report from raw counts. Zero totals give zero percentages.
    pub fn from_counts(total: u64, deleted: GroupCounts, not_deleted: GroupCounts) -> Self {
        Self {
            deleted_products: ProductGroupStats::new(deleted, total),
            not_deleted_products: ProductGroupStats::new(not_deleted, total),
        }
    }
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `GET /reports/products`. Only `filters` are read from the query.
pub(crate) async fn products_report(
    user: ApiUser,
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> ApiResult<Json<ProductsReport>> {
    let filters = parse_filter_query(raw.as_deref().unwrap_or(""), &state.schema)?;
    let base = adapt_all(filters.as_ref()).unwrap_or_default();
    info!(user = %user.username, filters = base.len(), "Generating product report");

    let store = state.products.clone();
    let report = tokio::task::spawn_blocking(move || compute(&store, base)).await??;
    Ok(Json(report))
}

fn compute(store: &ProductStore, base: PredicateMap) -> StorageResult<ProductsReport> {
    let total = store.count_matching(&base)?;
    if total == 0 {
        return Ok(ProductsReport::from_counts(0, GroupCounts::default(), GroupCounts::default()));
    }
    let deleted = group_counts(store, base.clone().with("deletedAt", Predicate::IsNotNull))?;
    let not_deleted = group_counts(store, base.with("deletedAt", Predicate::IsNull))?;
    Ok(ProductsReport::from_counts(total, deleted, not_deleted))
}

fn group_counts(store: &ProductStore, group: PredicateMap) -> StorageResult<GroupCounts> {
    let total = store.count_matching(&group)?;
    let with_price = store.count_matching(&group.with("price", Predicate::IsNotNull))?;
    Ok(GroupCounts { total, with_price })
}
