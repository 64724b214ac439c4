use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::extract::{Path, RawQuery, State};
use axum::Json;
use catalog_filter::{adapt_all, parse_list_query, Predicate};
use catalog_types::{Product, ProductId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListProductsResponse {
    pub results: Vec<Product>,
    pub pagination: PaginationInfo,
}

/// `GET /products`. Deleted products are never listed, whatever the
/// request says about `deletedAt`.
pub(crate) async fn list_products(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> ApiResult<Json<ListProductsResponse>> {
    let query = parse_list_query(raw.as_deref().unwrap_or(""), &state.schema, &state.pagination)?;
    let mut predicates = adapt_all(query.filters.as_ref()).unwrap_or_default();
    predicates.set("deletedAt", Predicate::IsNull);
    debug!(filters = predicates.len(), "Listing products");

    let store = state.products.clone();
    let page = query.pagination;
    let order = query.order;
    let (results, total) = tokio::task::spawn_blocking(move || {
        store.find_matching(&predicates, page.skip, page.limit, &order)
    })
    .await??;

    Ok(Json(ListProductsResponse {
        results,
        pagination: PaginationInfo {
            total,
            skip: page.skip,
            limit: page.limit,
        },
    }))
}

/// `DELETE /products/{id}`.
pub(crate) async fn soft_delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = ProductId::parse(&id).map_err(|_| ApiError::Validation(vec!["id must be a UUID".into()]))?;
    let store = state.products.clone();
    let affected = tokio::task::spawn_blocking(move || store.soft_delete(&id)).await??;
    if affected == 0 {
        return Err(ApiError::NotFound("Product not found".into()));
    }
    info!(%id, "Product soft deleted");
    Ok(Json(json!({ "message": "Product soft deleted successfully" })))
}
