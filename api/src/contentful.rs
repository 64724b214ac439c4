use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::extract::State;
use axum::Json;
use catalog_sync::EntriesPage;
use tracing::debug;

/// `GET /contentful/products`: the raw product entries as the entries API
/// returns them, without touching the local store.
pub(crate) async fn list_products(State(state): State<AppState>) -> ApiResult<Json<EntriesPage>> {
    let Some(client) = state.contentful.as_ref() else {
        return Err(ApiError::Unavailable("Contentful is not configured".into()));
    };
    let page = client.list_entries().await?;
    debug!(total = page.total, items = page.items.len(), "Listed Contentful entries");
    Ok(Json(page))
}
