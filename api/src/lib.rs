//! HTTP API for the product catalog.
//!
//! - `GET /products`: filtered, paginated list of live products
//! - `DELETE /products/{id}`: soft delete
//! - `GET /reports/products`: deleted / live split with price coverage
//!   (bearer token required)
//! - `GET /contentful/products`: product entries straight from Contentful
//!
//! With a [`RateLimiter`] installed every route is throttled per client.

pub mod auth;
pub mod config;
mod contentful;
mod error;
mod products;
pub mod rate_limit;
mod reports;

pub use auth::{generate_api_key, ApiUser, TokenVerifier};
pub use error::{ApiError, ApiResult};
pub use products::{ListProductsResponse, PaginationInfo};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use reports::{GroupCounts, PriceReport, ProductGroupStats, ProductsReport};

use axum::routing::{delete, get};
use axum::{middleware, Router};
use catalog_filter::{FilterSchema, PaginationConfig};
use catalog_storage::ProductStore;
use catalog_sync::ContentfulClient;
use std::sync::Arc;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub products: Arc<ProductStore>,
    pub schema: Arc<FilterSchema>,
    pub pagination: PaginationConfig,
    pub verifier: Arc<TokenVerifier>,
    /// Source for `GET /contentful/products`; 503 when absent.
    pub contentful: Option<Arc<ContentfulClient>>,
    pub rate_limit: Option<Arc<RateLimiter>>,
}

impl AppState {
    /// State for the product schema with default pagination.
    pub fn new(products: Arc<ProductStore>, jwt_secret: &str) -> Self {
        Self {
            products,
            schema: Arc::new(FilterSchema::products()),
            pagination: PaginationConfig::default(),
            verifier: Arc::new(TokenVerifier::new(jwt_secret)),
            contentful: None,
            rate_limit: None,
        }
    }

    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn with_contentful(mut self, client: Arc<ContentfulClient>) -> Self {
        self.contentful = Some(client);
        self
    }

    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = Some(Arc::new(RateLimiter::new(config)));
        self
    }
}

/// Build the HTTP API router with the given state.
pub fn build_router(state: AppState) -> Router {
    let limiter = state.rate_limit.clone();
    let router = Router::new()
        .route("/products", get(products::list_products))
        .route("/products/{id}", delete(products::soft_delete_product))
        .route("/reports/products", get(reports::products_report))
        .route("/contentful/products", get(contentful::list_products))
        .with_state(state);

    match limiter {
        Some(limiter) => router.layer(middleware::from_fn_with_state(limiter, rate_limit::throttle)),
        None => router,
    }
}
