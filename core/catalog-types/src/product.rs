//! Product records.
//!
//! A [`Product`] is a stored catalog row. Rows imported from an external
//! system carry a natural key (`integration`, `external_id`) which is what
//! upserts resolve conflicts on; the generated [`ProductId`] never leaves
//! the local store.

use crate::ids::ProductId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Integration name stamped on rows imported from Contentful.
pub const INTEGRATION_CONTENTFUL: &str = "contentful";

/// A product row as stored and served by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    /// Stock keeping unit, at most 50 characters.
    pub sku: String,
    pub name: String,
    pub brand: String,
    pub model: String,
    pub category: Option<String>,
    pub color: Option<String>,
    /// Price with two decimal places of precision.
    pub price: Option<f64>,
    /// ISO 4217 currency code.
    pub currency: Option<String>,
    pub stock: Option<i64>,
    pub external_id: Option<String>,
    pub integration: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the product is soft deleted.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Returns true if the product has been soft deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns the natural key, if the row came from an integration.
    #[must_use]
    pub fn natural_key(&self) -> Option<NaturalKey> {
        match (&self.integration, &self.external_id) {
            (Some(integration), Some(external_id)) => {
                Some(NaturalKey::new(integration.clone(), external_id.clone()))
            }
            _ => None,
        }
    }
}

/// A product without a local id, used for upserts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub brand: String,
    pub model: String,
    pub category: Option<String>,
    pub color: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub stock: Option<i64>,
    pub external_id: String,
    pub integration: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewProduct {
    /// Returns the natural key the upsert resolves conflicts on.
    #[must_use]
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey::new(self.integration.clone(), self.external_id.clone())
    }
}

/// `(integration, external_id)`: identifies a product across systems.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NaturalKey {
    pub integration: String,
    pub external_id: String,
}

impl NaturalKey {
    /// Creates a natural key.
    pub fn new(integration: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            integration: integration.into(),
            external_id: external_id.into(),
        }
    }
}

impl std::fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.integration, self.external_id)
    }
}
