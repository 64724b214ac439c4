//! Contentful content source.
//!
//! Uses the Content Delivery API sync endpoint:
//!
//! - initial: `GET {base}/spaces/{space}/sync?initial=true&content_type=..&type=Entry`
//! - continue: `GET {token}` where the token is a `nextPageUrl` or `nextSyncUrl`
//!
//! Every request carries the delivery token as the `access_token` query
//! parameter.

use crate::entry::{EntriesPage, SyncPage};
use crate::error::{SyncError, SyncResult};
use crate::traits::ContentSource;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Contentful connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentfulConfig {
    /// Base URL of the delivery API (e.g. `https://cdn.contentful.com`).
    pub base_url: String,
    pub space_id: String,
    pub environment: String,
    /// Content Delivery API token.
    pub access_token: String,
    /// Content type id of product entries.
    pub content_type: String,
    /// Locale whose field values are imported.
    pub locale: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ContentfulConfig {
    fn default() -> Self {
        Self {
            base_url: "https://cdn.contentful.com".to_string(),
            space_id: String::new(),
            environment: "master".to_string(),
            access_token: String::new(),
            content_type: "product".to_string(),
            locale: "en-US".to_string(),
            timeout_secs: 30,
        }
    }
}

/// HTTP client for the Contentful sync and entries APIs.
pub struct ContentfulClient {
    config: ContentfulConfig,
    base: Url,
    client: Client,
}

impl ContentfulClient {
    /// Creates a client. Fails if the base URL does not parse.
    pub fn new(config: ContentfulConfig) -> SyncResult<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| SyncError::Protocol(format!("invalid base url {:?}: {e}", config.base_url)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            config,
            base,
            client,
        })
    }

    pub fn config(&self) -> &ContentfulConfig {
        &self.config
    }

    /// Lists product entries through the entries API.
    pub async fn list_entries(&self) -> SyncResult<EntriesPage> {
        let url = self.endpoint(&format!(
            "spaces/{}/environments/{}/entries",
            self.config.space_id, self.config.environment
        ))?;
        self.get_json(
            url,
            &[
                ("access_token", self.config.access_token.as_str()),
                ("content_type", self.config.content_type.as_str()),
            ],
        )
        .await
    }

    /// Resolves a path against the base URL, keeping any base path prefix.
    fn endpoint(&self, path: &str) -> SyncResult<Url> {
        let base = self.base.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|e| SyncError::Protocol(format!("invalid endpoint {path:?}: {e}")))
    }

    /// Sync tokens are absolute URLs; a relative one is resolved against
    /// the base URL.
    fn locate(&self, token: &str) -> SyncResult<Url> {
        match Url::parse(token) {
            Ok(url) => Ok(url),
            Err(_) => self
                .base
                .join(token)
                .map_err(|e| SyncError::Protocol(format!("invalid sync token {token:?}: {e}"))),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, &str)]) -> SyncResult<T> {
        debug!(path = url.path(), "GET");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SyncError::Timeout
                } else {
                    SyncError::Network(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SyncError::Protocol(format!("failed to parse response: {e}")))
    }
}

#[async_trait]
impl ContentSource for ContentfulClient {
    async fn initial_sync(&self) -> SyncResult<SyncPage> {
        info!(content_type = %self.config.content_type, "Requesting initial sync");
        let url = self.endpoint(&format!("spaces/{}/sync", self.config.space_id))?;
        self.get_json(
            url,
            &[
                ("access_token", self.config.access_token.as_str()),
                ("initial", "true"),
                ("content_type", self.config.content_type.as_str()),
                ("type", "Entry"),
            ],
        )
        .await
    }

    async fn continue_sync(&self, token: &str) -> SyncResult<SyncPage> {
        let url = self.locate(token)?;
        self.get_json(url, &[("access_token", self.config.access_token.as_str())])
            .await
    }
}
