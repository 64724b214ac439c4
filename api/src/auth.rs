//! Bearer-token authentication.
//!
//! API keys are HS256 JWTs signed with the service secret. A key must carry
//! `sub` and `username`; `exp` is enforced when present.

use crate::error::ApiError;
use crate::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

/// Subject and username written into generated API keys.
pub const API_KEY_SUBJECT: &str = "api-user";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Verifies bearer tokens against the configured secret.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = true;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            debug!("Rejected bearer token: {e}");
            unauthorized()
        })?;
        let claims = data.claims;
        if claims.sub.is_empty() || claims.username.is_empty() {
            return Err(ApiError::Unauthorized("Invalid token".into()));
        }
        Ok(claims)
    }
}

/// The caller behind a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiUser {
    pub user_id: String,
    pub username: String,
}

impl FromRequestParts<AppState> for ApiUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(unauthorized)?;
        let claims = state.verifier.verify(token)?;
        Ok(Self {
            user_id: claims.sub,
            username: claims.username,
        })
    }
}

fn unauthorized() -> ApiError {
    ApiError::Unauthorized("Unauthorized".into())
}

/// Signs a new API key valid for `expires_in`.
pub fn generate_api_key(secret: &str, expires_in: Duration) -> jsonwebtoken::errors::Result<String> {
    let now = Utc::now().timestamp();
    let lifetime = i64::try_from(expires_in.as_secs()).unwrap_or(i64::MAX);
    let claims = Claims {
        sub: API_KEY_SUBJECT.into(),
        username: API_KEY_SUBJECT.into(),
        kind: Some("api-key".into()),
        iat: Some(now),
        exp: Some(now.saturating_add(lifetime)),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// A fresh 64-byte secret, hex encoded.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Parses a key lifetime such as `3600`, `90s`, `15m`, `12h`, `30d`, `2w`
/// or `1y`. A bare number is seconds.
pub fn parse_expires_in(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let split = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
    let (amount, unit) = raw.split_at(split);
    let amount: u64 = amount.parse().ok()?;
    let unit_secs = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        "w" => 7 * 24 * 60 * 60,
        "y" => 365 * 24 * 60 * 60 + 6 * 60 * 60,
        _ => return None,
    };
    amount.checked_mul(unit_secs).map(Duration::from_secs)
}
