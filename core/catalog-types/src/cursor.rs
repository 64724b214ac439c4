use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The continuation token most recently issued by the content source.
///
/// The token is opaque: it is the full locator of the next sync request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCursor {
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyncCursor {
    /// Creates a fresh cursor stamped with the current time.
    pub fn new(token: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            token: token.into(),
            created_at: now,
            updated_at: now,
        }
    }
}
