//! Wire types of the Contentful sync and entries APIs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `sys.type` of a removed entry in a sync response.
pub const DELETED_ENTRY: &str = "DeletedEntry";

/// One page of a sync response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPage {
    #[serde(default)]
    pub items: Vec<Entry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_sync_url: Option<String>,
}

/// A listing of entries from the entries API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntriesPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub items: Vec<Entry>,
}

/// A content entry. Field values are keyed by locale in sync responses,
/// e.g. `{"sku": {"en-US": "A-1"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub sys: EntrySys,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Entry {
    /// Returns true for entries the source reports as removed.
    pub fn is_deleted(&self) -> bool {
        self.sys.kind == DELETED_ENTRY
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySys {
    pub id: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_kind() -> String {
    "Entry".to_string()
}

/// A unit of import work: one entry, named after its id.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportJob {
    pub name: String,
    pub entry: Entry,
}

impl ImportJob {
    pub fn new(entry: Entry) -> Self {
        Self {
            name: entry.sys.id.clone(),
            entry,
        }
    }
}
