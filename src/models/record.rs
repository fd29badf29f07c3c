use serde::{Deserialize, Serialize};

/// Maximum number of links kept in the local history.
pub const HISTORY_CAP: usize = 20;

/// Locally cached representation of a created short link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLinkRecord {
    pub id: String,
    pub short_code: String,
    pub original_url: String,
    pub short_url: String,
    pub created_at: i64,
    #[serde(default)]
    pub visit_count: u64,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl ShortLinkRecord {
    pub fn new(
        short_code: String,
        original_url: String,
        short_url: String,
        created_at: i64,
        expires_at: Option<i64>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            short_code,
            original_url,
            short_url,
            created_at,
            visit_count: 0,
            expires_at,
        }
    }
}

/// Reconciliation state of one record. Cached is the initial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    Cached,
    Refreshing,
    Reconciled,
    StalePruned,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub records: Vec<ShortLinkRecord>,
    pub pruned: Vec<String>,
    pub failed: Vec<String>,
    pub message: Option<String>,
}
