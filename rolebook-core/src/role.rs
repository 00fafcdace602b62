use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored role card, one row of the `roles` table.
///
/// `role_data` holds the full character-sheet document as JSON; the
/// surrounding columns are denormalized for listing without decoding it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    /// Owner — the WeChat open-id from the identity headers.
    pub wx_user_id: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub description: String,
    pub role_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Role {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether `user_id` may read or modify this role.
    pub fn owned_by(&self, user_id: &str) -> bool {
        self.wx_user_id == user_id
    }
}
