use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalogue entry, one row of the `books` table.
///
/// Deletion is soft: rows with a `deleted_at` are kept but invisible to
/// every read path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Book {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
