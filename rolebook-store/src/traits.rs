//! Storage trait seams.
//!
//! Handlers depend on these traits, never on a concrete backend; the
//! PostgreSQL implementation serves production and the in-memory one
//! serves tests.

use async_trait::async_trait;
use rolebook_core::book::Book;
use rolebook_core::role::Role;

use crate::error::StorageResult;

/// Pagination window. `page` is 1-based.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Page {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, page_size: 10 }
    }
}

/// Fields for a new book row.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub price: f64,
    pub description: String,
}

/// Partial book update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
}

/// Fields for a new role row.
#[derive(Debug, Clone)]
pub struct NewRole {
    pub name: String,
    pub wx_user_id: String,
    pub avatar_url: String,
    pub description: String,
    pub role_data: serde_json::Value,
}

/// Role update. Ownership is checked against `wx_user_id`.
#[derive(Debug, Clone)]
pub struct RoleUpdate {
    pub name: String,
    pub wx_user_id: String,
    pub avatar_url: String,
    pub description: String,
    pub role_data: serde_json::Value,
}

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn create_book(&self, book: NewBook) -> StorageResult<Book>;

    /// Fetch a live (not soft-deleted) book by id.
    async fn get_book(&self, id: i64) -> StorageResult<Book>;

    /// Page of live books plus the total live count.
    async fn list_books(&self, page: Page) -> StorageResult<(Vec<Book>, i64)>;

    /// Apply a partial update; errors with `NotFound` when the row is
    /// missing or soft-deleted.
    async fn update_book(&self, id: i64, update: BookUpdate) -> StorageResult<()>;

    /// Soft-delete. Deleting an absent row is a no-op (idempotent).
    async fn delete_book(&self, id: i64) -> StorageResult<()>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn create_role(&self, role: NewRole) -> StorageResult<Role>;

    /// Fetch a live role; `PermissionDenied` when `user_id` is not the owner.
    async fn get_role(&self, id: i64, user_id: &str) -> StorageResult<Role>;

    /// Page of the caller's live roles plus their total count.
    async fn list_roles(&self, user_id: &str, page: Page) -> StorageResult<(Vec<Role>, i64)>;

    /// Replace the role's fields; ownership enforced.
    async fn update_role(&self, id: i64, update: RoleUpdate) -> StorageResult<()>;

    /// Soft-delete. Idempotent like [`BookStore::delete_book`].
    async fn delete_role(&self, id: i64) -> StorageResult<()>;
}
