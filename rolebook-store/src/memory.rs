//! In-memory store used by tests and local development.
//!
//! Mirrors the PostgreSQL semantics exactly: soft deletes, 1-based
//! pagination, ownership checks on roles.

use async_trait::async_trait;
use chrono::Utc;
use rolebook_core::book::Book;
use rolebook_core::role::Role;
use std::sync::Mutex;

use crate::error::{StorageError, StorageResult};
use crate::traits::{BookStore, BookUpdate, NewBook, NewRole, Page, RoleStore, RoleUpdate};

#[derive(Default)]
struct Inner {
    books: Vec<Book>,
    roles: Vec<Role>,
    next_book_id: i64,
    next_role_id: i64,
}

/// Mutex-guarded store; every operation takes the lock briefly.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only happens when a test thread panicked while
        // holding it; recovering the data is still sound here.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn create_book(&self, book: NewBook) -> StorageResult<Book> {
        let mut inner = self.lock();
        inner.next_book_id += 1;
        let now = Utc::now();
        let created = Book {
            id: inner.next_book_id,
            title: book.title,
            author: book.author,
            price: book.price,
            description: book.description,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        inner.books.push(created.clone());
        Ok(created)
    }

    async fn get_book(&self, id: i64) -> StorageResult<Book> {
        let inner = self.lock();
        inner
            .books
            .iter()
            .find(|b| b.id == id && !b.is_deleted())
            .cloned()
            .ok_or_else(|| StorageError::not_found("book", id))
    }

    async fn list_books(&self, page: Page) -> StorageResult<(Vec<Book>, i64)> {
        let inner = self.lock();
        let live: Vec<&Book> = inner.books.iter().filter(|b| !b.is_deleted()).collect();
        let total = live.len() as i64;
        let items = live
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect();
        Ok((items, total))
    }

    async fn update_book(&self, id: i64, update: BookUpdate) -> StorageResult<()> {
        let mut inner = self.lock();
        let book = inner
            .books
            .iter_mut()
            .find(|b| b.id == id && !b.is_deleted())
            .ok_or_else(|| StorageError::not_found("book", id))?;
        if let Some(title) = update.title {
            book.title = title;
        }
        if let Some(author) = update.author {
            book.author = author;
        }
        if let Some(price) = update.price {
            book.price = price;
        }
        if let Some(description) = update.description {
            book.description = description;
        }
        book.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_book(&self, id: i64) -> StorageResult<()> {
        let mut inner = self.lock();
        if let Some(book) = inner.books.iter_mut().find(|b| b.id == id && !b.is_deleted()) {
            book.deleted_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn create_role(&self, role: NewRole) -> StorageResult<Role> {
        let mut inner = self.lock();
        inner.next_role_id += 1;
        let now = Utc::now();
        let created = Role {
            id: inner.next_role_id,
            name: role.name,
            wx_user_id: role.wx_user_id,
            avatar_url: role.avatar_url,
            description: role.description,
            role_data: role.role_data,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        inner.roles.push(created.clone());
        Ok(created)
    }

    async fn get_role(&self, id: i64, user_id: &str) -> StorageResult<Role> {
        let inner = self.lock();
        let role = inner
            .roles
            .iter()
            .find(|r| r.id == id && !r.is_deleted())
            .ok_or_else(|| StorageError::not_found("role", id))?;
        if !role.owned_by(user_id) {
            return Err(StorageError::permission_denied("role", id));
        }
        Ok(role.clone())
    }

    async fn list_roles(&self, user_id: &str, page: Page) -> StorageResult<(Vec<Role>, i64)> {
        let inner = self.lock();
        let mine: Vec<&Role> = inner
            .roles
            .iter()
            .filter(|r| !r.is_deleted() && r.wx_user_id == user_id)
            .collect();
        let total = mine.len() as i64;
        let items = mine
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect();
        Ok((items, total))
    }

    async fn update_role(&self, id: i64, update: RoleUpdate) -> StorageResult<()> {
        let mut inner = self.lock();
        let role = inner
            .roles
            .iter_mut()
            .find(|r| r.id == id && !r.is_deleted())
            .ok_or_else(|| StorageError::not_found("role", id))?;
        if !role.owned_by(&update.wx_user_id) {
            return Err(StorageError::permission_denied("role", id));
        }
        role.name = update.name;
        role.avatar_url = update.avatar_url;
        role.description = update.description;
        role.role_data = update.role_data;
        role.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_role(&self, id: i64) -> StorageResult<()> {
        let mut inner = self.lock();
        if let Some(role) = inner.roles.iter_mut().find(|r| r.id == id && !r.is_deleted()) {
            role.deleted_at = Some(Utc::now());
        }
        Ok(())
    }
}
