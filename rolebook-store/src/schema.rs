//! Primary-database schema.
//!
//! Executed at startup; every statement is idempotent so repeated boots
//! are safe. The `request_logs` table lives in the secondary database
//! and is owned by the observability crate's sink.

use sqlx::PgPool;

use crate::error::StorageResult;

const CREATE_BOOKS: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    id          BIGSERIAL PRIMARY KEY,
    title       VARCHAR(255) NOT NULL,
    author      VARCHAR(100) NOT NULL,
    price       DOUBLE PRECISION NOT NULL DEFAULT 0,
    description TEXT NOT NULL DEFAULT '',
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at  TIMESTAMPTZ
)
"#;

const CREATE_ROLES: &str = r#"
CREATE TABLE IF NOT EXISTS roles (
    id          BIGSERIAL PRIMARY KEY,
    name        VARCHAR(255) NOT NULL,
    wx_user_id  VARCHAR(255) NOT NULL,
    avatar_url  VARCHAR(255) NOT NULL DEFAULT '',
    description VARCHAR(255) NOT NULL DEFAULT '',
    role_data   JSONB NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at  TIMESTAMPTZ
)
"#;

const CREATE_ROLES_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_roles_wx_user_id ON roles (wx_user_id)";

/// Create the books/roles tables when missing.
pub async fn migrate(pool: &PgPool) -> StorageResult<()> {
    sqlx::query(CREATE_BOOKS).execute(pool).await?;
    sqlx::query(CREATE_ROLES).execute(pool).await?;
    sqlx::query(CREATE_ROLES_USER_INDEX).execute(pool).await?;
    Ok(())
}
