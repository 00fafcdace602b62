//! Persistence targets for the batch writer.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use rolebook_core::config::LogDatabaseConfig;

use crate::record::RequestLogRecord;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("log database connection error: {message}")]
    Connection { message: String },

    #[error("log database query error: {message}")]
    Query { message: String },
}

/// Where flushed batches go. Exactly one writer loop owns the handle.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Persist the batch as a single multi-row insert.
    async fn insert_batch(&self, batch: &[RequestLogRecord]) -> Result<(), SinkError>;
}

// ── PostgreSQL ───────────────────────────────────────────────────────────────

const CREATE_REQUEST_LOGS: &str = r#"
CREATE TABLE IF NOT EXISTS request_logs (
    id                BIGSERIAL PRIMARY KEY,
    request_id        VARCHAR(64) NOT NULL,
    method            VARCHAR(10) NOT NULL,
    path              VARCHAR(255) NOT NULL,
    query_string      TEXT NOT NULL DEFAULT '',
    status_code       INT NOT NULL,
    remote_ip         VARCHAR(45) NOT NULL DEFAULT '',
    user_agent        TEXT NOT NULL DEFAULT '',
    request_time      DOUBLE PRECISION NOT NULL,
    created_at        TIMESTAMPTZ NOT NULL DEFAULT now(),
    file_name         VARCHAR(255),
    file_size         BIGINT,
    file_content_json JSONB
)
"#;

const CREATE_REQUEST_ID_INDEX: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_request_logs_request_id ON request_logs (request_id)";

const CREATE_CREATED_AT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_request_logs_created_at ON request_logs (created_at)";

/// Writes batches into the `request_logs` table of the log database.
pub struct PgLogSink {
    pool: PgPool,
}

impl PgLogSink {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open the log-database pool and create the table when missing.
    pub async fn connect(config: &LogDatabaseConfig) -> Result<Self, SinkError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| SinkError::Connection { message: e.to_string() })?;

        let sink = Self { pool };
        sink.migrate().await?;
        debug!("log database ready");
        Ok(sink)
    }

    async fn migrate(&self) -> Result<(), SinkError> {
        for statement in [CREATE_REQUEST_LOGS, CREATE_REQUEST_ID_INDEX, CREATE_CREATED_AT_INDEX] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| SinkError::Query { message: e.to_string() })?;
        }
        Ok(())
    }
}

#[async_trait]
impl LogSink for PgLogSink {
    async fn insert_batch(&self, batch: &[RequestLogRecord]) -> Result<(), SinkError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO request_logs \
             (request_id, method, path, query_string, status_code, remote_ip, \
              user_agent, request_time, created_at, file_name, file_size, file_content_json) ",
        );
        builder.push_values(batch, |mut row, rec| {
            row.push_bind(&rec.request_id)
                .push_bind(&rec.method)
                .push_bind(&rec.path)
                .push_bind(&rec.query_string)
                .push_bind(i32::from(rec.status_code))
                .push_bind(&rec.remote_ip)
                .push_bind(&rec.user_agent)
                .push_bind(rec.request_time)
                .push_bind(rec.created_at)
                .push_bind(rec.file_name.as_deref())
                .push_bind(rec.file_size)
                .push_bind(rec.file_content_json.as_ref());
        });

        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| SinkError::Query { message: e.to_string() })?;
        Ok(())
    }
}

// ── In-memory (tests) ────────────────────────────────────────────────────────

/// Test sink recording every flushed batch.
#[derive(Default)]
pub struct MemoryLogSink {
    batches: Mutex<Vec<Vec<RequestLogRecord>>>,
    fail_next: AtomicBool,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `insert_batch` fail once.
    pub fn fail_next_flush(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Every flushed batch, in flush order.
    pub fn batches(&self) -> Vec<Vec<RequestLogRecord>> {
        self.batches.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn total_rows(&self) -> usize {
        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(Vec::len)
            .sum()
    }
}

#[async_trait]
impl LogSink for MemoryLogSink {
    async fn insert_batch(&self, batch: &[RequestLogRecord]) -> Result<(), SinkError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(SinkError::Query { message: "injected failure".into() });
        }
        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(batch.to_vec());
        Ok(())
    }
}
