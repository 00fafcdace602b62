//! Off-path enrichment of captured file bodies.
//!
//! Runs per request as a spawned task, decoupled from the request's own
//! execution: the response is long gone by the time this work happens.

use bytes::Bytes;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::queue::LogQueue;
use crate::record::RequestLogRecord;

/// At most this many characters of a non-JSON upload survive into the
/// wrapped error payload.
pub const ERROR_PREVIEW_CHARS: usize = 10_000;

/// Validate or wrap captured file bytes.
///
/// Well-formed JSON is kept as the parsed value; anything else becomes
/// `{"error": "file content is not valid JSON: <prefix>"}` with the
/// prefix bounded at [`ERROR_PREVIEW_CHARS`] characters so a huge
/// non-JSON upload cannot blow up the log row.
pub fn enrich_file_content(raw: &[u8]) -> serde_json::Value {
    match serde_json::from_slice::<serde_json::Value>(raw) {
        Ok(value) => value,
        Err(_) => {
            let text = String::from_utf8_lossy(raw);
            let preview: String = text.chars().take(ERROR_PREVIEW_CHARS).collect();
            json!({ "error": format!("file content is not valid JSON: {preview}") })
        }
    }
}

/// Finish the record off the request path and hand it to the queue.
///
/// Concurrency is bounded by `slots`: under a flood of uploads, tasks
/// wait on a permit instead of all decoding at once. Waiting happens
/// here, never in the capture middleware.
pub fn spawn_enrichment(
    queue: LogQueue,
    slots: Arc<Semaphore>,
    mut record: RequestLogRecord,
    raw: Option<Bytes>,
) {
    tokio::spawn(async move {
        let Some(raw) = raw else {
            queue.enqueue(record);
            return;
        };
        // Err only when the semaphore is closed, which never happens;
        // proceed unbounded rather than lose the record.
        let _permit = slots.acquire_owned().await.ok();
        record.file_content_json = Some(enrich_file_content(&raw));
        queue.enqueue(record);
    });
}
