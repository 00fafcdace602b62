//! Per-request capture middleware.
//!
//! Wraps the whole handler chain: stamps a correlation id, optionally
//! captures an uploaded file body, times the request, and hands the
//! finished record to the enrichment task. Nothing here can change the
//! response — capture failures leave fields empty.

use axum::body::{Body, to_bytes};
use axum::extract::connect_info::ConnectInfo;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use bytes::Bytes;
use chrono::Utc;
use http::header;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::debug;
use uuid::Uuid;

use rolebook_core::config::RequestLogConfig;

use crate::enrich;
use crate::queue::LogQueue;
use crate::record::RequestLogRecord;

/// Recorded in place of file content that was never read.
pub const FILE_TOO_LARGE_SENTINEL: &str = "file too large, skip content";

/// The multipart field the pipeline captures.
const FILE_FIELD: &str = "file";

/// Correlation identifier, available to handlers via request extensions.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Producer-side pipeline handle, cloned into every request.
#[derive(Clone)]
pub struct RequestLogState {
    queue: LogQueue,
    enrich_slots: Arc<Semaphore>,
    max_form_bytes: usize,
    max_file_bytes: usize,
}

impl RequestLogState {
    pub fn new(queue: LogQueue, config: &RequestLogConfig) -> Self {
        Self {
            queue,
            enrich_slots: Arc::new(Semaphore::new(config.enrich_concurrency)),
            max_form_bytes: config.max_form_bytes,
            max_file_bytes: config.max_file_bytes,
        }
    }
}

struct CapturedUpload {
    file_name: Option<String>,
    file_size: i64,
    bytes: Bytes,
}

/// Middleware wrapping every route. Install with
/// `axum::middleware::from_fn_with_state` as the outermost layer so
/// panics recovered further in still produce a record.
pub async fn capture_request(
    State(state): State<RequestLogState>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let request_id = Uuid::new_v4().to_string();

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let query_string = request.uri().query().unwrap_or_default().to_string();
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let remote_ip = client_ip(&request);

    let mut request = request;
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut upload = None;
    if is_multipart(&request) {
        (request, upload) = capture_upload(request, &state).await;
    }

    let response = next.run(request).await;
    let status_code = response.status().as_u16();
    let request_time = started.elapsed().as_secs_f64();

    let record = RequestLogRecord {
        request_id: request_id.clone(),
        method,
        path,
        query_string,
        status_code,
        remote_ip,
        user_agent,
        request_time,
        created_at: Utc::now(),
        file_name: upload.as_ref().and_then(|u| u.file_name.clone()),
        file_size: upload.as_ref().map(|u| u.file_size),
        file_content_json: None,
    };

    debug!(
        request_id = %request_id,
        status = status_code,
        elapsed_secs = request_time,
        "request captured"
    );

    enrich::spawn_enrichment(
        state.queue.clone(),
        Arc::clone(&state.enrich_slots),
        record,
        upload.map(|u| u.bytes),
    );

    response
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

/// Client address: first `X-Forwarded-For` hop, else the socket peer.
fn client_ip(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_default()
}

/// Buffer a multipart body, capture the `file` field, and restore the
/// body so downstream extractors see the request unchanged.
///
/// Bodies with no declared length, or declared larger than the form
/// ceiling, pass through untouched — capture is bounded, traffic is not.
async fn capture_upload(
    request: Request,
    state: &RequestLogState,
) -> (Request, Option<CapturedUpload>) {
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    match declared {
        Some(len) if len <= state.max_form_bytes => {}
        _ => return (request, None),
    }

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, state.max_form_bytes).await {
        Ok(bytes) => bytes,
        // The body is gone; the handler gets an empty one and fails its
        // own parse. Capture fields stay empty.
        Err(_) => return (Request::from_parts(parts, Body::empty()), None),
    };

    let content_type = parts.headers.get(header::CONTENT_TYPE).cloned();
    let upload = read_file_field(content_type, bytes.clone(), state.max_file_bytes).await;

    (Request::from_parts(parts, Body::from(bytes)), upload)
}

async fn read_file_field(
    content_type: Option<header::HeaderValue>,
    bytes: Bytes,
    max_file_bytes: usize,
) -> Option<CapturedUpload> {
    let content_type = content_type?;
    let scratch = Request::builder()
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(bytes))
        .ok()?;
    let mut multipart = Multipart::from_request(scratch, &()).await.ok()?;

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_owned);
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                return Some(CapturedUpload {
                    file_name,
                    file_size: 0,
                    bytes: Bytes::from(format!("read file error: {e}")),
                });
            }
        };
        let file_size = data.len() as i64;
        let bytes = if !data.is_empty() && data.len() <= max_file_bytes {
            data
        } else {
            Bytes::from_static(FILE_TOO_LARGE_SENTINEL.as_bytes())
        };
        return Some(CapturedUpload { file_name, file_size, bytes });
    }
    None
}
