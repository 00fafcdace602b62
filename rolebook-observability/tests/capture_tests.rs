//! Integration tests for the capture middleware.
//!
//! Uses `tower::ServiceExt::oneshot` against a small router — no TCP,
//! every test gets a fresh queue and state.

use axum::body::{Body, to_bytes};
use axum::extract::Multipart;
use axum::http::{Method, Request, StatusCode, header};
use axum::routing::{get, post};
use axum::{Extension, Router, middleware};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower::ServiceExt; // .oneshot()
use tower_http::catch_panic::CatchPanicLayer;

use rolebook_core::config::RequestLogConfig;
use rolebook_observability::{
    LogQueue, PipelineMetrics, RequestId, RequestLogRecord, RequestLogState, capture_request,
};

// ── Helpers ───────────────────────────────────────────────────

fn test_state(
    config: &RequestLogConfig,
) -> (RequestLogState, mpsc::Receiver<RequestLogRecord>) {
    let metrics = Arc::new(PipelineMetrics::disabled());
    let (queue, rx) = LogQueue::bounded(config.queue_capacity, metrics);
    (RequestLogState::new(queue, config), rx)
}

async fn echo_upload(mut multipart: Multipart) -> String {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            let data = field.bytes().await.unwrap();
            return String::from_utf8_lossy(&data).into_owned();
        }
    }
    "no file".into()
}

async fn whoami(Extension(id): Extension<RequestId>) -> String {
    id.0
}

async fn ping() -> &'static str {
    "pong"
}

async fn boom() -> &'static str {
    panic!("kaboom")
}

fn app(state: RequestLogState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/upload", post(echo_upload))
        .route("/whoami", get(whoami))
        .route("/boom", get(boom))
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn_with_state(state, capture_request))
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::USER_AGENT, "capture-tests")
        .body(Body::empty())
        .unwrap()
}

fn multipart_req(uri: &str, file_content: &[u8]) -> Request<Body> {
    let boundary = "X-CAPTURE-TEST-BOUNDARY";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"card.json\"\r\nContent-Type: application/json\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file_content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header(header::CONTENT_LENGTH, body.len().to_string())
        .body(Body::from(body))
        .unwrap()
}

async fn next_record(rx: &mut mpsc::Receiver<RequestLogRecord>) -> RequestLogRecord {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a record")
        .expect("queue closed before a record arrived")
}

// ── Core fields ───────────────────────────────────────────────

#[tokio::test]
async fn every_request_produces_exactly_one_record() {
    let (state, mut rx) = test_state(&RequestLogConfig::default());
    let app = app(state);

    let resp = app.clone().oneshot(get_req("/ping?tab=all")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let rec = next_record(&mut rx).await;
    assert_eq!(rec.method, "GET");
    assert_eq!(rec.path, "/ping");
    assert_eq!(rec.query_string, "tab=all");
    assert_eq!(rec.status_code, 200);
    assert_eq!(rec.user_agent, "capture-tests");
    assert!(rec.request_time >= 0.0);
    assert!(!rec.request_id.is_empty());
    assert!(rec.file_name.is_none());
    assert!(rec.file_size.is_none());
    assert!(rec.file_content_json.is_none());

    // No second record for the single request.
    drop(app);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn request_id_is_available_to_handlers() {
    let (state, mut rx) = test_state(&RequestLogConfig::default());
    let app = app(state);

    let resp = app.oneshot(get_req("/whoami")).await.unwrap();
    let body = to_bytes(resp.into_body(), 1024).await.unwrap();
    let id_seen_by_handler = String::from_utf8_lossy(&body).into_owned();

    let rec = next_record(&mut rx).await;
    assert_eq!(rec.request_id, id_seen_by_handler);
}

#[tokio::test]
async fn correlation_ids_are_unique_across_concurrent_requests() {
    let (state, mut rx) = test_state(&RequestLogConfig::default());
    let app = app(state);

    let mut handles = Vec::new();
    for _ in 0..100 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            app.oneshot(get_req("/ping")).await.unwrap()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().status(), StatusCode::OK);
    }

    let mut ids = HashSet::new();
    for _ in 0..100 {
        ids.insert(next_record(&mut rx).await.request_id);
    }
    assert_eq!(ids.len(), 100);
}

#[tokio::test]
async fn forwarded_for_header_wins_for_remote_ip() {
    let (state, mut rx) = test_state(&RequestLogConfig::default());
    let app = app(state);

    let req = Request::builder()
        .method(Method::GET)
        .uri("/ping")
        .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
        .body(Body::empty())
        .unwrap();
    app.oneshot(req).await.unwrap();

    let rec = next_record(&mut rx).await;
    assert_eq!(rec.remote_ip, "203.0.113.9");
}

// ── Panic recovery ────────────────────────────────────────────

#[tokio::test]
async fn panicking_handler_is_still_logged_with_500() {
    let (state, mut rx) = test_state(&RequestLogConfig::default());
    let app = app(state);

    let resp = app.oneshot(get_req("/boom")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let rec = next_record(&mut rx).await;
    assert_eq!(rec.path, "/boom");
    assert_eq!(rec.status_code, 500);
}

// ── File capture ──────────────────────────────────────────────

#[tokio::test]
async fn valid_json_upload_is_kept_verbatim() {
    let (state, mut rx) = test_state(&RequestLogConfig::default());
    let app = app(state);

    let resp = app.oneshot(multipart_req("/upload", br#"{"a":1}"#)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let rec = next_record(&mut rx).await;
    assert_eq!(rec.file_name.as_deref(), Some("card.json"));
    assert_eq!(rec.file_size, Some(7));
    assert_eq!(rec.file_content_json, Some(serde_json::json!({"a": 1})));
}

#[tokio::test]
async fn invalid_json_upload_is_wrapped_with_error() {
    let (state, mut rx) = test_state(&RequestLogConfig::default());
    let app = app(state);

    app.oneshot(multipart_req("/upload", b"hello")).await.unwrap();

    let rec = next_record(&mut rx).await;
    assert_eq!(rec.file_size, Some(5));
    assert_eq!(
        rec.file_content_json,
        Some(serde_json::json!({"error": "file content is not valid JSON: hello"}))
    );
}

#[tokio::test]
async fn oversized_file_gets_the_sentinel_not_its_bytes() {
    let config = RequestLogConfig {
        max_file_bytes: 16,
        ..Default::default()
    };
    let (state, mut rx) = test_state(&config);
    let app = app(state);

    let big = vec![b'z'; 64];
    app.oneshot(multipart_req("/upload", &big)).await.unwrap();

    let rec = next_record(&mut rx).await;
    assert_eq!(rec.file_size, Some(64));
    let content = rec.file_content_json.unwrap();
    let msg = content["error"].as_str().unwrap();
    assert!(msg.contains("file too large, skip content"));
    assert!(!msg.contains("zzz"));
}

#[tokio::test]
async fn downstream_handler_sees_the_buffered_body() {
    let (state, mut rx) = test_state(&RequestLogConfig::default());
    let app = app(state);

    let resp = app
        .oneshot(multipart_req("/upload", br#"{"intact": true}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = to_bytes(resp.into_body(), 1024).await.unwrap();
    assert_eq!(&body[..], br#"{"intact": true}"#);

    // The capture happened as well.
    let rec = next_record(&mut rx).await;
    assert_eq!(rec.file_content_json, Some(serde_json::json!({"intact": true})));
}

#[tokio::test]
async fn body_over_form_ceiling_passes_through_uncaptured() {
    let config = RequestLogConfig {
        max_form_bytes: 64,
        ..Default::default()
    };
    let (state, mut rx) = test_state(&config);
    let app = app(state);

    // Body declared larger than the ceiling: no buffering, no capture,
    // request untouched on its way to the handler.
    let big = vec![b'y'; 512];
    let resp = app.oneshot(multipart_req("/upload", &big)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let rec = next_record(&mut rx).await;
    assert!(rec.file_name.is_none());
    assert!(rec.file_content_json.is_none());
}
