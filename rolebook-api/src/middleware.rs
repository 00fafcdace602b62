use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use rolebook_core::identity::{RequestIdentity, WX_APP_ID, WX_ENV, WX_OPEN_ID, WX_UNION_ID};

fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Copy the WX identity headers into a request-scoped extension.
pub async fn extract_identity(mut request: Request, next: Next) -> Response {
    let headers = request.headers();
    let identity = RequestIdentity {
        user_id: header_value(headers, WX_OPEN_ID),
        app_id: header_value(headers, WX_APP_ID),
        union_id: header_value(headers, WX_UNION_ID),
        env: header_value(headers, WX_ENV),
    };
    request.extensions_mut().insert(identity);
    next.run(request).await
}
