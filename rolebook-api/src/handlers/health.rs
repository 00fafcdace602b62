use axum::extract::State;
use axum::response::Json;
use serde_json::{Value, json};

use crate::server::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": state.backend,
        "metrics_enabled": state.metrics.is_enabled(),
    }))
}
