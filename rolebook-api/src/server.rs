use crate::handlers;
use crate::middleware::extract_identity;
use axum::Router as AxumRouter;
use axum::extract::{DefaultBodyLimit, State};
use axum::middleware;
use axum::routing::{get, post};
use rolebook_observability::PipelineMetrics;
use rolebook_store::{BookStore, RoleStore};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

/// Multipart forms are accepted up to this size (axum's default body
/// limit is far below what role-card uploads need).
const MAX_FORM_BYTES: usize = 100 * 1024 * 1024;

/// Shared state for the API.
#[derive(Clone)]
pub struct AppState {
    pub books: Arc<dyn BookStore>,
    pub roles: Arc<dyn RoleStore>,
    pub metrics: Arc<PipelineMetrics>,
    /// Which storage backend is live ("postgres" / "memory").
    pub backend: &'static str,
}

/// Build the API router: CRUD routes plus health and metrics, with
/// panic recovery and identity extraction layered in. The request-log
/// capture middleware is attached by the caller, outermost, so it also
/// observes recovered panics.
pub fn build_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        // Books
        .route(
            "/books",
            get(handlers::books::list_books).post(handlers::books::create_book),
        )
        .route(
            "/books/{id}",
            get(handlers::books::get_book)
                .put(handlers::books::update_book)
                .delete(handlers::books::delete_book),
        )
        // Roles
        .route(
            "/roles",
            get(handlers::roles::list_roles).post(handlers::roles::preview_role),
        )
        .route("/roles/create", post(handlers::roles::create_role))
        .route(
            "/roles/{id}",
            get(handlers::roles::get_role)
                .put(handlers::roles::update_role)
                .delete(handlers::roles::delete_role),
        )
        // Health & metrics
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(metrics_handler))
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn(extract_identity))
        .layer(DefaultBodyLimit::max(MAX_FORM_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Prometheus metrics endpoint handler.
async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.render()
}
