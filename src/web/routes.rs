//! Route definitions

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Web UI
        .route("/", get(handlers::index))
        .route("/search", get(handlers::search))
        .route("/about", get(handlers::about))
        // JSON API
        .route("/count", get(handlers::count))
        .route("/version", get(handlers::version))
        .route("/stats", get(handlers::stats))
        .route("/health", get(handlers::health))
        // Tool calls over HTTP
        .route("/tools", get(handlers::list_tools))
        .route("/tools/:name", post(handlers::call_tool))
        .route("/favicon.ico", get(handlers::favicon))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
