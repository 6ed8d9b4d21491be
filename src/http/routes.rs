use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Uploads may far exceed the API's 25 MB limit; the pipeline compresses
/// them down, so the HTTP layer has to let them in first.
const MAX_REQUEST_BYTES: usize = 512 * 1024 * 1024;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Pipeline triggers
        .route("/transcriptions", post(handlers::transcribe_upload))
        .route("/recordings", post(handlers::transcribe_recording))
        // Session state queries and export
        .route(
            "/transcriptions/latest",
            get(handlers::latest_transcript),
        )
        .route(
            "/transcriptions/export",
            post(handlers::export_transcript),
        )
        // Request logging, plus CORS for a browser front-end
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .with_state(state)
}
