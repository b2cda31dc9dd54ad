use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Connection control
        .route("/session/status", get(handlers::session_status))
        .route("/session/connect", post(handlers::connect))
        .route("/session/disconnect", post(handlers::disconnect))
        // Voice intents
        .route("/voice/message", post(handlers::send_message))
        .route("/voice/routine/today", post(handlers::routine_today))
        .route(
            "/voice/routine/register",
            post(handlers::register_routine_list),
        )
        .route(
            "/voice/prescription/register",
            post(handlers::register_prescription),
        )
        .route(
            "/voice/prescription/photo",
            post(handlers::upload_prescription_photo),
        )
        .route("/voice/pills/capture", post(handlers::capture_pills_photo))
        .route("/voice/pills/photo", post(handlers::upload_pills_photo))
        .route("/voice/medicines/search", post(handlers::search_medicines))
        // Artifact maintenance
        .route("/artifacts/sweep", post(handlers::sweep_artifacts))
        // Local UI shells call from a webview origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
