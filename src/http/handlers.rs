use super::state::AppState;
use crate::error::SessionError;
use crate::protocol::SessionResult;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
    pub server_action: Option<String>,
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct PhotoRequest {
    /// Base64-encoded image
    pub image_base64: String,
}

#[derive(Debug, Deserialize)]
pub struct RoutineListRequest {
    pub routines: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub success: bool,
    pub scanned: usize,
    pub removed: usize,
    pub retained: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Error mapping
// ============================================================================

fn status_for(err: &SessionError) -> StatusCode {
    match err {
        SessionError::Auth => StatusCode::UNAUTHORIZED,
        SessionError::Server { .. } => StatusCode::BAD_GATEWAY,
        SessionError::Disconnected | SessionError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
        SessionError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        SessionError::Decode(_) | SessionError::Io(_) | SessionError::Json(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn reply(result: Result<SessionResult, SessionError>) -> Response {
    match result {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            error!("Voice request failed: {}", e);
            error_response(status_for(&e), e.to_string())
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /session/status
pub async fn session_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.chat.status()))
}

/// POST /session/connect
pub async fn connect(State(state): State<AppState>) -> Response {
    match state.chat.connect().await {
        Ok(()) => (StatusCode::OK, Json(state.chat.status())).into_response(),
        Err(e) => {
            error!("Failed to connect: {}", e);
            error_response(status_for(&e), e.to_string())
        }
    }
}

/// POST /session/disconnect
pub async fn disconnect(State(state): State<AppState>) -> impl IntoResponse {
    info!("Disconnect requested over HTTP");
    state.chat.disconnect();
    (StatusCode::OK, Json(state.chat.status()))
}

/// POST /voice/message
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<MessageRequest>,
) -> Response {
    reply(
        state
            .chat
            .send_message(&req.message, req.server_action.as_deref(), req.data)
            .await,
    )
}

/// POST /voice/routine/today
pub async fn routine_today(State(state): State<AppState>) -> Response {
    reply(state.chat.routine_today().await)
}

/// POST /voice/prescription/register
pub async fn register_prescription(State(state): State<AppState>) -> Response {
    reply(state.chat.register_prescription().await)
}

/// POST /voice/prescription/photo
pub async fn upload_prescription_photo(
    State(state): State<AppState>,
    Json(req): Json<PhotoRequest>,
) -> Response {
    reply(state.chat.upload_prescription_photo(&req.image_base64).await)
}

/// POST /voice/routine/register
pub async fn register_routine_list(
    State(state): State<AppState>,
    Json(req): Json<RoutineListRequest>,
) -> Response {
    reply(state.chat.register_routine_list(req.routines).await)
}

/// POST /voice/pills/capture
pub async fn capture_pills_photo(State(state): State<AppState>) -> Response {
    reply(state.chat.capture_pills_photo().await)
}

/// POST /voice/pills/photo
pub async fn upload_pills_photo(
    State(state): State<AppState>,
    Json(req): Json<PhotoRequest>,
) -> Response {
    reply(state.chat.upload_pills_photo(&req.image_base64).await)
}

/// POST /voice/medicines/search
pub async fn search_medicines(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Response {
    reply(state.chat.search_medicines(&req.query).await)
}

/// POST /artifacts/sweep
/// Delete voice replies older than the retention window
pub async fn sweep_artifacts(State(state): State<AppState>) -> Response {
    match state.chat.sweep_artifacts().await {
        Ok(report) => (
            StatusCode::OK,
            Json(SweepResponse {
                success: true,
                scanned: report.scanned,
                removed: report.removed,
                retained: report.retained,
                failed: report.failed,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Artifact sweep failed: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
        }
    }
}
