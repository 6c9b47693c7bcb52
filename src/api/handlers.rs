//! HTTP request handlers

use super::types::{ErrorResponse, InboundMessageRequest, MessageResponse, ReplyPayload};
use super::AppState;
use crate::runtime::UserId;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Longest message text accepted from the gateway
const MAX_TEXT_CHARS: usize = 4096;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Inbound user messages
        .route("/api/messages", post(post_message))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Messages
// ============================================================

async fn post_message(
    State(state): State<AppState>,
    Json(req): Json<InboundMessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if req.text.chars().count() > MAX_TEXT_CHARS {
        return Err(AppError::BadRequest(format!(
            "Message text exceeds {MAX_TEXT_CHARS} characters"
        )));
    }

    let outgoing = state
        .dispatcher
        .dispatch(UserId(req.user_id), req.text)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(MessageResponse {
        replies: outgoing.into_iter().map(ReplyPayload::from).collect(),
    }))
}

async fn get_version() -> &'static str {
    concat!("incident-intake ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
