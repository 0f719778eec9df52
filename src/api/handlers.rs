//! HTTP request handlers

use super::types::{ChatReply, ErrorResponse, VersionResponse};
use super::AppState;
use crate::relay::RelayError;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;

/// Largest accepted `/chat` body, matching the gateway payload ceiling
pub const MAX_CHAT_BODY_BYTES: usize = 6 * 1024 * 1024;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/chat",
            post(chat).layer(DefaultBodyLimit::max(MAX_CHAT_BODY_BYTES)),
        )
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Chat
// ============================================================

/// Answer one chat message.
///
/// The body is taken raw so that unparseable or oversized input becomes a
/// JSON 500 rather than an extractor's plain-text rejection.
async fn chat(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::error!(
                status = %rejection.status(),
                error = %rejection.body_text(),
                "Failed to read chat request body"
            );
            return AppError::Internal.into_response();
        }
    };

    let relay = state.relay.clone();
    let result = AssertUnwindSafe(async move { relay.handle_body(&body).await })
        .catch_unwind()
        .await;

    match result {
        Ok(Ok(answer)) => with_cors(
            StatusCode::OK,
            Json(ChatReply {
                response: answer.response,
                session_id: answer.session_id,
                timestamp: answer.timestamp,
            }),
        ),
        Ok(Err(RelayError::Validation(msg))) => {
            tracing::debug!(error = %msg, "Rejected chat request");
            AppError::BadRequest(msg).into_response()
        }
        Ok(Err(RelayError::Internal(msg))) => {
            tracing::error!(error = %msg, "Chat request failed");
            AppError::Internal.into_response()
        }
        Err(_) => {
            tracing::error!("Chat handler panicked");
            AppError::Internal.into_response()
        }
    }
}

// ============================================================
// Version
// ============================================================

async fn get_version(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        mode: state.relay.mode().to_string(),
    })
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        with_cors(status, Json(ErrorResponse::new(message)))
    }
}

/// Chat responses carry a permissive origin header whether or not the
/// request was a CORS request.
fn with_cors(status: StatusCode, body: impl IntoResponse) -> Response {
    (
        status,
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        body,
    )
        .into_response()
}
