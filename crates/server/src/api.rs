//! Message-post, health, and CORS preflight handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::state::AppState;

fn cors_headers() -> [(HeaderName, &'static str); 3] {
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
    ]
}

#[derive(Debug, Deserialize)]
pub struct MessageParams {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// `POST /messages?session_id=`: hand the body to the RPC dispatcher.
///
/// The dispatcher's response (if any) goes back over the session's event
/// stream, not this HTTP response, which is always a bare 202.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MessageParams>,
    body: String,
) -> Response {
    let Some(session_id) = params.session_id else {
        return (
            StatusCode::BAD_REQUEST,
            cors_headers(),
            Json(json!({"error": "Missing session_id"})),
        )
            .into_response();
    };

    let raw: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                cors_headers(),
                Json(json!({"error": e.to_string()})),
            )
                .into_response();
        }
    };

    if let Some(response) = state.dispatcher.handle_message(raw, &session_id).await {
        // Single-line payload; the SSE framing forbids embedded newlines.
        let payload = serde_json::to_string(&response).unwrap_or_default();
        state.sse.send_to(&session_id, "message", payload).await;
    }

    (
        StatusCode::ACCEPTED,
        cors_headers(),
        Json(json!({"status": "accepted"})),
    )
        .into_response()
}

/// `OPTIONS /messages`: CORS preflight.
pub async fn options_messages() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, cors_headers())
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
