//! HTTP router construction.
//!
//! The event stream is exposed at both `/` (modern profile) and `/sse`
//! (legacy profile) for compatibility with either client generation.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;
use crate::{api, sse};

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(sse::sse_handler))
        .route("/sse", get(sse::sse_handler))
        .route(
            "/messages",
            post(api::post_message).options(api::options_messages),
        )
        .route("/health", get(api::health))
        .with_state(state)
}
