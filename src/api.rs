//! HTTP binding for the transport boundary
//!
//! The chat transport POSTs each incoming event as JSON and delivers
//! whatever replies come back in the response body. Authorization and
//! every other business rule live in the engine; this layer only moves
//! events and replies.

use crate::db::Database;
use crate::engine::Engine;
use crate::transport::{Incoming, Outgoing};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine<Database>>,
}

impl AppState {
    pub fn new(engine: Engine<Database>) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/events", post(handle_event))
        .route("/healthz", get(healthz))
        .route("/version", get(version))
        .with_state(state)
}

/// One incoming transport event in, the replies for that user out.
async fn handle_event(
    State(state): State<AppState>,
    Json(incoming): Json<Incoming>,
) -> Json<Vec<Outgoing>> {
    Json(state.engine.handle(incoming).await)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
