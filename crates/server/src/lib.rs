//! Saccade Server Library
//!
//! Exposes the transport, registry, and settings modules for in-process
//! testing.

pub mod analysis_api;
pub mod health;
pub mod registry;
pub mod settings;
pub mod state;
pub mod stream_api;

// Re-export key types for tests
pub use registry::{ConnectionEntry, ConnectionHandle, SessionRegistry, SharedTracker};
pub use settings::{MemorySettings, SettingsError, SettingsStore};
pub use state::{AppState, SharedState};
pub use stream_api::{
    InboundMessage, OutboundFrame, ReplyMode, IDLE_TIMEOUT, MAX_MISSED_PROBES, PROBE_PERIOD,
};

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

/// Build the service router over the given state.
///
/// Shared between the binary and in-process tests so both exercise the same
/// routes.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_handler))
        // Streaming API
        .route("/ws", get(stream_api::ws_stream_handler))
        // Batch API
        .route("/api/analyze", post(analysis_api::analyze_handler))
        .layer(cors)
        .with_state(state)
}

/// State wired with the in-memory settings store, for tests and the binary.
pub fn build_state(reply_mode: ReplyMode) -> SharedState {
    Arc::new(AppState::new(Arc::new(MemorySettings::new()), reply_mode))
}
