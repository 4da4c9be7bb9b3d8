//! Health endpoint: build info plus live stream accounting.
//!
//! Does not touch per-stream state; reads only the registry count.

use axum::{extract::State, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::SharedState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub version: String,
    pub uptime_seconds: i64,
    /// Streams currently registered and live.
    pub active_streams: usize,
    pub reply_mode: String,
    pub checked_at: DateTime<Utc>,
}

/// GET /health - service health
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let now = Utc::now();
    Json(HealthResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: (now - state.start_time).num_seconds(),
        active_streams: state.registry.active_count().await,
        reply_mode: state.reply_mode.as_str().to_string(),
        checked_at: now,
    })
}
