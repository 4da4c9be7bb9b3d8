//! Batch analysis endpoint: a finite coordinate array scored in one request.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use saccade_core::{analyze_batch, CalibrationBounds};
use serde::Deserialize;

use crate::state::SharedState;

/// Request body for POST /api/analyze.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub timestamp: f64,
    pub coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeQuery {
    /// Settings key; absent means the default calibration envelope.
    #[serde(default)]
    pub user_id: Option<String>,
    /// When present, computed results are forwarded to the settings
    /// collaborator for this session before responding.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// POST /api/analyze?user_id=<id>&session_id=<id> - score a coordinate batch
///
/// Every pair is scored against a fresh tracker with the request-level
/// timestamp; the response is the ordered array of score objects, one per
/// accepted pair.
pub async fn analyze_handler(
    State(state): State<SharedState>,
    Query(query): Query<AnalyzeQuery>,
    Json(req): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    let bounds = match &query.user_id {
        Some(user_id) => match state.settings.get_calibration(user_id) {
            Ok(bounds) => bounds,
            Err(e) => {
                tracing::error!("batch analysis refused: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": e.to_string() })),
                )
                    .into_response();
            }
        },
        None => CalibrationBounds::default(),
    };

    let results = analyze_batch(req.timestamp, &req.coordinates, &bounds);

    if let Some(session_id) = &query.session_id {
        if let Err(e) = state.settings.persist_results(session_id, &results) {
            tracing::error!("failed to persist batch for session {}: {}", session_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
        tracing::debug!(
            "persisted {} scores for session {}",
            results.len(),
            session_id
        );
    }

    (StatusCode::OK, Json(results)).into_response()
}
