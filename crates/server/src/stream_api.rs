//! Real-Time Transport: one bidirectional WebSocket per client stream.
//!
//! Each connection owns its tracker exclusively; samples are processed in
//! arrival order with no fan-out. Liveness, inbound decoding, outbound
//! replies, and registry pushes all run in one `tokio::select!` loop, and
//! every exit path funnels into the same teardown.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use saccade_core::{CalibrationBounds, MotionScore, MotionTracker};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::registry::SharedTracker;
use crate::state::SharedState;

// ============================================================================
// Liveness policy
// ============================================================================

/// A peer that stays silent this long is gone.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Probe at 9/10 of the idle window so a healthy-but-quiet peer gets a
/// chance to prove liveness before the window closes.
pub const PROBE_PERIOD: Duration = Duration::from_secs(54);

/// Consecutive unanswered probes tolerated before the connection is cut.
pub const MAX_MISSED_PROBES: u32 = 3;

// ============================================================================
// Wire protocol
// ============================================================================

/// Inbound sample message. Both the single-pair and the batch-in-stream
/// forms are accepted on the same connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InboundMessage {
    Single { timestamp: f64, x: f64, y: f64 },
    Batch {
        timestamp: f64,
        coordinates: Vec<Vec<f64>>,
    },
}

impl InboundMessage {
    /// Flatten to (timestamp, accepted pairs), preserving order and
    /// skipping pairs that are not exactly [x, y].
    pub fn into_samples(self) -> (f64, Vec<(f64, f64)>) {
        match self {
            InboundMessage::Single { timestamp, x, y } => (timestamp, vec![(x, y)]),
            InboundMessage::Batch {
                timestamp,
                coordinates,
            } => {
                let pairs = coordinates
                    .into_iter()
                    .filter(|pair| pair.len() == 2)
                    .map(|pair| (pair[0], pair[1]))
                    .collect();
                (timestamp, pairs)
            }
        }
    }
}

/// Frame pushed to a connection's writer, either by its own read loop or by
/// whoever holds the registry handle.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutboundFrame {
    Score(MotionScore),
    Scores(Vec<MotionScore>),
}

/// How computed scores are written back on a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyMode {
    /// One frame per processed pair, written as each pair is scored.
    #[default]
    PerSample,
    /// One JSON array per inbound message.
    Batched,
}

impl ReplyMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "per-sample" | "per_sample" => Some(Self::PerSample),
            "batched" => Some(Self::Batched),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerSample => "per-sample",
            Self::Batched => "batched",
        }
    }
}

// ============================================================================
// Handshake
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    #[serde(default)]
    pub stream_id: Option<String>,
}

/// GET /ws?stream_id=<id> - upgrade to a scoring stream
///
/// The stream id is required and doubles as the settings key. Identity and
/// calibration gate the stream ahead of upgrade mechanics: a client with no
/// stream id gets 401 and a stream with unusable calibration is refused
/// outright, whether or not the request could have been upgraded.
pub async fn ws_stream_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    Query(query): Query<StreamQuery>,
    State(state): State<SharedState>,
) -> Response {
    let stream_id = match query.stream_id.filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "stream_id is required" })),
            )
                .into_response();
        }
    };

    let bounds = match state.settings.get_calibration(&stream_id) {
        Ok(bounds) => bounds,
        Err(e) => {
            tracing::error!("refusing stream {}: {}", stream_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| run_connection(socket, state, stream_id, bounds)),
        Err(rejection) => rejection.into_response(),
    }
}

// ============================================================================
// Connection loop
// ============================================================================

async fn run_connection(
    mut socket: WebSocket,
    state: SharedState,
    stream_id: String,
    bounds: CalibrationBounds,
) {
    let conn_id = Uuid::new_v4();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();

    // Fresh estimator state, registered with the connection and stepped
    // only by this task.
    let tracker: SharedTracker = Arc::new(StdMutex::new(MotionTracker::new()));

    if let Some(replaced) = state
        .registry
        .register(&stream_id, conn_id, out_tx, tracker.clone())
        .await
    {
        tracing::info!(
            "stream {} reconnected, superseding connection {}",
            stream_id,
            replaced.conn_id
        );
    }
    tracing::info!("stream {} connected ({})", stream_id, conn_id);

    let mut probe = tokio::time::interval(PROBE_PERIOD);
    probe.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // interval fires immediately on the first tick; the peer hasn't had a
    // chance to be idle yet.
    probe.tick().await;

    let mut last_seen = Instant::now();
    let mut missed_probes: u32 = 0;

    loop {
        tokio::select! {
            _ = probe.tick() => {
                if last_seen.elapsed() >= IDLE_TIMEOUT {
                    tracing::info!("stream {} idle for {:?}, closing", stream_id, IDLE_TIMEOUT);
                    break;
                }
                if missed_probes >= MAX_MISSED_PROBES {
                    tracing::info!("stream {} missed {} probes, closing", stream_id, missed_probes);
                    break;
                }
                if socket.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
                missed_probes += 1;
            }

            Some(frame) = out_rx.recv() => {
                if write_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(message)) => {
                        last_seen = Instant::now();
                        match message {
                            Message::Text(text) => {
                                if handle_sample_text(
                                    &mut socket,
                                    &tracker,
                                    &bounds,
                                    state.reply_mode,
                                    &stream_id,
                                    &text,
                                )
                                .await
                                .is_err()
                                {
                                    break;
                                }
                            }
                            Message::Pong(_) => {
                                missed_probes = 0;
                            }
                            Message::Close(_) => break,
                            // axum answers pings for us; binary frames are
                            // not part of the protocol.
                            Message::Ping(_) | Message::Binary(_) => {}
                        }
                    }
                    Some(Err(e)) => {
                        tracing::debug!("read error on stream {}: {}", stream_id, e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    // Single teardown path for every exit: close frame, read/write error,
    // liveness expiry. Unregister is idempotent and conn-id guarded.
    state.registry.unregister(&stream_id, conn_id).await;
    tracing::info!("stream {} disconnected ({})", stream_id, conn_id);
}

/// Decode one inbound text frame and run its pairs through the stream's
/// tracker.
///
/// An undecodable frame drops the whole message without killing the
/// connection; only a socket write failure is an error here. The tracker
/// lock is held per step, never across an await.
async fn handle_sample_text(
    socket: &mut WebSocket,
    tracker: &SharedTracker,
    bounds: &CalibrationBounds,
    reply_mode: ReplyMode,
    stream_id: &str,
    text: &str,
) -> Result<(), axum::Error> {
    let message: InboundMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!("undecodable frame on stream {}: {}", stream_id, e);
            return Ok(());
        }
    };

    let (timestamp, pairs) = message.into_samples();

    match reply_mode {
        ReplyMode::PerSample => {
            for (x, y) in pairs {
                let score = tracker.lock().unwrap().step(timestamp, x, y, bounds);
                write_frame(socket, &OutboundFrame::Score(score)).await?;
            }
        }
        ReplyMode::Batched => {
            let scores: Vec<MotionScore> = {
                let mut tracker = tracker.lock().unwrap();
                pairs
                    .into_iter()
                    .map(|(x, y)| tracker.step(timestamp, x, y, bounds))
                    .collect()
            };
            write_frame(socket, &OutboundFrame::Scores(scores)).await?;
        }
    }

    Ok(())
}

async fn write_frame(socket: &mut WebSocket, frame: &OutboundFrame) -> Result<(), axum::Error> {
    // Serialization of these shapes cannot fail; map_err keeps the single
    // error type for the write path.
    let json = serde_json::to_string(frame).map_err(axum::Error::new)?;
    socket.send(Message::Text(json)).await
}
