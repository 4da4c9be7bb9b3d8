//! Session Registry: live-connection bookkeeping.
//!
//! One global lock covers register/lookup/unregister so concurrent
//! connect/disconnect can never observe a torn entry, and teardown releases
//! the estimator state and the entry together. The tracker inside an entry
//! is stepped only by its owning connection task — the per-entry mutex is
//! uncontended and exists so the entry can carry the state it owns.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use saccade_core::MotionTracker;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use crate::stream_api::OutboundFrame;

/// Handle for pushing frames to a live connection's writer loop.
pub type ConnectionHandle = mpsc::UnboundedSender<OutboundFrame>;

/// Estimator state held by a registry entry, exclusively stepped by the
/// connection that registered it.
pub type SharedTracker = Arc<StdMutex<MotionTracker>>;

/// One live connection, keyed by stream id.
#[derive(Debug, Clone)]
pub struct ConnectionEntry {
    /// Instance id of the connection that registered this entry. A
    /// reconnect under the same stream id gets a new instance id, so the
    /// superseded connection's deferred cleanup cannot evict its
    /// replacement.
    pub conn_id: Uuid,
    pub handle: ConnectionHandle,
    pub tracker: SharedTracker,
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    entries: Mutex<HashMap<String, ConnectionEntry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection, replacing any previous entry for the stream
    /// id (reconnect wins). Returns the replaced entry, if any.
    pub async fn register(
        &self,
        stream_id: &str,
        conn_id: Uuid,
        handle: ConnectionHandle,
        tracker: SharedTracker,
    ) -> Option<ConnectionEntry> {
        let entry = ConnectionEntry {
            conn_id,
            handle,
            tracker,
            connected_at: Utc::now(),
        };
        self.entries.lock().await.insert(stream_id.to_string(), entry)
    }

    /// Look up the live transport handle for a stream.
    pub async fn lookup(&self, stream_id: &str) -> Option<ConnectionHandle> {
        self.entries
            .lock()
            .await
            .get(stream_id)
            .map(|entry| entry.handle.clone())
    }

    /// Remove a stream's entry, releasing its estimator state with it.
    /// Idempotent, and guarded by connection instance: a stale `conn_id`
    /// (a connection that has already been replaced) leaves the current
    /// entry in place.
    pub async fn unregister(&self, stream_id: &str, conn_id: Uuid) {
        let mut entries = self.entries.lock().await;
        if entries.get(stream_id).is_some_and(|e| e.conn_id == conn_id) {
            entries.remove(stream_id);
        }
    }

    pub async fn active_count(&self) -> usize {
        self.entries.lock().await.len()
    }
}
