//! Settings collaborator: per-user calibration and result persistence.
//!
//! The scoring core consumes this surface; it does not implement durable
//! storage. `MemorySettings` backs the binary and the tests. Calibration is
//! captured once per connection/request — an update only affects
//! connections and requests opened afterwards.

use std::collections::HashMap;
use std::sync::RwLock;

use saccade_core::{CalibrationBounds, CalibrationError, MotionScore};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    /// Degenerate bounds are a configuration error and must surface as a
    /// hard failure before any sample is processed.
    #[error("calibration for {user_id} is unusable: {source}")]
    DegenerateCalibration {
        user_id: String,
        #[source]
        source: CalibrationError,
    },

    #[error("failed to persist results for session {session_id}: {reason}")]
    PersistFailed { session_id: String, reason: String },
}

/// External collaborator surface the scoring path depends on.
///
/// Lock hold times are map-op short; methods are sync and safe to call from
/// request handlers.
pub trait SettingsStore: Send + Sync {
    /// Calibration bounds for a user. Unknown users receive the defaults
    /// (new users are seeded with the fitted constants). Degenerate stored
    /// bounds are rejected here, never forwarded to a tracker.
    fn get_calibration(&self, user_id: &str) -> Result<CalibrationBounds, SettingsError>;

    /// Replace a user's calibration. Validated before storing so a bad
    /// write is caught at write time rather than on the next stream open.
    fn update_calibration(
        &self,
        user_id: &str,
        bounds: CalibrationBounds,
    ) -> Result<(), SettingsError>;

    /// Persist one batch of computed scores for a session.
    fn persist_results(
        &self,
        session_id: &str,
        results: &[MotionScore],
    ) -> Result<(), SettingsError>;
}

/// In-memory settings store.
#[derive(Debug, Default)]
pub struct MemorySettings {
    calibrations: RwLock<HashMap<String, CalibrationBounds>>,
    results: RwLock<HashMap<String, Vec<MotionScore>>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored results for a session (test/introspection surface).
    pub fn session_results(&self, session_id: &str) -> Option<Vec<MotionScore>> {
        self.results.read().unwrap().get(session_id).cloned()
    }
}

impl SettingsStore for MemorySettings {
    fn get_calibration(&self, user_id: &str) -> Result<CalibrationBounds, SettingsError> {
        let bounds = self
            .calibrations
            .read()
            .unwrap()
            .get(user_id)
            .copied()
            .unwrap_or_default();

        bounds
            .validate()
            .map_err(|source| SettingsError::DegenerateCalibration {
                user_id: user_id.to_string(),
                source,
            })?;

        Ok(bounds)
    }

    fn update_calibration(
        &self,
        user_id: &str,
        bounds: CalibrationBounds,
    ) -> Result<(), SettingsError> {
        bounds
            .validate()
            .map_err(|source| SettingsError::DegenerateCalibration {
                user_id: user_id.to_string(),
                source,
            })?;

        self.calibrations
            .write()
            .unwrap()
            .insert(user_id.to_string(), bounds);
        Ok(())
    }

    fn persist_results(
        &self,
        session_id: &str,
        results: &[MotionScore],
    ) -> Result<(), SettingsError> {
        self.results
            .write()
            .unwrap()
            .entry(session_id.to_string())
            .or_default()
            .extend_from_slice(results);
        Ok(())
    }
}
