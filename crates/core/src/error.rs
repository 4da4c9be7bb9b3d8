//! Error types for calibration validation.
//!
//! The tracker itself never fails: malformed samples degrade to the neutral
//! score inside `step`. Degenerate calibration is the one hard-failure
//! class, and it must be caught before any sample reaches a tracker.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    #[error("calibration bound {name} is not finite: {value}")]
    NonFiniteBound { name: &'static str, value: f64 },

    #[error("calibration bound {name} must be positive, got {value}")]
    NonPositiveMax { name: &'static str, value: f64 },
}
