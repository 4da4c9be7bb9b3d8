//! Per-user calibration bounds and sensitivity policy.

use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;

/// Default variance clip window (squared displacement, normalized units).
pub const DEFAULT_VAR_MIN: f64 = 4.5e-7;
pub const DEFAULT_VAR_MAX: f64 = 1.3e-4;

/// Default acceleration clip window.
pub const DEFAULT_ACC_MIN: f64 = 0.3;
pub const DEFAULT_ACC_MAX: f64 = 10.0;

/// Valid sensitivity domain; anything outside collapses to 1.0.
pub const SENSITIVITY_RANGE: std::ops::RangeInclusive<f64> = 0.75..=1.25;

/// Calibration envelope for one stream or batch request.
///
/// Immutable for the lifetime of the connection/request that captured it.
/// The defaults are the fitted constants every new user starts from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBounds {
    pub var_min: f64,
    pub var_max: f64,
    pub acc_min: f64,
    pub acc_max: f64,
    pub sensitivity: f64,
}

impl Default for CalibrationBounds {
    fn default() -> Self {
        Self {
            var_min: DEFAULT_VAR_MIN,
            var_max: DEFAULT_VAR_MAX,
            acc_min: DEFAULT_ACC_MIN,
            acc_max: DEFAULT_ACC_MAX,
            sensitivity: 1.0,
        }
    }
}

impl CalibrationBounds {
    /// Sensitivity with the silent-correction policy applied.
    ///
    /// Values outside [0.75, 1.25], NaN, and ±Inf all behave as exactly 1.0.
    /// Never an error: the sensitivity knob is untrusted client-adjacent
    /// configuration.
    pub fn effective_sensitivity(&self) -> f64 {
        if SENSITIVITY_RANGE.contains(&self.sensitivity) {
            self.sensitivity
        } else {
            1.0
        }
    }

    /// Reject degenerate bounds before any sample is processed.
    ///
    /// `var_max` and `acc_max` are remap denominators; a non-positive or
    /// non-finite value there is a configuration error, not a data error,
    /// and is the one class that surfaces as a hard failure.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        for (name, value) in [
            ("var_min", self.var_min),
            ("var_max", self.var_max),
            ("acc_min", self.acc_min),
            ("acc_max", self.acc_max),
        ] {
            if !value.is_finite() {
                return Err(CalibrationError::NonFiniteBound { name, value });
            }
        }
        if self.var_max <= 0.0 {
            return Err(CalibrationError::NonPositiveMax {
                name: "var_max",
                value: self.var_max,
            });
        }
        if self.acc_max <= 0.0 {
            return Err(CalibrationError::NonPositiveMax {
                name: "acc_max",
                value: self.acc_max,
            });
        }
        Ok(())
    }
}
