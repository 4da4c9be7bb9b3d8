//! Stateful single-pass kinematic estimator.

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationBounds;
use crate::scale::clip_and_scale;

/// Below this Δt the acceleration term is forced to zero to avoid numerical
/// blow-up from near-coincident timestamps.
const ACCEL_EPSILON: f64 = 1e-6;

/// Normalized output envelope, before sensitivity scaling.
const OUT_MIN: f64 = 0.01;
const OUT_MAX: f64 = 0.95;

/// Scores for one processed sample. Field names are the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionScore {
    pub variance: f64,
    pub acceleration: f64,
    pub probability: f64,
}

impl MotionScore {
    /// Fixed output for samples that carry no kinematic information: the
    /// first sample of a stream, duplicate/backward timestamps, and
    /// non-finite timestamps. Never computed from data.
    pub const NEUTRAL: MotionScore = MotionScore {
        variance: 0.0,
        acceleration: 0.0,
        probability: 0.05,
    };
}

/// Per-stream estimator state.
///
/// Owned exclusively by the connection task or batch request that created
/// it; there is no interior locking. While `initialized` is false the
/// numeric fields are meaningless and never influence output.
#[derive(Debug, Clone, Default)]
pub struct MotionTracker {
    last_x: f64,
    last_y: f64,
    last_time: f64,
    last_velocity: f64,
    initialized: bool,
}

impl MotionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Consume one sample and produce its scores.
    ///
    /// Must be called in arrival order for the stream. Never fails:
    /// temporal anomalies and non-finite timestamps degrade to
    /// [`MotionScore::NEUTRAL`].
    pub fn step(&mut self, t: f64, x: f64, y: f64, bounds: &CalibrationBounds) -> MotionScore {
        if !t.is_finite() {
            return MotionScore::NEUTRAL;
        }

        // Time running backward means the source stream restarted (page
        // reload); drop the history and reseed from this sample.
        if self.initialized && t < self.last_time {
            self.reset();
        }

        if !self.initialized {
            self.last_x = x;
            self.last_y = y;
            self.last_time = t;
            self.last_velocity = 0.0;
            self.initialized = true;
            return MotionScore::NEUTRAL;
        }

        let dt = t - self.last_time;
        if dt <= 0.0 {
            // Duplicate timestamp: dropped, not fatal, state untouched.
            return MotionScore::NEUTRAL;
        }

        let dx = x - self.last_x;
        let dy = y - self.last_y;
        // Squared displacement; "variance" is the domain term, not the
        // statistical quantity.
        let variance = dx * dx + dy * dy;
        let velocity = variance.sqrt() / dt;
        let acceleration = if dt > ACCEL_EPSILON {
            (velocity - self.last_velocity) / dt
        } else {
            0.0
        };

        // The acceleration envelope widens with sensitivity; the variance
        // envelope does not.
        let s = bounds.effective_sensitivity();
        let variance_norm = clip_and_scale(
            variance,
            bounds.var_min,
            bounds.var_max,
            OUT_MIN * s,
            OUT_MAX * s,
        );
        let acceleration_norm = clip_and_scale(
            acceleration,
            bounds.acc_min * s,
            bounds.acc_max * s,
            OUT_MIN * s,
            OUT_MAX * s,
        );

        let probability = (variance_norm + acceleration_norm) / 2.0;

        self.last_x = x;
        self.last_y = y;
        self.last_time = t;
        self.last_velocity = velocity;

        MotionScore {
            variance: variance_norm,
            acceleration: acceleration_norm,
            probability,
        }
    }

    fn reset(&mut self) {
        self.last_x = 0.0;
        self.last_y = 0.0;
        self.last_time = 0.0;
        self.last_velocity = 0.0;
        self.initialized = false;
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> (f64, f64, f64, f64) {
        (self.last_x, self.last_y, self.last_time, self.last_velocity)
    }
}
