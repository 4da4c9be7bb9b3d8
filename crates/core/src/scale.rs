//! Magnitude normalization.

/// Clip a raw magnitude to `[min, max]` and remap it into `[out_min, out_max]`.
///
/// Motion magnitude is direction-agnostic, so the absolute value is taken
/// first. The remap denominator is `max`, not `max - min`: a value clipped
/// to `min` only lands on `out_min` when `min == 0`. This matches the fitted
/// scoring curve in production and must not be "corrected".
///
/// Callers are responsible for rejecting `max <= 0` before calling (see
/// `CalibrationBounds::validate`); with a positive `max` and finite inputs
/// the result is always finite.
pub fn clip_and_scale(value: f64, min: f64, max: f64, out_min: f64, out_max: f64) -> f64 {
    let val_abs = value.abs();
    // max().min() chaining, not f64::clamp: a misordered window must degrade
    // to `max`, never panic.
    let clipped = val_abs.max(min).min(max);
    out_min + (out_max - out_min) * (clipped / max)
}
