//! Batch analysis for finite coordinate arrays uploaded in one request.

use crate::calibration::CalibrationBounds;
use crate::tracker::{MotionScore, MotionTracker};

/// Score an ordered array of coordinate pairs against a fresh tracker.
///
/// Every accepted pair is stepped with the same request-level `timestamp`:
/// the first pair seeds the tracker, and each later pair lands on the
/// non-positive-Δt guard and yields the neutral score. Callers that want
/// per-point kinematics must stream samples with per-point timestamps.
///
/// Pairs whose length is not exactly 2 are skipped. Results are returned in
/// input order, one per accepted pair. Nothing is persisted here.
pub fn analyze_batch(
    timestamp: f64,
    coordinates: &[Vec<f64>],
    bounds: &CalibrationBounds,
) -> Vec<MotionScore> {
    let mut tracker = MotionTracker::new();
    let mut results = Vec::with_capacity(coordinates.len());

    for pair in coordinates {
        if pair.len() != 2 {
            continue;
        }
        results.push(tracker.step(timestamp, pair[0], pair[1], bounds));
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_output() {
        let results = analyze_batch(1.0, &[], &CalibrationBounds::default());
        assert!(results.is_empty());
    }

    #[test]
    fn shared_timestamp_seeds_then_neutralizes() {
        let coords = vec![vec![0.0, 0.0], vec![3.0, 4.0], vec![100.0, 100.0]];
        let results = analyze_batch(5.0, &coords, &CalibrationBounds::default());

        assert_eq!(results.len(), 3);
        for score in &results {
            assert_eq!(*score, MotionScore::NEUTRAL);
        }
    }

    #[test]
    fn malformed_pairs_are_skipped() {
        let coords = vec![
            vec![0.0, 0.0],
            vec![1.0],
            vec![1.0, 2.0, 3.0],
            vec![],
            vec![3.0, 4.0],
        ];
        let results = analyze_batch(5.0, &coords, &CalibrationBounds::default());
        // Only the two well-formed pairs produce output.
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn each_call_gets_a_fresh_tracker() {
        let coords = vec![vec![10.0, 10.0]];
        let first = analyze_batch(1.0, &coords, &CalibrationBounds::default());
        let second = analyze_batch(2.0, &coords, &CalibrationBounds::default());
        // Both calls see a first sample, regardless of the earlier request.
        assert_eq!(first[0], MotionScore::NEUTRAL);
        assert_eq!(second[0], MotionScore::NEUTRAL);
    }
}
