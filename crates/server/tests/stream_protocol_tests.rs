//! Protocol-level tests for the streaming path: message decoding, reply
//! shapes, and per-stream estimator isolation.

use saccade_core::{CalibrationBounds, MotionScore, MotionTracker};
use saccade_server::{InboundMessage, OutboundFrame};

/// Drive a tracker the way the connection loop does for one inbound frame.
fn process_frame(
    tracker: &mut MotionTracker,
    bounds: &CalibrationBounds,
    text: &str,
) -> Vec<MotionScore> {
    let message: InboundMessage = serde_json::from_str(text).expect("frame should decode");
    let (timestamp, pairs) = message.into_samples();
    pairs
        .into_iter()
        .map(|(x, y)| tracker.step(timestamp, x, y, bounds))
        .collect()
}

#[test]
fn single_pair_stream_produces_one_score_per_frame() {
    let bounds = CalibrationBounds::default();
    let mut tracker = MotionTracker::new();

    let first = process_frame(
        &mut tracker,
        &bounds,
        r#"{"timestamp": 1.0, "x": 0.0, "y": 0.0}"#,
    );
    assert_eq!(first, vec![MotionScore::NEUTRAL]);

    let second = process_frame(
        &mut tracker,
        &bounds,
        r#"{"timestamp": 2.0, "x": 3.0, "y": 4.0}"#,
    );
    assert_eq!(second.len(), 1);
    assert!((second[0].variance - 0.95).abs() < 1e-12);
    assert!((second[0].probability - 0.715).abs() < 1e-12);
}

#[test]
fn batch_in_stream_frame_feeds_pairs_in_order() {
    let bounds = CalibrationBounds::default();
    let mut tracker = MotionTracker::new();

    // All pairs share the frame timestamp: the first seeds the tracker and
    // the rest hit the non-positive-dt guard.
    let scores = process_frame(
        &mut tracker,
        &bounds,
        r#"{"timestamp": 1.0, "coordinates": [[0.0, 0.0], [3.0, 4.0], [9.0, 9.0]]}"#,
    );
    assert_eq!(scores.len(), 3);
    assert!(scores.iter().all(|s| *s == MotionScore::NEUTRAL));

    // A later frame with a fresh timestamp resumes normal kinematics from
    // the state the batch frame left behind.
    let next = process_frame(
        &mut tracker,
        &bounds,
        r#"{"timestamp": 2.0, "x": 12.0, "y": 13.0}"#,
    );
    assert_ne!(next[0], MotionScore::NEUTRAL);
}

#[test]
fn malformed_pairs_inside_a_frame_are_skipped_not_fatal() {
    let bounds = CalibrationBounds::default();
    let mut tracker = MotionTracker::new();

    let scores = process_frame(
        &mut tracker,
        &bounds,
        r#"{"timestamp": 1.0, "coordinates": [[0.0], [0.0, 0.0], [1.0, 2.0, 3.0]]}"#,
    );
    assert_eq!(scores.len(), 1);
    assert!(tracker.is_initialized());
}

#[test]
fn concurrent_streams_never_cross_contaminate() {
    let bounds = CalibrationBounds::default();
    let mut stream_a = MotionTracker::new();
    let mut stream_b = MotionTracker::new();

    // Interleaved delivery, divergent content.
    process_frame(&mut stream_a, &bounds, r#"{"timestamp": 1.0, "x": 0.0, "y": 0.0}"#);
    process_frame(&mut stream_b, &bounds, r#"{"timestamp": 10.0, "x": 5.0, "y": 5.0}"#);
    let a = process_frame(&mut stream_a, &bounds, r#"{"timestamp": 2.0, "x": 300.0, "y": 400.0}"#);
    let b = process_frame(&mut stream_b, &bounds, r#"{"timestamp": 11.0, "x": 5.001, "y": 5.0}"#);

    // Stream A saturates, stream B idles near the floor; each matches its
    // own isolated replay exactly.
    assert!((a[0].variance - 0.95).abs() < 1e-12);
    assert!(b[0].variance < a[0].variance);

    let mut replay = MotionTracker::new();
    process_frame(&mut replay, &bounds, r#"{"timestamp": 10.0, "x": 5.0, "y": 5.0}"#);
    let replay_b =
        process_frame(&mut replay, &bounds, r#"{"timestamp": 11.0, "x": 5.001, "y": 5.0}"#);
    assert_eq!(replay_b, b);
}

#[test]
fn per_sample_and_batched_replies_carry_the_same_scores() {
    let bounds = CalibrationBounds::default();

    let mut tracker = MotionTracker::new();
    let scores = process_frame(
        &mut tracker,
        &bounds,
        r#"{"timestamp": 1.0, "coordinates": [[0.0, 0.0], [1.0, 1.0]]}"#,
    );

    // per-sample: one frame per score
    let per_sample: Vec<String> = scores
        .iter()
        .map(|s| serde_json::to_string(&OutboundFrame::Score(*s)).unwrap())
        .collect();
    assert_eq!(per_sample.len(), 2);
    for frame in &per_sample {
        let value: serde_json::Value = serde_json::from_str(frame).unwrap();
        assert!(value.get("probability").is_some());
    }

    // batched: one array frame for the whole message
    let batched = serde_json::to_string(&OutboundFrame::Scores(scores.clone())).unwrap();
    let value: serde_json::Value = serde_json::from_str(&batched).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 2);
    assert_eq!(value[0]["probability"], scores[0].probability);
}

#[test]
fn stream_restart_is_absorbed_without_reconnecting() {
    let bounds = CalibrationBounds::default();
    let mut tracker = MotionTracker::new();

    process_frame(&mut tracker, &bounds, r#"{"timestamp": 100.0, "x": 1.0, "y": 1.0}"#);
    process_frame(&mut tracker, &bounds, r#"{"timestamp": 101.0, "x": 2.0, "y": 2.0}"#);

    // Page reload: clock restarts. Same connection, fresh kinematics.
    let restart =
        process_frame(&mut tracker, &bounds, r#"{"timestamp": 1.0, "x": 50.0, "y": 50.0}"#);
    assert_eq!(restart, vec![MotionScore::NEUTRAL]);

    let resumed =
        process_frame(&mut tracker, &bounds, r#"{"timestamp": 2.0, "x": 53.0, "y": 54.0}"#);
    assert!((resumed[0].variance - 0.95).abs() < 1e-12);
}
