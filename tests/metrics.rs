#![cfg(feature = "metrics")]
//! Tests for `amqpframe` metrics helpers and the counters the dispatcher
//! updates while classifying frames.
//!
//! These tests verify that counters update as expected using
//! `metrics_util::debugging::DebuggingRecorder`.
use amqpframe::{
    delivery::FrameDispatcher,
    frame::{Frame, FrameKind},
    metrics::{self as amqp_metrics, DELIVERIES_TOTAL, FRAMES_PROCESSED, UNHANDLED_FRAMES, VIOLATIONS_TOTAL},
    properties::PropertyBag,
};
use amqpframe_testing::{CHANNEL, body, delivery, heartbeat};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use rstest::rstest;

/// Creates a debugging recorder and snapshotter for metrics testing.
fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

fn assert_counter_eq(snapshotter: &Snapshotter, name: &str, expected: u64) {
    let metrics = snapshotter.snapshot().into_vec();
    assert!(
        metrics.iter().any(|(key, _, _, value)| {
            key.key().name() == name && matches!(value, DebugValue::Counter(c) if *c == expected)
        }),
        "expected {name} == {expected}, got {metrics:#?}"
    );
}

fn frames_counted(snapshotter: &Snapshotter, kind: &str) -> u64 {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter(|(key, _, _, _)| {
            key.key().name() == FRAMES_PROCESSED
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == "kind" && l.value() == kind)
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(c) => c,
            _ => 0,
        })
        .sum()
}

#[rstest]
#[case(FrameKind::Method, "method")]
#[case(FrameKind::Body, "body")]
#[case(FrameKind::Unknown, "unknown")]
fn frame_metric_is_labelled_by_kind(#[case] kind: FrameKind, #[case] label: &str) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || amqp_metrics::inc_frames(kind));

    assert_eq!(frames_counted(&snapshotter, label), 1);
}

#[test]
fn dispatcher_counts_frames_and_completed_deliveries() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        let mut dispatcher = FrameDispatcher::new();
        for frame in delivery(1, PropertyBag::new(), b"abcdef", 4) {
            dispatcher.classify(frame).expect("valid sequence");
        }
        dispatcher.classify(heartbeat()).expect("heartbeat");
    });

    assert_eq!(frames_counted(&snapshotter, "method"), 1);
    assert_eq!(frames_counted(&snapshotter, "header"), 1);
    assert_eq!(frames_counted(&snapshotter, "body"), 2);
    assert_eq!(frames_counted(&snapshotter, "heartbeat"), 1);
    assert_counter_eq(&snapshotter, DELIVERIES_TOTAL, 1);
    assert_counter_eq(&snapshotter, UNHANDLED_FRAMES, 1);
}

#[rstest]
#[case(1)]
#[case(3)]
fn violations_are_counted(#[case] expected: u64) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        let mut dispatcher = FrameDispatcher::new();
        for _ in 0..expected {
            let frame: Frame = body(CHANNEL, b"orphan");
            dispatcher.classify(frame).expect_err("no delivery announced");
        }
    });

    assert_counter_eq(&snapshotter, VIOLATIONS_TOTAL, expected);
}
