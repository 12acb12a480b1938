//! Metric helpers for `amqpframe`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. Without the
//! `metrics` feature the helpers do nothing.

#[cfg(feature = "metrics")]
use metrics::counter;

use crate::frame::FrameKind;

/// Name of the counter tracking frames seen by the dispatcher.
pub const FRAMES_PROCESSED: &str = "amqpframe_frames_processed_total";
/// Name of the counter tracking completed deliveries.
pub const DELIVERIES_TOTAL: &str = "amqpframe_deliveries_total";
/// Name of the counter tracking frames that took no part in reassembly.
pub const UNHANDLED_FRAMES: &str = "amqpframe_unhandled_frames_total";
/// Name of the counter tracking reassembly violations.
pub const VIOLATIONS_TOTAL: &str = "amqpframe_violations_total";

/// Record a frame of the given kind.
pub fn inc_frames(kind: FrameKind) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_PROCESSED, "kind" => kind.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

/// Record a completed delivery.
pub fn inc_deliveries() {
    #[cfg(feature = "metrics")]
    counter!(DELIVERIES_TOTAL).increment(1);
}

/// Record a frame ignored by reassembly.
pub fn inc_unhandled() {
    #[cfg(feature = "metrics")]
    counter!(UNHANDLED_FRAMES).increment(1);
}

/// Record a reassembly violation.
pub fn inc_violations() {
    #[cfg(feature = "metrics")]
    counter!(VIOLATIONS_TOTAL).increment(1);
}
