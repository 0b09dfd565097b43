//! Metric helpers for `tanklink`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. Without the
//! `metrics` feature every helper compiles to nothing.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the counter tracking inbound notifications by outcome.
pub const FRAMES_TOTAL: &str = "tanklink_frames_total";
/// Name of the gauge tracking assemblies that are still collecting.
pub const PENDING_ASSEMBLIES: &str = "tanklink_pending_assemblies";
/// Name of the counter tracking responses that reached their terminal frame.
pub const ASSEMBLIES_COMPLETED: &str = "tanklink_assemblies_completed_total";
/// Name of the counter tracking assemblies dropped before completion.
pub const ASSEMBLIES_DISCARDED: &str = "tanklink_assemblies_discarded_total";
/// Name of the counter tracking completed responses that failed to decode.
pub const DECODE_FAILURES: &str = "tanklink_decode_failures_total";
/// Name of the counter tracking readings produced.
pub const READINGS_TOTAL: &str = "tanklink_readings_total";

/// What happened to an inbound notification at the envelope boundary.
#[derive(Clone, Copy, Debug)]
pub enum FrameOutcome {
    /// The notification was a tank query response.
    Accepted,
    /// The notification was not relevant and was dropped.
    Rejected,
}

impl FrameOutcome {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            FrameOutcome::Accepted => "accepted",
            FrameOutcome::Rejected => "rejected",
        }
    }
}

/// Why an assembly was dropped before its terminal frame.
#[derive(Clone, Copy, Debug)]
pub enum DiscardReason {
    /// No fragment arrived within the inactivity window.
    Expired,
    /// The assembly outgrew the payload cap.
    TooLarge,
}

impl DiscardReason {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            DiscardReason::Expired => "expired",
            DiscardReason::TooLarge => "too_large",
        }
    }
}

/// Record an inbound notification with its envelope outcome.
pub fn inc_frames(outcome: FrameOutcome) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_TOTAL, "outcome" => outcome.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = outcome;
}

/// Increment the pending assemblies gauge.
pub fn inc_pending_assemblies() {
    #[cfg(feature = "metrics")]
    gauge!(PENDING_ASSEMBLIES).increment(1.0);
}

/// Decrement the pending assemblies gauge by `count`.
#[cfg_attr(
    feature = "metrics",
    expect(
        clippy::cast_precision_loss,
        reason = "at most ten assemblies per session are ever pending"
    )
)]
pub fn dec_pending_assemblies(count: usize) {
    if count == 0 {
        return;
    }
    #[cfg(feature = "metrics")]
    gauge!(PENDING_ASSEMBLIES).decrement(count as f64);
}

/// Record a response that reached its terminal frame.
pub fn inc_assemblies_completed() {
    #[cfg(feature = "metrics")]
    counter!(ASSEMBLIES_COMPLETED).increment(1);
}

/// Record an assembly dropped before completion.
pub fn inc_assemblies_discarded(reason: DiscardReason) {
    #[cfg(feature = "metrics")]
    counter!(ASSEMBLIES_DISCARDED, "reason" => reason.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = reason;
}

/// Record a completed response that failed to decode.
pub fn inc_decode_failures() {
    #[cfg(feature = "metrics")]
    counter!(DECODE_FAILURES).increment(1);
}

/// Record a decoded reading.
pub fn inc_readings() {
    #[cfg(feature = "metrics")]
    counter!(READINGS_TOTAL).increment(1);
}
