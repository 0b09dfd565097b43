#![cfg(feature = "metrics")]
//! Tests for `tanklink` metrics.
//!
//! These tests drive decoder sessions under a
//! `metrics_util::debugging::DebuggingRecorder` and check that counters and
//! gauges move as documented.
use std::time::{Duration, Instant};

use metrics::{SharedString, Unit};
use metrics_util::{
    CompositeKey,
    debugging::{DebugValue, DebuggingRecorder, Snapshotter},
};
use rstest::rstest;
use tanklink::{
    ASSEMBLIES_COMPLETED,
    ASSEMBLIES_DISCARDED,
    CorrelatorConfig,
    DECODE_FAILURES,
    FRAMES_TOTAL,
    PENDING_ASSEMBLIES,
    QueryId,
    READINGS_TOTAL,
    TankQueryDecoder,
};
use tanklink_testing::{FailingPipeline, FixedReading, continuation_frame, terminal_frame};

/// Creates a debugging recorder and snapshotter for metrics testing.
fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

type Snapshot = Vec<(CompositeKey, Option<Unit>, Option<SharedString>, DebugValue)>;

fn counter(metrics: &Snapshot, name: &str, label: Option<(&str, &str)>) -> u64 {
    metrics
        .iter()
        .filter(|(key, _, _, _)| {
            key.key().name() == name
                && label.is_none_or(|(k, v)| {
                    key.key()
                        .labels()
                        .any(|l| l.key() == k && l.value() == v)
                })
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(count) => *count,
            _ => 0,
        })
        .sum()
}

fn gauge(metrics: &Snapshot, name: &str) -> f64 {
    metrics
        .iter()
        .find_map(|(key, _, _, value)| match value {
            DebugValue::Gauge(level) if key.key().name() == name => Some(level.into_inner()),
            _ => None,
        })
        .unwrap_or_default()
}

#[test]
fn frames_are_counted_by_outcome() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        let mut decoder = TankQueryDecoder::new(CorrelatorConfig::default(), FixedReading::level(5));
        decoder.process_notification(&continuation_frame(QueryId::E0, b"a"));
        decoder.process_notification(&[0x00, 0x0A, 0x02]);
        decoder.process_notification(&[0x07, 0x0A, 0x02, 0xE0]);
        decoder.process_notification(&terminal_frame(QueryId::E0, b"b"));
    });

    let metrics = snapshotter.snapshot().into_vec();
    assert_eq!(counter(&metrics, FRAMES_TOTAL, Some(("outcome", "accepted"))), 2);
    assert_eq!(counter(&metrics, FRAMES_TOTAL, Some(("outcome", "rejected"))), 2);
    assert_eq!(counter(&metrics, ASSEMBLIES_COMPLETED, None), 1);
    assert_eq!(counter(&metrics, READINGS_TOTAL, None), 1);
}

#[test]
fn pending_gauge_tracks_collecting_responses() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let mut decoder = TankQueryDecoder::new(CorrelatorConfig::default(), FixedReading::level(5));

    metrics::with_local_recorder(&recorder, || {
        decoder.process_notification(&continuation_frame(QueryId::E1, b"a"));
        decoder.process_notification(&continuation_frame(QueryId::E2, b"b"));
        decoder.process_notification(&terminal_frame(QueryId::E1, b"c"));
    });

    let metrics = snapshotter.snapshot().into_vec();
    assert!((gauge(&metrics, PENDING_ASSEMBLIES) - 1.0).abs() < f64::EPSILON);
    assert_eq!(decoder.pending_count(), 1);
}

#[test]
fn dropping_a_session_releases_its_pending_gauge() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        let mut decoder =
            TankQueryDecoder::new(CorrelatorConfig::default(), FixedReading::level(5));
        decoder.process_notification(&continuation_frame(QueryId::E1, b"a"));
        decoder.process_notification(&continuation_frame(QueryId::E2, b"b"));
        drop(decoder);
    });

    let metrics = snapshotter.snapshot().into_vec();
    assert!(gauge(&metrics, PENDING_ASSEMBLIES).abs() < f64::EPSILON);
}

#[rstest]
#[case::expired("expired")]
#[case::too_large("too_large")]
fn discarded_assemblies_are_counted_by_reason(#[case] reason: &str) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        let config = CorrelatorConfig::new(
            Duration::from_secs(1),
            std::num::NonZeroUsize::new(8).expect("non-zero"),
        );
        let mut decoder = TankQueryDecoder::new(config, FixedReading::level(5));
        let start = Instant::now();
        decoder.process_notification_at(&continuation_frame(QueryId::E3, b"abc"), start);
        if reason == "expired" {
            decoder.purge_expired_at(start + Duration::from_secs(2));
        } else {
            decoder.process_notification_at(&continuation_frame(QueryId::E3, b"defg"), start);
        }
    });

    let metrics = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter(&metrics, ASSEMBLIES_DISCARDED, Some(("reason", reason))),
        1
    );
}

#[test]
fn decode_failures_are_counted() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        let mut decoder =
            TankQueryDecoder::new(CorrelatorConfig::default(), FailingPipeline::default());
        decoder.process_notification(&terminal_frame(QueryId::E4, b"x"));
        decoder.process_notification(&terminal_frame(QueryId::E5, b"y"));
    });

    let metrics = snapshotter.snapshot().into_vec();
    assert_eq!(counter(&metrics, DECODE_FAILURES, None), 2);
    assert_eq!(counter(&metrics, READINGS_TOTAL, None), 0);
}
