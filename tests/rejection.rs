//! Property tests for envelope rejection.
//!
//! Frames that fail header validation must never reach the correlator, no
//! matter how often they are resubmitted.

use proptest::prelude::*;
use tanklink::{CorrelatorConfig, Envelope, QueryId, TankQueryDecoder};
use tanklink_testing::{FixedReading, continuation_frame};

/// Frames with at least one invalid header byte.
fn malformed_frame() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        proptest::collection::vec(any::<u8>(), 0..4),
        (1_u8.., proptest::collection::vec(any::<u8>(), 3..12)).prop_map(|(marker, mut rest)| {
            rest.insert(0, marker);
            rest
        }),
        (any::<u8>(), any::<u8>().prop_filter("not a query response", |b| *b != 0x02))
            .prop_map(|(response_type, marker)| vec![0x00, response_type, marker, 0xE0, 0x11]),
        (any::<u8>(), any::<u8>().prop_filter("not E0-E9", |b| !(0xE0..=0xE9).contains(b)))
            .prop_map(|(response_type, id)| vec![0x00, response_type, 0x02, id, 0x11]),
    ]
}

proptest! {
    #[test]
    fn malformed_frames_never_touch_state(
        frame in malformed_frame(),
        repeats in 1_usize..4,
    ) {
        prop_assert!(Envelope::parse(&frame).is_err());

        let mut decoder = TankQueryDecoder::new(CorrelatorConfig::default(), FixedReading::level(9));
        decoder.process_notification(&continuation_frame(QueryId::E3, b"held"));
        for _ in 0..repeats {
            prop_assert!(decoder.process_notification(&frame).is_none());
        }

        prop_assert_eq!(decoder.pending_count(), 1);
        prop_assert_eq!(decoder.correlator().pending_fragments(QueryId::E3), Some(1));
        prop_assert_eq!(decoder.correlator().total_buffered_bytes(), 6);
    }

    #[test]
    fn valid_headers_always_parse(
        response_type in any::<u8>(),
        index in 0_u8..10,
        body in proptest::collection::vec(any::<u8>(), 0..32),
    ) {
        let mut frame = vec![0x00, response_type, 0x02, 0xE0 | index];
        frame.extend_from_slice(&body);

        let envelope = Envelope::parse(&frame).expect("valid header");
        prop_assert_eq!(envelope.query_id().index(), index);
        prop_assert_eq!(envelope.is_terminal(), response_type == 0x0A);
        prop_assert_eq!(envelope.body(), &frame[2..]);
    }
}
