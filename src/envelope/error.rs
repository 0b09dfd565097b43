//! Reasons a raw notification is not treated as a tank query response.
//!
//! Rejections are expected on a noisy wireless channel. They are reported
//! so callers and tests can tell them apart, but a session simply drops the
//! frame and moves on.

use thiserror::Error;

use super::{ENVELOPE_HEADER_LEN, FRAME_MARKER, QUERY_RESPONSE_MARKER};

/// Why [`Envelope::parse`](super::Envelope::parse) declined a frame.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum EnvelopeRejection {
    /// The frame cannot hold the envelope header.
    #[error("frame too short: {len} bytes < {min}", min = ENVELOPE_HEADER_LEN)]
    TooShort {
        /// Length of the rejected frame.
        len: usize,
    },
    /// The leading marker byte did not match.
    #[error("unexpected frame marker {found:#04x}, expected {expected:#04x}", expected = FRAME_MARKER)]
    BadFrameMarker {
        /// Byte found in the marker position.
        found: u8,
    },
    /// The frame is not a query response.
    #[error(
        "not a query response: marker {found:#04x}, expected {expected:#04x}",
        expected = QUERY_RESPONSE_MARKER
    )]
    NotQueryResponse {
        /// Byte found in the query-response marker position.
        found: u8,
    },
    /// The identifier byte is outside `0xE0..=0xE9`.
    #[error("unrecognised query identifier {found:#04x}")]
    UnknownQueryId {
        /// Byte found in the identifier position.
        found: u8,
    },
}

impl EnvelopeRejection {
    /// Short label used in trace output.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::TooShort { .. } => "too_short",
            Self::BadFrameMarker { .. } => "bad_frame_marker",
            Self::NotQueryResponse { .. } => "not_query_response",
            Self::UnknownQueryId { .. } => "unknown_query_id",
        }
    }
}
