//! Envelope parsing for tank query response notifications.
//!
//! Every notification that belongs to a tank query response starts with a
//! fixed four byte header:
//!
//! ```text
//! +--------+---------------+----------------+----------+------------
//! | 0x00   | response type | 0x02           | 0xE0-E9  | body ...
//! | marker |               | query response | query id |
//! +--------+---------------+----------------+----------+------------
//! ```
//!
//! The parser validates that header and produces an [`Envelope`]. Each
//! notification is one byte-stuffed message: the marker is its start-of-frame
//! separator and the response type is its first code byte, so the two
//! happen to read as a header. The marker and response type are stripped
//! from the body; the query-response marker and identifier stay at its head
//! (see [`QUERY_HEADER_LEN`]). The correlator keeps the response type beside
//! each body so the decode pipeline can undo the stuffing.

mod error;
mod query_id;

use bytes::Bytes;

pub use error::EnvelopeRejection;
pub use query_id::QueryId;

/// Marker byte opening every query response frame.
pub const FRAME_MARKER: u8 = 0x00;
/// Third header byte identifying a query response.
pub const QUERY_RESPONSE_MARKER: u8 = 0x02;
/// Full envelope header: marker, response type, query marker, identifier.
pub const ENVELOPE_HEADER_LEN: usize = 4;
/// Header bytes stripped from the frame when building a fragment body.
pub const ENVELOPE_PREFIX_LEN: usize = 2;
/// Header bytes left at the head of each fragment body.
pub const QUERY_HEADER_LEN: usize = ENVELOPE_HEADER_LEN - ENVELOPE_PREFIX_LEN;

/// Response type carried in the second header byte.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ResponseType(pub u8);

impl ResponseType {
    /// Response type marking the last frame of a response.
    pub const TERMINAL: ResponseType = ResponseType(0x0A);

    /// Whether no further fragments follow this frame.
    #[must_use]
    pub const fn is_terminal(self) -> bool { self.0 == Self::TERMINAL.0 }
}

impl From<u8> for ResponseType {
    fn from(value: u8) -> Self { Self(value) }
}

impl std::fmt::Display for ResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Validated, minimally parsed tank query response frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    query_id: QueryId,
    response_type: ResponseType,
    body: Bytes,
}

impl Envelope {
    /// Build an envelope from already validated parts.
    #[must_use]
    pub fn new(query_id: QueryId, response_type: ResponseType, body: impl Into<Bytes>) -> Self {
        Self {
            query_id,
            response_type,
            body: body.into(),
        }
    }

    /// Validate a raw notification and copy its body.
    ///
    /// Nothing is allocated for rejected frames.
    ///
    /// # Errors
    ///
    /// Returns an [`EnvelopeRejection`] when the frame is too short, carries
    /// the wrong marker bytes, or names an unknown query identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use tanklink::{Envelope, QueryId};
    ///
    /// let envelope = Envelope::parse(&[0x00, 0x0A, 0x02, 0xE1, 0x55]).expect("valid frame");
    /// assert_eq!(envelope.query_id(), QueryId::E1);
    /// assert!(envelope.is_terminal());
    /// assert_eq!(envelope.body(), &[0x02, 0xE1, 0x55]);
    /// ```
    pub fn parse(frame: &[u8]) -> Result<Self, EnvelopeRejection> {
        let (query_id, response_type) = validate_header(frame)?;
        let envelope = Self::new(
            query_id,
            response_type,
            Bytes::copy_from_slice(&frame[ENVELOPE_PREFIX_LEN..]),
        );
        envelope.observe(frame.len());
        Ok(envelope)
    }

    /// Validate a raw notification without copying its body.
    ///
    /// # Errors
    ///
    /// See [`Envelope::parse`].
    pub fn parse_bytes(frame: Bytes) -> Result<Self, EnvelopeRejection> {
        let (query_id, response_type) = validate_header(&frame)?;
        let len = frame.len();
        let envelope = Self::new(query_id, response_type, frame.slice(ENVELOPE_PREFIX_LEN..));
        envelope.observe(len);
        Ok(envelope)
    }

    fn observe(&self, frame_len: usize) {
        tracing::debug!(
            query_id = %self.query_id,
            response_type = %self.response_type,
            frame_len,
            "tank query response frame"
        );
    }

    /// Identifier correlating this frame with its query.
    #[must_use]
    pub const fn query_id(&self) -> QueryId { self.query_id }

    /// Response type from the second header byte.
    #[must_use]
    pub const fn response_type(&self) -> ResponseType { self.response_type }

    /// Whether this frame completes its response.
    #[must_use]
    pub const fn is_terminal(&self) -> bool { self.response_type.is_terminal() }

    /// Fragment body: the frame minus its marker and response-type bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] { &self.body }

    /// Consume the envelope, returning the body.
    #[must_use]
    pub fn into_body(self) -> Bytes { self.body }
}

/// Check the fixed header and extract the response type and identifier.
fn validate_header(frame: &[u8]) -> Result<(QueryId, ResponseType), EnvelopeRejection> {
    let &[marker, response_type, query_marker, query_byte, ..] = frame else {
        return Err(reject(EnvelopeRejection::TooShort { len: frame.len() }));
    };
    if marker != FRAME_MARKER {
        return Err(reject(EnvelopeRejection::BadFrameMarker { found: marker }));
    }
    if query_marker != QUERY_RESPONSE_MARKER {
        return Err(reject(EnvelopeRejection::NotQueryResponse {
            found: query_marker,
        }));
    }
    let Some(query_id) = QueryId::from_wire(query_byte) else {
        return Err(reject(EnvelopeRejection::UnknownQueryId { found: query_byte }));
    };
    Ok((query_id, ResponseType(response_type)))
}

fn reject(rejection: EnvelopeRejection) -> EnvelopeRejection {
    tracing::trace!(reason = rejection.reason(), "ignoring notification: {rejection}");
    rejection
}
