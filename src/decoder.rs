//! Per-connection decoding of tank query notifications.
//!
//! [`TankQueryDecoder`] is the session object a host creates for each device
//! connection. It chains the envelope parser, the response correlator, and a
//! [`DecodePipeline`], turning every notification into zero or one
//! [`DecodedReading`]. Nothing that arrives on the wire can stop it from
//! processing the next notification.

use std::time::Instant;

use bytes::Bytes;
use log::warn;

use crate::{
    config::DecoderConfig,
    correlator::{CorrelatorConfig, ResponseCorrelator},
    decode::{DecodePipeline, DecodedReading, TankDecodePipeline},
    envelope::{Envelope, EnvelopeRejection, QueryId},
    metrics::{self, FrameOutcome},
};

/// Decoder session for one device connection.
///
/// # Examples
///
/// ```
/// use tanklink::{AssembledPayload, DecodeError, DecodePipeline, DecodedReading, QueryId};
/// use tanklink::{CorrelatorConfig, TankQueryDecoder};
///
/// struct FixedLevel;
///
/// impl DecodePipeline for FixedLevel {
///     fn decode(
///         &self,
///         query_id: QueryId,
///         _payload: &AssembledPayload,
///     ) -> Result<DecodedReading, DecodeError> {
///         Ok(DecodedReading {
///             query_id,
///             table_id: 1,
///             device_index: query_id.index(),
///             level_percent: 50,
///         })
///     }
/// }
///
/// let mut decoder = TankQueryDecoder::new(CorrelatorConfig::default(), FixedLevel);
/// assert!(decoder.process_notification(&[0x00, 0x45, 0x02, 0xE0, 0x01]).is_none());
/// let reading = decoder
///     .process_notification(&[0x00, 0x0A, 0x02, 0xE0, 0x02])
///     .expect("terminal frame yields a reading");
/// assert_eq!(reading.level_percent, 50);
/// assert!(!decoder.is_pending(QueryId::E0));
/// ```
#[derive(Debug)]
pub struct TankQueryDecoder<P> {
    correlator: ResponseCorrelator,
    pipeline: P,
}

impl TankQueryDecoder<TankDecodePipeline> {
    /// Build a session with the production pipeline from validated settings.
    #[must_use]
    pub fn from_config(config: &DecoderConfig) -> Self {
        Self::new(config.correlator_config(), config.pipeline())
    }
}

impl Default for TankQueryDecoder<TankDecodePipeline> {
    fn default() -> Self { Self::new(CorrelatorConfig::default(), TankDecodePipeline::default()) }
}

impl<P: DecodePipeline> TankQueryDecoder<P> {
    /// Create a session around `pipeline`.
    #[must_use]
    pub fn new(config: CorrelatorConfig, pipeline: P) -> Self {
        Self {
            correlator: ResponseCorrelator::new(config),
            pipeline,
        }
    }

    /// Handle one raw notification using the current time.
    pub fn process_notification(&mut self, frame: &[u8]) -> Option<DecodedReading> {
        self.process_notification_at(frame, Instant::now())
    }

    /// Handle one raw notification using an explicit clock reading.
    ///
    /// Returns a reading only when the frame completes a response that
    /// decodes successfully.
    pub fn process_notification_at(
        &mut self,
        frame: &[u8],
        now: Instant,
    ) -> Option<DecodedReading> {
        self.process_envelope(Envelope::parse(frame), now)
    }

    /// Handle one notification already held in a [`Bytes`] buffer.
    ///
    /// Fragment bodies share the buffer instead of being copied.
    pub fn process_bytes(&mut self, frame: Bytes) -> Option<DecodedReading> {
        self.process_envelope(Envelope::parse_bytes(frame), Instant::now())
    }

    fn process_envelope(
        &mut self,
        parsed: Result<Envelope, EnvelopeRejection>,
        now: Instant,
    ) -> Option<DecodedReading> {
        let Ok(envelope) = parsed else {
            metrics::inc_frames(FrameOutcome::Rejected);
            return None;
        };
        metrics::inc_frames(FrameOutcome::Accepted);

        let payload = match self.correlator.ingest_at(envelope, now) {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(error) => {
                warn!("dropping response: {error}");
                return None;
            }
        };

        let query_id = payload.query_id();
        match self.pipeline.decode(query_id, &payload) {
            Ok(reading) => {
                metrics::inc_readings();
                tracing::debug!(
                    %query_id,
                    table_id = reading.table_id,
                    device_index = reading.device_index,
                    level_percent = reading.level_percent,
                    "tank reading decoded"
                );
                Some(reading)
            }
            Err(error) => {
                metrics::inc_decode_failures();
                warn!(
                    "failed to decode response {query_id} ({} bytes in {} fragments): {error}",
                    payload.len(),
                    payload.fragment_count()
                );
                None
            }
        }
    }

    /// Discard assemblies idle past the inactivity window.
    pub fn purge_expired(&mut self) -> Vec<QueryId> { self.correlator.purge_expired() }

    /// Discard idle assemblies using an explicit clock reading.
    pub fn purge_expired_at(&mut self, now: Instant) -> Vec<QueryId> {
        self.correlator.purge_expired_at(now)
    }

    /// Number of responses still collecting.
    #[must_use]
    pub fn pending_count(&self) -> usize { self.correlator.pending_count() }

    /// Whether a response is collecting for `query_id`.
    #[must_use]
    pub fn is_pending(&self, query_id: QueryId) -> bool { self.correlator.is_pending(query_id) }

    /// Drop every collecting response, returning how many were discarded.
    pub fn reset(&mut self) -> usize { self.correlator.clear() }

    /// Underlying correlator, for inspection.
    #[must_use]
    pub const fn correlator(&self) -> &ResponseCorrelator { &self.correlator }

    /// Pipeline completed responses are handed to.
    #[must_use]
    pub const fn pipeline(&self) -> &P { &self.pipeline }
}
