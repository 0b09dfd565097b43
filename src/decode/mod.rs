//! Decoding of assembled responses into tank readings.
//!
//! [`DecodePipeline`] is the seam between correlation and decoding: the
//! decoder session hands every completed [`AssembledPayload`] to a pipeline
//! and never depends on a concrete implementation. [`TankDecodePipeline`] is
//! the production pipeline; tests substitute their own.
//!
//! The production stages are byte stuffing ([`cobs`]), the checksum trailer
//! ([`crc`]), the command response header ([`command`]), the optional
//! record cipher ([`tea`]), and the status record itself ([`tank_status`]).

pub mod cobs;
pub mod command;
pub mod crc;
mod error;
mod pipeline;
pub mod tank_status;
pub mod tea;

pub use error::DecodeError;
pub use pipeline::TankDecodePipeline;

use crate::{assembler::AssembledPayload, envelope::QueryId};

/// Tank level decoded from a completed response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecodedReading {
    /// Identifier of the response the reading came from.
    pub query_id: QueryId,
    /// Device table the sensor belongs to.
    pub table_id: u8,
    /// Sensor position derived from the query identifier.
    pub device_index: u8,
    /// Fill level, 0 to 100.
    pub level_percent: u8,
}

/// Turns an assembled payload into a reading.
pub trait DecodePipeline: Send + Sync {
    /// Decode the payload collected for `query_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] when the payload cannot be de-framed or
    /// parsed. Failures are never fatal to the session.
    fn decode(
        &self,
        query_id: QueryId,
        payload: &AssembledPayload,
    ) -> Result<DecodedReading, DecodeError>;
}

impl<P: DecodePipeline + ?Sized> DecodePipeline for Box<P> {
    fn decode(
        &self,
        query_id: QueryId,
        payload: &AssembledPayload,
    ) -> Result<DecodedReading, DecodeError> {
        (**self).decode(query_id, payload)
    }
}

impl<P: DecodePipeline + ?Sized> DecodePipeline for std::sync::Arc<P> {
    fn decode(
        &self,
        query_id: QueryId,
        payload: &AssembledPayload,
    ) -> Result<DecodedReading, DecodeError> {
        (**self).decode(query_id, payload)
    }
}
