//! Stand-in decode pipelines.

use std::sync::{Arc, Mutex};

use tanklink::{AssembledPayload, DecodeError, DecodePipeline, DecodedReading, QueryId};

/// Pipeline that reports the same level for every completed response.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedReading {
    table_id: u8,
    level_percent: u8,
}

impl FixedReading {
    /// Report `level_percent` for every response.
    #[must_use]
    pub const fn level(level_percent: u8) -> Self {
        Self {
            table_id: 0,
            level_percent,
        }
    }

    /// Report readings from `table_id`.
    #[must_use]
    pub const fn with_table(mut self, table_id: u8) -> Self {
        self.table_id = table_id;
        self
    }
}

impl DecodePipeline for FixedReading {
    fn decode(
        &self,
        query_id: QueryId,
        _payload: &AssembledPayload,
    ) -> Result<DecodedReading, DecodeError> {
        Ok(DecodedReading {
            query_id,
            table_id: self.table_id,
            device_index: query_id.index(),
            level_percent: self.level_percent,
        })
    }
}

/// Pipeline that fails for every response.
#[derive(Clone, Debug)]
pub struct FailingPipeline(pub DecodeError);

impl Default for FailingPipeline {
    fn default() -> Self { Self(DecodeError::Empty) }
}

impl DecodePipeline for FailingPipeline {
    fn decode(
        &self,
        _query_id: QueryId,
        _payload: &AssembledPayload,
    ) -> Result<DecodedReading, DecodeError> {
        Err(self.0.clone())
    }
}

/// Pipeline that records every payload before delegating.
///
/// Clones share one record, so a registry's sessions all report into the
/// same log.
#[derive(Clone, Debug, Default)]
pub struct RecordingPipeline<P = FixedReading> {
    inner: P,
    seen: Arc<Mutex<Vec<AssembledPayload>>>,
}

impl<P: DecodePipeline> RecordingPipeline<P> {
    /// Record payloads, then decode them with `inner`.
    #[must_use]
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            seen: Arc::default(),
        }
    }

    /// Payloads received so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if a decoding thread panicked while recording.
    #[must_use]
    pub fn payloads(&self) -> Vec<AssembledPayload> {
        self.seen.lock().expect("payload record poisoned").clone()
    }
}

impl<P: DecodePipeline> DecodePipeline for RecordingPipeline<P> {
    fn decode(
        &self,
        query_id: QueryId,
        payload: &AssembledPayload,
    ) -> Result<DecodedReading, DecodeError> {
        self.seen
            .lock()
            .expect("payload record poisoned")
            .push(payload.clone());
        self.inner.decode(query_id, payload)
    }
}
