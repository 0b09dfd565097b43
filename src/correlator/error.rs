//! Errors raised while correlating fragments.

use std::num::NonZeroUsize;

use thiserror::Error;

use crate::envelope::QueryId;

/// Errors produced by [`ResponseCorrelator::ingest`](super::ResponseCorrelator::ingest).
///
/// The offending assembly has already been discarded when one of these is
/// returned; the next frame for the identifier starts afresh.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CorrelationError {
    /// The assembly grew beyond the configured payload cap.
    #[error("response {query_id} exceeds size limit: {attempted} bytes > {limit} bytes")]
    PayloadTooLarge {
        /// Identifier of the discarded assembly.
        query_id: QueryId,
        /// Buffered size that triggered the guard.
        attempted: usize,
        /// Configured size cap.
        limit: NonZeroUsize,
    },
}
