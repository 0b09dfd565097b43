//! Stateful correlation of response fragments by query identifier.
//!
//! [`ResponseCorrelator`] owns one [`PendingAssembly`] per
//! [`QueryId`] and walks each identifier through
//! `Absent -> Collecting -> Complete`, where completion immediately evicts
//! the assembly again:
//!
//! - the first frame for an absent identifier opens an assembly;
//! - every frame appends its body in arrival order;
//! - the terminal frame hands the fragments to the
//!   [`assembler`](crate::assembler) and removes the entry.
//!
//! Delivery is assumed to be in order and lossless; the protocol carries no
//! sequence numbers to check either. Assemblies whose terminal frame never
//! arrives are purged after an inactivity window, and a payload cap bounds the
//! bytes any single assembly may hold.

mod config;
mod error;
mod pending;

use std::{
    collections::{HashMap, hash_map::Entry},
    time::Instant,
};

use log::warn;

pub use config::{CorrelatorConfig, DEFAULT_INACTIVITY_TIMEOUT, DEFAULT_MAX_PAYLOAD_SIZE};
pub use error::CorrelationError;
pub use pending::PendingAssembly;

use crate::{
    assembler::{self, AssembledPayload},
    envelope::{Envelope, QueryId},
    metrics::{self, DiscardReason},
};

/// Tracks in-flight responses for a single device connection.
///
/// # Examples
///
/// ```
/// use tanklink::{Envelope, QueryId, ResponseCorrelator};
///
/// let mut correlator = ResponseCorrelator::default();
///
/// let first = Envelope::parse(&[0x00, 0x45, 0x02, 0xE2, 0x11]).expect("valid frame");
/// assert!(correlator.ingest(first).expect("within budget").is_none());
/// assert!(correlator.is_pending(QueryId::E2));
///
/// let last = Envelope::parse(&[0x00, 0x0A, 0x02, 0xE2, 0x22]).expect("valid frame");
/// let payload = correlator
///     .ingest(last)
///     .expect("within budget")
///     .expect("terminal frame completes the response");
/// assert_eq!(payload.as_bytes(), &[0x02, 0xE2, 0x11, 0x02, 0xE2, 0x22]);
/// assert!(!correlator.is_pending(QueryId::E2));
/// ```
#[derive(Debug, Default)]
pub struct ResponseCorrelator {
    config: CorrelatorConfig,
    pending: HashMap<QueryId, PendingAssembly>,
}

impl ResponseCorrelator {
    /// Create a correlator with explicit limits.
    #[must_use]
    pub fn new(config: CorrelatorConfig) -> Self {
        Self {
            config,
            pending: HashMap::new(),
        }
    }

    /// Limits this correlator enforces.
    #[must_use]
    pub const fn config(&self) -> &CorrelatorConfig { &self.config }

    /// Route an envelope to its assembly using the current time.
    ///
    /// Returns `Ok(Some(payload))` when the envelope is the terminal frame
    /// for its identifier and `Ok(None)` while more fragments are expected.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError::PayloadTooLarge`] when the assembly would
    /// outgrow the configured cap. The assembly is discarded.
    pub fn ingest(
        &mut self,
        envelope: Envelope,
    ) -> Result<Option<AssembledPayload>, CorrelationError> {
        self.ingest_at(envelope, Instant::now())
    }

    /// Route an envelope to its assembly using an explicit clock reading.
    ///
    /// Idle assemblies are purged before the envelope is applied.
    ///
    /// # Errors
    ///
    /// See [`ingest`](Self::ingest).
    pub fn ingest_at(
        &mut self,
        envelope: Envelope,
        now: Instant,
    ) -> Result<Option<AssembledPayload>, CorrelationError> {
        self.purge_expired_at(now);

        let query_id = envelope.query_id();
        let response_type = envelope.response_type();
        let terminal = response_type.is_terminal();
        let body = envelope.into_body();
        let limit = self.config.max_payload_size;

        let mut entry = match self.pending.entry(query_id) {
            Entry::Occupied(occupied) => occupied,
            Entry::Vacant(vacant) => {
                tracing::debug!(%query_id, "collecting new response");
                metrics::inc_pending_assemblies();
                vacant.insert_entry(PendingAssembly::new(query_id, now))
            }
        };

        let attempted = entry.get().buffered_len().saturating_add(body.len());
        if attempted > limit.get() {
            entry.remove();
            metrics::dec_pending_assemblies(1);
            metrics::inc_assemblies_discarded(DiscardReason::TooLarge);
            warn!("discarding response {query_id}: {attempted} bytes exceeds limit of {limit}");
            return Err(CorrelationError::PayloadTooLarge {
                query_id,
                attempted,
                limit,
            });
        }

        entry.get_mut().push(response_type, body, now);
        if !terminal {
            return Ok(None);
        }

        let assembly = entry.remove();
        metrics::dec_pending_assemblies(1);
        metrics::inc_assemblies_completed();
        tracing::debug!(
            %query_id,
            fragments = assembly.fragment_count(),
            "response complete"
        );
        Ok(Some(assembler::assemble(&assembly)))
    }

    /// Remove assemblies that have been idle for the inactivity window.
    ///
    /// Returns the identifiers of evicted assemblies.
    pub fn purge_expired(&mut self) -> Vec<QueryId> { self.purge_expired_at(Instant::now()) }

    /// Remove idle assemblies using an explicit clock reading.
    ///
    /// Returns the identifiers of evicted assemblies.
    pub fn purge_expired_at(&mut self, now: Instant) -> Vec<QueryId> {
        let mut evicted = Vec::new();
        let timeout = self.config.inactivity_timeout;

        self.pending.retain(|query_id, assembly| {
            let idle = assembly.is_idle(now, timeout);
            if idle {
                warn!(
                    "discarding response {query_id} after {timeout:?} without a terminal frame ({} \
                     fragments buffered)",
                    assembly.fragment_count()
                );
                evicted.push(*query_id);
            }
            !idle
        });

        if !evicted.is_empty() {
            metrics::dec_pending_assemblies(evicted.len());
            for _ in &evicted {
                metrics::inc_assemblies_discarded(DiscardReason::Expired);
            }
        }
        evicted
    }

    /// Drop every in-flight assembly, for example when the connection closes.
    ///
    /// Returns the number of assemblies discarded.
    pub fn clear(&mut self) -> usize {
        let discarded = self.pending.len();
        self.pending.clear();
        metrics::dec_pending_assemblies(discarded);
        discarded
    }

    /// Whether an assembly is collecting for `query_id`.
    #[must_use]
    pub fn is_pending(&self, query_id: QueryId) -> bool { self.pending.contains_key(&query_id) }

    /// Number of fragments buffered for `query_id`, if collecting.
    #[must_use]
    pub fn pending_fragments(&self, query_id: QueryId) -> Option<usize> {
        self.pending
            .get(&query_id)
            .map(PendingAssembly::fragment_count)
    }

    /// Number of assemblies currently collecting.
    #[must_use]
    pub fn pending_count(&self) -> usize { self.pending.len() }

    /// Body bytes buffered across all collecting assemblies.
    #[must_use]
    pub fn total_buffered_bytes(&self) -> usize {
        self.pending
            .values()
            .map(PendingAssembly::buffered_len)
            .sum()
    }
}

impl Drop for ResponseCorrelator {
    fn drop(&mut self) { metrics::dec_pending_assemblies(self.pending.len()); }
}
