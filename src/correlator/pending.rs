//! In-progress assembly for one query identifier.

use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::envelope::{QueryId, ResponseType};

/// Fragments collected so far for one query identifier.
///
/// Owned by the [`ResponseCorrelator`](super::ResponseCorrelator) while
/// collecting; handed to the [`assembler`](crate::assembler) once the
/// terminal frame arrives.
#[derive(Debug)]
pub struct PendingAssembly {
    query_id: QueryId,
    fragments: Vec<Bytes>,
    response_types: Vec<ResponseType>,
    buffered_len: usize,
    started_at: Instant,
    last_fragment_at: Instant,
}

impl PendingAssembly {
    pub(crate) fn new(query_id: QueryId, now: Instant) -> Self {
        Self {
            query_id,
            fragments: Vec::new(),
            response_types: Vec::new(),
            buffered_len: 0,
            started_at: now,
            last_fragment_at: now,
        }
    }

    pub(crate) fn push(&mut self, response_type: ResponseType, body: Bytes, now: Instant) {
        self.buffered_len = self.buffered_len.saturating_add(body.len());
        self.fragments.push(body);
        self.response_types.push(response_type);
        self.last_fragment_at = now;
    }

    pub(crate) fn is_idle(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_fragment_at) >= timeout
    }

    /// Identifier shared by every fragment in this assembly.
    #[must_use]
    pub const fn query_id(&self) -> QueryId { self.query_id }

    /// Fragment bodies in arrival order.
    #[must_use]
    pub fn fragments(&self) -> &[Bytes] { &self.fragments }

    /// Response type of each fragment, parallel to [`fragments`](Self::fragments).
    #[must_use]
    pub fn response_types(&self) -> &[ResponseType] { &self.response_types }

    /// Number of fragments collected.
    #[must_use]
    pub fn fragment_count(&self) -> usize { self.fragments.len() }

    /// Total body bytes collected.
    #[must_use]
    pub const fn buffered_len(&self) -> usize { self.buffered_len }

    /// When the first fragment arrived.
    #[must_use]
    pub const fn started_at(&self) -> Instant { self.started_at }

    /// When the most recent fragment arrived.
    #[must_use]
    pub const fn last_fragment_at(&self) -> Instant { self.last_fragment_at }
}
