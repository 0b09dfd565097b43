//! Registry of decoder sessions for concurrent device connections.
//!
//! `DecoderRegistry` maps each [`ConnectionId`] to its own
//! [`TankQueryDecoder`], so hosts bridging several gateways can feed
//! notifications from any thread. Every connection keeps an isolated
//! identifier space: two gateways collecting `E3` at once never share
//! fragments.
use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};

use dashmap::DashMap;
use log::warn;

use crate::{
    correlator::CorrelatorConfig,
    decode::{DecodePipeline, DecodedReading},
    decoder::TankQueryDecoder,
};

/// Identifier assigned to a device connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl From<u64> for ConnectionId {
    fn from(value: u64) -> Self { Self(value) }
}

impl ConnectionId {
    /// Create a new [`ConnectionId`] with the provided value.
    #[must_use]
    pub fn new(id: u64) -> Self { Self(id) }

    /// Return the inner `u64` representation.
    #[must_use]
    pub fn as_u64(&self) -> u64 { self.0 }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConnectionId({})", self.0)
    }
}

/// Shared handle to one connection's decoder.
pub type SessionHandle<P> = Arc<Mutex<TankQueryDecoder<P>>>;

/// Concurrent registry of decoder sessions keyed by [`ConnectionId`].
#[derive(Debug)]
pub struct DecoderRegistry<P> {
    sessions: DashMap<ConnectionId, SessionHandle<P>>,
    config: CorrelatorConfig,
    pipeline: P,
}

impl<P: DecodePipeline + Clone> DecoderRegistry<P> {
    /// Create a registry whose sessions share `config` and clones of
    /// `pipeline`.
    #[must_use]
    pub fn new(config: CorrelatorConfig, pipeline: P) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
            pipeline,
        }
    }

    /// Start a session for a newly established connection.
    ///
    /// An existing session for `id` is replaced and its in-flight responses
    /// are discarded.
    pub fn open(&self, id: ConnectionId) -> SessionHandle<P> {
        let session = self.new_session();
        if self.sessions.insert(id, Arc::clone(&session)).is_some() {
            warn!("replacing decoder session for {id}");
        }
        session
    }

    fn new_session(&self) -> SessionHandle<P> {
        Arc::new(Mutex::new(TankQueryDecoder::new(
            self.config,
            self.pipeline.clone(),
        )))
    }

    /// Retrieve the session for `id`, if one is open.
    #[must_use]
    pub fn get(&self, id: &ConnectionId) -> Option<SessionHandle<P>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove the session for `id`, typically on connection teardown.
    ///
    /// Returns the number of responses that were still collecting.
    pub fn close(&self, id: &ConnectionId) -> Option<usize> {
        let (_, session) = self.sessions.remove(id)?;
        Some(lock_session(&session, *id).reset())
    }

    /// Feed one notification to the session for `id`, opening it if needed.
    pub fn process(&self, id: ConnectionId, frame: &[u8]) -> Option<DecodedReading> {
        self.process_at(id, frame, Instant::now())
    }

    /// Feed one notification using an explicit clock reading.
    pub fn process_at(
        &self,
        id: ConnectionId,
        frame: &[u8],
        now: Instant,
    ) -> Option<DecodedReading> {
        let session = Arc::clone(
            self.sessions
                .entry(id)
                .or_insert_with(|| self.new_session())
                .value(),
        );
        let mut decoder = lock_session(&session, id);
        decoder.process_notification_at(frame, now)
    }

    /// Purge idle responses in every session.
    ///
    /// Returns the number of responses discarded.
    pub fn purge_expired(&self) -> usize { self.purge_expired_at(Instant::now()) }

    /// Purge idle responses in every session using an explicit clock reading.
    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let sessions: Vec<(ConnectionId, SessionHandle<P>)> = self
            .sessions
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        sessions
            .iter()
            .map(|(id, session)| lock_session(session, *id).purge_expired_at(now).len())
            .sum()
    }

    /// IDs of the open sessions.
    #[must_use]
    pub fn active_ids(&self) -> Vec<ConnectionId> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }

    /// Number of open sessions.
    #[must_use]
    pub fn len(&self) -> usize { self.sessions.len() }

    /// Whether no sessions are open.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.sessions.is_empty() }
}

impl<P: DecodePipeline + Clone + Default> Default for DecoderRegistry<P> {
    fn default() -> Self { Self::new(CorrelatorConfig::default(), P::default()) }
}

/// Lock a session, recovering it if a previous holder panicked.
fn lock_session<P>(
    session: &Mutex<TankQueryDecoder<P>>,
    id: ConnectionId,
) -> MutexGuard<'_, TankQueryDecoder<P>> {
    session.lock().unwrap_or_else(|poisoned| {
        warn!("recovering poisoned decoder session for {id}");
        session.clear_poison();
        poisoned.into_inner()
    })
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::{ConnectionId, DecoderRegistry};
    use crate::{
        assembler::AssembledPayload,
        decode::{DecodeError, DecodePipeline, DecodedReading},
        envelope::QueryId,
    };

    #[derive(Clone, Debug, Default)]
    struct PayloadLength;

    impl DecodePipeline for PayloadLength {
        #[expect(clippy::cast_possible_truncation, reason = "test payloads are tiny")]
        fn decode(
            &self,
            query_id: QueryId,
            payload: &AssembledPayload,
        ) -> Result<DecodedReading, DecodeError> {
            Ok(DecodedReading {
                query_id,
                table_id: 0,
                device_index: query_id.index(),
                level_percent: payload.data_len() as u8,
            })
        }
    }

    #[fixture]
    fn registry() -> DecoderRegistry<PayloadLength> { DecoderRegistry::default() }

    #[rstest]
    fn connections_keep_separate_identifier_spaces(registry: DecoderRegistry<PayloadLength>) {
        let first = ConnectionId::new(1);
        let second = ConnectionId::new(2);

        assert!(
            registry
                .process(first, &[0x00, 0x45, 0x02, 0xE3, 1, 2, 3])
                .is_none()
        );
        assert!(registry.process(second, &[0x00, 0x45, 0x02, 0xE3, 9]).is_none());

        let reading = registry
            .process(second, &[0x00, 0x0A, 0x02, 0xE3, 9])
            .expect("second connection completes");
        assert_eq!(reading.level_percent, 2);

        let reading = registry
            .process(first, &[0x00, 0x0A, 0x02, 0xE3, 4])
            .expect("first connection completes");
        assert_eq!(reading.level_percent, 4);
    }

    #[rstest]
    fn close_reports_discarded_responses(registry: DecoderRegistry<PayloadLength>) {
        let id = ConnectionId::from(7);
        registry.process(id, &[0x00, 0x45, 0x02, 0xE0, 1]);
        registry.process(id, &[0x00, 0x45, 0x02, 0xE1, 1]);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.close(&id), Some(2));
        assert!(registry.is_empty());
        assert_eq!(registry.close(&id), None);
    }

    #[rstest]
    fn open_replaces_existing_session(registry: DecoderRegistry<PayloadLength>) {
        let id = ConnectionId::new(3);
        registry.process(id, &[0x00, 0x45, 0x02, 0xE5, 1]);

        let session = registry.open(id);
        assert_eq!(session.lock().expect("session").pending_count(), 0);
        assert_eq!(registry.active_ids(), vec![id]);
    }

    #[rstest]
    fn poisoned_session_is_recovered(registry: DecoderRegistry<PayloadLength>) {
        let id = ConnectionId::new(4);
        let session = registry.open(id);
        let poisoner = std::sync::Arc::clone(&session);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().expect("session");
            panic!("poison the session");
        })
        .join();
        assert!(session.is_poisoned());

        assert!(registry.process(id, &[0x00, 0x0A, 0x02, 0xE2, 1]).is_some());
        assert!(!session.is_poisoned());
    }

    #[rstest]
    fn debug_output_lists_open_sessions(registry: DecoderRegistry<PayloadLength>) {
        registry.process(ConnectionId::new(9), &[0x00, 0x45, 0x02, 0xE1, 1]);

        let rendered = format!("{registry:?}");
        assert!(rendered.starts_with("DecoderRegistry"));
        assert!(rendered.contains("ConnectionId(9)"));
        assert!(rendered.contains("PayloadLength"));
    }

    #[test]
    fn display_names_the_connection() {
        assert_eq!(ConnectionId::new(42).to_string(), "ConnectionId(42)");
        assert_eq!(ConnectionId::from(42).as_u64(), 42);
    }
}
