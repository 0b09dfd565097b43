//! Limits applied to in-flight response assemblies.

use std::{num::NonZeroUsize, time::Duration};

/// Default inactivity window before a collecting assembly is discarded.
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default cap on the buffered bytes of a single assembly.
pub const DEFAULT_MAX_PAYLOAD_SIZE: NonZeroUsize = match NonZeroUsize::new(4 * 1024) {
    Some(size) => size,
    None => unreachable!(),
};

/// Settings that bound the memory held by a [`ResponseCorrelator`](super::ResponseCorrelator).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CorrelatorConfig {
    /// Assemblies that receive no fragment for this long are purged. Never
    /// zero when built through [`CorrelatorConfig::new`].
    pub inactivity_timeout: Duration,
    /// Hard cap on the concatenated fragment bodies of one assembly.
    pub max_payload_size: NonZeroUsize,
}

impl CorrelatorConfig {
    /// Create a configuration with explicit limits.
    ///
    /// # Panics
    ///
    /// Panics if `inactivity_timeout` is zero.
    #[must_use]
    pub const fn new(inactivity_timeout: Duration, max_payload_size: NonZeroUsize) -> Self {
        assert!(!inactivity_timeout.is_zero(), "inactivity timeout must be positive");
        Self {
            inactivity_timeout,
            max_payload_size,
        }
    }
}

impl Default for CorrelatorConfig {
    fn default() -> Self { Self::new(DEFAULT_INACTIVITY_TIMEOUT, DEFAULT_MAX_PAYLOAD_SIZE) }
}
