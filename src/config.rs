//! Deserialisable settings for decoder sessions.
//!
//! [`DecoderConfig`] is the plain-data form hosts load from their own
//! configuration files. [`DecoderConfig::validate`] checks it and the
//! conversion helpers produce the typed [`CorrelatorConfig`] and
//! [`TankDecodePipeline`].

use std::{num::NonZeroUsize, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    correlator::{CorrelatorConfig, DEFAULT_INACTIVITY_TIMEOUT, DEFAULT_MAX_PAYLOAD_SIZE},
    decode::{TankDecodePipeline, tea::TeaKey},
};

/// Invalid decoder settings.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_payload_size` must allow at least one byte.
    #[error("max_payload_size must be greater than zero")]
    ZeroPayloadSize,
    /// `inactivity_timeout_ms` must be positive.
    #[error("inactivity_timeout_ms must be greater than zero")]
    ZeroInactivityTimeout,
}

/// Settings for one decoder session.
///
/// # Examples
///
/// ```
/// use tanklink::DecoderConfig;
///
/// let config = DecoderConfig {
///     max_payload_size: 512,
///     ..DecoderConfig::default()
/// };
/// config.validate().expect("valid settings");
/// assert_eq!(config.correlator_config().max_payload_size.get(), 512);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Milliseconds without a fragment before a response is abandoned.
    pub inactivity_timeout_ms: u64,
    /// Largest number of body bytes one response may buffer.
    pub max_payload_size: usize,
    /// Cipher key for encrypted status records. Records are plaintext when
    /// unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_key: Option<TeaKey>,
    /// Whether message checksums are verified.
    pub verify_crc: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_ms: default_inactivity_timeout_ms(),
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE.get(),
            device_key: None,
            verify_crc: true,
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "the default timeout is a few seconds"
)]
fn default_inactivity_timeout_ms() -> u64 { DEFAULT_INACTIVITY_TIMEOUT.as_millis() as u64 }

impl DecoderConfig {
    /// Check the settings.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a limit is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_payload_size == 0 {
            return Err(ConfigError::ZeroPayloadSize);
        }
        if self.inactivity_timeout_ms == 0 {
            return Err(ConfigError::ZeroInactivityTimeout);
        }
        Ok(())
    }

    /// Correlator limits described by these settings.
    ///
    /// Zero limits fall back to their defaults; call
    /// [`validate`](Self::validate) to reject them instead.
    #[must_use]
    pub fn correlator_config(&self) -> CorrelatorConfig {
        let inactivity_timeout = match self.inactivity_timeout_ms {
            0 => DEFAULT_INACTIVITY_TIMEOUT,
            ms => Duration::from_millis(ms),
        };
        CorrelatorConfig::new(
            inactivity_timeout,
            NonZeroUsize::new(self.max_payload_size).unwrap_or(DEFAULT_MAX_PAYLOAD_SIZE),
        )
    }

    /// Decode pipeline described by these settings.
    #[must_use]
    pub fn pipeline(&self) -> TankDecodePipeline {
        TankDecodePipeline::new(self.device_key, self.verify_crc)
    }
}

impl TryFrom<&DecoderConfig> for CorrelatorConfig {
    type Error = ConfigError;

    fn try_from(config: &DecoderConfig) -> Result<Self, Self::Error> {
        config.validate()?;
        Ok(config.correlator_config())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::rstest;

    use super::{ConfigError, DecoderConfig};
    use crate::{correlator::CorrelatorConfig, decode::tea::TeaKey};

    #[test]
    fn defaults_match_correlator_defaults() {
        let config = DecoderConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.correlator_config(), CorrelatorConfig::default());
        assert_eq!(config.pipeline().key(), None);
        assert!(config.pipeline().verifies_crc());
    }

    #[rstest]
    #[case::zero_payload(DecoderConfig { max_payload_size: 0, ..DecoderConfig::default() }, ConfigError::ZeroPayloadSize)]
    #[case::zero_timeout(DecoderConfig { inactivity_timeout_ms: 0, ..DecoderConfig::default() }, ConfigError::ZeroInactivityTimeout)]
    fn rejects_zero_limits(#[case] config: DecoderConfig, #[case] expected: ConfigError) {
        assert_eq!(config.validate(), Err(expected));
        assert_eq!(CorrelatorConfig::try_from(&config), Err(expected));
        assert_eq!(config.correlator_config(), CorrelatorConfig::default());
    }

    #[test]
    fn converts_custom_limits() {
        let config = DecoderConfig {
            inactivity_timeout_ms: 250,
            max_payload_size: 64,
            device_key: Some(TeaKey([1, 2, 3, 4])),
            verify_crc: false,
        };
        let correlator = CorrelatorConfig::try_from(&config).expect("valid settings");

        assert_eq!(correlator.inactivity_timeout, Duration::from_millis(250));
        assert_eq!(correlator.max_payload_size.get(), 64);
        assert_eq!(config.pipeline().key(), Some(TeaKey([1, 2, 3, 4])));
        assert!(!config.pipeline().verifies_crc());
    }
}
