#![doc(html_root_url = "https://docs.rs/tanklink/latest")]
//! Public API for the `tanklink` library.
//!
//! Wireless RV gateways answer tank level queries with responses split
//! across several notifications. This crate validates each notification,
//! correlates fragments by query identifier, assembles completed responses,
//! and decodes them into [`DecodedReading`]s.
//!
//! Hosts normally drive a [`TankQueryDecoder`] per connection, or a
//! [`DecoderRegistry`] when several connections are bridged at once. The
//! lower layers ([`Envelope`], [`ResponseCorrelator`], [`assemble`], and
//! [`DecodePipeline`]) are public for hosts that need to compose them
//! differently.
//!
//! The crate performs no I/O and installs no logger. Diagnostics go through
//! the `log` and `tracing` facades, and counters through `metrics` when the
//! `metrics` feature is enabled.

pub mod assembler;
pub mod byte_order;
pub mod config;
pub mod correlator;
pub mod decode;
pub mod decoder;
pub mod envelope;
pub mod metrics;
pub mod session;

pub use assembler::{AssembledPayload, assemble};
pub use config::{ConfigError, DecoderConfig};
pub use correlator::{CorrelationError, CorrelatorConfig, PendingAssembly, ResponseCorrelator};
pub use decode::{DecodeError, DecodePipeline, DecodedReading, TankDecodePipeline};
pub use decoder::TankQueryDecoder;
pub use envelope::{Envelope, EnvelopeRejection, QueryId, ResponseType};
pub use metrics::{
    ASSEMBLIES_COMPLETED,
    ASSEMBLIES_DISCARDED,
    DECODE_FAILURES,
    FRAMES_TOTAL,
    PENDING_ASSEMBLIES,
    READINGS_TOTAL,
};
pub use session::{ConnectionId, DecoderRegistry};
