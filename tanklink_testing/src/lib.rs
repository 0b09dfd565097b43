//! Utilities for exercising [`tanklink`] decoder sessions in tests.
//!
//! These helpers build notification frames the way a gateway sends them,
//! provide stand-in decode pipelines, and serialise access to the global
//! log capture.
//!
//! ```rust
//! use tanklink::{QueryId, TankQueryDecoder};
//! use tanklink_testing::{FixedReading, response_frames};
//!
//! let mut decoder = TankQueryDecoder::new(Default::default(), FixedReading::level(40));
//! let readings: Vec<_> = response_frames(QueryId::E2, b"payload", 3)
//!     .iter()
//!     .filter_map(|frame| decoder.process_notification(frame))
//!     .collect();
//! assert_eq!(readings.len(), 1);
//! ```

pub mod frames;
pub mod logging;
pub mod pipelines;

pub use frames::{
    CLOSING_SUMMARY,
    CONTINUATION_RESPONSE,
    SAMPLE_TRACE,
    continuation_frame,
    hex_to_bytes,
    query_frame,
    response_frames,
    sample_trace,
    status_response_frames,
    terminal_frame,
};
pub use logging::{LoggerHandle, logger};
pub use pipelines::{FailingPipeline, FixedReading, RecordingPipeline};
