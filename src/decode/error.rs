//! Errors raised while decoding an assembled response.

use thiserror::Error;

use super::cobs::CobsError;
use crate::envelope::QueryId;

/// Reasons a completed response produced no reading.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The byte-stuffed stream was malformed.
    #[error("framing error: {0}")]
    Framing(#[from] CobsError),
    /// A message's trailing checksum did not match its contents.
    #[error("crc mismatch: expected {expected:#04x}, found {found:#04x}")]
    CrcMismatch {
        /// Checksum computed over the message.
        expected: u8,
        /// Checksum carried by the message.
        found: u8,
    },
    /// The payload carried no message data.
    #[error("payload carried no message")]
    Empty,
    /// A message was not a device command response.
    #[error("message is event {0:#04x}, not a command response")]
    NotCommandResponse(u8),
    /// A command response answered a different query.
    #[error("command {command_id:#06x} does not answer query {query_id}")]
    ForeignCommand {
        /// Query the response was correlated under.
        query_id: QueryId,
        /// Command identifier the message carried.
        command_id: u16,
    },
    /// The gateway reported the command as failed.
    #[error("command {command_id:#06x} failed with response type {response_type:#04x}")]
    CommandFailed {
        /// Command identifier the message carried.
        command_id: u16,
        /// Response type of the failing message.
        response_type: u8,
    },
    /// The last message did not close the exchange.
    #[error("response ended without a completed message")]
    Incomplete,
    /// The ciphertext is not a whole number of cipher blocks.
    #[error("ciphertext of {len} bytes is not a multiple of the block size")]
    Misaligned {
        /// Ciphertext length in bytes.
        len: usize,
    },
    /// A record is shorter than its layout requires.
    #[error("record too short: {len} bytes")]
    TooShort {
        /// Record length in bytes.
        len: usize,
    },
    /// The data names an event other than a tank status.
    #[error("unexpected event type {0:#04x}")]
    UnknownEvent(u8),
}
