//! Consistent overhead byte stuffing as spoken by the device.
//!
//! Messages are separated by [`FRAME_CHAR`]. Each block opens with a code
//! byte: the low six bits count the literal bytes that follow (at most 63)
//! and every multiple of 64 above that appends one zero once the literals
//! are consumed (at most three). Unlike textbook COBS, no implicit zero
//! closes a block.

use thiserror::Error;

/// Byte separating encoded messages.
pub const FRAME_CHAR: u8 = 0x00;
/// Largest literal run a single code byte can announce.
pub const MAX_DATA_BYTES: u8 = 0x3F;
/// Code byte increment announcing one trailing zero.
const ZERO_STEP: u8 = 0x40;
/// Code bytes at or above this value cannot announce another zero.
const MAX_ZERO_CODE: u8 = 0xC0;

/// Malformed byte-stuffed input.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum CobsError {
    /// A separator arrived before the current block was consumed.
    #[error("message ended with {remaining} stuffed bytes outstanding")]
    Truncated {
        /// Literal bytes the code byte still announced.
        remaining: u8,
    },
    /// Input ended without a closing separator.
    #[error("stream ended inside a message ({buffered} bytes buffered)")]
    Unterminated {
        /// Decoded bytes waiting for the separator.
        buffered: usize,
    },
}

/// Incremental decoder fed one byte at a time.
#[derive(Debug, Default)]
pub struct CobsDecoder {
    code: u8,
    message: Vec<u8>,
}

impl CobsDecoder {
    /// Create an idle decoder.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Feed one byte, returning a message when a separator completes one.
    ///
    /// Empty messages, such as the start-of-frame separator some senders
    /// emit, yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`CobsError::Truncated`] when a separator interrupts a block.
    /// The decoder is reset and ready for the next message.
    pub fn push(&mut self, byte: u8) -> Result<Option<Vec<u8>>, CobsError> {
        if byte == FRAME_CHAR {
            let remaining = std::mem::take(&mut self.code);
            let message = std::mem::take(&mut self.message);
            if remaining != 0 {
                return Err(CobsError::Truncated { remaining });
            }
            return Ok((!message.is_empty()).then_some(message));
        }

        if self.code == 0 {
            self.code = byte;
        } else {
            self.code -= 1;
            self.message.push(byte);
        }
        while self.code != 0 && self.code & MAX_DATA_BYTES == 0 {
            self.message.push(FRAME_CHAR);
            self.code -= ZERO_STEP;
        }
        Ok(None)
    }

    /// Whether no partial message is buffered.
    #[must_use]
    pub fn is_idle(&self) -> bool { self.code == 0 && self.message.is_empty() }
}

/// Decode every message in `input`.
///
/// # Errors
///
/// Returns a [`CobsError`] if a block is truncated or the input does not end
/// with a separator.
///
/// # Examples
///
/// ```
/// use tanklink::decode::cobs::{decode_all, encode};
///
/// let mut stream = encode(&[0x11, 0x00, 0x22]);
/// stream.extend(encode(&[0x33]));
/// assert_eq!(decode_all(&stream), Ok(vec![vec![0x11, 0x00, 0x22], vec![0x33]]));
/// ```
pub fn decode_all(input: &[u8]) -> Result<Vec<Vec<u8>>, CobsError> {
    let mut decoder = CobsDecoder::new();
    let mut messages = Vec::new();
    for &byte in input {
        if let Some(message) = decoder.push(byte)? {
            messages.push(message);
        }
    }
    if !decoder.is_idle() {
        return Err(CobsError::Unterminated {
            buffered: decoder.message.len(),
        });
    }
    Ok(messages)
}

/// Encode one message and append the closing separator.
#[must_use]
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / usize::from(MAX_DATA_BYTES) + 2);
    let mut rest = data;
    while !rest.is_empty() {
        let code_at = out.len();
        out.push(FRAME_CHAR);
        let mut code = 0_u8;
        while let Some((&byte, tail)) = rest.split_first()
            && byte != FRAME_CHAR
            && code < MAX_DATA_BYTES
        {
            out.push(byte);
            code += 1;
            rest = tail;
        }
        while let Some((&FRAME_CHAR, tail)) = rest.split_first()
            && code < MAX_ZERO_CODE
        {
            code += ZERO_STEP;
            rest = tail;
        }
        out[code_at] = code;
    }
    out.push(FRAME_CHAR);
    out
}
