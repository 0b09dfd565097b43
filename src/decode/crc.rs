//! CRC-8 trailer carried by every stuffed message.
//!
//! Reflected polynomial `0x31` with the register seeded to `0x55`. The `crc`
//! crate reflects `init` for reflected algorithms, hence `0xAA` below.

use crc::{Algorithm, Crc};

/// Parameters of the message checksum.
pub const CRC_8_TANKLINK: Algorithm<u8> = Algorithm {
    width: 8,
    poly: 0x31,
    init: 0xAA,
    refin: true,
    refout: true,
    xorout: 0x00,
    check: 0xC7,
    residue: 0x00,
};

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_TANKLINK);

/// Checksum of `data`.
///
/// # Examples
///
/// ```
/// use tanklink::decode::crc::checksum;
///
/// assert_eq!(checksum(b"123456789"), 0xC7);
/// ```
#[must_use]
pub fn checksum(data: &[u8]) -> u8 { CRC8.checksum(data) }

/// Append the checksum of `data` to a copy of it.
#[must_use]
pub fn with_checksum(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 1);
    out.extend_from_slice(data);
    out.push(checksum(data));
    out
}
