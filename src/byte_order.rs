//! Helpers for explicit wire byte-order conversions.
//!
//! Command identifiers travel most significant byte first while cipher block
//! words travel least significant byte first. Keeping the conversions here
//! scopes the Clippy expectations to the places that need them.

/// Serialise a `u16` in network byte order (big-endian).
///
/// # Examples
///
/// ```
/// use tanklink::byte_order::write_be_u16;
///
/// assert_eq!(write_be_u16(0xE001), [0xE0, 0x01]);
/// ```
#[must_use]
pub fn write_be_u16(value: u16) -> [u8; 2] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Command identifiers are big-endian on the wire."
    )]
    value.to_be_bytes()
}

/// Parse a network-order `u16`.
///
/// # Examples
///
/// ```
/// use tanklink::byte_order::read_be_u16;
///
/// assert_eq!(read_be_u16([0xE0, 0x01]), 0xE001);
/// ```
#[must_use]
pub fn read_be_u16(bytes: [u8; 2]) -> u16 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Command identifiers are big-endian on the wire."
    )]
    u16::from_be_bytes(bytes)
}

/// Serialise a `u32` as little-endian bytes.
///
/// # Examples
///
/// ```
/// use tanklink::byte_order::write_le_u32;
///
/// assert_eq!(write_le_u32(0x1234_5678), [0x78, 0x56, 0x34, 0x12]);
/// ```
#[must_use]
pub fn write_le_u32(value: u32) -> [u8; 4] {
    #[expect(
        clippy::little_endian_bytes,
        reason = "Cipher block words are little-endian on the wire."
    )]
    value.to_le_bytes()
}

/// Parse a little-endian `u32`.
///
/// # Examples
///
/// ```
/// use tanklink::byte_order::read_le_u32;
///
/// assert_eq!(read_le_u32([0x78, 0x56, 0x34, 0x12]), 0x1234_5678);
/// ```
#[must_use]
pub fn read_le_u32(bytes: [u8; 4]) -> u32 {
    #[expect(
        clippy::little_endian_bytes,
        reason = "Cipher block words are little-endian on the wire."
    )]
    u32::from_le_bytes(bytes)
}
