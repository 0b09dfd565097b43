//! Query identifiers carried in the fourth byte of a tank query response.

use std::fmt;

/// High nibble shared by every recognised query identifier byte.
const QUERY_ID_NIBBLE: u8 = 0xE;

/// Correlates a tank query with its (possibly multi-frame) response.
///
/// Identifiers travel on the wire as `0xE0`..=`0xE9` and are conventionally
/// written `E0`..`E9`. The low nibble doubles as the device index.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum QueryId {
    E0 = 0,
    E1 = 1,
    E2 = 2,
    E3 = 3,
    E4 = 4,
    E5 = 5,
    E6 = 6,
    E7 = 7,
    E8 = 8,
    E9 = 9,
}

impl QueryId {
    /// Every recognised identifier in device-index order.
    pub const ALL: [QueryId; 10] = [
        QueryId::E0,
        QueryId::E1,
        QueryId::E2,
        QueryId::E3,
        QueryId::E4,
        QueryId::E5,
        QueryId::E6,
        QueryId::E7,
        QueryId::E8,
        QueryId::E9,
    ];

    /// Decode an identifier from its wire byte.
    ///
    /// Returns `None` unless the high nibble is `0xE` and the low nibble is a
    /// decimal digit.
    ///
    /// # Examples
    ///
    /// ```
    /// use tanklink::QueryId;
    ///
    /// assert_eq!(QueryId::from_wire(0xE3), Some(QueryId::E3));
    /// assert_eq!(QueryId::from_wire(0xEA), None);
    /// assert_eq!(QueryId::from_wire(0xD3), None);
    /// ```
    #[must_use]
    pub const fn from_wire(byte: u8) -> Option<Self> {
        if byte >> 4 != QUERY_ID_NIBBLE {
            return None;
        }
        Self::from_index(byte & 0x0F)
    }

    /// Look up the identifier for a device index in `0..=9`.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index as usize >= Self::ALL.len() {
            return None;
        }
        Some(Self::ALL[index as usize])
    }

    /// Device index encoded by this identifier.
    #[must_use]
    pub const fn index(self) -> u8 { self as u8 }

    /// Byte used for this identifier on the wire.
    #[must_use]
    pub const fn wire_value(self) -> u8 { (QUERY_ID_NIBBLE << 4) | self.index() }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "E{}", self.index()) }
}

impl TryFrom<u8> for QueryId {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> { Self::from_wire(byte).ok_or(byte) }
}

impl From<QueryId> for u8 {
    fn from(value: QueryId) -> Self { value.wire_value() }
}
