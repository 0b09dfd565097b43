//! Tank sensor status records.
//!
//! ```text
//! +------------+----------+-----------+-----------------+
//! | event type | table id | device id | status bytes... |
//! +------------+----------+-----------+-----------------+
//! ```
//!
//! The fill level sits in the low seven bits of the first status byte. A
//! version 1 record carries at least one status byte and a version 2 record
//! at least two.

use super::DecodeError;

/// Event type of a version 2 tank sensor status.
pub const TANK_SENSOR_STATUS_V2: u8 = 0x1B;
/// Event type of a version 1 tank sensor status.
pub const TANK_SENSOR_STATUS: u8 = 0x0C;
/// Smallest version 1 record.
pub const MIN_STATUS_V1_LEN: usize = 5;
/// Smallest version 2 record.
pub const MIN_STATUS_V2_LEN: usize = 6;
const LEVEL_MASK: u8 = 0x7F;
const MAX_LEVEL: u8 = 100;

/// Parsed tank status header and level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TankStatus {
    /// Which status layout the record uses.
    pub event_type: u8,
    /// Device table the sensor belongs to.
    pub table_id: u8,
    /// Device number reported by the sensor itself.
    pub device_id: u8,
    /// Fill level, 0 to 100.
    pub level_percent: u8,
}

/// Minimum record length for a tank status event type.
///
/// # Examples
///
/// ```
/// use tanklink::decode::tank_status::{TANK_SENSOR_STATUS_V2, min_len};
///
/// assert_eq!(min_len(TANK_SENSOR_STATUS_V2), Some(6));
/// assert_eq!(min_len(0x03), None);
/// ```
#[must_use]
pub const fn min_len(event_type: u8) -> Option<usize> {
    match event_type {
        TANK_SENSOR_STATUS => Some(MIN_STATUS_V1_LEN),
        TANK_SENSOR_STATUS_V2 => Some(MIN_STATUS_V2_LEN),
        _ => None,
    }
}

impl TankStatus {
    /// Parse a status record. Trailing padding is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownEvent`] when the event type is not a
    /// tank status and [`DecodeError::TooShort`] for records under
    /// [`min_len`] bytes.
    pub fn parse(record: &[u8]) -> Result<Self, DecodeError> {
        let Some(&event_type) = record.first() else {
            return Err(DecodeError::Empty);
        };
        let Some(min) = min_len(event_type) else {
            return Err(DecodeError::UnknownEvent(event_type));
        };
        let &[_, table_id, device_id, level, ..] = record else {
            return Err(DecodeError::TooShort { len: record.len() });
        };
        if record.len() < min {
            return Err(DecodeError::TooShort { len: record.len() });
        }
        Ok(Self {
            event_type,
            table_id,
            device_id,
            level_percent: (level & LEVEL_MASK).min(MAX_LEVEL),
        })
    }

    /// Serialise the record, as a sensor would, with zeroed status bytes
    /// after the level up to the minimum length for its event type.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![self.event_type, self.table_id, self.device_id, self.level_percent];
        let min = min_len(self.event_type).unwrap_or(out.len());
        out.resize(min.max(out.len()), 0);
        out
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{
        MIN_STATUS_V1_LEN,
        MIN_STATUS_V2_LEN,
        TANK_SENSOR_STATUS,
        TANK_SENSOR_STATUS_V2,
        TankStatus,
    };
    use crate::decode::DecodeError;

    #[rstest]
    #[case::v2(TANK_SENSOR_STATUS_V2)]
    #[case::v1(TANK_SENSOR_STATUS)]
    fn parses_status_events(#[case] event_type: u8) {
        let status = TankStatus::parse(&[event_type, 0x02, 0x05, 0x21, 0xFF, 0xFF])
            .expect("tank status");
        assert_eq!(
            status,
            TankStatus {
                event_type,
                table_id: 0x02,
                device_id: 0x05,
                level_percent: 33,
            }
        );
    }

    #[rstest]
    #[case::flag_bit_masked(0xB2, 50)]
    #[case::clamped(0x7F, 100)]
    #[case::full(100, 100)]
    #[case::empty_tank(0x00, 0)]
    fn level_is_masked_and_clamped(#[case] raw: u8, #[case] level: u8) {
        let status =
            TankStatus::parse(&[TANK_SENSOR_STATUS_V2, 1, 1, raw, 0, 0]).expect("tank status");
        assert_eq!(status.level_percent, level);
    }

    #[rstest]
    #[case::v2_header_only(&[TANK_SENSOR_STATUS_V2, 1, 1], 3)]
    #[case::v2_one_status_byte(&[TANK_SENSOR_STATUS_V2, 1, 1, 50, 0], 5)]
    #[case::v1_level_only(&[TANK_SENSOR_STATUS, 1, 1, 50], 4)]
    fn rejects_records_under_their_minimum(#[case] record: &[u8], #[case] len: usize) {
        assert_eq!(TankStatus::parse(record), Err(DecodeError::TooShort { len }));
    }

    #[rstest]
    #[case::v1(TANK_SENSOR_STATUS, MIN_STATUS_V1_LEN)]
    #[case::v2(TANK_SENSOR_STATUS_V2, MIN_STATUS_V2_LEN)]
    fn serialised_records_meet_their_minimum(#[case] event_type: u8, #[case] len: usize) {
        let status = TankStatus {
            event_type,
            table_id: 4,
            device_id: 1,
            level_percent: 12,
        };
        let bytes = status.to_bytes();

        assert_eq!(bytes.len(), len);
        assert_eq!(TankStatus::parse(&bytes), Ok(status));
    }

    #[test]
    fn rejects_other_events() {
        assert_eq!(
            TankStatus::parse(&[0x03, 1, 1, 50, 0, 0]),
            Err(DecodeError::UnknownEvent(0x03))
        );
    }

    #[test]
    fn rejects_empty_records() {
        assert_eq!(TankStatus::parse(&[]), Err(DecodeError::Empty));
    }
}
