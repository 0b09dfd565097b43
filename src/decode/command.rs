//! Command responses carried by tank query notifications.
//!
//! Every message of a query response is a device command event:
//!
//! ```text
//! +------------+-------------------+---------------+------------------+
//! | event type | client command id | response type | extended data... |
//! | 0x02       | u16, big-endian   |               |                  |
//! +------------+-------------------+---------------+------------------+
//! ```
//!
//! The high byte of the command identifier is the query identifier the
//! envelope matched on. Responses without [`COMPLETED_FLAG`] carry the
//! response data; the completed response closes the exchange and carries a
//! short summary.

use super::DecodeError;
use crate::{
    byte_order::{read_be_u16, write_be_u16},
    envelope::{QUERY_RESPONSE_MARKER, QueryId},
};

/// Event type of a device command response.
pub const DEVICE_COMMAND_EVENT: u8 = QUERY_RESPONSE_MARKER;
/// Event type, command identifier and response type.
pub const COMMAND_HEADER_LEN: usize = 4;
/// Response type bit set on the last response to a command.
pub const COMPLETED_FLAG: u8 = 0x80;
/// Successful response with more to follow.
pub const SUCCESS_MULTIPLE: u8 = 0x01;
/// Failed response with more to follow.
pub const FAILURE_MULTIPLE: u8 = 0x02;
/// Successful final response.
pub const SUCCESS_COMPLETED: u8 = SUCCESS_MULTIPLE | COMPLETED_FLAG;
/// Failed final response.
pub const FAILURE_COMPLETED: u8 = FAILURE_MULTIPLE | COMPLETED_FLAG;

/// Low byte of the command identifier tank queries are sent under.
pub const QUERY_SEQUENCE: u8 = 0x01;

/// Client command identifier a response to `query_id` carries.
///
/// # Examples
///
/// ```
/// use tanklink::{QueryId, decode::command::query_command_id};
///
/// assert_eq!(query_command_id(QueryId::E0), 0xE001);
/// assert_eq!(query_command_id(QueryId::E9), 0xE901);
/// ```
#[must_use]
pub fn query_command_id(query_id: QueryId) -> u16 {
    read_be_u16([query_id.wire_value(), QUERY_SEQUENCE])
}

/// One decoded device command response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandResponse<'a> {
    /// Identifier the client chose when sending the command.
    pub command_id: u16,
    /// Success or failure, with [`COMPLETED_FLAG`] on the last response.
    pub response_type: u8,
    /// Bytes following the header.
    pub extended_data: &'a [u8],
}

impl<'a> CommandResponse<'a> {
    /// Parse a de-stuffed message with its checksum removed.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::TooShort`] for messages under
    /// [`COMMAND_HEADER_LEN`] bytes and [`DecodeError::NotCommandResponse`]
    /// for any other event.
    pub fn parse(message: &'a [u8]) -> Result<Self, DecodeError> {
        let [event_type, id_high, id_low, response_type, extended_data @ ..] = message else {
            return Err(DecodeError::TooShort { len: message.len() });
        };
        if *event_type != DEVICE_COMMAND_EVENT {
            return Err(DecodeError::NotCommandResponse(*event_type));
        }
        Ok(Self {
            command_id: read_be_u16([*id_high, *id_low]),
            response_type: *response_type,
            extended_data,
        })
    }

    /// Whether this response closes the exchange.
    #[must_use]
    pub const fn is_completed(&self) -> bool { self.response_type & COMPLETED_FLAG != 0 }

    /// Whether the gateway reported the command as failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.response_type & !COMPLETED_FLAG == FAILURE_MULTIPLE
    }

    /// Query identifier named by the command identifier's high byte.
    #[must_use]
    pub fn query_id(&self) -> Option<QueryId> {
        let [high, _] = write_be_u16(self.command_id);
        QueryId::from_wire(high)
    }

    /// Serialise the response, as the gateway would before stuffing.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let [high, low] = write_be_u16(self.command_id);
        let mut out = Vec::with_capacity(COMMAND_HEADER_LEN + self.extended_data.len());
        out.extend_from_slice(&[DEVICE_COMMAND_EVENT, high, low, self.response_type]);
        out.extend_from_slice(self.extended_data);
        out
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{
        CommandResponse,
        FAILURE_COMPLETED,
        FAILURE_MULTIPLE,
        SUCCESS_COMPLETED,
        SUCCESS_MULTIPLE,
    };
    use crate::{decode::DecodeError, envelope::QueryId};

    #[test]
    fn parses_header_and_extended_data() {
        let message = [0x02, 0xE0, 0x01, 0x81, 0xC8, 0x39, 0x66, 0xBE, 0x12];
        let response = CommandResponse::parse(&message).expect("command response");

        assert_eq!(response.command_id, 0xE001);
        assert_eq!(response.query_id(), Some(QueryId::E0));
        assert!(response.is_completed());
        assert!(!response.is_failure());
        assert_eq!(response.extended_data, &[0xC8, 0x39, 0x66, 0xBE, 0x12]);
        assert_eq!(response.to_bytes(), message);
    }

    #[rstest]
    #[case::success_multiple(SUCCESS_MULTIPLE, false, false)]
    #[case::success_completed(SUCCESS_COMPLETED, true, false)]
    #[case::failure_multiple(FAILURE_MULTIPLE, false, true)]
    #[case::failure_completed(FAILURE_COMPLETED, true, true)]
    fn response_type_flags(#[case] response_type: u8, #[case] completed: bool, #[case] failed: bool) {
        let response = CommandResponse {
            command_id: 0xE301,
            response_type,
            extended_data: &[],
        };
        assert_eq!(response.is_completed(), completed);
        assert_eq!(response.is_failure(), failed);
    }

    #[test]
    fn foreign_command_identifiers_name_no_query() {
        let response = CommandResponse {
            command_id: 0x0001,
            response_type: SUCCESS_MULTIPLE,
            extended_data: &[],
        };
        assert_eq!(response.query_id(), None);
    }

    #[rstest]
    #[case::empty(&[], DecodeError::TooShort { len: 0 })]
    #[case::header_cut(&[0x02, 0xE0, 0x01], DecodeError::TooShort { len: 3 })]
    #[case::other_event(&[0x1B, 0x01, 0x02, 0x30], DecodeError::NotCommandResponse(0x1B))]
    fn rejects_malformed_messages(#[case] message: &[u8], #[case] expected: DecodeError) {
        assert_eq!(CommandResponse::parse(message), Err(expected));
    }
}
