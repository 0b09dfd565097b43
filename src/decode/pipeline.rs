//! Production decode pipeline for tank query responses.

use super::{
    DecodeError,
    DecodePipeline,
    DecodedReading,
    cobs,
    command::CommandResponse,
    crc,
    tank_status::TankStatus,
    tea::{BLOCK_LEN, TeaKey},
};
use crate::{assembler::AssembledPayload, envelope::QueryId};

/// De-stuffs, verifies, and parses a tank status response.
///
/// Each fragment is one stuffed command response. The data messages are
/// concatenated, decrypted when a device key is configured, and parsed as a
/// tank status record. The completed message that closes the exchange only
/// carries a summary.
///
/// # Examples
///
/// ```
/// use tanklink::{AssembledPayload, DecodePipeline, Envelope, QueryId, TankDecodePipeline};
/// use tanklink::decode::{
///     command::{CommandResponse, SUCCESS_COMPLETED, SUCCESS_MULTIPLE},
///     tank_status::{TANK_SENSOR_STATUS_V2, TankStatus},
/// };
///
/// let pipeline = TankDecodePipeline::default();
/// let status = TankStatus {
///     event_type: TANK_SENSOR_STATUS_V2,
///     table_id: 2,
///     device_id: 4,
///     level_percent: 75,
/// };
/// let record = pipeline.encode_status(&status);
/// let frames: Vec<Envelope> = [
///     (SUCCESS_MULTIPLE, record.as_slice()),
///     (SUCCESS_COMPLETED, &[0x11, 0x22][..]),
/// ]
/// .into_iter()
/// .map(|(response_type, extended_data)| CommandResponse {
///     command_id: 0xE401,
///     response_type,
///     extended_data,
/// })
/// .map(|response| pipeline.encode_message(&response.to_bytes()))
/// .map(|frame| Envelope::parse(&frame).expect("query response frame"))
/// .collect();
/// let payload = AssembledPayload::from_fragments(
///     QueryId::E4,
///     frames.iter().map(|envelope| (envelope.response_type(), envelope.body())),
/// );
///
/// let reading = pipeline.decode(QueryId::E4, &payload).expect("valid response");
/// assert_eq!(reading.level_percent, 75);
/// assert_eq!(reading.device_index, 4);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TankDecodePipeline {
    key: Option<TeaKey>,
    verify_crc: bool,
}

impl TankDecodePipeline {
    /// Create a pipeline. Records are read as plaintext unless a device key
    /// is given.
    #[must_use]
    pub const fn new(key: Option<TeaKey>, verify_crc: bool) -> Self { Self { key, verify_crc } }

    /// Cipher key used to decrypt status records, if any.
    #[must_use]
    pub const fn key(&self) -> Option<TeaKey> { self.key }

    /// Whether message checksums are verified.
    #[must_use]
    pub const fn verifies_crc(&self) -> bool { self.verify_crc }

    /// Stuff one message as the gateway sends it: a start-of-frame
    /// separator, then the message with its checksum trailer when checksums
    /// are enabled.
    #[must_use]
    pub fn encode_message(&self, message: &[u8]) -> Vec<u8> {
        let message = if self.verify_crc {
            crc::with_checksum(message)
        } else {
            message.to_vec()
        };
        let mut out = vec![cobs::FRAME_CHAR];
        out.extend(cobs::encode(&message));
        out
    }

    /// Status record as this pipeline expects to receive it. With a device
    /// key the record is zero padded to whole cipher blocks and encrypted.
    #[must_use]
    pub fn encode_status(&self, status: &TankStatus) -> Vec<u8> {
        let mut record = status.to_bytes();
        if let Some(key) = self.key {
            record.resize(record.len().next_multiple_of(BLOCK_LEN), 0);
            let (blocks, _) = record.as_chunks_mut::<BLOCK_LEN>();
            for block in blocks {
                key.encrypt_block(block);
            }
        }
        record
    }

    /// Strip and check the checksum trailer.
    fn verified(&self, mut message: Vec<u8>) -> Result<Vec<u8>, DecodeError> {
        if !self.verify_crc {
            return Ok(message);
        }
        let Some(found) = message.pop() else {
            return Err(DecodeError::Empty);
        };
        let expected = crc::checksum(&message);
        if expected != found {
            return Err(DecodeError::CrcMismatch { expected, found });
        }
        Ok(message)
    }

    /// Destuff and verify every fragment.
    fn messages(&self, payload: &AssembledPayload) -> Result<Vec<Vec<u8>>, DecodeError> {
        let mut messages = Vec::with_capacity(payload.fragment_count());
        for stuffed in payload.stuffed_fragments() {
            for message in cobs::decode_all(&stuffed)? {
                messages.push(self.verified(message)?);
            }
        }
        Ok(messages)
    }
}

/// Parse a message and check it answers `query_id` successfully.
fn response_for(query_id: QueryId, message: &[u8]) -> Result<CommandResponse<'_>, DecodeError> {
    let response = CommandResponse::parse(message)?;
    if response.query_id() != Some(query_id) {
        return Err(DecodeError::ForeignCommand {
            query_id,
            command_id: response.command_id,
        });
    }
    if response.is_failure() {
        return Err(DecodeError::CommandFailed {
            command_id: response.command_id,
            response_type: response.response_type,
        });
    }
    Ok(response)
}

impl Default for TankDecodePipeline {
    fn default() -> Self { Self::new(None, true) }
}

impl DecodePipeline for TankDecodePipeline {
    fn decode(
        &self,
        query_id: QueryId,
        payload: &AssembledPayload,
    ) -> Result<DecodedReading, DecodeError> {
        let messages = self.messages(payload)?;
        let Some((closing, data_messages)) = messages.split_last() else {
            return Err(DecodeError::Empty);
        };
        let summary = response_for(query_id, closing)?;
        if !summary.is_completed() {
            return Err(DecodeError::Incomplete);
        }

        let mut data = Vec::new();
        for message in data_messages {
            data.extend_from_slice(response_for(query_id, message)?.extended_data);
        }
        tracing::debug!(
            %query_id,
            messages = messages.len(),
            summary_len = summary.extended_data.len(),
            data_len = data.len(),
            "command response verified"
        );
        if data.is_empty() {
            return Err(DecodeError::Empty);
        }
        if let Some(key) = self.key {
            key.decrypt(&mut data)
                .map_err(|len| DecodeError::Misaligned { len })?;
        }

        let status = TankStatus::parse(&data)?;
        let device_index = query_id.index();
        if status.device_id != device_index {
            tracing::debug!(
                %query_id,
                device_id = status.device_id,
                "status device id differs from query device index"
            );
        }
        tracing::debug!(
            %query_id,
            table_id = status.table_id,
            level_percent = status.level_percent,
            "decoded tank status"
        );
        Ok(DecodedReading {
            query_id,
            table_id: status.table_id,
            device_index,
            level_percent: status.level_percent,
        })
    }
}
