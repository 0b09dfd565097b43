//! Builders for gateway notification frames.

use tanklink::{
    QueryId,
    ResponseType,
    TankDecodePipeline,
    decode::{
        command::{CommandResponse, SUCCESS_COMPLETED, SUCCESS_MULTIPLE, query_command_id},
        tank_status::TankStatus,
    },
    envelope::{FRAME_MARKER, QUERY_RESPONSE_MARKER},
};

/// Response type the gateway uses for non-final fragments in captured traces.
pub const CONTINUATION_RESPONSE: ResponseType = ResponseType(0x4B);

/// Captured `E0` response to a device list command, in plaintext.
///
/// Each frame is one stuffed command response with a checksum trailer. The
/// first five are data messages; the last is the completed message whose
/// stuffed form opens with the terminal response type.
pub const SAMPLE_TRACE: [&str; 6] = [
    "00 45 02 E0 01 01 01 42 04 01 83 02 0A 21 C1 78 86 1E E5 68 02 0A 27 C1 91 47 1E D3 E6 02 \
     0A 21 02 C1 91 04 1E D3 E6 51 00",
    "00 4B 02 E0 01 01 01 04 04 02 0A 21 01 C1 91 47 1E D3 E6 02 0A 1E 04 C1 91 47 1E D3 E6 02 \
     0A 1E 03 C1 91 47 1E D3 E6 02 0A 1E 02 C1 91 04 1E D3 E6 65 00",
    "00 4B 02 E0 01 01 01 08 04 02 0A 1E 01 C1 91 86 1E D3 E6 02 0A 21 C1 79 86 1E CB BC 02 0A \
     28 C1 97 47 1E 80 C4 02 0A 21 01 C1 97 04 1E 80 C4 3E 00",
    "00 8A 02 E0 01 01 01 0C 04 02 0A 21 C1 77 47 1E 24 20 02 0A 0A 05 C1 0B 47 01 EC F7 02 0A \
     0A 04 C1 0B 47 01 EC F7 02 0A 0A 03 C1 0B 04 01 EC F7 22 00",
    "00 4B 02 E0 01 01 01 10 02 02 0A 0A 02 C1 0B 47 01 EC F7 02 0A 0A 01 C1 0B 04 01 EC F7 20 \
     00",
    "00 0A 02 E0 01 81 C8 39 66 BE 12 E8 00",
];

/// Parse whitespace-separated hex into bytes.
///
/// # Panics
///
/// Panics on malformed hex; inputs are test fixtures.
#[must_use]
pub fn hex_to_bytes(hex: &str) -> Vec<u8> {
    let digits: Vec<u8> = hex.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    assert!(digits.len() % 2 == 0, "odd number of hex digits in {hex:?}");
    digits
        .chunks(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair).expect("ascii hex");
            u8::from_str_radix(text, 16).expect("valid hex digit pair")
        })
        .collect()
}

/// The captured `E0` trace as raw frames.
#[must_use]
pub fn sample_trace() -> Vec<Vec<u8>> { SAMPLE_TRACE.iter().map(|hex| hex_to_bytes(hex)).collect() }

/// Build one query response notification.
#[must_use]
pub fn query_frame(response_type: ResponseType, query_id: QueryId, data: &[u8]) -> Vec<u8> {
    let mut frame = vec![
        FRAME_MARKER,
        response_type.0,
        QUERY_RESPONSE_MARKER,
        query_id.wire_value(),
    ];
    frame.extend_from_slice(data);
    frame
}

/// Build a non-final fragment.
#[must_use]
pub fn continuation_frame(query_id: QueryId, data: &[u8]) -> Vec<u8> {
    query_frame(CONTINUATION_RESPONSE, query_id, data)
}

/// Build the final fragment of a response.
#[must_use]
pub fn terminal_frame(query_id: QueryId, data: &[u8]) -> Vec<u8> {
    query_frame(ResponseType::TERMINAL, query_id, data)
}

/// Split `data` across frames of at most `chunk` data bytes.
///
/// The last frame is terminal. Empty data yields a lone header-only
/// terminal frame.
///
/// # Panics
///
/// Panics if `chunk` is zero.
#[must_use]
pub fn response_frames(query_id: QueryId, data: &[u8], chunk: usize) -> Vec<Vec<u8>> {
    assert!(chunk > 0, "chunk size must be positive");
    if data.is_empty() {
        return vec![terminal_frame(query_id, &[])];
    }
    let parts: Vec<&[u8]> = data.chunks(chunk).collect();
    let last = parts.len() - 1;
    parts
        .iter()
        .enumerate()
        .map(|(index, part)| {
            if index == last {
                terminal_frame(query_id, part)
            } else {
                continuation_frame(query_id, part)
            }
        })
        .collect()
}

/// Summary carried by the completed message of [`SAMPLE_TRACE`].
pub const CLOSING_SUMMARY: [u8; 5] = [0xC8, 0x39, 0x66, 0xBE, 0x12];

/// Frames a gateway sends to answer `query_id` with `status`, encoded for
/// `pipeline`.
///
/// The status record is split into data messages of at most `chunk` bytes,
/// followed by a completed message. That message is sized so its stuffed
/// form opens with the terminal response type: ten nonzero bytes including
/// the checksum.
///
/// # Panics
///
/// Panics if `chunk` is zero or if a data message would itself read as
/// terminal. Pick another chunk size in that case.
#[must_use]
pub fn status_response_frames(
    pipeline: &TankDecodePipeline,
    query_id: QueryId,
    status: &TankStatus,
    chunk: usize,
) -> Vec<Vec<u8>> {
    assert!(chunk > 0, "chunk size must be positive");
    let command_id = query_command_id(query_id);
    let record = pipeline.encode_status(status);
    let mut frames: Vec<Vec<u8>> = record
        .chunks(chunk)
        .map(|part| {
            let message = CommandResponse {
                command_id,
                response_type: SUCCESS_MULTIPLE,
                extended_data: part,
            };
            let frame = pipeline.encode_message(&message.to_bytes());
            assert_ne!(
                frame[1],
                ResponseType::TERMINAL.0,
                "data message of {chunk} bytes reads as terminal"
            );
            frame
        })
        .collect();

    let mut summary = CLOSING_SUMMARY.to_vec();
    if !pipeline.verifies_crc() {
        summary.push(0x5A);
    }
    let closing = CommandResponse {
        command_id,
        response_type: SUCCESS_COMPLETED,
        extended_data: &summary,
    };
    let frame = pipeline.encode_message(&closing.to_bytes());
    assert_eq!(frame[1], ResponseType::TERMINAL.0, "closing message must read as terminal");
    frames.push(frame);
    frames
}
