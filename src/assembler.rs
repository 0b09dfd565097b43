//! Concatenation of completed assemblies into a single payload.
//!
//! The assembled payload is the fragment bodies back to back, in arrival
//! order, with nothing inserted between them. Fragment boundaries and the
//! response type of each fragment are kept alongside the bytes: the response
//! type is the first code byte of the fragment's stuffed message, so the
//! decode pipeline needs it back to undo the stuffing.

use bytes::{Bytes, BytesMut};

use crate::{
    correlator::PendingAssembly,
    envelope::{QUERY_HEADER_LEN, QueryId, ResponseType},
};

/// Fully collected response awaiting decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssembledPayload {
    query_id: QueryId,
    bytes: Bytes,
    fragment_ends: Vec<usize>,
    response_types: Vec<ResponseType>,
}

impl AssembledPayload {
    /// Build a payload from `(response type, body)` pairs in arrival order.
    ///
    /// # Examples
    ///
    /// ```
    /// use tanklink::{AssembledPayload, QueryId, ResponseType};
    ///
    /// let payload = AssembledPayload::from_fragments(
    ///     QueryId::E0,
    ///     [
    ///         (ResponseType(0x43), &[0x02_u8, 0xE0, 0xAA][..]),
    ///         (ResponseType::TERMINAL, &[0x02_u8, 0xE0, 0xBB, 0xCC][..]),
    ///     ],
    /// );
    /// assert_eq!(payload.as_bytes(), &[0x02, 0xE0, 0xAA, 0x02, 0xE0, 0xBB, 0xCC]);
    /// assert_eq!(payload.fragment_count(), 2);
    /// assert_eq!(payload.fragment_data(), vec![0xAA_u8, 0xBB, 0xCC]);
    /// ```
    #[must_use]
    pub fn from_fragments<'a, I>(query_id: QueryId, fragments: I) -> Self
    where
        I: IntoIterator<Item = (ResponseType, &'a [u8])>,
    {
        let mut bytes = BytesMut::new();
        let mut fragment_ends = Vec::new();
        let mut response_types = Vec::new();
        for (response_type, body) in fragments {
            bytes.extend_from_slice(body);
            fragment_ends.push(bytes.len());
            response_types.push(response_type);
        }
        Self {
            query_id,
            bytes: bytes.freeze(),
            fragment_ends,
            response_types,
        }
    }

    /// Identifier of the completed response.
    #[must_use]
    pub const fn query_id(&self) -> QueryId { self.query_id }

    /// Concatenated fragment bodies.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] { &self.bytes }

    /// Consume the payload, returning the concatenated bytes.
    #[must_use]
    pub fn into_bytes(self) -> Bytes { self.bytes }

    /// Total length of the concatenated bodies.
    #[must_use]
    pub fn len(&self) -> usize { self.bytes.len() }

    /// Whether the payload holds no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }

    /// Number of fragments the payload was built from.
    #[must_use]
    pub fn fragment_count(&self) -> usize { self.fragment_ends.len() }

    /// Response type of each fragment in arrival order.
    #[must_use]
    pub fn response_types(&self) -> &[ResponseType] { &self.response_types }

    /// Iterate over the individual fragment bodies.
    pub fn fragments(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let starts = std::iter::once(0).chain(self.fragment_ends.iter().copied());
        starts
            .zip(self.fragment_ends.iter().copied())
            .map(|(start, end)| &self.bytes[start..end])
    }

    /// Each fragment as it was stuffed on the wire: its response type byte
    /// followed by its body, without the start-of-frame separator.
    pub fn stuffed_fragments(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        self.response_types
            .iter()
            .zip(self.fragments())
            .map(|(response_type, body)| {
                let mut stuffed = Vec::with_capacity(body.len() + 1);
                stuffed.push(response_type.0);
                stuffed.extend_from_slice(body);
                stuffed
            })
    }

    /// Fragment bodies with their query header removed, concatenated.
    #[must_use]
    pub fn fragment_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.data_len());
        for fragment in self.fragments() {
            data.extend_from_slice(fragment.get(QUERY_HEADER_LEN..).unwrap_or_default());
        }
        data
    }

    /// Bytes carried after the per-fragment query headers.
    #[must_use]
    pub fn data_len(&self) -> usize {
        self.fragments()
            .map(|fragment| fragment.len().saturating_sub(QUERY_HEADER_LEN))
            .sum()
    }
}

/// Concatenate a completed assembly's fragments in arrival order.
#[must_use]
pub fn assemble(assembly: &PendingAssembly) -> AssembledPayload {
    let payload = AssembledPayload::from_fragments(
        assembly.query_id(),
        assembly
            .response_types()
            .iter()
            .copied()
            .zip(assembly.fragments().iter().map(AsRef::as_ref)),
    );
    tracing::debug!(
        query_id = %payload.query_id(),
        fragments = payload.fragment_count(),
        payload_len = payload.len(),
        data_len = payload.data_len(),
        "assembled response payload"
    );
    payload
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use bytes::Bytes;

    use super::{AssembledPayload, assemble};
    use crate::{
        correlator::PendingAssembly,
        envelope::{QueryId, ResponseType},
    };

    const CONTINUATION: ResponseType = ResponseType(0x4B);

    fn assembly_of(query_id: QueryId, bodies: &[&'static [u8]]) -> PendingAssembly {
        let now = Instant::now();
        let mut assembly = PendingAssembly::new(query_id, now);
        for &body in bodies {
            assembly.push(CONTINUATION, Bytes::from_static(body), now);
        }
        assembly
    }

    #[test]
    fn concatenates_in_arrival_order_without_delimiters() {
        let assembly = assembly_of(QueryId::E5, &[b"\x02\xE5ab", b"\x02\xE5cd", b"\x02\xE5e"]);
        let payload = assemble(&assembly);

        assert_eq!(payload.query_id(), QueryId::E5);
        assert_eq!(payload.as_bytes(), b"\x02\xE5ab\x02\xE5cd\x02\xE5e");
        assert_eq!(payload.fragment_count(), 3);
        assert_eq!(payload.len(), 13);
    }

    #[test]
    fn data_length_discounts_each_query_header() {
        let assembly = assembly_of(QueryId::E0, &[b"\x02\xE0abc", b"\x02\xE0de"]);
        let payload = assemble(&assembly);

        assert_eq!(payload.data_len(), 5);
        assert_eq!(payload.fragment_data(), b"abcde");
    }

    #[test]
    fn header_only_fragments_contribute_no_data() {
        let payload = AssembledPayload::from_fragments(
            QueryId::E1,
            [
                (CONTINUATION, &b"\x02\xE1"[..]),
                (CONTINUATION, &b"\x02"[..]),
                (ResponseType::TERMINAL, &b"\x02\xE1z"[..]),
            ],
        );

        assert_eq!(payload.data_len(), 1);
        assert_eq!(payload.fragment_data(), b"z");
    }

    #[test]
    fn fragments_iterate_original_bodies() {
        let payload = AssembledPayload::from_fragments(
            QueryId::E2,
            [
                (CONTINUATION, &b"one"[..]),
                (CONTINUATION, &b""[..]),
                (ResponseType::TERMINAL, &b"three"[..]),
            ],
        );
        let fragments: Vec<&[u8]> = payload.fragments().collect();

        assert_eq!(fragments, vec![&b"one"[..], &b""[..], &b"three"[..]]);
    }

    #[test]
    fn stuffed_fragments_restore_the_leading_code_byte() {
        let now = Instant::now();
        let mut assembly = PendingAssembly::new(QueryId::E4, now);
        assembly.push(ResponseType(0x45), Bytes::from_static(b"\x02\xE4\x01"), now);
        assembly.push(ResponseType::TERMINAL, Bytes::from_static(b"\x02\xE4"), now);
        let payload = assemble(&assembly);

        assert_eq!(
            payload.response_types(),
            &[ResponseType(0x45), ResponseType::TERMINAL]
        );
        let stuffed: Vec<Vec<u8>> = payload.stuffed_fragments().collect();
        assert_eq!(
            stuffed,
            vec![vec![0x45, 0x02, 0xE4, 0x01], vec![0x0A, 0x02, 0xE4]]
        );
    }

    #[test]
    fn empty_assembly_yields_empty_payload() {
        let payload = assemble(&assembly_of(QueryId::E3, &[]));
        assert!(payload.is_empty());
        assert_eq!(payload.fragment_count(), 0);
        assert!(payload.fragment_data().is_empty());
        assert_eq!(payload.stuffed_fragments().count(), 0);
    }
}
