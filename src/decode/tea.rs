//! Tiny Encryption Algorithm over little-endian block words.
//!
//! The device encrypts tank status records in 8-byte blocks with 32-round
//! TEA. Each block is read as two little-endian `u32` words.

use serde::{Deserialize, Serialize};

use crate::byte_order::{read_le_u32, write_le_u32};

/// Cipher block size in bytes.
pub const BLOCK_LEN: usize = 8;
const ROUNDS: u32 = 32;
const DELTA: u32 = 0x9E37_79B9;

/// 128-bit cipher key as four words.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeaKey(pub [u32; 4]);

impl TeaKey {
    /// Gateway key used by the vendor application.
    pub const DEFAULT: TeaKey = TeaKey([0x436F_7079, 0x7269_6768, 0x7420_4944, 0x5373_6E63]);

    /// Encrypt one block of two words.
    #[must_use]
    pub fn encrypt_words(&self, [mut v0, mut v1]: [u32; 2]) -> [u32; 2] {
        let [k0, k1, k2, k3] = self.0;
        let mut sum = 0_u32;
        for _ in 0..ROUNDS {
            sum = sum.wrapping_add(DELTA);
            v0 = v0.wrapping_add(mix(v1, sum, k0, k1));
            v1 = v1.wrapping_add(mix(v0, sum, k2, k3));
        }
        [v0, v1]
    }

    /// Decrypt one block of two words.
    #[must_use]
    pub fn decrypt_words(&self, [mut v0, mut v1]: [u32; 2]) -> [u32; 2] {
        let [k0, k1, k2, k3] = self.0;
        let mut sum = DELTA.wrapping_mul(ROUNDS);
        for _ in 0..ROUNDS {
            v1 = v1.wrapping_sub(mix(v0, sum, k2, k3));
            v0 = v0.wrapping_sub(mix(v1, sum, k0, k1));
            sum = sum.wrapping_sub(DELTA);
        }
        [v0, v1]
    }

    /// Encrypt one 8-byte block in place.
    pub fn encrypt_block(&self, block: &mut [u8; BLOCK_LEN]) {
        write_block(block, self.encrypt_words(read_block(block)));
    }

    /// Decrypt one 8-byte block in place.
    pub fn decrypt_block(&self, block: &mut [u8; BLOCK_LEN]) {
        write_block(block, self.decrypt_words(read_block(block)));
    }

    /// Encrypt `data` in place.
    ///
    /// # Errors
    ///
    /// Returns the buffer length if it is not a multiple of [`BLOCK_LEN`].
    pub fn encrypt(&self, data: &mut [u8]) -> Result<(), usize> {
        self.apply(data, Self::encrypt_block)
    }

    /// Decrypt `data` in place.
    ///
    /// # Errors
    ///
    /// Returns the buffer length if it is not a multiple of [`BLOCK_LEN`].
    pub fn decrypt(&self, data: &mut [u8]) -> Result<(), usize> {
        self.apply(data, Self::decrypt_block)
    }

    fn apply(&self, data: &mut [u8], op: fn(&Self, &mut [u8; BLOCK_LEN])) -> Result<(), usize> {
        let len = data.len();
        let (blocks, rest) = data.as_chunks_mut::<BLOCK_LEN>();
        if !rest.is_empty() {
            return Err(len);
        }
        for block in blocks {
            op(self, block);
        }
        Ok(())
    }
}

impl Default for TeaKey {
    fn default() -> Self { Self::DEFAULT }
}

fn mix(v: u32, sum: u32, ka: u32, kb: u32) -> u32 {
    (v << 4).wrapping_add(ka) ^ v.wrapping_add(sum) ^ (v >> 5).wrapping_add(kb)
}

fn read_block(block: &[u8; BLOCK_LEN]) -> [u32; 2] {
    let [a, b, c, d, e, f, g, h] = *block;
    [read_le_u32([a, b, c, d]), read_le_u32([e, f, g, h])]
}

fn write_block(block: &mut [u8; BLOCK_LEN], [lo, hi]: [u32; 2]) {
    let ([a, b, c, d], [e, f, g, h]) = (write_le_u32(lo), write_le_u32(hi));
    *block = [a, b, c, d, e, f, g, h];
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::TeaKey;

    #[test]
    fn zero_key_reference_vector() {
        let key = TeaKey([0; 4]);
        assert_eq!(key.encrypt_words([0, 0]), [0x41EA_3A0A, 0x94BA_A940]);
        assert_eq!(key.decrypt_words([0x41EA_3A0A, 0x94BA_A940]), [0, 0]);
    }

    #[test]
    fn gateway_key_encrypts_status_block() {
        let mut block = [0x1B, 0x02, 0x03, 0x2A, 0x00, 0x00, 0x00, 0x00];
        TeaKey::DEFAULT.encrypt(&mut block).expect("one block");
        assert_eq!(block, [0xD3, 0xD6, 0x2C, 0xCD, 0x78, 0xD5, 0x3C, 0x75]);

        TeaKey::DEFAULT.decrypt(&mut block).expect("one block");
        assert_eq!(block, [0x1B, 0x02, 0x03, 0x2A, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn partial_block_is_refused() {
        let mut data = [0_u8; 12];
        assert_eq!(TeaKey::DEFAULT.decrypt(&mut data), Err(12));
        assert_eq!(data, [0_u8; 12]);
    }

    proptest! {
        #[test]
        fn decrypt_inverts_encrypt(
            key in any::<[u32; 4]>(),
            blocks in proptest::collection::vec(any::<[u8; 8]>(), 0..8),
        ) {
            let key = TeaKey(key);
            let plain: Vec<u8> = blocks.concat();
            let mut data = plain.clone();
            key.encrypt(&mut data).expect("whole blocks");
            key.decrypt(&mut data).expect("whole blocks");
            prop_assert_eq!(data, plain);
        }
    }
}
