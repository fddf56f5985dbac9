//! Little-endian conversion between bytes and 32-bit words.
//!
//! The image file is a plain sequence of little-endian words, the same layout
//! the Cortex-M core sees when it reads its flash word by word.

use crate::StampError;

/// Size of one word in bytes.
pub const WORD_SIZE: usize = 4;

/// Assembles a word from four bytes, least significant byte first.
///
/// Every byte is zero-extended before it is shifted into place.
#[inline]
pub const fn bytes_to_word(b0: u8, b1: u8, b2: u8, b3: u8) -> u32 {
    (b0 as u32) | ((b1 as u32) << 8) | ((b2 as u32) << 16) | ((b3 as u32) << 24)
}

/// Splits a word into its four bytes, least significant byte first.
#[inline]
pub const fn word_to_bytes(word: u32) -> [u8; WORD_SIZE] {
    [
        (word & 0xff) as u8,
        ((word >> 8) & 0xff) as u8,
        ((word >> 16) & 0xff) as u8,
        ((word >> 24) & 0xff) as u8,
    ]
}

/// Decodes a byte buffer into words.
///
/// Fails with [`StampError::MisalignedInput`] if the buffer ends in a partial word.
pub fn decode_words(bytes: &[u8]) -> Result<Vec<u32>, StampError> {
    let chunks = bytes.chunks_exact(WORD_SIZE);
    if !chunks.remainder().is_empty() {
        return Err(StampError::MisalignedInput { len: bytes.len() });
    }

    Ok(chunks
        .map(|chunk| bytes_to_word(chunk[0], chunk[1], chunk[2], chunk[3]))
        .collect())
}

/// Encodes words into a byte buffer of `4 * words.len()` bytes.
pub fn encode_words(words: &[u32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(words.len() * WORD_SIZE);
    for &word in words {
        bytes.extend_from_slice(&word_to_bytes(word));
    }
    bytes
}
