//! CRC32 as computed by the STM32 CRC peripheral.
//!
//! The peripheral shifts every 32-bit word through its register MSB first with
//! the polynomial [`POLYNOMIAL`]. There is no input or output reflection and no
//! final XOR, so the common table-driven CRC-32 found in most libraries produces
//! different values. The algorithm below follows the peripheral one bit at a time.

/// The fixed generator polynomial of the peripheral.
pub const POLYNOMIAL: u32 = 0x04C1_1DB7;

/// The value of the data register after a reset.
pub const INITIAL_VALUE: u32 = 0xFFFF_FFFF;

/// Feeds a single word into the CRC register `crc` and returns the new register value.
#[inline]
pub const fn step_word(crc: u32, word: u32) -> u32 {
    let mut crc = crc ^ word;
    let mut bit = 0;
    while bit < 32 {
        crc = if crc & 0x8000_0000 != 0 {
            (crc << 1) ^ POLYNOMIAL
        } else {
            crc << 1
        };
        bit += 1;
    }
    crc
}

/// Computes the CRC of `words`, starting from `initial_value`.
///
/// An empty slice returns `initial_value` unchanged.
pub fn compute(words: &[u32], initial_value: u32) -> u32 {
    words.iter().fold(initial_value, |crc, &word| step_word(crc, word))
}

/// A CRC calculation unit with the semantics of the STM32 CRC peripheral.
///
/// The unit is a handle to a single calculation resource and is passed explicitly
/// to whoever needs it.
pub trait CrcUnit {
    /// Resets the data register to [`INITIAL_VALUE`].
    fn reset(&mut self);

    /// Feeds `words` into the data register and returns its new value.
    fn accumulate(&mut self, words: &[u32]) -> u32;

    /// Returns the current value of the data register.
    fn value(&self) -> u32;
}

/// A software emulation of the CRC peripheral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftwareCrc {
    data: u32,
}

impl SoftwareCrc {
    /// Creates a unit in its reset state.
    pub fn new() -> Self {
        Self {
            data: INITIAL_VALUE,
        }
    }
}

impl Default for SoftwareCrc {
    fn default() -> Self {
        Self::new()
    }
}

impl CrcUnit for SoftwareCrc {
    fn reset(&mut self) {
        self.data = INITIAL_VALUE;
    }

    fn accumulate(&mut self, words: &[u32]) -> u32 {
        self.data = compute(words, self.data);
        self.data
    }

    fn value(&self) -> u32 {
        self.data
    }
}
