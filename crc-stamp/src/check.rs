//! The boot-time flash check performed by the device.
//!
//! At startup the firmware resets its CRC unit and runs it over the whole used
//! flash, checksum word included. A correctly stamped image leaves the unit at
//! zero. The functions here run the same check on the host so stamped (and
//! deliberately corrupted) images can be inspected before they are flashed.

use std::path::Path;

use crate::crc::{CrcUnit, SoftwareCrc};
use crate::image::ByteImage;
use crate::word;
use crate::StampError;

/// The result of a flash check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, docsplay::Display)]
pub enum FlashCheck {
    /// Flash check passed.
    Passed,
    /// Flash check failed, the CRC unit ended at {crc:#010x}.
    Failed { crc: u32 },
}

impl FlashCheck {
    fn from_crc(crc: u32) -> Self {
        if crc == 0 {
            FlashCheck::Passed
        } else {
            FlashCheck::Failed { crc }
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, FlashCheck::Passed)
    }

    /// The value the CRC unit ended at.
    pub fn crc(&self) -> u32 {
        match self {
            FlashCheck::Passed => 0,
            FlashCheck::Failed { crc } => *crc,
        }
    }
}

/// Resets `unit` and runs it over `words`.
pub fn check_words(unit: &mut impl CrcUnit, words: &[u32]) -> u32 {
    unit.reset();
    unit.accumulate(words)
}

/// Resets `unit` and runs it over `bytes`, read as little-endian words.
pub fn check_bytes(unit: &mut impl CrcUnit, bytes: &[u8]) -> Result<u32, StampError> {
    if bytes.is_empty() {
        return Err(StampError::EmptyInput);
    }
    let words = word::decode_words(bytes)?;

    Ok(check_words(unit, &words))
}

/// Runs the boot-time check over a whole image.
pub fn verify_image(unit: &mut impl CrcUnit, image: &ByteImage) -> FlashCheck {
    let words = crate::WordImage::decode(image);
    let crc = check_words(unit, words.words());
    tracing::debug!("Flash check over {} words ended at {crc:#010x}", words.len());

    FlashCheck::from_crc(crc)
}

/// Loads the image at `path` and runs the boot-time check on it with a [`SoftwareCrc`].
pub fn check_file(path: impl AsRef<Path>) -> Result<FlashCheck, StampError> {
    let image = ByteImage::load(path)?;
    let mut unit = SoftwareCrc::new();

    Ok(verify_image(&mut unit, &image))
}
