//! Computing, injecting and verifying the checksum word.
//!
//! Stamping runs as a linear pipeline:
//!
//! ```text
//! Loaded -> Decoded -> ChecksumComputed -> Injected -> {Corrupted | Verified}
//!        -> ReEncoded -> Validated -> Saved
//! ```
//!
//! The first failing stage aborts the run. The output file is only written
//! once every other stage has passed.

use std::num::NonZeroU32;
use std::path::Path;

use crate::crc::{self, INITIAL_VALUE};
use crate::image::{ByteImage, WordImage};
use crate::StampError;

/// The stages of the stamping pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, docsplay::Display)]
pub enum StampStage {
    /// loaded
    Loaded,
    /// decoded
    Decoded,
    /// checksum computed
    ChecksumComputed,
    /// injected
    Injected,
    /// corrupted
    Corrupted,
    /// verified
    Verified,
    /// re-encoded
    ReEncoded,
    /// validated
    Validated,
    /// saved
    Saved,
}

/// The amount added to the checksum word when an image is deliberately corrupted.
///
/// One CRC step maps `crc ^ word` bijectively, so only the correct checksum
/// folds the image to zero. Adding any non-zero amount therefore always
/// yields an image that fails the boot check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Perturbation(NonZeroU32);

impl Perturbation {
    /// The perturbation used unless configured otherwise.
    pub const DEFAULT: Self = Self(match NonZeroU32::new(105) {
        Some(value) => value,
        None => unreachable!(),
    });

    pub const fn new(amount: NonZeroU32) -> Self {
        Self(amount)
    }

    pub const fn get(self) -> u32 {
        self.0.get()
    }

    pub const fn amount(self) -> NonZeroU32 {
        self.0
    }

    /// Applies the perturbation to a checksum word.
    pub const fn apply(self, checksum: u32) -> u32 {
        checksum.wrapping_add(self.0.get())
    }
}

impl Default for Perturbation {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<NonZeroU32> for Perturbation {
    fn from(amount: NonZeroU32) -> Self {
        Self(amount)
    }
}

/// What to do after the checksum has been injected.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StampMode {
    /// Check that the stamped image folds to zero.
    #[default]
    Verify,
    /// Break the checksum on purpose so the device's boot check fails.
    Corrupt(Perturbation),
}

impl StampMode {
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StampMode::Corrupt(_))
    }
}

/// The outcome of a successful stamping run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampReport {
    /// The CRC over all words in front of the checksum slot.
    pub checksum: u32,
    /// The value written into the checksum slot.
    ///
    /// Equal to `checksum` unless the image was corrupted.
    pub stored: u32,
    /// The mode the image was stamped with.
    pub mode: StampMode,
    /// Number of words in the image, checksum slot included.
    pub words: usize,
}

impl StampReport {
    pub fn is_corrupted(&self) -> bool {
        self.mode.is_corrupt()
    }
}

fn enter(stage: StampStage) {
    tracing::debug!(%stage, "Stamping stage reached");
}

/// Computes the checksum of `image`, writes it into the checksum slot and
/// either verifies or corrupts the result.
pub fn stamp_words(image: &mut WordImage, mode: StampMode) -> Result<StampReport, StampError> {
    let checksum = crc::compute(image.payload(), INITIAL_VALUE);
    enter(StampStage::ChecksumComputed);
    tracing::info!("Computed checksum {checksum:#010x} over {} words", image.payload().len());

    image.set_checksum_slot(checksum);
    enter(StampStage::Injected);

    match mode {
        StampMode::Corrupt(perturbation) => {
            image.set_checksum_slot(perturbation.apply(checksum));
            enter(StampStage::Corrupted);
            tracing::info!(
                "Corrupted the checksum word: {checksum:#010x} -> {:#010x}",
                image.checksum_slot()
            );
        }
        StampMode::Verify => {
            let total = crc::compute(image.words(), INITIAL_VALUE);
            if total != 0 {
                return Err(StampError::ChecksumVerificationFailed { crc: total });
            }
            enter(StampStage::Verified);
        }
    }

    Ok(StampReport {
        checksum,
        stored: image.checksum_slot(),
        mode,
        words: image.len(),
    })
}

/// Stamps a byte image and returns the stamped copy.
///
/// After re-encoding, everything in front of the checksum slot is compared with
/// the input to catch any asymmetry between decoding and encoding.
pub fn stamp_image(
    input: &ByteImage,
    mode: StampMode,
) -> Result<(ByteImage, StampReport), StampError> {
    let mut words = WordImage::decode(input);
    enter(StampStage::Decoded);

    let report = stamp_words(&mut words, mode)?;

    let output = words.encode();
    enter(StampStage::ReEncoded);

    if let Some(offset) = input
        .payload()
        .iter()
        .zip(output.payload())
        .position(|(original, stamped)| original != stamped)
    {
        return Err(StampError::PayloadMismatch { offset });
    }
    if output.len() != input.len() {
        return Err(StampError::PayloadMismatch {
            offset: input.len().min(output.len()),
        });
    }
    enter(StampStage::Validated);

    Ok((output, report))
}

/// Loads the image at `input`, stamps it and saves the result to `output`.
///
/// Nothing is written if any step before saving fails.
pub fn stamp_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    mode: StampMode,
) -> Result<StampReport, StampError> {
    let image = ByteImage::load(input.as_ref())?;
    enter(StampStage::Loaded);

    let (stamped, report) = stamp_image(&image, mode)?;

    stamped.save(output.as_ref())?;
    enter(StampStage::Saved);

    Ok(report)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crc;
    use crate::word::word_to_bytes;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const PAYLOAD_ONE: [u8; 8] = [0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

    fn image(bytes: &[u8]) -> ByteImage {
        ByteImage::new(bytes.to_vec()).unwrap()
    }

    #[test]
    fn end_to_end_example() {
        let c = crc::compute(&[1], INITIAL_VALUE);
        let (stamped, report) = stamp_image(&image(&PAYLOAD_ONE), StampMode::Verify).unwrap();

        let mut expected = vec![0x01, 0x00, 0x00, 0x00];
        expected.extend_from_slice(&word_to_bytes(c));
        assert_eq!(stamped.as_bytes(), expected.as_slice());
        assert_eq!(report.checksum, 0xc3c5_c0cc);
        assert_eq!(report.stored, c);
        assert_eq!(report.words, 2);
        assert_eq!(crc::compute(&[1, c], INITIAL_VALUE), 0);
    }

    #[test]
    fn corruption_example() {
        let c = crc::compute(&[1], INITIAL_VALUE);
        let mode = StampMode::Corrupt(Perturbation::default());
        let (stamped, report) = stamp_image(&image(&PAYLOAD_ONE), mode).unwrap();

        assert!(report.is_corrupted());
        assert_eq!(report.checksum, c);
        assert_eq!(report.stored, c.wrapping_add(105));
        assert_eq!(&stamped.as_bytes()[4..], &word_to_bytes(c + 105));

        let words = WordImage::decode(&stamped);
        assert_ne!(crc::compute(words.words(), INITIAL_VALUE), 0);
    }

    #[test_case(1; "smallest")]
    #[test_case(105; "default")]
    #[test_case(0x8000_0000; "top bit")]
    #[test_case(u32::MAX; "wraps around")]
    fn any_perturbation_breaks_the_checksum(amount: u32) {
        let perturbation = Perturbation::new(NonZeroU32::new(amount).unwrap());
        let mut words = WordImage::new(vec![0x2000_5000, 0x0800_0101, 0xffff_ffff, 0]).unwrap();

        stamp_words(&mut words, StampMode::Corrupt(perturbation)).unwrap();

        assert_ne!(crc::compute(words.words(), INITIAL_VALUE), 0);
    }

    #[test]
    fn existing_slot_content_is_ignored() {
        let fresh = image(&[0xaa, 0xbb, 0xcc, 0xdd, 0, 0, 0, 0]);
        let stale = image(&[0xaa, 0xbb, 0xcc, 0xdd, 0x12, 0x34, 0x56, 0x78]);

        let (fresh, _) = stamp_image(&fresh, StampMode::Verify).unwrap();
        let (stale, _) = stamp_image(&stale, StampMode::Verify).unwrap();

        assert_eq!(fresh, stale);
    }

    #[test]
    fn restamping_is_stable() {
        let (once, first) = stamp_image(&image(&PAYLOAD_ONE), StampMode::Verify).unwrap();
        let (twice, second) = stamp_image(&once, StampMode::Verify).unwrap();

        assert_eq!(once, twice);
        assert_eq!(first, second);
    }

    #[test]
    fn payload_with_high_bytes_is_preserved() {
        let bytes: Vec<u8> = (0..64u8).map(|i| i.wrapping_mul(37) | 0x80).collect();
        let input = image(&bytes);

        let (stamped, _) = stamp_image(&input, StampMode::Verify).unwrap();

        assert_eq!(stamped.len(), input.len());
        assert_eq!(stamped.payload(), input.payload());
    }

    #[test]
    fn single_word_image() {
        let (stamped, report) = stamp_image(&image(&[0; 4]), StampMode::Verify).unwrap();

        assert_eq!(report.checksum, INITIAL_VALUE);
        assert_eq!(stamped.as_bytes(), &[0xff; 4]);
    }

    #[test]
    fn stamp_mode_defaults_to_verify() {
        assert_eq!(StampMode::default(), StampMode::Verify);
        assert_eq!(Perturbation::default().get(), 105);
        assert_eq!(Perturbation::DEFAULT.apply(u32::MAX), 104);
    }
}
