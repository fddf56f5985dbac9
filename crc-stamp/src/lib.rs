//! # Checksum stamping for STM32 firmware images
//!
//! The STM32 CRC peripheral computes a CRC32 over 32-bit words with the
//! polynomial `0x04C11DB7`, MSB first, starting from `0xFFFFFFFF` and without
//! any reflection or final XOR. A firmware that reserves its last word for the
//! checksum can verify itself at boot: running the peripheral over the whole
//! image, checksum word included, yields zero.
//!
//! This crate produces such images on the host.
//!
//! # Examples
//!
//! ## Stamping a binary in memory
//!
//! ```
//! # use crc_stamp::StampError;
//! use crc_stamp::{check, stamp_image, ByteImage, SoftwareCrc, StampMode};
//!
//! // One payload word and the reserved checksum slot.
//! let image = ByteImage::new(vec![0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00])?;
//!
//! let (stamped, report) = stamp_image(&image, StampMode::Verify)?;
//! assert_eq!(report.stored, report.checksum);
//!
//! // The device's own boot check now passes.
//! let mut unit = SoftwareCrc::new();
//! assert!(check::verify_image(&mut unit, &stamped).is_passed());
//! # Ok::<(), StampError>(())
//! ```
//!
//! ## Stamping a file
//!
//! ```no_run
//! # use crc_stamp::StampError;
//! use crc_stamp::{stamp_file, StampMode};
//!
//! let report = stamp_file("firmware.bin", "firmware-crc.bin", StampMode::Verify)?;
//! println!("CRC32: {:#010x}", report.checksum);
//! # Ok::<(), StampError>(())
//! ```
//!
//! crc-stamp is built around the [`crc`] engine, the [`ByteImage`] and
//! [`WordImage`] buffers and the stamping pipeline in [`stamp`].

pub mod check;
pub mod crc;
mod error;
pub mod image;
pub mod stamp;
pub mod word;

pub use crate::crc::{CrcUnit, SoftwareCrc, INITIAL_VALUE, POLYNOMIAL};
pub use crate::error::StampError;
pub use crate::image::{ByteImage, WordImage};
pub use crate::stamp::{
    stamp_file, stamp_image, stamp_words, Perturbation, StampMode, StampReport, StampStage,
};
