use std::path::PathBuf;

use anyhow::Context;
use colored::Colorize;
use crc_stamp::check::{verify_image, FlashCheck};
use crc_stamp::{ByteImage, SoftwareCrc};

use crate::util::logging::LogOptions;

/// Run the device's boot-time flash check on a stamped binary
///
/// The whole image, checksum word included, is fed through an emulated CRC unit.
/// The check passes if the unit ends at zero.
#[derive(clap::Parser)]
#[clap(
    name = "crc-check",
    version = env!("CRC_STAMP_VERSION"),
    long_version = env!("CRC_STAMP_LONG_VERSION")
)]
pub struct Cmd {
    #[clap(flatten)]
    pub log: LogOptions,

    /// The stamped firmware binary
    pub image: PathBuf,
}

/// {image:?} failed the flash check, the CRC unit ended at {crc:#010x} instead of zero.
#[derive(Debug, thiserror::Error, docsplay::Display)]
pub struct FlashCheckFailed {
    image: PathBuf,
    crc: u32,
}

impl Cmd {
    pub fn run(self) -> anyhow::Result<()> {
        let image = ByteImage::load(&self.image)
            .with_context(|| format!("Failed to load {}", self.image.display()))?;

        let mut unit = SoftwareCrc::new();
        let check = verify_image(&mut unit, &image);
        println!("CRC32: {:#010x}", check.crc());

        match check {
            FlashCheck::Passed => {
                println!("{} Flash check passed.", "Finished".green().bold());
                Ok(())
            }
            FlashCheck::Failed { crc } => Err(FlashCheckFailed {
                image: self.image,
                crc,
            }
            .into()),
        }
    }
}
