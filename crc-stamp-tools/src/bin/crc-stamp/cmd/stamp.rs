use std::path::PathBuf;

use anyhow::Context;
use colored::Colorize;
use crc_stamp::image::preflight_output;
use crc_stamp::{stamp_image, ByteImage, Perturbation, StampMode};

use crate::util::logging::LogOptions;

/// Stamp a firmware binary with an STM32 CRC32 checksum
///
/// The CRC is computed over every word but the last one and written into the
/// last word, so the device's CRC unit folds the whole image to zero.
///
/// e.g. crc-stamp firmware.bin firmware-crc.bin
///      crc-stamp firmware.bin firmware-bad.bin c
#[derive(clap::Parser)]
#[clap(
    name = "crc-stamp",
    version = env!("CRC_STAMP_VERSION"),
    long_version = env!("CRC_STAMP_LONG_VERSION"),
    verbatim_doc_comment
)]
pub struct Cmd {
    #[clap(flatten)]
    pub log: LogOptions,

    /// The firmware binary to stamp. Its last word is reserved for the checksum
    pub input: PathBuf,

    /// Where to write the stamped binary
    pub output: PathBuf,

    /// Pass `c` to corrupt the checksum word on purpose and skip verification
    pub mode: Option<String>,
}

impl Cmd {
    pub fn stamp_mode(&self, perturbation: Perturbation) -> StampMode {
        if corrupt_requested(self.mode.as_deref()) {
            StampMode::Corrupt(perturbation)
        } else {
            StampMode::Verify
        }
    }

    pub fn run(self, perturbation: Perturbation) -> anyhow::Result<()> {
        let mode = self.stamp_mode(perturbation);

        let image = ByteImage::load(&self.input)
            .with_context(|| format!("Failed to load {}", self.input.display()))?;
        preflight_output(&self.output)?;

        let (stamped, report) = stamp_image(&image, mode)?;
        println!("CRC32: {:#010x}", report.checksum);

        if report.is_corrupted() {
            println!(
                "{} the checksum word: {:#010x} -> {:#010x}",
                "Corrupted".yellow().bold(),
                report.checksum,
                report.stored
            );
        }

        stamped
            .save(&self.output)
            .with_context(|| format!("Failed to save {}", self.output.display()))?;

        println!(
            "{} New binary: {} saved!",
            "Finished".green().bold(),
            self.output.display()
        );

        Ok(())
    }
}

/// Corruption is requested by any mode argument starting with `c`.
fn corrupt_requested(mode: Option<&str>) -> bool {
    mode.is_some_and(|mode| mode.starts_with('c'))
}
