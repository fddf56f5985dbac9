//! Firmware images as bytes and as words.
use std::fs;
use std::path::Path;

use crate::word::{self, WORD_SIZE};
use crate::StampError;

/// The raw contents of a firmware image.
///
/// A `ByteImage` is never empty and its length is always a multiple of four bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteImage(Vec<u8>);

impl ByteImage {
    /// Wraps `bytes`, checking the size constraints of an image.
    pub fn new(bytes: Vec<u8>) -> Result<Self, StampError> {
        if bytes.is_empty() {
            return Err(StampError::EmptyInput);
        }
        if bytes.len() % WORD_SIZE != 0 {
            return Err(StampError::MisalignedInput { len: bytes.len() });
        }

        Ok(Self(bytes))
    }

    /// Reads the image stored at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StampError> {
        let path = path.as_ref();

        // A directory opens fine on some platforms and only fails on read.
        let metadata = fs::metadata(path).map_err(|e| StampError::from_input_io(path, e))?;
        if !metadata.is_file() {
            return Err(StampError::InputNotFound(path.to_path_buf()));
        }

        let bytes = fs::read(path).map_err(|e| StampError::from_input_io(path, e))?;
        tracing::debug!("Read {} bytes from {:?}", bytes.len(), path);

        Self::new(bytes)
    }

    /// Writes the image to `path`, creating or truncating the file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StampError> {
        let path = path.as_ref();

        fs::write(path, &self.0).map_err(|e| StampError::from_output_io(path, e))?;
        tracing::debug!("Wrote {} bytes to {:?}", self.0.len(), path);

        Ok(())
    }

    /// The image length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`, an image holds at least one word.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The bytes in front of the checksum slot.
    pub fn payload(&self) -> &[u8] {
        &self.0[..self.0.len() - WORD_SIZE]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for ByteImage {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A firmware image as a sequence of little-endian words.
///
/// The last word is the checksum slot. A `WordImage` always holds at least that word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordImage(Vec<u32>);

impl WordImage {
    /// Builds an image from `words`, failing with [`StampError::EmptyInput`] if there are none.
    pub fn new(words: Vec<u32>) -> Result<Self, StampError> {
        if words.is_empty() {
            return Err(StampError::EmptyInput);
        }

        Ok(Self(words))
    }

    /// Decodes a byte image.
    pub fn decode(image: &ByteImage) -> Self {
        let words = image
            .as_bytes()
            .chunks_exact(WORD_SIZE)
            .map(|chunk| word::bytes_to_word(chunk[0], chunk[1], chunk[2], chunk[3]))
            .collect();

        Self(words)
    }

    /// Encodes the image back into bytes.
    pub fn encode(&self) -> ByteImage {
        ByteImage(word::encode_words(&self.0))
    }

    /// Number of words, checksum slot included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`, the checksum slot is always present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All words in front of the checksum slot.
    pub fn payload(&self) -> &[u32] {
        &self.0[..self.0.len() - 1]
    }

    /// The current content of the checksum slot.
    pub fn checksum_slot(&self) -> u32 {
        self.0[self.0.len() - 1]
    }

    pub fn set_checksum_slot(&mut self, value: u32) {
        let last = self.0.len() - 1;
        self.0[last] = value;
    }

    /// All words, checksum slot included.
    pub fn words(&self) -> &[u32] {
        &self.0
    }
}

/// Checks that the output image can be written to `path` before any work is done.
///
/// An existing read-only file, a directory, or a path whose parent directory is
/// missing is rejected. A missing file is fine, it is created on save.
pub fn preflight_output(path: impl AsRef<Path>) -> Result<(), StampError> {
    let path = path.as_ref();
    let not_writable = || StampError::OutputNotWritable {
        path: path.to_path_buf(),
        source: None,
    };

    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() || metadata.permissions().readonly() => {
            return Err(not_writable());
        }
        Ok(_) => return Ok(()),
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            return Err(StampError::from_output_io(path, e));
        }
        Err(_) => {}
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        return Err(not_writable());
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn byte_image_rejects_empty_input() {
        assert!(matches!(
            ByteImage::new(Vec::new()),
            Err(StampError::EmptyInput)
        ));
    }

    #[test]
    fn byte_image_rejects_misaligned_input() {
        for len in [1, 2, 3, 5, 7, 4099] {
            let error = ByteImage::new(vec![0; len]).unwrap_err();
            assert!(
                matches!(error, StampError::MisalignedInput { len: l } if l == len),
                "length {len} was not rejected"
            );
        }
    }

    #[test]
    fn word_image_views() {
        let bytes = ByteImage::new(vec![1, 0, 0, 0, 2, 0, 0, 0, 0xaa, 0xbb, 0xcc, 0xdd]).unwrap();
        let mut words = WordImage::decode(&bytes);

        assert_eq!(words.len(), 3);
        assert_eq!(words.payload(), &[1, 2]);
        assert_eq!(words.checksum_slot(), 0xddcc_bbaa);
        assert_eq!(bytes.payload(), &[1, 0, 0, 0, 2, 0, 0, 0]);

        words.set_checksum_slot(0x1122_3344);
        assert_eq!(words.words(), &[1, 2, 0x1122_3344]);
        assert_eq!(
            words.encode().into_bytes(),
            vec![1, 0, 0, 0, 2, 0, 0, 0, 0x44, 0x33, 0x22, 0x11]
        );
    }

    #[test]
    fn single_word_image_has_empty_payload() {
        let bytes = ByteImage::new(vec![0xff; 4]).unwrap();
        let words = WordImage::decode(&bytes);

        assert!(words.payload().is_empty());
        assert!(bytes.payload().is_empty());
    }

    #[test]
    fn word_image_requires_a_checksum_slot() {
        assert!(matches!(
            WordImage::new(Vec::new()),
            Err(StampError::EmptyInput)
        ));
        assert_eq!(WordImage::new(vec![7]).unwrap().checksum_slot(), 7);
    }

    #[test]
    fn load_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.bin");
        let image = ByteImage::new(vec![0x80, 0x81, 0x82, 0x83, 0, 0, 0, 0]).unwrap();

        image.save(&path).unwrap();
        assert_eq!(ByteImage::load(&path).unwrap(), image);
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let error = ByteImage::load(dir.path().join("missing.bin")).unwrap_err();

        assert!(matches!(error, StampError::InputNotFound(_)));
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        let error = ByteImage::load(dir.path()).unwrap_err();

        assert!(matches!(error, StampError::InputNotFound(_)));
    }

    #[test]
    fn load_validates_size() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.bin");
        let odd = dir.path().join("odd.bin");
        fs::write(&empty, b"").unwrap();
        fs::write(&odd, [0u8; 7]).unwrap();

        assert!(matches!(
            ByteImage::load(&empty),
            Err(StampError::EmptyInput)
        ));
        assert!(matches!(
            ByteImage::load(&odd),
            Err(StampError::MisalignedInput { len: 7 })
        ));
    }

    #[test]
    fn save_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let image = ByteImage::new(vec![0; 4]).unwrap();
        let error = image
            .save(dir.path().join("missing").join("out.bin"))
            .unwrap_err();

        assert!(matches!(error, StampError::OutputNotWritable { .. }));
    }

    #[test]
    fn preflight() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("existing.bin");
        fs::write(&existing, [0u8; 4]).unwrap();

        preflight_output(&existing).unwrap();
        preflight_output(dir.path().join("new.bin")).unwrap();

        assert!(matches!(
            preflight_output(dir.path()),
            Err(StampError::OutputNotWritable { .. })
        ));
        assert!(matches!(
            preflight_output(dir.path().join("missing").join("out.bin")),
            Err(StampError::OutputNotWritable { .. })
        ));
    }
}
