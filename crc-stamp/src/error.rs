use std::path::PathBuf;

/// Describes any error that happened while loading, stamping or saving an image.
#[derive(Debug, thiserror::Error, docsplay::Display)]
pub enum StampError {
    /// The input image {0:?} does not exist or is not a regular file.
    InputNotFound(PathBuf),

    /// The input image {path:?} is not readable.
    InputNotReadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The output image {path:?} is not writable.
    OutputNotWritable {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// An I/O error occurred while accessing {path:?}.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The input image is empty.
    EmptyInput,

    /// The input image is {len} bytes long, which is not aligned to 4 bytes.
    MisalignedInput { len: usize },

    /// The CRC check failed: the stamped image checksums to {crc:#010x} instead of zero.
    ChecksumVerificationFailed { crc: u32 },

    /// The re-encoded image differs from the input at byte offset {offset:#x}.
    PayloadMismatch { offset: usize },
}

impl StampError {
    /// Sorts an I/O error from reading the input image into the matching variant.
    pub(crate) fn from_input_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => StampError::InputNotFound(path),
            std::io::ErrorKind::PermissionDenied => StampError::InputNotReadable { path, source },
            _ => StampError::Io { path, source },
        }
    }

    /// Sorts an I/O error from writing the output image into the matching variant.
    pub(crate) fn from_output_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                StampError::OutputNotWritable {
                    path,
                    source: Some(source),
                }
            }
            _ => StampError::Io { path, source },
        }
    }
}
