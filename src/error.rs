//! Error types for building and reading ZIP archives.
//!
//! Every fallible operation in this crate returns [`Result<T>`]. Writer
//! errors are terminal for the current build: the [`ZipWriter`] that
//! produced them should be dropped and a new one started.
//!
//! [`ZipWriter`]: crate::ZipWriter

use std::io;

/// The error type for archive operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error from the underlying data source.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The UTF-8 encoded entry name does not fit the 16-bit length field.
    #[error("entry name is {len} bytes, the limit is 65535")]
    NameTooLong {
        /// Length of the encoded name in bytes.
        len: usize,
    },

    /// The entry content does not fit the 32-bit size fields.
    #[error("entry content is {size} bytes, the limit is 4294967295")]
    EntryTooLarge {
        /// Length of the rejected content in bytes.
        size: u64,
    },

    /// The archive holds more entries than the 16-bit count fields allow.
    #[error("archive holds {count} entries, the limit is 65535")]
    TooManyEntries {
        /// Number of entries in the writer.
        count: usize,
    },

    /// Adding the entry would move an offset past the 32-bit limit.
    #[error("archive offset {offset} exceeds the 32-bit limit")]
    ArchiveTooLarge {
        /// The offset that would have been required.
        offset: u64,
    },

    /// The data is not a well-formed ZIP archive.
    #[error("invalid ZIP archive: {0}")]
    InvalidFormat(String),

    /// The entry uses a compression method other than STORE.
    #[error("unsupported compression method: {method} (only STORED/uncompressed is supported)")]
    UnsupportedMethod {
        /// Raw method value from the header.
        method: u16,
    },

    /// The archive relies on a format extension this crate does not handle.
    #[error("unsupported feature: {feature}")]
    UnsupportedFeature {
        /// Name of the extension.
        feature: &'static str,
    },

    /// Stored content does not match the checksum recorded for it.
    #[error("CRC mismatch for {name}: expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch {
        /// Entry name.
        name: String,
        /// Checksum recorded in the central directory.
        expected: u32,
        /// Checksum of the bytes actually read.
        actual: u32,
    },
}

/// A specialized [`Result`](std::result::Result) for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidFormat(msg.into())
    }
}
