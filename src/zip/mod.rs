//! ZIP archive writing and reading.
//!
//! ## Architecture
//!
//! - [`crc`]: CRC-32 checksums for entry data
//! - [`dos_time`]: MS-DOS date/time fields
//! - [`structures`]: On-disk records (local header, central header, EOCD)
//! - [`writer`]: In-memory archive builder
//! - [`parser`] and [`extractor`]: Reading archives back for listing and verification
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! ## Supported Features
//!
//! - STORED (no compression) method, for writing and reading
//! - UTF-8 file names (general purpose flag bit 11)
//!
//! ## Limitations
//!
//! - No compression methods other than STORED
//! - No ZIP64 extensions; entries and archives must stay below 4 GiB
//!   and 65535 entries
//! - No encryption support
//! - No multi-disk archive support

pub mod crc;
pub mod dos_time;
mod extractor;
mod parser;
mod structures;
mod writer;

pub use crc::{Crc32, crc32};
pub use dos_time::DosDateTime;
pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
pub use writer::{MAX_ENTRIES, MAX_NAME_LEN, ZipArchive, ZipEntry, ZipWriter};
