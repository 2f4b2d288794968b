//! # storezip
//!
//! A minimal ZIP writer that packs named byte buffers into a single
//! uncompressed (STORE method) archive, entirely in memory.
//!
//! ## Features
//!
//! - Byte-exact local file headers, central directory and end record
//! - UTF-8 entry names
//! - Table-driven CRC-32
//! - A STORE-only reader for listing archives and verifying their CRCs
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use storezip::{MemoryReader, ZipExtractor, ZipWriter};
//!
//! #[tokio::main]
//! async fn main() -> storezip::Result<()> {
//!     let mut writer = ZipWriter::new();
//!     writer.add("notes/todo.txt", b"buy milk")?;
//!     writer.add("data.bin", [0u8, 1, 2, 3])?;
//!     let archive = writer.finish()?;
//!     assert_eq!(archive.media_type(), "application/zip");
//!
//!     // Read it back
//!     let extractor = ZipExtractor::new(Arc::new(MemoryReader::from(archive)));
//!     let files = extractor.list_files().await?;
//!     assert_eq!(files[0].file_name, "notes/todo.txt");
//!     assert_eq!(extractor.extract_to_memory(&files[1]).await?, [0, 1, 2, 3]);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use error::{Error, Result};
pub use io::{LocalFileReader, MemoryReader, ReadAt};
pub use zip::{
    CentralDirectoryHeader, CompressionMethod, Crc32, DosDateTime, EndOfCentralDirectory,
    LocalFileHeader, ZipArchive, ZipEntry, ZipExtractor, ZipFileEntry, ZipWriter, crc32,
};
