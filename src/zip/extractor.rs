use log::debug;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::io::ReadAt;

use super::crc::crc32;
use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Reads stored entries back out of an archive
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all files in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Read an entry's content into memory, checking its CRC
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if entry.compression_method != CompressionMethod::Stored {
            return Err(Error::UnsupportedMethod {
                method: entry.compression_method.as_u16(),
            });
        }
        if entry.compressed_size != entry.uncompressed_size {
            return Err(Error::invalid(format!(
                "stored entry {} has compressed size {} but uncompressed size {}",
                entry.file_name, entry.compressed_size, entry.uncompressed_size
            )));
        }

        let data_offset = self.parser.get_data_offset(entry).await?;

        let mut buf = vec![0u8; entry.uncompressed_size as usize];
        self.parser
            .reader()
            .read_exact_at(data_offset, &mut buf)
            .await?;

        let actual = crc32(&buf);
        if actual != entry.crc32 {
            return Err(Error::CrcMismatch {
                name: entry.file_name.clone(),
                expected: entry.crc32,
                actual,
            });
        }

        debug!("read {} ({} bytes)", entry.file_name, buf.len());
        Ok(buf)
    }

    /// Read every entry and check its CRC, returning how many were checked
    pub async fn verify(&self) -> Result<usize> {
        let entries = self.list_files().await?;
        for entry in &entries {
            self.extract_to_memory(entry).await?;
        }
        Ok(entries.len())
    }
}
