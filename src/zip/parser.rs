//! Low-level ZIP archive parser.
//!
//! Reads archives from any source that implements [`ReadAt`], starting
//! from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. Read the Central Directory to get metadata for all files
//! 3. For extraction, read each file's Local File Header to locate its data
//!
//! ZIP64 archives are detected and rejected.

use log::trace;
use std::io::Cursor;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::io::ReadAt;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// ZIP64 End of Central Directory Locator, 20 bytes ending at the EOCD.
const ZIP64_LOCATOR_SIGNATURE: &[u8; 4] = b"PK\x06\x07";
const ZIP64_LOCATOR_SIZE: u64 = 20;

/// Low-level ZIP file parser.
///
/// Typically used through [`ZipExtractor`](super::ZipExtractor)
/// rather than directly.
pub struct ZipParser<R: ReadAt> {
    /// The underlying data source
    reader: Arc<R>,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Tries the comment-less position first, then scans backwards through
    /// the last 64 KiB for a record whose comment length reaches exactly
    /// to the end of the data.
    ///
    /// Returns the record and its offset.
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        let eocd_size = EndOfCentralDirectory::SIZE as u64;
        if self.size < eocd_size {
            return Err(Error::invalid("too short to hold an End of Central Directory"));
        }

        let offset = self.size - eocd_size;
        let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
        self.reader.read_exact_at(offset, &mut buf).await?;

        if buf[0..4] == EndOfCentralDirectory::SIGNATURE[..] && buf[20..22] == [0u8, 0] {
            trace!("EOCD found at {} without comment", offset);
            return Ok((EndOfCentralDirectory::from_bytes(&buf)?, offset));
        }

        let search_size = (MAX_COMMENT_SIZE + eocd_size).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf).await?;

        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if buf[i..i + 4] != EndOfCentralDirectory::SIGNATURE[..] {
                continue;
            }
            let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
            if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                let eocd =
                    EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])?;
                let offset = search_start + i as u64;
                trace!("EOCD found at {} with {} byte comment", offset, comment_len);
                return Ok((eocd, offset));
            }
        }

        Err(Error::invalid("End of Central Directory not found"))
    }

    /// List all entries in the archive, in central directory order.
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        if eocd.is_zip64() && self.has_zip64_locator(eocd_offset).await? {
            return Err(Error::UnsupportedFeature { feature: "ZIP64" });
        }
        if eocd.disk_number != 0
            || eocd.disk_with_cd != 0
            || eocd.disk_entries != eocd.total_entries
        {
            return Err(Error::UnsupportedFeature {
                feature: "multi-disk archives",
            });
        }

        let cd_offset = eocd.cd_offset as u64;
        let cd_size = eocd.cd_size as u64;
        if cd_offset + cd_size > eocd_offset {
            return Err(Error::invalid(format!(
                "central directory ({} bytes at {}) overlaps its end record at {}",
                cd_size, cd_offset, eocd_offset
            )));
        }

        // One read for the whole directory
        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader.read_exact_at(cd_offset, &mut cd_data).await?;

        let mut entries = Vec::with_capacity(eocd.total_entries as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());

        for _ in 0..eocd.total_entries {
            let entry = self.parse_cdfh(&mut cursor)?;
            trace!("central directory entry {}", entry.file_name);
            entries.push(entry);
        }

        if cursor.position() != cd_size {
            return Err(Error::invalid(format!(
                "central directory holds {} bytes past its last entry",
                cd_size - cursor.position()
            )));
        }

        Ok(entries)
    }

    /// Whether a ZIP64 locator sits directly before the end record.
    async fn has_zip64_locator(&self, eocd_offset: u64) -> Result<bool> {
        if eocd_offset < ZIP64_LOCATOR_SIZE {
            return Ok(false);
        }
        let mut sig = [0u8; 4];
        self.reader
            .read_exact_at(eocd_offset - ZIP64_LOCATOR_SIZE, &mut sig)
            .await?;
        Ok(&sig == ZIP64_LOCATOR_SIGNATURE)
    }

    /// Parse one Central Directory File Header and its trailing name,
    /// skipping the extra field and comment.
    fn parse_cdfh(&self, cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
        let header = CentralDirectoryHeader::read_from(cursor)?;

        let mut file_name_bytes = vec![0u8; header.file_name_length as usize];
        std::io::Read::read_exact(cursor, &mut file_name_bytes)?;

        let is_utf8 = header.flags & FLAG_UTF8 != 0;
        // Use lossy conversion to handle non-UTF8 filenames gracefully
        let file_name = String::from_utf8_lossy(&file_name_bytes).into_owned();
        let is_directory = file_name.ends_with('/');

        let skip = header.extra_field_length as u64 + header.file_comment_length as u64;
        let next = cursor.position() + skip;
        if next > cursor.get_ref().len() as u64 {
            return Err(Error::invalid(format!(
                "central directory entry {} runs past the directory",
                file_name
            )));
        }
        cursor.set_position(next);

        Ok(ZipFileEntry {
            file_name,
            compression_method: header.compression_method,
            compressed_size: header.compressed_size,
            uncompressed_size: header.uncompressed_size,
            crc32: header.crc32,
            lfh_offset: header.lfh_offset,
            modified: header.modified,
            is_utf8,
            is_directory,
        })
    }

    /// Get the offset of the entry's data.
    ///
    /// The Local File Header's name and extra field lengths may differ
    /// from the Central Directory copy, so they are read from the LFH.
    pub async fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let mut lfh_buf = [0u8; LocalFileHeader::SIZE];
        self.reader
            .read_exact_at(entry.lfh_offset as u64, &mut lfh_buf)
            .await?;

        let lfh = LocalFileHeader::read_from(&mut lfh_buf.as_slice())?;

        Ok(entry.lfh_offset as u64 + lfh.data_offset())
    }

    /// Get a reference to the underlying reader.
    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DosDateTime, MemoryReader, ZipWriter};

    fn parser(bytes: Vec<u8>) -> ZipParser<MemoryReader> {
        ZipParser::new(Arc::new(MemoryReader::new(bytes)))
    }

    fn sample() -> Vec<u8> {
        let mut writer = ZipWriter::new().with_timestamp(DosDateTime::MIN);
        writer.add("a.txt", b"alpha").unwrap();
        writer.add("dir/", b"").unwrap();
        writer.finish().unwrap().into_bytes()
    }

    #[tokio::test]
    async fn test_list_files() {
        let entries = parser(sample()).list_files().await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].file_name, "a.txt");
        assert_eq!(entries[0].uncompressed_size, 5);
        assert_eq!(entries[0].lfh_offset, 0);
        assert!(entries[0].is_utf8);
        assert!(!entries[0].is_directory);
        assert_eq!(entries[1].lfh_offset, 40);
        assert!(entries[1].is_directory);
    }

    #[tokio::test]
    async fn test_find_eocd_with_comment() {
        let mut bytes = sample();
        let len = bytes.len();
        // Patch in a 7 byte comment
        bytes[len - 2..].copy_from_slice(&7u16.to_le_bytes());
        bytes.extend_from_slice(b"comment");

        let parser = parser(bytes);
        let (eocd, offset) = parser.find_eocd().await.unwrap();
        assert_eq!(offset as usize, len - EndOfCentralDirectory::SIZE);
        assert_eq!(eocd.comment_len, 7);
        assert_eq!(parser.list_files().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_data_offset() {
        let parser = parser(sample());
        let entries = parser.list_files().await.unwrap();
        assert_eq!(parser.get_data_offset(&entries[0]).await.unwrap(), 35);
        assert_eq!(parser.get_data_offset(&entries[1]).await.unwrap(), 40 + 34);
    }

    #[tokio::test]
    async fn test_not_a_zip() {
        let err = parser(b"definitely not a zip archive".to_vec())
            .list_files()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));

        let err = parser(b"PK".to_vec()).list_files().await.unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[tokio::test]
    async fn test_zip64_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(ZIP64_LOCATOR_SIGNATURE);
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&0u64.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        EndOfCentralDirectory::new(0xFFFF, 0xFFFFFFFF, 0xFFFFFFFF)
            .write_to(&mut bytes)
            .unwrap();
        let err = parser(bytes).list_files().await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature { feature: "ZIP64" }));
    }

    #[tokio::test]
    async fn test_all_ones_count_without_locator_is_plain() {
        // 0xFFFF entries in a directory that is too short: read as a plain
        // record and fail on the directory, not as ZIP64
        let mut bytes = vec![0u8; 32];
        EndOfCentralDirectory::new(0xFFFF, 0, 0)
            .write_to(&mut bytes)
            .unwrap();
        let err = parser(bytes).list_files().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Io(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof
        ));
    }

    #[tokio::test]
    async fn test_truncated_directory() {
        let mut bytes = sample();
        let len = bytes.len();
        // Claim one more entry than the directory holds
        bytes[len - 14..len - 12].copy_from_slice(&3u16.to_le_bytes());
        bytes[len - 12..len - 10].copy_from_slice(&3u16.to_le_bytes());
        assert!(parser(bytes).list_files().await.is_err());
    }
}
