//! In-memory ZIP writer using the STORE method.
//!
//! Each call to [`ZipWriter::add`] emits the entry's local record straight
//! into the output buffer; [`ZipWriter::finish`] appends the central
//! directory and the end record and hands back the finished bytes.

use log::debug;

use super::crc::crc32;
use super::dos_time::DosDateTime;
use super::structures::{CentralDirectoryHeader, EndOfCentralDirectory, LocalFileHeader};
use crate::error::{Error, Result};

/// Largest entry count the 16-bit EOCD fields can hold.
pub const MAX_ENTRIES: usize = u16::MAX as usize;

/// Largest UTF-8 name length the 16-bit name fields can hold.
pub const MAX_NAME_LEN: usize = u16::MAX as usize;

/// Metadata for one entry already written to the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntry {
    name: String,
    crc32: u32,
    size: u32,
    offset: u32,
    modified: DosDateTime,
}

impl ZipEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    /// Content length; compressed and uncompressed sizes are equal.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Offset of the local file header from the start of the archive.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn modified(&self) -> DosDateTime {
        self.modified
    }

    /// Length of the local record: header, name and content.
    pub fn local_record_len(&self) -> u64 {
        LocalFileHeader::SIZE as u64 + self.name.len() as u64 + self.size as u64
    }

    /// Length of the central directory record: header and name.
    pub fn central_record_len(&self) -> u64 {
        CentralDirectoryHeader::SIZE as u64 + self.name.len() as u64
    }
}

/// Emit the local file header, name and content for `entry`.
pub(crate) fn write_local_record(
    out: &mut Vec<u8>,
    entry: &ZipEntry,
    content: &[u8],
) -> Result<()> {
    LocalFileHeader::stored(
        entry.name.len() as u16,
        entry.crc32,
        entry.size,
        entry.modified,
    )
    .write_to(out)?;
    out.extend_from_slice(entry.name.as_bytes());
    out.extend_from_slice(content);
    Ok(())
}

/// Emit the central directory header and name for `entry`.
pub(crate) fn write_central_record(out: &mut Vec<u8>, entry: &ZipEntry) -> Result<()> {
    CentralDirectoryHeader::stored(
        entry.name.len() as u16,
        entry.crc32,
        entry.size,
        entry.modified,
        entry.offset,
    )
    .write_to(out)?;
    out.extend_from_slice(entry.name.as_bytes());
    Ok(())
}

/// Emit the end of central directory record.
pub(crate) fn write_eocd(
    out: &mut Vec<u8>,
    entries: u16,
    cd_size: u32,
    cd_offset: u32,
) -> Result<()> {
    EndOfCentralDirectory::new(entries, cd_size, cd_offset).write_to(out)?;
    Ok(())
}

/// A finished archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipArchive {
    bytes: Vec<u8>,
    entry_count: usize,
}

impl ZipArchive {
    /// Media type to hand to whatever saves or serves the archive.
    pub const MEDIA_TYPE: &'static str = "application/zip";

    pub fn media_type(&self) -> &'static str {
        Self::MEDIA_TYPE
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always `false`: even an archive with no entries holds its 22 byte
    /// end record. Use [`entry_count`](Self::entry_count) for entries.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }
}

impl AsRef<[u8]> for ZipArchive {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<ZipArchive> for Vec<u8> {
    fn from(archive: ZipArchive) -> Self {
        archive.bytes
    }
}

/// Builds a STORE-only ZIP archive in memory.
///
/// Entries appear in the archive in the order they are added. The writer
/// is single use: [`finish`](Self::finish) consumes it.
///
/// ## Example
///
/// ```
/// use storezip::ZipWriter;
///
/// let mut writer = ZipWriter::new();
/// writer.add("hello.txt", b"Hello, world!")?;
/// writer.add("empty.bin", b"")?;
///
/// let archive = writer.finish()?;
/// assert_eq!(archive.entry_count(), 2);
/// assert_eq!(archive.media_type(), "application/zip");
/// assert_eq!(&archive.as_bytes()[0..4], b"PK\x03\x04");
/// # Ok::<(), storezip::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct ZipWriter {
    /// Everything emitted so far; its length is the next local header offset.
    buffer: Vec<u8>,
    /// Entries in insertion order.
    entries: Vec<ZipEntry>,
    /// Fixed timestamp for every entry; the wall clock is read per entry when unset.
    timestamp: Option<DosDateTime>,
}

impl ZipWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp every entry with `timestamp` instead of the current time.
    ///
    /// Two writers with the same timestamp and the same entries produce
    /// identical bytes.
    pub fn with_timestamp(mut self, timestamp: DosDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Entries added so far, in insertion order.
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Offset at which the next local header will be written.
    pub fn offset(&self) -> u64 {
        self.buffer.len() as u64
    }

    /// Append an entry.
    ///
    /// The entry is checked before anything is written, so on error the
    /// writer holds exactly what it held before the call.
    ///
    /// # Errors
    ///
    /// - [`Error::NameTooLong`] if `name` is longer than 65535 bytes.
    /// - [`Error::EntryTooLarge`] if `content` is 4 GiB or longer.
    /// - [`Error::ArchiveTooLarge`] if the entry would push an offset past
    ///   the 32-bit limit.
    pub fn add(&mut self, name: &str, content: impl AsRef<[u8]>) -> Result<&ZipEntry> {
        let content = content.as_ref();

        if name.len() > MAX_NAME_LEN {
            return Err(Error::NameTooLong { len: name.len() });
        }
        let size = u32::try_from(content.len()).map_err(|_| Error::EntryTooLarge {
            size: content.len() as u64,
        })?;
        let offset = u32::try_from(self.offset()).map_err(|_| Error::ArchiveTooLarge {
            offset: self.offset(),
        })?;

        // The central directory must start below 0xFFFFFFFF, which readers
        // take as a ZIP64 sentinel.
        let end = self.offset() + LocalFileHeader::SIZE as u64 + name.len() as u64 + size as u64;
        if end >= u32::MAX as u64 {
            return Err(Error::ArchiveTooLarge { offset: end });
        }

        let entry = ZipEntry {
            name: name.to_owned(),
            crc32: crc32(content),
            size,
            offset,
            modified: self.timestamp.unwrap_or_else(DosDateTime::now),
        };

        self.buffer.reserve(entry.local_record_len() as usize);
        write_local_record(&mut self.buffer, &entry, content)?;

        debug!(
            "added {} ({} bytes, crc {:#010x}) at offset {}",
            entry.name, entry.size, entry.crc32, entry.offset
        );

        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Write the central directory and end record and return the archive.
    ///
    /// # Errors
    ///
    /// - [`Error::TooManyEntries`] if more than 65535 entries were added.
    /// - [`Error::ArchiveTooLarge`] if the central directory does not fit
    ///   the 32-bit size field.
    pub fn finish(self) -> Result<ZipArchive> {
        let Self {
            mut buffer,
            entries,
            ..
        } = self;

        let count = u16::try_from(entries.len()).map_err(|_| Error::TooManyEntries {
            count: entries.len(),
        })?;

        // add() keeps every local record below 4 GiB
        let cd_offset = buffer.len() as u32;
        let cd_len: u64 = entries.iter().map(ZipEntry::central_record_len).sum();
        let cd_size = u32::try_from(cd_len)
            .ok()
            .filter(|&size| size != u32::MAX)
            .ok_or(Error::ArchiveTooLarge {
                offset: cd_offset as u64 + cd_len,
            })?;

        buffer.reserve(cd_len as usize + EndOfCentralDirectory::SIZE);
        for entry in &entries {
            write_central_record(&mut buffer, entry)?;
        }
        write_eocd(&mut buffer, count, cd_size, cd_offset)?;

        debug!(
            "finished archive: {} entries, central directory {} bytes at {}, {} bytes total",
            count,
            cd_size,
            cd_offset,
            buffer.len()
        );

        Ok(ZipArchive {
            bytes: buffer,
            entry_count: entries.len(),
        })
    }
}
