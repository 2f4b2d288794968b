use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use super::dos_time::DosDateTime;
use crate::error::{Error, Result};

/// "Version needed to extract" and "version made by" written by this crate (2.0).
pub const ZIP_VERSION: u16 = 20;

/// General purpose flag bit 11: file name is UTF-8.
pub const FLAG_UTF8: u16 = 1 << 11;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

fn read_signature<R: Read>(reader: &mut R, expected: &[u8; 4], what: &str) -> Result<()> {
    let mut sig = [0u8; 4];
    reader.read_exact(&mut sig)?;
    if &sig != expected {
        return Err(Error::invalid(format!("bad {what} signature")));
    }
    Ok(())
}

/// Local File Header (LFH) - 30 bytes, followed by the name and the entry data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub modified: DosDateTime,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
}

impl LocalFileHeader {
    pub const SIGNATURE: &'static [u8; 4] = b"PK\x03\x04";
    pub const SIZE: usize = 30;

    /// Header for a STORE entry with a UTF-8 name.
    pub fn stored(name_len: u16, crc32: u32, size: u32, modified: DosDateTime) -> Self {
        Self {
            version_needed: ZIP_VERSION,
            flags: FLAG_UTF8,
            compression_method: CompressionMethod::Stored,
            modified,
            crc32,
            compressed_size: size,
            uncompressed_size: size,
            file_name_length: name_len,
            extra_field_length: 0,
        }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(Self::SIGNATURE)?;
        writer.write_u16::<LittleEndian>(self.version_needed)?;
        writer.write_u16::<LittleEndian>(self.flags)?;
        writer.write_u16::<LittleEndian>(self.compression_method.as_u16())?;
        writer.write_u16::<LittleEndian>(self.modified.time)?;
        writer.write_u16::<LittleEndian>(self.modified.date)?;
        writer.write_u32::<LittleEndian>(self.crc32)?;
        writer.write_u32::<LittleEndian>(self.compressed_size)?;
        writer.write_u32::<LittleEndian>(self.uncompressed_size)?;
        writer.write_u16::<LittleEndian>(self.file_name_length)?;
        writer.write_u16::<LittleEndian>(self.extra_field_length)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        read_signature(reader, Self::SIGNATURE, "Local File Header")?;

        Ok(Self {
            version_needed: reader.read_u16::<LittleEndian>()?,
            flags: reader.read_u16::<LittleEndian>()?,
            compression_method: CompressionMethod::from_u16(reader.read_u16::<LittleEndian>()?),
            modified: {
                let time = reader.read_u16::<LittleEndian>()?;
                let date = reader.read_u16::<LittleEndian>()?;
                DosDateTime::from_raw(time, date)
            },
            crc32: reader.read_u32::<LittleEndian>()?,
            compressed_size: reader.read_u32::<LittleEndian>()?,
            uncompressed_size: reader.read_u32::<LittleEndian>()?,
            file_name_length: reader.read_u16::<LittleEndian>()?,
            extra_field_length: reader.read_u16::<LittleEndian>()?,
        })
    }

    /// Bytes between the start of this header and the entry data.
    pub fn data_offset(&self) -> u64 {
        Self::SIZE as u64 + self.file_name_length as u64 + self.extra_field_length as u64
    }
}

/// Central Directory File Header (CDFH) - 46 bytes, followed by name, extra and comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryHeader {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub modified: DosDateTime,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
    pub file_comment_length: u16,
    pub disk_number_start: u16,
    pub internal_attrs: u16,
    pub external_attrs: u32,
    pub lfh_offset: u32,
}

impl CentralDirectoryHeader {
    pub const SIGNATURE: &'static [u8; 4] = b"PK\x01\x02";
    pub const SIZE: usize = 46;

    /// Header pointing at a STORE entry written at `lfh_offset`.
    pub fn stored(
        name_len: u16,
        crc32: u32,
        size: u32,
        modified: DosDateTime,
        lfh_offset: u32,
    ) -> Self {
        Self {
            version_made_by: ZIP_VERSION,
            version_needed: ZIP_VERSION,
            flags: FLAG_UTF8,
            compression_method: CompressionMethod::Stored,
            modified,
            crc32,
            compressed_size: size,
            uncompressed_size: size,
            file_name_length: name_len,
            extra_field_length: 0,
            file_comment_length: 0,
            disk_number_start: 0,
            internal_attrs: 0,
            external_attrs: 0,
            lfh_offset,
        }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(Self::SIGNATURE)?;
        writer.write_u16::<LittleEndian>(self.version_made_by)?;
        writer.write_u16::<LittleEndian>(self.version_needed)?;
        writer.write_u16::<LittleEndian>(self.flags)?;
        writer.write_u16::<LittleEndian>(self.compression_method.as_u16())?;
        writer.write_u16::<LittleEndian>(self.modified.time)?;
        writer.write_u16::<LittleEndian>(self.modified.date)?;
        writer.write_u32::<LittleEndian>(self.crc32)?;
        writer.write_u32::<LittleEndian>(self.compressed_size)?;
        writer.write_u32::<LittleEndian>(self.uncompressed_size)?;
        writer.write_u16::<LittleEndian>(self.file_name_length)?;
        writer.write_u16::<LittleEndian>(self.extra_field_length)?;
        writer.write_u16::<LittleEndian>(self.file_comment_length)?;
        writer.write_u16::<LittleEndian>(self.disk_number_start)?;
        writer.write_u16::<LittleEndian>(self.internal_attrs)?;
        writer.write_u32::<LittleEndian>(self.external_attrs)?;
        writer.write_u32::<LittleEndian>(self.lfh_offset)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        read_signature(reader, Self::SIGNATURE, "Central Directory File Header")?;

        Ok(Self {
            version_made_by: reader.read_u16::<LittleEndian>()?,
            version_needed: reader.read_u16::<LittleEndian>()?,
            flags: reader.read_u16::<LittleEndian>()?,
            compression_method: CompressionMethod::from_u16(reader.read_u16::<LittleEndian>()?),
            modified: {
                let time = reader.read_u16::<LittleEndian>()?;
                let date = reader.read_u16::<LittleEndian>()?;
                DosDateTime::from_raw(time, date)
            },
            crc32: reader.read_u32::<LittleEndian>()?,
            compressed_size: reader.read_u32::<LittleEndian>()?,
            uncompressed_size: reader.read_u32::<LittleEndian>()?,
            file_name_length: reader.read_u16::<LittleEndian>()?,
            extra_field_length: reader.read_u16::<LittleEndian>()?,
            file_comment_length: reader.read_u16::<LittleEndian>()?,
            disk_number_start: reader.read_u16::<LittleEndian>()?,
            internal_attrs: reader.read_u16::<LittleEndian>()?,
            external_attrs: reader.read_u32::<LittleEndian>()?,
            lfh_offset: reader.read_u32::<LittleEndian>()?,
        })
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8; 4] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    /// Single-disk record without a comment.
    pub fn new(entries: u16, cd_size: u32, cd_offset: u32) -> Self {
        Self {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: entries,
            total_entries: entries,
            cd_size,
            cd_offset,
            comment_len: 0,
        }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(Self::SIGNATURE)?;
        writer.write_u16::<LittleEndian>(self.disk_number)?;
        writer.write_u16::<LittleEndian>(self.disk_with_cd)?;
        writer.write_u16::<LittleEndian>(self.disk_entries)?;
        writer.write_u16::<LittleEndian>(self.total_entries)?;
        writer.write_u32::<LittleEndian>(self.cd_size)?;
        writer.write_u32::<LittleEndian>(self.cd_offset)?;
        writer.write_u16::<LittleEndian>(self.comment_len)?;
        Ok(())
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::invalid("truncated End of Central Directory"));
        }

        let mut cursor = data;
        read_signature(&mut cursor, Self::SIGNATURE, "End of Central Directory")?;

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>()?,
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    /// Whether any count, size or offset holds its all-ones value.
    ///
    /// These are ZIP64 sentinels only when a ZIP64 locator precedes the
    /// record. A plain archive with exactly 65535 entries carries them too.
    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }
}

/// Parsed ZIP file entry information
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub crc32: u32,
    pub lfh_offset: u32,
    pub modified: DosDateTime,
    pub is_utf8: bool,
    pub is_directory: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_header_layout() {
        let modified = DosDateTime::from_raw(0x6B8F, 0x586F);
        let header = LocalFileHeader::stored(5, 0xCBF43926, 9, modified);

        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();

        assert_eq!(buf.len(), LocalFileHeader::SIZE);
        assert_eq!(
            buf,
            [
                0x50, 0x4B, 0x03, 0x04, // signature
                0x14, 0x00, // version needed
                0x00, 0x08, // flags (UTF-8)
                0x00, 0x00, // method
                0x8F, 0x6B, // time
                0x6F, 0x58, // date
                0x26, 0x39, 0xF4, 0xCB, // crc
                0x09, 0x00, 0x00, 0x00, // compressed size
                0x09, 0x00, 0x00, 0x00, // uncompressed size
                0x05, 0x00, // name length
                0x00, 0x00, // extra length
            ]
        );

        assert_eq!(LocalFileHeader::read_from(&mut buf.as_slice()).unwrap(), header);
    }

    #[test]
    fn test_central_header_layout() {
        let header =
            CentralDirectoryHeader::stored(3, 0xDEADBEEF, 0x0102, DosDateTime::MIN, 0x0A0B0C0D);

        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();

        assert_eq!(buf.len(), CentralDirectoryHeader::SIZE);
        assert_eq!(&buf[0..4], b"PK\x01\x02");
        assert_eq!(&buf[4..6], &[20, 0]); // made by
        assert_eq!(&buf[6..8], &[20, 0]); // needed
        assert_eq!(&buf[8..10], &[0x00, 0x08]);
        assert_eq!(&buf[10..12], &[0, 0]);
        assert_eq!(&buf[16..20], &0xDEADBEEFu32.to_le_bytes());
        assert_eq!(&buf[20..24], &0x0102u32.to_le_bytes());
        assert_eq!(&buf[24..28], &0x0102u32.to_le_bytes());
        assert_eq!(&buf[28..30], &[3, 0]);
        // extra, comment, disk, internal attrs, external attrs
        assert!(buf[30..42].iter().all(|&b| b == 0));
        assert_eq!(&buf[42..46], &[0x0D, 0x0C, 0x0B, 0x0A]);

        assert_eq!(CentralDirectoryHeader::read_from(&mut buf.as_slice()).unwrap(), header);
    }

    #[test]
    fn test_eocd_layout() {
        let eocd = EndOfCentralDirectory::new(2, 100, 300);

        let mut buf = Vec::new();
        eocd.write_to(&mut buf).unwrap();

        assert_eq!(
            buf,
            [
                0x50, 0x4B, 0x05, 0x06, 0, 0, 0, 0, 2, 0, 2, 0, 100, 0, 0, 0, 0x2C, 0x01, 0, 0, 0,
                0,
            ]
        );
        assert_eq!(EndOfCentralDirectory::from_bytes(&buf).unwrap(), eocd);
        assert!(!eocd.is_zip64());
    }

    #[test]
    fn test_bad_signature() {
        let mut buf = Vec::new();
        EndOfCentralDirectory::new(0, 0, 0).write_to(&mut buf).unwrap();
        buf[3] = 0x07;
        assert!(matches!(
            EndOfCentralDirectory::from_bytes(&buf),
            Err(Error::InvalidFormat(_))
        ));
        assert!(matches!(
            EndOfCentralDirectory::from_bytes(&buf[..10]),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_compression_method() {
        assert_eq!(CompressionMethod::from_u16(0), CompressionMethod::Stored);
        assert_eq!(CompressionMethod::from_u16(8), CompressionMethod::Unknown(8));
        assert_eq!(CompressionMethod::Unknown(8).as_u16(), 8);
    }
}
