use super::ReadAt;
use async_trait::async_trait;
use std::io;

/// Random access over an in-memory buffer, e.g. a freshly built archive
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    data: Vec<u8>,
}

impl MemoryReader {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for MemoryReader {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl From<crate::ZipArchive> for MemoryReader {
    fn from(archive: crate::ZipArchive) -> Self {
        Self {
            data: archive.into_bytes(),
        }
    }
}

#[async_trait]
impl ReadAt for MemoryReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let start = match usize::try_from(offset) {
            Ok(start) if start < self.data.len() => start,
            _ => return Ok(0),
        };
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_at() {
        let reader = MemoryReader::new(b"0123456789".to_vec());
        assert_eq!(reader.size(), 10);

        let mut buf = [0u8; 4];
        assert_eq!(reader.read_at(3, &mut buf).await.unwrap(), 4);
        assert_eq!(&buf, b"3456");

        // short read at the tail
        assert_eq!(reader.read_at(8, &mut buf).await.unwrap(), 2);
        assert_eq!(&buf[..2], b"89");

        assert_eq!(reader.read_at(10, &mut buf).await.unwrap(), 0);
        assert_eq!(reader.read_at(u64::MAX, &mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_read_exact_at() {
        let reader = MemoryReader::new(b"0123456789".to_vec());

        let mut buf = [0u8; 3];
        reader.read_exact_at(7, &mut buf).await.unwrap();
        assert_eq!(&buf, b"789");

        let mut buf = [0u8; 4];
        let err = reader.read_exact_at(7, &mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
