//! CRC-32 (IEEE 802.3) as used by ZIP headers.
//!
//! The lookup table is computed at compile time from the reflected
//! polynomial `0xEDB88320`, so checksumming never rebuilds it.

const POLYNOMIAL: u32 = 0xEDB8_8320;

const fn make_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLYNOMIAL
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static TABLE: [u32; 256] = make_table();

#[inline]
fn fold(mut acc: u32, data: &[u8]) -> u32 {
    for &byte in data {
        acc = TABLE[((acc ^ byte as u32) & 0xFF) as usize] ^ (acc >> 8);
    }
    acc
}

/// Compute the CRC-32 of `data` in one call.
///
/// ```
/// assert_eq!(storezip::crc32(b"123456789"), 0xCBF43926);
/// ```
pub fn crc32(data: &[u8]) -> u32 {
    fold(0xFFFF_FFFF, data) ^ 0xFFFF_FFFF
}

/// Incremental CRC-32 for data that arrives in pieces.
#[derive(Debug, Clone)]
pub struct Crc32 {
    state: u32,
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc32 {
    pub fn new() -> Self {
        Self { state: 0xFFFF_FFFF }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.state = fold(self.state, data);
    }

    pub fn finalize(&self) -> u32 {
        self.state ^ 0xFFFF_FFFF
    }
}
