//! CRC-32 (ISO 3309 / ITU-T V.42), the checksum carried in gzip trailers.
//!
//! The implementation is table driven and consumes four bytes per step
//! ("slicing-by-4") once enough input is available.

const POLYNOMIAL: u32 = 0xEDB8_8320;

/// Lookup tables: `TABLES[0]` is the classic byte table, `TABLES[k]` advances
/// a byte that is followed by `k` more bytes.
const TABLES: [[u32; 256]; 4] = build_tables();

const fn build_tables() -> [[u32; 256]; 4] {
    let mut tables = [[0u32; 256]; 4];

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
        tables[0][i] = crc;
        i += 1;
    }

    let mut k = 1;
    while k < 4 {
        let mut i = 0;
        while i < 256 {
            let prev = tables[k - 1][i];
            tables[k][i] = (prev >> 8) ^ tables[0][(prev & 0xFF) as usize];
            i += 1;
        }
        k += 1;
    }

    tables
}

/// Streaming CRC-32 calculator.
#[derive(Debug, Clone)]
pub struct Crc32 {
    state: u32,
}

impl Crc32 {
    /// Create a new CRC-32 calculator.
    pub fn new() -> Self {
        Self { state: 0xFFFF_FFFF }
    }

    /// Feed more data.
    pub fn update(&mut self, data: &[u8]) {
        let mut crc = self.state;

        let mut words = data.chunks_exact(4);
        for word in &mut words {
            crc ^= u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
            crc = TABLES[3][(crc & 0xFF) as usize]
                ^ TABLES[2][((crc >> 8) & 0xFF) as usize]
                ^ TABLES[1][((crc >> 16) & 0xFF) as usize]
                ^ TABLES[0][(crc >> 24) as usize];
        }
        for &byte in words.remainder() {
            crc = TABLES[0][((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8);
        }

        self.state = crc;
    }

    /// The checksum of everything fed so far.
    #[inline]
    pub fn value(&self) -> u32 {
        !self.state
    }

    /// Consume the calculator and return the checksum.
    #[inline]
    pub fn finalize(self) -> u32 {
        self.value()
    }

    /// Compute CRC-32 for a slice in one call.
    pub fn compute(data: &[u8]) -> u32 {
        let mut crc = Self::new();
        crc.update(data);
        crc.finalize()
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_known_values() {
        assert_eq!(Crc32::compute(b""), 0);
        assert_eq!(Crc32::compute(b"123456789"), 0xCBF4_3926);
        assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4A_C3D0);
        assert_eq!(
            Crc32::compute(b"The quick brown fox jumps over the lazy dog"),
            0x414F_A339
        );
    }

    #[test]
    fn test_crc32_incremental_matches_one_shot() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i * 7 + 3) as u8).collect();
        let mut crc = Crc32::new();
        for chunk in data.chunks(13) {
            crc.update(chunk);
        }
        assert_eq!(crc.finalize(), Crc32::compute(&data));
    }

    #[test]
    fn test_crc32_table_entries() {
        assert_eq!(TABLES[0][0], 0);
        assert_eq!(TABLES[0][1], 0x7707_3096);
        assert_eq!(TABLES[0][255], 0x2D02_EF8D);
    }
}
