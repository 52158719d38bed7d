//! Adler-32 checksum (RFC 1950), carried in zlib trailers.

/// Largest prime smaller than 65536.
const MOD_ADLER: u32 = 65521;

/// Largest n such that 255n(n+1)/2 + (n+1)(MOD_ADLER-1) fits in 32 bits;
/// sums may grow that long before they need reducing.
const NMAX: usize = 5552;

/// Streaming Adler-32 calculator.
#[derive(Debug, Clone)]
pub struct Adler32 {
    a: u32,
    b: u32,
}

impl Adler32 {
    /// Create a new Adler-32 calculator.
    pub fn new() -> Self {
        Self { a: 1, b: 0 }
    }

    /// Feed more data.
    pub fn update(&mut self, data: &[u8]) {
        let (mut a, mut b) = (self.a, self.b);

        for chunk in data.chunks(NMAX) {
            for &byte in chunk {
                a += byte as u32;
                b += a;
            }
            a %= MOD_ADLER;
            b %= MOD_ADLER;
        }

        self.a = a;
        self.b = b;
    }

    /// The checksum of everything fed so far.
    pub fn value(&self) -> u32 {
        (self.b << 16) | self.a
    }

    /// Compute Adler-32 for a slice in one call.
    pub fn checksum(data: &[u8]) -> u32 {
        let mut adler = Self::new();
        adler.update(data);
        adler.value()
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adler32_known_values() {
        assert_eq!(Adler32::checksum(b""), 1);
        assert_eq!(Adler32::checksum(b"a"), 0x0062_0062);
        assert_eq!(Adler32::checksum(b"Wikipedia"), 0x11E6_0398);
    }

    #[test]
    fn test_adler32_long_input_reduces() {
        // Enough 0xFF bytes to overflow without periodic reduction.
        let data = vec![0xFFu8; 3 * NMAX + 17];
        let mut expected_a: u64 = 1;
        let mut expected_b: u64 = 0;
        for &byte in &data {
            expected_a = (expected_a + byte as u64) % MOD_ADLER as u64;
            expected_b = (expected_b + expected_a) % MOD_ADLER as u64;
        }
        let expected = ((expected_b << 16) | expected_a) as u32;
        assert_eq!(Adler32::checksum(&data), expected);
    }

    #[test]
    fn test_adler32_incremental() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let mut adler = Adler32::new();
        adler.update(&data[..10]);
        adler.update(&data[10..]);
        assert_eq!(adler.value(), Adler32::checksum(data));
    }
}
