//! Cost models and symbol statistics for the optimal parser.

use crate::lz77::Lz77Token;
use crate::tables::{
    DISTANCE_BASE, END_OF_BLOCK, MAX_MATCH, MIN_MATCH, NUM_DIST, NUM_LITLEN,
    distance_extra_bits, distance_symbol, length_extra_bits, length_symbol,
};

/// Ideal code length of each symbol: `log2(total / count)`.
///
/// A symbol that never occurred costs `log2(total)`. An all-zero table
/// costs `log2(n)` for every symbol.
pub fn entropy(counts: &[f64], bit_lengths: &mut [f64]) {
    debug_assert_eq!(counts.len(), bit_lengths.len());
    let sum: f64 = counts.iter().sum();
    let log2sum = if sum == 0.0 {
        (counts.len() as f64).log2()
    } else {
        sum.log2()
    };

    for (bits, &count) in bit_lengths.iter_mut().zip(counts) {
        *bits = if count == 0.0 {
            log2sum
        } else {
            (sum / count).log2()
        };
        debug_assert!(*bits >= 0.0, "negative entropy");
    }
}

/// Marsaglia's multiply-with-carry generator.
///
/// Seeded identically for every call so compression stays deterministic.
#[derive(Debug, Clone)]
pub struct MwcRng {
    m_w: u32,
    m_z: u32,
}

impl MwcRng {
    /// Generator with the fixed seeds (1, 2).
    pub fn new() -> Self {
        Self { m_w: 1, m_z: 2 }
    }

    /// Next 32-bit value.
    pub fn next_u32(&mut self) -> u32 {
        self.m_z = 36969 * (self.m_z & 65535) + (self.m_z >> 16);
        self.m_w = 18000 * (self.m_w & 65535) + (self.m_w >> 16);
        (self.m_z << 16).wrapping_add(self.m_w)
    }

    /// With probability 1/3 replace each frequency by a randomly chosen one
    /// of the same table.
    fn shuffle_frequencies(&mut self, freqs: &mut [f64]) {
        let n = freqs.len() as u32;
        for i in 0..freqs.len() {
            if (self.next_u32() >> 4) % 3 == 0 {
                freqs[i] = freqs[(self.next_u32() % n) as usize];
            }
        }
    }
}

impl Default for MwcRng {
    fn default() -> Self {
        Self::new()
    }
}

/// Symbol frequencies and their entropy-derived costs in bits.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolStats {
    /// Literal/length symbol frequencies.
    pub litlens: [f64; NUM_LITLEN],
    /// Distance symbol frequencies.
    pub dists: [f64; NUM_DIST],
    /// Cost in bits of each literal/length symbol.
    pub ll_symbols: [f64; NUM_LITLEN],
    /// Cost in bits of each distance symbol.
    pub d_symbols: [f64; NUM_DIST],
}

impl SymbolStats {
    /// Count the symbols of a parse and derive their costs.
    pub fn from_tokens(tokens: &[Lz77Token]) -> Self {
        let mut stats = Self {
            litlens: [0.0; NUM_LITLEN],
            dists: [0.0; NUM_DIST],
            ll_symbols: [0.0; NUM_LITLEN],
            d_symbols: [0.0; NUM_DIST],
        };
        for token in tokens {
            stats.litlens[token.litlen_symbol()] += 1.0;
            if let Some(dist) = token.dist_symbol() {
                stats.dists[dist] += 1.0;
            }
        }
        stats.litlens[END_OF_BLOCK] = 1.0;
        stats.calculate();
        stats
    }

    /// Recompute symbol costs from the frequencies.
    pub fn calculate(&mut self) {
        entropy(&self.litlens, &mut self.ll_symbols);
        entropy(&self.dists, &mut self.d_symbols);
    }

    /// `self * w1 + other * w2`, with costs recomputed.
    pub fn add_weighted(&self, w1: f64, other: &Self, w2: f64) -> Self {
        let mut result = self.clone();
        for (out, (&a, &b)) in result
            .litlens
            .iter_mut()
            .zip(self.litlens.iter().zip(&other.litlens))
        {
            *out = a * w1 + b * w2;
        }
        for (out, (&a, &b)) in result
            .dists
            .iter_mut()
            .zip(self.dists.iter().zip(&other.dists))
        {
            *out = a * w1 + b * w2;
        }
        result.litlens[END_OF_BLOCK] = 1.0;
        result.calculate();
        result
    }

    /// Perturb the frequencies to escape a local optimum, then recompute costs.
    pub fn randomize(&mut self, rng: &mut MwcRng) {
        rng.shuffle_frequencies(&mut self.litlens);
        rng.shuffle_frequencies(&mut self.dists);
        self.litlens[END_OF_BLOCK] = 1.0;
        self.calculate();
    }
}

/// Bit cost model for literals and matches.
#[derive(Debug, Clone, Copy)]
pub enum CostModel<'a> {
    /// Exact costs under the fixed Huffman tree.
    Fixed,
    /// Entropy estimates from symbol statistics.
    Stat(&'a SymbolStats),
}

impl CostModel<'_> {
    /// Cost of a literal byte.
    #[inline]
    pub fn literal_cost(&self, byte: u8) -> f64 {
        match self {
            Self::Fixed => {
                if byte <= 143 {
                    8.0
                } else {
                    9.0
                }
            }
            Self::Stat(stats) => stats.ll_symbols[byte as usize],
        }
    }

    /// Cost of a match, including extra bits.
    #[inline]
    pub fn match_cost(&self, length: u16, distance: u16) -> f64 {
        let lsym = length_symbol(length);
        let extra = (length_extra_bits(length) + distance_extra_bits(distance)) as f64;
        match self {
            Self::Fixed => {
                // Every distance symbol is 5 bits; length symbols 7 or 8.
                let lbits = if lsym <= 279 { 7.0 } else { 8.0 };
                5.0 + lbits + extra
            }
            Self::Stat(stats) => {
                let dsym = distance_symbol(distance);
                stats.ll_symbols[lsym as usize] + stats.d_symbols[dsym as usize] + extra
            }
        }
    }

    /// Cost of a token.
    pub fn token_cost(&self, token: &Lz77Token) -> f64 {
        match *token {
            Lz77Token::Literal(byte) => self.literal_cost(byte),
            Lz77Token::Match { length, distance } => self.match_cost(length, distance),
        }
    }

    /// Lower bound on the cost of any match, used to prune the search.
    ///
    /// Combines the cheapest length at distance 1 with the cheapest
    /// distance symbol at length 3.
    pub fn min_cost(&self) -> f64 {
        let mut best_length = MIN_MATCH as u16;
        let mut best = f64::INFINITY;
        for length in MIN_MATCH as u16..=MAX_MATCH as u16 {
            let cost = self.match_cost(length, 1);
            if cost < best {
                best = cost;
                best_length = length;
            }
        }

        let mut best_distance = 1;
        best = f64::INFINITY;
        for &distance in &DISTANCE_BASE {
            let cost = self.match_cost(MIN_MATCH as u16, distance);
            if cost < best {
                best = cost;
                best_distance = distance;
            }
        }

        self.match_cost(best_length, best_distance)
    }
}
