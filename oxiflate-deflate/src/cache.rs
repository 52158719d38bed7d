//! Longest match cache.
//!
//! The optimal parser asks for the longest match at every position of a
//! block once per iteration. The answers never change between iterations, so
//! the first full query at a position is remembered together with a
//! compressed copy of its sub-length table: for each achievable length, the
//! smallest distance reaching it.

use crate::tables::MIN_MATCH;

/// Number of (length, distance) breakpoints kept per position.
pub const CACHE_LENGTH: usize = 8;

/// Per-position memo of longest matches, relative to the block start.
#[derive(Debug, Clone)]
pub struct MatchCache {
    length: Vec<u16>,
    dist: Vec<u16>,
    /// `CACHE_LENGTH` entries of (length - 3, dist low, dist high) per position.
    sublen: Vec<u8>,
}

impl MatchCache {
    /// Create a cache for a block of `block_size` bytes, all positions unfilled.
    pub fn new(block_size: usize) -> Self {
        Self {
            // (1, 0) cannot be a real answer and marks an unfilled slot.
            length: vec![1; block_size],
            dist: vec![0; block_size],
            sublen: vec![0; CACHE_LENGTH * 3 * block_size],
        }
    }

    /// Whether a result has been stored for `pos`.
    #[inline]
    pub fn is_filled(&self, pos: usize) -> bool {
        self.length[pos] == 0 || self.dist[pos] != 0
    }

    /// The stored `(length, distance)` for `pos`.
    #[inline]
    pub fn get(&self, pos: usize) -> (u16, u16) {
        (self.length[pos], self.dist[pos])
    }

    /// Remember the longest match at `pos` and its sub-length table.
    ///
    /// Lengths below 3 are stored as "no match". Panics if `pos` was already
    /// filled.
    pub fn store(&mut self, pos: usize, length: u16, dist: u16, sublen: &[u16]) {
        assert!(
            self.length[pos] == 1 && self.dist[pos] == 0,
            "match cache slot {} filled twice",
            pos
        );
        let (length, dist) = if (length as usize) < MIN_MATCH {
            (0, 0)
        } else {
            (length, dist)
        };
        self.length[pos] = length;
        self.dist[pos] = dist;
        self.sublen_to_cache(sublen, pos, length);
    }

    fn sublen_to_cache(&mut self, sublen: &[u16], pos: usize, length: u16) {
        if (length as usize) < MIN_MATCH {
            return;
        }

        let base = CACHE_LENGTH * 3 * pos;
        let cache = &mut self.sublen[base..base + CACHE_LENGTH * 3];
        let mut slot = 0;
        let mut best_length = 0;
        for i in MIN_MATCH as u16..=length {
            if i == length || sublen[i as usize] != sublen[i as usize + 1] {
                let dist = sublen[i as usize];
                cache[slot * 3] = (i - MIN_MATCH as u16) as u8;
                cache[slot * 3 + 1] = dist as u8;
                cache[slot * 3 + 2] = (dist >> 8) as u8;
                best_length = i;
                slot += 1;
                if slot >= CACHE_LENGTH {
                    break;
                }
            }
        }

        if slot < CACHE_LENGTH {
            assert_eq!(best_length, length);
            // The last slot always records the longest cached length.
            cache[(CACHE_LENGTH - 1) * 3] = (best_length - MIN_MATCH as u16) as u8;
        } else {
            assert!(best_length <= length);
        }
        debug_assert_eq!(best_length, self.max_cached_sublen(pos));
    }

    /// Rebuild the sub-length table at `pos` for lengths up to `length`.
    pub fn cache_to_sublen(&self, pos: usize, length: u16, sublen: &mut [u16]) {
        if (length as usize) < MIN_MATCH {
            return;
        }

        let max_length = self.max_cached_sublen(pos);
        let base = CACHE_LENGTH * 3 * pos;
        let mut prev_length = MIN_MATCH as u16;
        for slot in 0..CACHE_LENGTH {
            let entry = &self.sublen[base + slot * 3..base + slot * 3 + 3];
            let slot_length = entry[0] as u16 + MIN_MATCH as u16;
            let dist = u16::from_le_bytes([entry[1], entry[2]]);
            for i in prev_length..=slot_length {
                sublen[i as usize] = dist;
            }
            if slot_length == max_length {
                break;
            }
            prev_length = slot_length + 1;
        }
    }

    /// Longest length whose distance can be rebuilt from the cache at `pos`,
    /// or 0 when nothing is cached.
    pub fn max_cached_sublen(&self, pos: usize) -> u16 {
        let base = CACHE_LENGTH * 3 * pos;
        if self.sublen[base + 1] == 0 && self.sublen[base + 2] == 0 {
            return 0;
        }
        self.sublen[base + (CACHE_LENGTH - 1) * 3] as u16 + MIN_MATCH as u16
    }
}
