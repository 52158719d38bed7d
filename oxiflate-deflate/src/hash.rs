//! Rolling hash chains over the sliding window.
//!
//! Every position in the window is linked to the previous position whose
//! next three bytes hash to the same value. A second set of chains keys the
//! hash on the length of the current run of identical bytes as well, which
//! lets the match finder skip quickly through long runs.

use crate::tables::{MIN_MATCH, WINDOW_MASK, WINDOW_SIZE};

const HASH_SHIFT: u32 = 5;
const HASH_MASK: usize = 32767;

/// Number of slots in the head tables.
const HEAD_SIZE: usize = 65536;

/// Hash chains for one parse of a block.
///
/// [`HashChain::update`] must be called exactly once for every position, in
/// increasing order, before that position is queried.
#[derive(Debug, Clone)]
pub struct HashChain {
    /// Hash value to most recent window index, or -1.
    pub(crate) head: Vec<i32>,
    /// Window index to the previous index with the same hash.
    /// `prev[i] == i` marks the end of a chain.
    pub(crate) prev: Vec<u16>,
    /// Window index to the hash value stored there, or -1.
    pub(crate) hash_val: Vec<i32>,
    /// Hash of the three bytes at the last updated position.
    pub(crate) val: usize,

    pub(crate) head2: Vec<i32>,
    pub(crate) prev2: Vec<u16>,
    pub(crate) hash_val2: Vec<i32>,
    pub(crate) val2: usize,

    /// Number of following bytes equal to the byte at each window index.
    pub(crate) same: Vec<u16>,
}

impl HashChain {
    /// Create empty hash chains.
    pub fn new() -> Self {
        Self {
            head: vec![-1; HEAD_SIZE],
            prev: (0..WINDOW_SIZE as u16).collect(),
            hash_val: vec![-1; WINDOW_SIZE],
            val: 0,
            head2: vec![-1; HEAD_SIZE],
            prev2: (0..WINDOW_SIZE as u16).collect(),
            hash_val2: vec![-1; WINDOW_SIZE],
            val2: 0,
            same: vec![0; WINDOW_SIZE],
        }
    }

    #[inline]
    fn roll(&mut self, byte: u8) {
        self.val = ((self.val << HASH_SHIFT) ^ byte as usize) & HASH_MASK;
    }

    /// Prime the rolling hash with the first two bytes at `pos`.
    pub fn warmup(&mut self, data: &[u8], pos: usize, end: usize) {
        if pos < end {
            self.roll(data[pos]);
        }
        if pos + 1 < end {
            self.roll(data[pos + 1]);
        }
    }

    /// Insert `pos` into the chains. Bytes at or past `end` hash as zero.
    pub fn update(&mut self, data: &[u8], pos: usize, end: usize) {
        let hpos = pos & WINDOW_MASK;

        let incoming = if pos + MIN_MATCH <= end {
            data[pos + MIN_MATCH - 1]
        } else {
            0
        };
        self.roll(incoming);

        let val = self.val;
        self.hash_val[hpos] = val as i32;
        let head = self.head[val];
        self.prev[hpos] = if head != -1 && self.hash_val[head as usize] == val as i32 {
            head as u16
        } else {
            hpos as u16
        };
        self.head[val] = hpos as i32;

        // Continue the run length of the previous position when possible.
        let previous = self.same[pos.wrapping_sub(1) & WINDOW_MASK];
        let mut amount = previous.saturating_sub(1) as usize;
        while pos + amount + 1 < end
            && data[pos] == data[pos + amount + 1]
            && amount < u16::MAX as usize
        {
            amount += 1;
        }
        self.same[hpos] = amount as u16;

        self.val2 = ((amount as u16).wrapping_sub(MIN_MATCH as u16) & 255) as usize ^ val;
        let val2 = self.val2;
        self.hash_val2[hpos] = val2 as i32;
        let head2 = self.head2[val2];
        self.prev2[hpos] = if head2 != -1 && self.hash_val2[head2 as usize] == val2 as i32 {
            head2 as u16
        } else {
            hpos as u16
        };
        self.head2[val2] = hpos as i32;
    }
}

impl Default for HashChain {
    fn default() -> Self {
        Self::new()
    }
}
