//! LZ77 symbols, the longest match finder, and the greedy parser.
//!
//! [`BlockState`] owns everything needed to parse one block: a view of the
//! whole input (bytes before the block act as dictionary) and, optionally,
//! the longest match cache shared by all parses of that block.

use crate::cache::MatchCache;
use crate::hash::HashChain;
use crate::options::Options;
use crate::tables::{
    END_OF_BLOCK, MAX_MATCH, MIN_MATCH, NUM_DIST, NUM_LITLEN, WINDOW_MASK, WINDOW_SIZE,
    distance_extra_bits, distance_symbol, length_extra_bits, length_symbol,
};

/// Maximum number of hash chain links followed per query.
pub const MAX_CHAIN_HITS: usize = 8192;

/// LZ77 symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lz77Token {
    /// Literal byte.
    Literal(u8),
    /// Back-reference: copy `length` (3-258) bytes from `distance` (1-32768)
    /// bytes back.
    Match {
        /// Match length.
        length: u16,
        /// Backward distance.
        distance: u16,
    },
}

impl Lz77Token {
    /// Number of input bytes this symbol covers.
    #[inline]
    pub fn byte_len(&self) -> usize {
        match *self {
            Self::Literal(_) => 1,
            Self::Match { length, .. } => length as usize,
        }
    }

    /// Literal/length symbol (0-285).
    #[inline]
    pub fn litlen_symbol(&self) -> usize {
        match *self {
            Self::Literal(byte) => byte as usize,
            Self::Match { length, .. } => length_symbol(length) as usize,
        }
    }

    /// Distance symbol (0-29), if this is a match.
    #[inline]
    pub fn dist_symbol(&self) -> Option<usize> {
        match *self {
            Self::Literal(_) => None,
            Self::Match { distance, .. } => Some(distance_symbol(distance) as usize),
        }
    }

    /// Total number of extra bits carried by this symbol.
    #[inline]
    pub fn extra_bits(&self) -> u32 {
        match *self {
            Self::Literal(_) => 0,
            Self::Match { length, distance } => {
                length_extra_bits(length) as u32 + distance_extra_bits(distance) as u32
            }
        }
    }
}

/// Symbol frequencies of a parse, with the end-of-block symbol counted once.
pub fn lz77_counts(tokens: &[Lz77Token]) -> ([usize; NUM_LITLEN], [usize; NUM_DIST]) {
    let mut litlens = [0usize; NUM_LITLEN];
    let mut dists = [0usize; NUM_DIST];
    for token in tokens {
        litlens[token.litlen_symbol()] += 1;
        if let Some(dist) = token.dist_symbol() {
            dists[dist] += 1;
        }
    }
    litlens[END_OF_BLOCK] = 1;
    (litlens, dists)
}

/// Number of input bytes covered by a parse.
pub fn uncompressed_size(tokens: &[Lz77Token]) -> usize {
    tokens.iter().map(Lz77Token::byte_len).sum()
}

/// Result of a longest match query.
///
/// A length below 3 means no usable match; the distance is then 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LongestMatch {
    /// Match length.
    pub length: u16,
    /// Backward distance of the match.
    pub distance: u16,
}

impl LongestMatch {
    const NONE: Self = Self {
        length: 0,
        distance: 0,
    };

    /// Heuristic score for the greedy parser: long distances need many
    /// extra bits, so beyond 1024 the length counts one less.
    #[inline]
    pub fn score(&self) -> u16 {
        if self.distance > 1024 {
            self.length.saturating_sub(1)
        } else {
            self.length
        }
    }

    pub(crate) fn into_token(self, data: &[u8], pos: usize) -> Lz77Token {
        debug_assert!(
            matches_input(data, pos, self.length as usize, self.distance as usize),
            "match at {} (length {}, distance {}) does not match the input",
            pos,
            self.length,
            self.distance
        );
        Lz77Token::Match {
            length: self.length,
            distance: self.distance,
        }
    }
}

/// Whether `length` bytes at `pos` repeat the bytes `distance` back.
fn matches_input(data: &[u8], pos: usize, length: usize, distance: usize) -> bool {
    distance >= 1
        && distance <= pos
        && pos + length <= data.len()
        && (0..length).all(|i| data[pos - distance + i] == data[pos + i])
}

/// Parsing state for the block `data[start..end]`.
#[derive(Debug)]
pub struct BlockState<'a> {
    pub(crate) options: &'a Options,
    pub(crate) data: &'a [u8],
    pub(crate) start: usize,
    pub(crate) end: usize,
    cache: Option<MatchCache>,
}

impl<'a> BlockState<'a> {
    /// State for compressing `data[start..end]`, with a longest match cache.
    pub fn new(options: &'a Options, data: &'a [u8], start: usize, end: usize) -> Self {
        assert!(start <= end && end <= data.len(), "block out of range");
        Self {
            options,
            data,
            start,
            end,
            cache: Some(MatchCache::new(end - start)),
        }
    }

    /// State without a cache, for one-shot parses.
    pub fn without_cache(options: &'a Options, data: &'a [u8], start: usize, end: usize) -> Self {
        assert!(start <= end && end <= data.len(), "block out of range");
        Self {
            options,
            data,
            start,
            end,
            cache: None,
        }
    }

    /// Hash chains primed with up to one window of bytes before the block.
    pub(crate) fn primed_hash(&self) -> HashChain {
        let window_start = self.start.saturating_sub(WINDOW_SIZE);
        let mut hash = HashChain::new();
        hash.warmup(self.data, window_start, self.end);
        for pos in window_start..self.start {
            hash.update(self.data, pos, self.end);
        }
        hash
    }

    fn try_cached(
        &self,
        pos: usize,
        limit: &mut usize,
        sublen: Option<&mut [u16]>,
    ) -> Option<LongestMatch> {
        let cache = self.cache.as_ref()?;
        let lmc_pos = pos - self.start;
        if !cache.is_filled(lmc_pos) {
            return None;
        }

        let (cached_length, cached_dist) = cache.get(lmc_pos);
        let max_sublen = match sublen {
            Some(_) => cache.max_cached_sublen(lmc_pos),
            None => 0,
        };
        let limit_ok = *limit == MAX_MATCH
            || cached_length as usize <= *limit
            || (sublen.is_some() && max_sublen as usize >= *limit);
        if !limit_ok {
            return None;
        }

        if sublen.is_none() || cached_length <= max_sublen {
            let length = cached_length.min(*limit as u16);
            if (length as usize) < MIN_MATCH {
                return Some(LongestMatch::NONE);
            }
            let distance = match sublen {
                Some(sublen) => {
                    cache.cache_to_sublen(lmc_pos, length, sublen);
                    let distance = sublen[length as usize];
                    if *limit == MAX_MATCH {
                        assert_eq!(distance, cached_dist, "cached sub-length disagrees");
                    }
                    distance
                }
                None => cached_dist,
            };
            return Some(LongestMatch { length, distance });
        }

        // The sub-lengths must be searched again, but no further than before.
        *limit = cached_length as usize;
        None
    }

    fn store_in_cache(
        &mut self,
        pos: usize,
        limit: usize,
        sublen: Option<&[u16]>,
        found: LongestMatch,
    ) {
        let start = self.start;
        let Some(cache) = self.cache.as_mut() else {
            return;
        };
        let lmc_pos = pos - start;
        if cache.is_filled(lmc_pos) || limit != MAX_MATCH {
            return;
        }
        if let Some(sublen) = sublen {
            cache.store(lmc_pos, found.length, found.distance, sublen);
        }
    }

    /// Find the longest match at `pos`, up to `limit` bytes (3-258).
    ///
    /// `hash` must have been updated up to and including `pos`. When
    /// `sublen` (at least 259 entries) is given, `sublen[k]` receives the
    /// smallest distance achieving length `k` for every `k` up to the
    /// returned length; only then is the cache consulted and filled.
    pub fn find_longest_match(
        &mut self,
        hash: &HashChain,
        pos: usize,
        limit: usize,
        mut sublen: Option<&mut [u16]>,
    ) -> LongestMatch {
        let data = self.data;
        let size = self.end;
        let mut limit = limit;

        if let Some(found) = self.try_cached(pos, &mut limit, sublen.as_deref_mut()) {
            debug_assert!(pos + found.length as usize <= size);
            return found;
        }

        assert!(
            (MIN_MATCH..=MAX_MATCH).contains(&limit),
            "match limit out of range: {}",
            limit
        );
        assert!(pos < size, "match position {} past block end {}", pos, size);

        if size - pos < MIN_MATCH {
            return LongestMatch::NONE;
        }
        limit = limit.min(size - pos);
        let array_end = pos + limit;

        let hpos = pos & WINDOW_MASK;
        let mut best_length = 1usize;
        let mut best_distance = 0usize;
        let mut chain = &hash.prev;
        let mut hits_left = MAX_CHAIN_HITS;

        let mut pp = hash.head[hash.val] as usize;
        debug_assert_eq!(pp, hpos, "hash chain not updated for position {}", pos);
        let mut p = chain[pp] as usize;
        let mut dist = if p < pp { pp - p } else { WINDOW_SIZE + pp - p };

        let same0 = hash.same[hpos] as usize;
        let first = data[pos];

        while dist < WINDOW_SIZE {
            let mut scan = pos;
            let mut matched = pos - dist;

            // Check the byte that would extend the current best first.
            let best_pos = pos + best_length;
            if best_pos >= size || data[best_pos] == data[matched + best_length] {
                if same0 > 2 && first == data[matched] {
                    let same1 = hash.same[matched & WINDOW_MASK] as usize;
                    let skip = same0.min(same1).min(limit);
                    scan += skip;
                    matched += skip;
                }
                while scan < array_end && data[scan] == data[matched] {
                    scan += 1;
                    matched += 1;
                }
                let length = scan - pos;

                if length > best_length {
                    if let Some(sublen) = sublen.as_deref_mut() {
                        for slot in &mut sublen[best_length + 1..=length] {
                            *slot = dist as u16;
                        }
                    }
                    best_length = length;
                    best_distance = dist;
                    if length >= limit {
                        break;
                    }
                }
            }

            // Inside a long run the run-length keyed chains are much shorter.
            if best_length >= same0 && hash.val2 as i32 == hash.hash_val2[p] {
                chain = &hash.prev2;
            }

            pp = p;
            p = chain[p] as usize;
            if p == pp {
                break;
            }
            dist += if p < pp { pp - p } else { WINDOW_SIZE + pp - p };

            hits_left -= 1;
            if hits_left == 0 {
                break;
            }
        }

        let found = LongestMatch {
            length: best_length as u16,
            distance: best_distance as u16,
        };
        self.store_in_cache(pos, limit, sublen.as_deref(), found);

        assert!(best_length <= limit);
        found
    }

    /// Parse the block with gzip-style lazy matching.
    ///
    /// A match is held back one position; if the match starting there
    /// scores more than one higher, a literal is emitted instead.
    pub fn greedy(&mut self) -> Vec<Lz77Token> {
        let (start, end) = (self.start, self.end);
        let data = self.data;
        let mut tokens = Vec::new();
        if start == end {
            return tokens;
        }

        let mut hash = self.primed_hash();
        let mut sublen = [0u16; MAX_MATCH + 1];
        let mut pending: Option<LongestMatch> = None;

        let mut i = start;
        while i < end {
            hash.update(data, i, end);
            let found = self.find_longest_match(&hash, i, MAX_MATCH, Some(&mut sublen));
            let score = found.score() as usize;

            if let Some(prev) = pending.take() {
                if score > prev.score() as usize + 1 {
                    tokens.push(Lz77Token::Literal(data[i - 1]));
                    if score >= MIN_MATCH && (found.length as usize) < MAX_MATCH {
                        pending = Some(found);
                        i += 1;
                        continue;
                    }
                } else {
                    tokens.push(prev.into_token(data, i - 1));
                    // The held match started one byte back; skip its remainder.
                    for _ in 2..prev.length {
                        i += 1;
                        hash.update(data, i, end);
                    }
                    i += 1;
                    continue;
                }
            } else if score >= MIN_MATCH && (found.length as usize) < MAX_MATCH {
                pending = Some(found);
                i += 1;
                continue;
            }

            if score >= MIN_MATCH {
                tokens.push(found.into_token(data, i));
                for _ in 1..found.length {
                    i += 1;
                    hash.update(data, i, end);
                }
            } else {
                tokens.push(Lz77Token::Literal(data[i]));
            }
            i += 1;
        }

        tokens
    }
}
