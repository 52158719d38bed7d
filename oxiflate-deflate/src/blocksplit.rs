//! Block splitting: choosing where one Huffman block should end and the
//! next begin.
//!
//! Splitting works on a parse. Each candidate split point is scored by the
//! exact dynamic block size of the two halves, and the largest remaining
//! block is split again until no split pays off.

use crate::block::calculate_block_size;
use crate::lz77::{BlockState, Lz77Token};
use crate::options::{BlockType, Options};

/// Below this many candidates [`find_minimum`] tries every one.
const EXHAUSTIVE_SEARCH_LIMIT: usize = 1024;

/// Probes per round of the narrowing search.
const NUM_PROBES: usize = 9;

/// Blocks with fewer symbols are never split.
const MIN_SPLIT_SYMBOLS: usize = 10;

/// Find an `i` in `start..end` minimizing `f(i)`.
///
/// Small ranges are searched exhaustively. Larger ones are probed at nine
/// evenly spaced points and narrowed to the neighbors of the best probe,
/// which finds a local minimum only.
pub fn find_minimum<F>(mut f: F, start: usize, end: usize) -> usize
where
    F: FnMut(usize) -> u64,
{
    if end - start < EXHAUSTIVE_SEARCH_LIMIT {
        let mut best = u64::MAX;
        let mut result = start;
        for i in start..end {
            let value = f(i);
            if value < best {
                best = value;
                result = i;
            }
        }
        return result;
    }

    let (mut start, mut end) = (start, end);
    let mut probes = [0usize; NUM_PROBES];
    let mut values = [0u64; NUM_PROBES];
    let mut last_best = u64::MAX;
    let mut pos = start;

    while end - start > NUM_PROBES {
        let step = (end - start) / (NUM_PROBES + 1);
        for (i, (probe, value)) in probes.iter_mut().zip(values.iter_mut()).enumerate() {
            *probe = start + (i + 1) * step;
            *value = f(*probe);
        }

        let mut best_index = 0;
        for i in 1..NUM_PROBES {
            if values[i] < values[best_index] {
                best_index = i;
            }
        }
        let best = values[best_index];
        if best > last_best {
            break;
        }

        if best_index > 0 {
            start = probes[best_index - 1];
        }
        if best_index < NUM_PROBES - 1 {
            end = probes[best_index + 1];
        }
        pos = probes[best_index];
        last_best = best;
    }
    pos
}

fn estimate_cost(tokens: &[Lz77Token]) -> u64 {
    calculate_block_size(tokens, BlockType::Dynamic)
}

/// The longest block, by symbol count, that may still be split.
///
/// The last block is measured up to the final symbol rather than past it.
fn find_largest_splittable_block(
    num_tokens: usize,
    done: &[bool],
    split_points: &[usize],
) -> Option<(usize, usize)> {
    let mut longest = 0;
    let mut found = None;
    for i in 0..=split_points.len() {
        let start = if i == 0 { 0 } else { split_points[i - 1] };
        let end = if i == split_points.len() {
            num_tokens - 1
        } else {
            split_points[i]
        };
        if !done[start] && end - start > longest {
            found = Some((start, end));
            longest = end - start;
        }
    }
    found
}

/// Map symbol indices to byte offsets relative to the start of the parse.
fn symbol_to_byte_offsets(tokens: &[Lz77Token], points: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(points.len());
    let mut pos = 0;
    for (i, token) in tokens.iter().enumerate() {
        if offsets.len() == points.len() {
            break;
        }
        if points[offsets.len()] == i {
            offsets.push(pos);
        }
        pos += token.byte_len();
    }
    assert_eq!(offsets.len(), points.len(), "split points out of range");
    offsets
}

fn log_split_points(offsets: &[usize]) {
    let decimal: Vec<String> = offsets.iter().map(|p| p.to_string()).collect();
    let hex: Vec<String> = offsets.iter().map(|p| format!("{:x}", p)).collect();
    log::info!(
        "block split points: {} (hex: {})",
        decimal.join(" "),
        hex.join(" ")
    );
}

/// Split a parse into blocks that are cheaper to encode separately.
///
/// Returns the symbol indices where new blocks start, ascending. At most
/// `max_blocks` blocks result, unless `max_blocks` is 0.
pub fn block_split_lz77(options: &Options, tokens: &[Lz77Token], max_blocks: usize) -> Vec<usize> {
    let num_tokens = tokens.len();
    let mut split_points: Vec<usize> = Vec::new();
    if num_tokens < MIN_SPLIT_SYMBOLS {
        return split_points;
    }

    let mut done = vec![false; num_tokens];
    let (mut lstart, mut lend) = (0, num_tokens);
    loop {
        if max_blocks > 0 && split_points.len() + 1 >= max_blocks {
            break;
        }
        assert!(lstart < lend, "empty block selected for splitting");

        let llpos = find_minimum(
            |i| estimate_cost(&tokens[lstart..i]) + estimate_cost(&tokens[i..lend]),
            lstart + 1,
            lend,
        );
        assert!(lstart < llpos && llpos < lend);

        let split_cost = estimate_cost(&tokens[lstart..llpos]) + estimate_cost(&tokens[llpos..lend]);
        let orig_cost = estimate_cost(&tokens[lstart..lend]);

        if split_cost > orig_cost || llpos == lstart + 1 || llpos == lend {
            done[lstart] = true;
        } else {
            let at = split_points.partition_point(|&p| p < llpos);
            split_points.insert(at, llpos);
        }

        match find_largest_splittable_block(num_tokens, &done, &split_points) {
            Some((start, end)) if end >= start + MIN_SPLIT_SYMBOLS => {
                lstart = start;
                lend = end;
            }
            _ => break,
        }
    }

    if options.verbose {
        log_split_points(&symbol_to_byte_offsets(tokens, &split_points));
    }
    split_points
}

/// Split `data[start..end]` into blocks, returning byte offsets into `data`.
///
/// The range is parsed greedily first; that parse gives better split points
/// than an optimal one.
pub fn block_split(
    options: &Options,
    data: &[u8],
    start: usize,
    end: usize,
    max_blocks: usize,
) -> Vec<usize> {
    let tokens = BlockState::without_cache(options, data, start, end).greedy();
    let points = block_split_lz77(options, &tokens, max_blocks);
    symbol_to_byte_offsets(&tokens, &points)
        .into_iter()
        .map(|offset| start + offset)
        .collect()
}

/// Split `start..end` every `block_size` bytes, ignoring the content.
pub fn block_split_simple(start: usize, end: usize, block_size: usize) -> Vec<usize> {
    (start + block_size..end).step_by(block_size).collect()
}
