//! Optimal parsing: shortest path through the space of LZ77 parses.
//!
//! Each run finds, for every byte of the block, the cheapest way to reach it
//! under a [`CostModel`], then walks the chosen lengths back from the end and
//! re-derives the distances. [`BlockState::lz77_optimal`] iterates runs,
//! feeding each one the statistics of the previous result.

use crate::block::calculate_block_size;
use crate::cost::{CostModel, MwcRng, SymbolStats};
use crate::lz77::{BlockState, Lz77Token};
use crate::options::BlockType;
use crate::tables::{MAX_MATCH, MIN_MATCH, WINDOW_MASK};

impl BlockState<'_> {
    /// Forward pass: the length of the last step on the cheapest path to
    /// every byte of the block. Index 0 is the block start.
    fn best_lengths(&mut self, model: CostModel<'_>) -> Vec<u16> {
        let (start, end) = (self.start, self.end);
        let data = self.data;
        let block_size = end - start;
        let mut lengths = vec![0u16; block_size + 1];
        if block_size == 0 {
            return lengths;
        }

        let mut costs = vec![f64::INFINITY; block_size + 1];
        costs[0] = 0.0;

        let mut hash = self.primed_hash();
        let min_cost = model.min_cost();
        let mut sublen = [0u16; MAX_MATCH + 1];

        let mut i = start;
        while i < end {
            let mut j = i - start;
            hash.update(data, i, end);

            // Deep inside a run of one byte value, step a whole maximum
            // match at a time instead of querying every position.
            if hash.same[i & WINDOW_MASK] as usize > MAX_MATCH * 2
                && i > start + MAX_MATCH + 1
                && i + MAX_MATCH * 2 + 1 < end
                && hash.same[(i - MAX_MATCH) & WINDOW_MASK] as usize > MAX_MATCH
            {
                let symbol_cost = model.match_cost(MAX_MATCH as u16, 1);
                for _ in 0..MAX_MATCH {
                    costs[j + MAX_MATCH] = costs[j] + symbol_cost;
                    lengths[j + MAX_MATCH] = MAX_MATCH as u16;
                    i += 1;
                    j += 1;
                    hash.update(data, i, end);
                }
            }

            let found = self.find_longest_match(&hash, i, MAX_MATCH, Some(&mut sublen));
            let cost = costs[j];

            let literal = cost + model.literal_cost(data[i]);
            assert!(literal >= 0.0, "negative path cost");
            if literal < costs[j + 1] {
                costs[j + 1] = literal;
                lengths[j + 1] = 1;
            }

            let max_length = (found.length as usize).min(end - i);
            for k in MIN_MATCH..=max_length {
                // Already at the cheapest cost any match could give.
                if costs[j + k] <= cost + min_cost {
                    continue;
                }
                let candidate = cost + model.match_cost(k as u16, sublen[k]);
                assert!(candidate >= 0.0, "negative path cost");
                if candidate < costs[j + k] {
                    costs[j + k] = candidate;
                    lengths[j + k] = k as u16;
                }
            }
            i += 1;
        }

        let total = costs[block_size];
        assert!(
            total.is_finite() && total >= 0.0,
            "invalid path cost {}",
            total
        );
        lengths
    }

    /// Optimal lit/len and dist symbols for the block under `model`.
    fn optimal_run(&mut self, model: CostModel<'_>) -> Vec<Lz77Token> {
        let lengths = self.best_lengths(model);
        let path = trace_backwards(self.end - self.start, &lengths);
        self.follow_path(&path)
    }

    /// Turn a path of lengths into symbols by finding the distance of every
    /// match again, limited to the chosen length.
    fn follow_path(&mut self, path: &[u16]) -> Vec<Lz77Token> {
        let (start, end) = (self.start, self.end);
        let data = self.data;
        let mut tokens = Vec::with_capacity(path.len());
        if start == end {
            return tokens;
        }

        let mut hash = self.primed_hash();
        let mut pos = start;
        for &length in path {
            assert!(pos < end, "path runs past the block end");
            hash.update(data, pos, end);

            let step = if length as usize >= MIN_MATCH {
                let found = self.find_longest_match(&hash, pos, length as usize, None);
                assert_eq!(
                    found.length, length,
                    "match at {} no longer reaches the chosen length",
                    pos
                );
                tokens.push(found.into_token(data, pos));
                length as usize
            } else {
                tokens.push(Lz77Token::Literal(data[pos]));
                1
            };

            assert!(pos + step <= end, "path runs past the block end");
            for offset in 1..step {
                hash.update(data, pos + offset, end);
            }
            pos += step;
        }
        tokens
    }

    /// Iterated optimal parse of the block.
    ///
    /// Starts from the greedy parse, then runs [`Options::num_iterations`]
    /// optimal passes, each priced with the statistics of the previous
    /// result. The parse with the smallest exact dynamic block size wins.
    /// When the size stops changing, the best statistics are perturbed
    /// randomly to escape the local optimum.
    ///
    /// [`Options::num_iterations`]: crate::Options::num_iterations
    pub fn lz77_optimal(&mut self) -> Vec<Lz77Token> {
        let options = self.options;
        let mut rng = MwcRng::new();
        let mut randomized = false;

        let mut best_tokens = self.greedy();
        let mut best_stats = SymbolStats::from_tokens(&best_tokens);
        let mut last_stats = best_stats.clone();
        let mut best_cost = u64::MAX;
        let mut last_cost = 0u64;

        for i in 0..options.iterations() {
            let tokens = self.optimal_run(CostModel::Stat(&last_stats));
            let cost = calculate_block_size(&tokens, BlockType::Dynamic);

            if options.verbose && cost < best_cost {
                log::info!("Iteration {}: {} bit", i, cost);
            } else if options.verbose_more {
                log::debug!("Iteration {}: {} bit", i, cost);
            }

            let stats = SymbolStats::from_tokens(&tokens);
            if cost < best_cost {
                best_tokens = tokens;
                best_stats = stats.clone();
                best_cost = cost;
            }

            if i > 5 && cost == last_cost {
                last_stats = best_stats.clone();
                last_stats.randomize(&mut rng);
                randomized = true;
            } else if randomized {
                // Converges slower but better.
                last_stats = stats.add_weighted(1.0, &last_stats, 0.5);
            } else {
                last_stats = stats;
            }
            last_cost = cost;
        }

        best_tokens
    }

    /// Optimal parse for the fixed Huffman tree. A single pass suffices
    /// because the costs do not depend on the parse.
    pub fn lz77_optimal_fixed(&mut self) -> Vec<Lz77Token> {
        self.optimal_run(CostModel::Fixed)
    }
}

/// Walk the best lengths back from the end of the block, returning the path
/// in forward order.
fn trace_backwards(size: usize, lengths: &[u16]) -> Vec<u16> {
    let mut path = Vec::new();
    let mut index = size;
    while index > 0 {
        let length = lengths[index];
        assert!(
            length != 0 && length as usize <= index && length as usize <= MAX_MATCH,
            "broken path at {}: length {}",
            index,
            length
        );
        path.push(length);
        index -= length as usize;
    }
    path.reverse();
    path
}
