//! Length-limited Huffman code construction for DEFLATE compression.
//!
//! Code lengths are optimal under a maximum length, computed with the
//! boundary package-merge algorithm of Katajainen, Moffat and Turpin
//! ("A Fast and Space-Economical Algorithm for Length-Limited Coding").
//! Codes are then assigned canonically as RFC 1951 section 3.2.2 requires.
//!
//! # Limits
//!
//! DEFLATE limits:
//! - **Literal/Length** and **Distance** codes: 15 bits
//! - **Code Length** codes: 7 bits

/// Maximum code length for literal/length and distance codes.
pub const MAX_CODE_LENGTH: usize = 15;

/// Maximum code length for the code length alphabet.
pub const MAX_CODELEN_CODE_LENGTH: usize = 7;

/// A chain in the package-merge lists. Chains share tails, so nodes live
/// in an arena and refer to each other by index.
#[derive(Debug, Clone, Copy)]
struct Node {
    /// Total weight of the chain.
    weight: usize,
    /// Number of leaves before this chain.
    count: usize,
    /// Previous node of the chain.
    tail: Option<usize>,
}

/// State of one package-merge run.
struct PackageMerge<'a> {
    /// Leaf weights, ascending.
    leaves: &'a [usize],
    nodes: Vec<Node>,
    /// The last two chains of every list, as arena indices.
    lists: Vec<[usize; 2]>,
}

impl<'a> PackageMerge<'a> {
    fn new(leaves: &'a [usize], max_bits: usize) -> Self {
        let nodes = vec![
            Node {
                weight: leaves[0],
                count: 1,
                tail: None,
            },
            Node {
                weight: leaves[1],
                count: 2,
                tail: None,
            },
        ];
        Self {
            leaves,
            nodes,
            lists: vec![[0, 1]; max_bits],
        }
    }

    fn push(&mut self, weight: usize, count: usize, tail: Option<usize>) -> usize {
        self.nodes.push(Node {
            weight,
            count,
            tail,
        });
        self.nodes.len() - 1
    }

    /// Add one chain to list `index`. Either the next leaf or the package of
    /// the two last chains of the list below, whichever is lighter; taking a
    /// package requires two new chains in the list below, unless this is the
    /// final step.
    fn boundary_step(&mut self, index: usize, last: bool) {
        let last_chain = self.nodes[self.lists[index][1]];
        let last_count = last_chain.count;
        let num_leaves = self.leaves.len();

        if index == 0 && last_count >= num_leaves {
            return;
        }

        self.lists[index][0] = self.lists[index][1];

        if index == 0 {
            let node = self.push(self.leaves[last_count], last_count + 1, None);
            self.lists[index][1] = node;
            return;
        }

        let [below0, below1] = self.lists[index - 1];
        let sum = self.nodes[below0].weight + self.nodes[below1].weight;
        if last_count < num_leaves && sum > self.leaves[last_count] {
            let node = self.push(self.leaves[last_count], last_count + 1, last_chain.tail);
            self.lists[index][1] = node;
        } else {
            let node = self.push(sum, last_count, Some(below1));
            self.lists[index][1] = node;
            if !last {
                self.boundary_step(index - 1, false);
                self.boundary_step(index - 1, false);
            }
        }
    }

    /// Walk the final chain: each node grants one more bit to its first
    /// `count` leaves.
    fn leaf_lengths(&self) -> Vec<u8> {
        let mut lengths = vec![0u8; self.leaves.len()];
        let top = self.lists.len() - 1;
        let mut node = Some(self.lists[top][1]);
        while let Some(index) = node {
            let chain = self.nodes[index];
            for length in &mut lengths[..chain.count] {
                *length += 1;
            }
            node = chain.tail;
        }
        lengths
    }
}

/// Optimal code lengths for `frequencies`, none longer than `max_bits`.
///
/// Symbols with frequency 0 get length 0. A lone used symbol gets length 1.
///
/// # Panics
///
/// If more than `2^max_bits` symbols are used.
pub fn length_limited_code_lengths(frequencies: &[usize], max_bits: usize) -> Vec<u8> {
    let mut lengths = vec![0u8; frequencies.len()];

    // (weight, symbol), stable by symbol within equal weights.
    let mut symbols: Vec<(usize, usize)> = frequencies
        .iter()
        .enumerate()
        .filter(|&(_, &f)| f > 0)
        .map(|(i, &f)| (f, i))
        .collect();

    assert!(
        symbols.len() <= 1usize << max_bits,
        "{} symbols cannot be coded in {} bits",
        symbols.len(),
        max_bits
    );

    match symbols.len() {
        0 => return lengths,
        1 => {
            lengths[symbols[0].1] = 1;
            return lengths;
        }
        _ => {}
    }

    symbols.sort_by_key(|&(weight, _)| weight);
    let weights: Vec<usize> = symbols.iter().map(|&(weight, _)| weight).collect();

    let mut pm = PackageMerge::new(&weights, max_bits);
    let steps = 2 * symbols.len() - 4;
    for step in 0..steps {
        pm.boundary_step(max_bits - 1, step + 1 == steps);
    }

    for (&(_, symbol), length) in symbols.iter().zip(pm.leaf_lengths()) {
        lengths[symbol] = length;
    }
    lengths
}

/// Canonical codes for `lengths` (RFC 1951 section 3.2.2).
///
/// Codes are returned most significant bit first; unused symbols get 0.
pub fn canonical_codes(lengths: &[u8]) -> Vec<u32> {
    let max_length = lengths.iter().copied().max().unwrap_or(0) as usize;
    let mut bl_count = vec![0u32; max_length + 1];
    for &len in lengths {
        if len > 0 {
            bl_count[len as usize] += 1;
        }
    }

    let mut next_code = vec![0u32; max_length + 1];
    let mut code = 0u32;
    for bits in 1..=max_length {
        code = (code + bl_count[bits - 1]) << 1;
        next_code[bits] = code;
    }

    lengths
        .iter()
        .map(|&len| {
            if len == 0 {
                0
            } else {
                let code = next_code[len as usize];
                next_code[len as usize] += 1;
                code
            }
        })
        .collect()
}
