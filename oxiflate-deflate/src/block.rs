//! DEFLATE block encoding and exact block size calculation.
//!
//! A block is a 3-bit header, for dynamic blocks the code length tree, the
//! Huffman coded symbols and the end-of-block code. Every size returned by
//! this module is exact: it equals the number of bits the writer emits.

use crate::huffman::{
    MAX_CODE_LENGTH, MAX_CODELEN_CODE_LENGTH, canonical_codes, length_limited_code_lengths,
};
use crate::lz77::{Lz77Token, lz77_counts, uncompressed_size};
use crate::options::BlockType;
use crate::tables::{
    CODE_LENGTH_ORDER, END_OF_BLOCK, NUM_DIST, NUM_LITLEN, distance_to_code,
    fixed_distance_lengths, fixed_litlen_lengths, length_to_code,
};
use oxiflate_core::BitWriter;
use oxiflate_core::error::Result;
use std::io::Write;

/// Maximum payload of a stored block.
pub const MAX_STORED_BLOCK: usize = 65535;

/// Code lengths of the literal/length and distance alphabets of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLengths {
    /// Literal/length code lengths.
    pub litlen: [u8; NUM_LITLEN],
    /// Distance code lengths.
    pub dist: [u8; NUM_DIST],
}

impl CodeLengths {
    /// The fixed Huffman code of RFC 1951 section 3.2.6.
    pub fn fixed() -> Self {
        Self {
            litlen: fixed_litlen_lengths(),
            dist: fixed_distance_lengths(),
        }
    }

    /// Optimal 15-bit limited code lengths for the symbols of a parse.
    pub fn dynamic(tokens: &[Lz77Token]) -> Self {
        let (litlen_counts, dist_counts) = lz77_counts(tokens);
        let mut lengths = Self {
            litlen: [0; NUM_LITLEN],
            dist: [0; NUM_DIST],
        };
        lengths
            .litlen
            .copy_from_slice(&length_limited_code_lengths(&litlen_counts, MAX_CODE_LENGTH));
        lengths
            .dist
            .copy_from_slice(&length_limited_code_lengths(&dist_counts, MAX_CODE_LENGTH));
        lengths.patch_distance_codes();

        for (symbol, &count) in litlen_counts.iter().enumerate() {
            assert!(
                count == 0 || lengths.litlen[symbol] > 0,
                "literal/length symbol {} has no code",
                symbol
            );
        }
        for (symbol, &count) in dist_counts.iter().enumerate() {
            assert!(
                count == 0 || lengths.dist[symbol] > 0,
                "distance symbol {} has no code",
                symbol
            );
        }
        lengths
    }

    /// Make sure at least two of the 30 real distance codes are in use.
    ///
    /// Old zlib versions (1.2.1 and earlier) reject blocks with fewer.
    pub fn patch_distance_codes(&mut self) {
        let used = self.dist[..30].iter().filter(|&&len| len > 0).count();
        match used {
            0 => {
                self.dist[0] = 1;
                self.dist[1] = 1;
            }
            1 => {
                let missing = if self.dist[0] != 0 { 1 } else { 0 };
                self.dist[missing] = 1;
            }
            _ => {}
        }
    }
}

/// Run-length encode the joined code lengths with the code length
/// alphabet. Returns `(symbol, extra bits value)` pairs.
fn rle_encode_lengths(lengths: &[u8]) -> Vec<(u8, u8)> {
    let mut rle = Vec::new();
    let mut i = 0;
    while i < lengths.len() {
        let value = lengths[i];
        let mut count = lengths[i..].iter().take_while(|&&len| len == value).count();

        if count >= 4 || (count >= 3 && value == 0) {
            if value == 0 {
                if count > 10 {
                    count = count.min(138);
                    rle.push((18, (count - 11) as u8));
                } else {
                    rle.push((17, (count - 3) as u8));
                }
            } else {
                rle.push((value, 0));
                let mut repeat = count - 1;
                while repeat >= 6 {
                    rle.push((16, 3));
                    repeat -= 6;
                }
                if repeat >= 3 {
                    rle.push((16, (repeat - 3) as u8));
                    repeat = 0;
                }
                rle.extend(std::iter::repeat_n((value, 0), repeat));
            }
            i += count;
        } else {
            rle.push((value, 0));
            i += 1;
        }
    }
    rle
}

/// Number of extra bits following a code length symbol.
fn rle_extra_bits(symbol: u8) -> u8 {
    match symbol {
        16 => 2,
        17 => 3,
        18 => 7,
        _ => 0,
    }
}

/// The header of a dynamic block, ready to be measured or written.
#[derive(Debug)]
struct TreeEncoding {
    /// Number of literal/length codes minus 257.
    hlit: usize,
    /// Number of distance codes minus 1.
    hdist: usize,
    /// Number of code length codes minus 4.
    hclen: usize,
    rle: Vec<(u8, u8)>,
    /// Code length code lengths, by symbol.
    clcl: Vec<u8>,
}

impl TreeEncoding {
    fn new(lengths: &CodeLengths) -> Self {
        let mut hlit = 29;
        while hlit > 0 && lengths.litlen[256 + hlit] == 0 {
            hlit -= 1;
        }
        // Decoders such as gzip reject HDIST > 29.
        let mut hdist = 29;
        while hdist > 0 && lengths.dist[hdist] == 0 {
            hdist -= 1;
        }

        let mut joined = Vec::with_capacity(257 + hlit + hdist + 1);
        joined.extend_from_slice(&lengths.litlen[..257 + hlit]);
        joined.extend_from_slice(&lengths.dist[..hdist + 1]);
        debug_assert!(joined.iter().all(|&len| len as usize <= MAX_CODE_LENGTH));

        let rle = rle_encode_lengths(&joined);
        let mut cl_counts = [0usize; 19];
        for &(symbol, _) in &rle {
            cl_counts[symbol as usize] += 1;
        }
        let clcl = length_limited_code_lengths(&cl_counts, MAX_CODELEN_CODE_LENGTH);

        let mut hclen = 15;
        while hclen > 0 && cl_counts[CODE_LENGTH_ORDER[hclen + 3]] == 0 {
            hclen -= 1;
        }

        Self {
            hlit,
            hdist,
            hclen,
            rle,
            clcl,
        }
    }

    fn bit_size(&self) -> u64 {
        let header = 5 + 5 + 4 + 3 * (self.hclen as u64 + 4);
        let body: u64 = self
            .rle
            .iter()
            .map(|&(symbol, _)| {
                self.clcl[symbol as usize] as u64 + rle_extra_bits(symbol) as u64
            })
            .sum();
        header + body
    }

    fn write<W: Write>(&self, writer: &mut BitWriter<W>) -> Result<()> {
        writer.write_bits(self.hlit as u32, 5)?;
        writer.write_bits(self.hdist as u32, 5)?;
        writer.write_bits(self.hclen as u32, 4)?;

        for &symbol in &CODE_LENGTH_ORDER[..self.hclen + 4] {
            writer.write_bits(self.clcl[symbol] as u32, 3)?;
        }

        let codes = canonical_codes(&self.clcl);
        for &(symbol, extra) in &self.rle {
            let symbol = symbol as usize;
            writer.write_huffman_bits(codes[symbol], self.clcl[symbol])?;
            writer.write_bits(extra as u32, rle_extra_bits(symbol as u8))?;
        }
        Ok(())
    }
}

/// Exact size in bits of the code length tree of a dynamic block.
pub fn calculate_tree_size(lengths: &CodeLengths) -> u64 {
    TreeEncoding::new(lengths).bit_size()
}

/// Size in bits of the symbols of a block plus its end-of-block code.
fn symbol_size(tokens: &[Lz77Token], lengths: &CodeLengths) -> u64 {
    let symbols: u64 = tokens
        .iter()
        .map(|token| {
            let mut bits = lengths.litlen[token.litlen_symbol()] as u64 + token.extra_bits() as u64;
            if let Some(dist) = token.dist_symbol() {
                bits += lengths.dist[dist] as u64;
            }
            bits
        })
        .sum();
    symbols + lengths.litlen[END_OF_BLOCK] as u64
}

/// Exact size in bits of `tokens` encoded as one block of `block_type`.
///
/// Stored blocks are counted as byte aligned: five header bytes for every
/// 65535 bytes of payload.
pub fn calculate_block_size(tokens: &[Lz77Token], block_type: BlockType) -> u64 {
    match block_type {
        BlockType::Stored => {
            let length = uncompressed_size(tokens) as u64;
            let blocks = length.div_ceil(MAX_STORED_BLOCK as u64).max(1);
            blocks * 5 * 8 + length * 8
        }
        BlockType::Fixed => 3 + symbol_size(tokens, &CodeLengths::fixed()),
        BlockType::Dynamic => {
            let lengths = CodeLengths::dynamic(tokens);
            3 + calculate_tree_size(&lengths) + symbol_size(tokens, &lengths)
        }
    }
}

/// Write `tokens` as one fixed or dynamic Huffman block.
///
/// `expected_size`, when nonzero, is checked against the number of bytes
/// the tokens cover.
pub fn write_lz77_block<W: Write>(
    writer: &mut BitWriter<W>,
    block_type: BlockType,
    is_final: bool,
    tokens: &[Lz77Token],
    expected_size: usize,
    verbose: bool,
) -> Result<()> {
    assert!(
        block_type != BlockType::Stored,
        "stored blocks carry no LZ77 symbols"
    );

    writer.write_bit(is_final)?;
    writer.write_bits(block_type.btype(), 2)?;

    let lengths = match block_type {
        BlockType::Dynamic => {
            let lengths = CodeLengths::dynamic(tokens);
            let tree_start = writer.bits_written();
            TreeEncoding::new(&lengths).write(writer)?;
            if verbose {
                log::info!("treesize: {} bits", writer.bits_written() - tree_start);
            }
            lengths
        }
        _ => CodeLengths::fixed(),
    };

    let litlen_codes = canonical_codes(&lengths.litlen);
    let dist_codes = canonical_codes(&lengths.dist);

    let data_start = writer.bits_written();
    let mut covered = 0usize;
    for token in tokens {
        match *token {
            Lz77Token::Literal(byte) => {
                let symbol = byte as usize;
                debug_assert!(lengths.litlen[symbol] > 0);
                writer.write_huffman_bits(litlen_codes[symbol], lengths.litlen[symbol])?;
                covered += 1;
            }
            Lz77Token::Match { length, distance } => {
                let (len_symbol, len_bits, len_extra) = length_to_code(length);
                let (dist_symbol, dist_bits, dist_extra) = distance_to_code(distance);
                let (len_symbol, dist_symbol) = (len_symbol as usize, dist_symbol as usize);
                debug_assert!(lengths.litlen[len_symbol] > 0 && lengths.dist[dist_symbol] > 0);

                writer.write_huffman_bits(litlen_codes[len_symbol], lengths.litlen[len_symbol])?;
                writer.write_bits(len_extra as u32, len_bits)?;
                writer.write_huffman_bits(dist_codes[dist_symbol], lengths.dist[dist_symbol])?;
                writer.write_bits(dist_extra as u32, dist_bits)?;
                covered += length as usize;
            }
        }
    }
    writer.write_huffman_bits(litlen_codes[END_OF_BLOCK], lengths.litlen[END_OF_BLOCK])?;

    assert!(
        expected_size == 0 || covered == expected_size,
        "block covers {} bytes, expected {}",
        covered,
        expected_size
    );

    if verbose {
        let compressed_bits = writer.bits_written() - data_start;
        log::info!(
            "compressed block size: {:.3} bytes ({}kB) (unc: {} ({}kB))",
            compressed_bits as f64 / 8.0,
            (compressed_bits + 4000) / 8000,
            covered,
            (covered + 500) / 1000
        );
    }
    Ok(())
}

/// Write `data` as one stored block.
pub fn write_stored_block<W: Write>(
    writer: &mut BitWriter<W>,
    is_final: bool,
    data: &[u8],
) -> Result<()> {
    assert!(
        data.len() <= MAX_STORED_BLOCK,
        "stored block of {} bytes",
        data.len()
    );

    writer.write_bit(is_final)?;
    writer.write_bits(BlockType::Stored.btype(), 2)?;
    writer.align_to_byte()?;

    let len = data.len() as u16;
    writer.write_bits(len as u32, 16)?;
    writer.write_bits(!len as u32, 16)?;
    writer.write_bytes(data)
}
