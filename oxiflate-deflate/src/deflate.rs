//! DEFLATE compression (RFC 1951).
//!
//! [`Deflater`] turns input ranges into DEFLATE blocks:
//! - Stored blocks (no compression)
//! - Fixed Huffman blocks, optimally parsed for the fixed code
//! - Dynamic Huffman blocks, iteratively optimized
//!
//! Large inputs are cut into master blocks, and each master block is split
//! into several DEFLATE blocks either before or after the LZ77 parse.

use crate::block::{MAX_STORED_BLOCK, calculate_block_size, write_lz77_block, write_stored_block};
use crate::blocksplit::{block_split, block_split_lz77, block_split_simple};
use crate::lz77::BlockState;
use crate::options::{BlockType, Options};
use oxiflate_core::BitWriter;
use oxiflate_core::error::Result;
use std::io::Write;

/// Dynamic blocks with fewer symbols are also tried with the fixed code.
const FIXED_TRIAL_MAX_SYMBOLS: usize = 1000;

/// DEFLATE compressor writing blocks into a bit stream.
#[derive(Debug)]
pub struct Deflater<'a, W: Write> {
    options: &'a Options,
    writer: BitWriter<W>,
}

impl<'a, W: Write> Deflater<'a, W> {
    /// Create a compressor writing to `writer`.
    pub fn new(options: &'a Options, writer: W) -> Self {
        Self {
            options,
            writer: BitWriter::new(writer),
        }
    }

    /// Number of bits written so far.
    pub fn bits_written(&self) -> u64 {
        self.writer.bits_written()
    }

    /// Compress all of `data`. The last block gets the final bit if
    /// `is_final` is set.
    ///
    /// At least one block is always written, so empty input still yields a
    /// valid stream.
    pub fn deflate(&mut self, data: &[u8], is_final: bool) -> Result<()> {
        let master_size = self.options.master_block_size;
        let start_bits = self.writer.bits_written();

        let mut pos = 0;
        loop {
            let master_final = master_size == 0 || data.len() - pos <= master_size;
            let end = if master_final {
                data.len()
            } else {
                pos + master_size
            };
            self.deflate_part(data, pos, end, is_final && master_final)?;
            pos = end;
            if master_final {
                break;
            }
        }

        if self.options.verbose {
            let out_size = (self.writer.bits_written() - start_bits).div_ceil(8);
            let removed = if data.is_empty() {
                0.0
            } else {
                100.0 * (data.len() as f64 - out_size as f64) / data.len() as f64
            };
            log::info!(
                "Original Size: {}, Deflate: {}, Compression: {:.6}% Removed",
                data.len(),
                out_size,
                removed
            );
        }
        Ok(())
    }

    /// Compress `data[start..end]`, using the bytes before `start` as
    /// dictionary.
    ///
    /// Consecutive ranges may be compressed by consecutive calls. Usually
    /// several blocks are written; only the last can carry the final bit.
    pub fn deflate_part(&mut self, data: &[u8], start: usize, end: usize, is_final: bool) -> Result<()> {
        assert!(start <= end && end <= data.len(), "range out of bounds");

        if !self.options.block_splitting {
            self.deflate_block(data, start, end, is_final)
        } else if self.options.block_splitting_last {
            self.deflate_splitting_last(data, start, end, is_final)
        } else {
            self.deflate_splitting_first(data, start, end, is_final)
        }
    }

    /// Pad to a byte boundary, flush, and return the inner writer.
    pub fn finish(self) -> Result<W> {
        self.writer.into_inner()
    }

    /// Split the bytes first, then parse each block on its own.
    fn deflate_splitting_first(&mut self, data: &[u8], start: usize, end: usize, is_final: bool) -> Result<()> {
        let split_points = match self.options.block_type {
            BlockType::Stored => block_split_simple(start, end, MAX_STORED_BLOCK),
            // More fixed blocks only add headers.
            BlockType::Fixed => Vec::new(),
            BlockType::Dynamic => block_split(
                self.options,
                data,
                start,
                end,
                self.options.block_splitting_max,
            ),
        };

        let num_points = split_points.len();
        for i in 0..=num_points {
            let block_start = if i == 0 { start } else { split_points[i - 1] };
            let block_end = if i == num_points { end } else { split_points[i] };
            self.deflate_block(data, block_start, block_end, is_final && i == num_points)?;
        }
        Ok(())
    }

    /// Parse the whole range first, then split the parse.
    fn deflate_splitting_last(&mut self, data: &[u8], start: usize, end: usize, is_final: bool) -> Result<()> {
        let options = self.options;
        let block_type = options.block_type;
        if block_type == BlockType::Stored {
            return self.deflate_splitting_first(data, start, end, is_final);
        }

        let mut state = BlockState::new(options, data, start, end);
        let tokens = match block_type {
            BlockType::Dynamic => state.lz77_optimal(),
            _ => state.lz77_optimal_fixed(),
        };

        let split_points = if block_type == BlockType::Dynamic {
            block_split_lz77(options, &tokens, options.block_splitting_max)
        } else {
            Vec::new()
        };

        let num_points = split_points.len();
        for i in 0..=num_points {
            let block_start = if i == 0 { 0 } else { split_points[i - 1] };
            let block_end = if i == num_points {
                tokens.len()
            } else {
                split_points[i]
            };
            write_lz77_block(
                &mut self.writer,
                block_type,
                is_final && i == num_points,
                &tokens[block_start..block_end],
                0,
                options.verbose,
            )?;
        }
        Ok(())
    }

    fn deflate_block(&mut self, data: &[u8], start: usize, end: usize, is_final: bool) -> Result<()> {
        match self.options.block_type {
            BlockType::Stored => self.deflate_stored(&data[start..end], is_final),
            BlockType::Fixed => self.deflate_fixed(data, start, end, is_final),
            BlockType::Dynamic => self.deflate_dynamic(data, start, end, is_final),
        }
    }

    /// Write stored blocks of at most 65535 bytes; at least one block.
    fn deflate_stored(&mut self, data: &[u8], is_final: bool) -> Result<()> {
        if data.is_empty() {
            return write_stored_block(&mut self.writer, is_final, data);
        }
        let mut chunks = data.chunks(MAX_STORED_BLOCK).peekable();
        while let Some(chunk) = chunks.next() {
            let last = chunks.peek().is_none();
            write_stored_block(&mut self.writer, is_final && last, chunk)?;
        }
        Ok(())
    }

    fn deflate_fixed(&mut self, data: &[u8], start: usize, end: usize, is_final: bool) -> Result<()> {
        let options = self.options;
        let tokens = BlockState::new(options, data, start, end).lz77_optimal_fixed();
        write_lz77_block(
            &mut self.writer,
            BlockType::Fixed,
            is_final,
            &tokens,
            end - start,
            options.verbose,
        )
    }

    fn deflate_dynamic(&mut self, data: &[u8], start: usize, end: usize, is_final: bool) -> Result<()> {
        let options = self.options;
        let mut state = BlockState::new(options, data, start, end);
        let mut tokens = state.lz77_optimal();
        let mut block_type = BlockType::Dynamic;

        // For small blocks the fixed code can win: its tree costs nothing.
        if tokens.len() < FIXED_TRIAL_MAX_SYMBOLS {
            let fixed_tokens = state.lz77_optimal_fixed();
            let dynamic_cost = calculate_block_size(&tokens, BlockType::Dynamic);
            let fixed_cost = calculate_block_size(&fixed_tokens, BlockType::Fixed);
            if fixed_cost < dynamic_cost {
                block_type = BlockType::Fixed;
                tokens = fixed_tokens;
            }
        }

        write_lz77_block(
            &mut self.writer,
            block_type,
            is_final,
            &tokens,
            end - start,
            options.verbose,
        )
    }
}

/// Compress data to a raw DEFLATE stream.
pub fn deflate(data: &[u8], options: &Options) -> Result<Vec<u8>> {
    let mut deflater = Deflater::new(options, Vec::new());
    deflater.deflate(data, true)?;
    deflater.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::DeflateDecoder;
    use std::io::Read;

    fn inflate(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        DeflateDecoder::new(data)
            .read_to_end(&mut out)
            .unwrap();
        out
    }

    fn fast() -> Options {
        Options::default().with_iterations(3)
    }

    #[test]
    fn test_deflate_stored() {
        let input = b"Hello, World!";
        let options = fast().with_block_type(BlockType::Stored);
        let compressed = deflate(input, &options).unwrap();
        assert_eq!(compressed.len(), input.len() + 5);
        assert_eq!(inflate(&compressed), input);
    }

    #[test]
    fn test_deflate_compressed() {
        let input = b"AAAAAAAAAABBBBBBBBBBCCCCCCCCCC";
        let compressed = deflate(input, &fast()).unwrap();
        assert!(
            compressed.len() < input.len(),
            "Compressed {} bytes to {} bytes",
            input.len(),
            compressed.len()
        );
        assert_eq!(inflate(&compressed), input);
    }

    #[test]
    fn test_deflate_empty() {
        for block_type in [BlockType::Stored, BlockType::Fixed, BlockType::Dynamic] {
            let options = fast().with_block_type(block_type);
            let compressed = deflate(b"", &options).unwrap();
            assert!(!compressed.is_empty());
            assert!(inflate(&compressed).is_empty());
        }
    }

    #[test]
    fn test_empty_fixed_block_bytes() {
        let options = fast().with_block_type(BlockType::Fixed);
        assert_eq!(deflate(b"", &options).unwrap(), vec![0x03, 0x00]);
    }

    #[test]
    fn test_deflate_roundtrip() {
        let inputs = [
            b"Hello".to_vec(),
            b"The quick brown fox jumps over the lazy dog".to_vec(),
            vec![0u8; 1000],
            (0..=255).collect::<Vec<u8>>(),
        ];

        for input in &inputs {
            for block_type in [BlockType::Stored, BlockType::Fixed, BlockType::Dynamic] {
                for splitting_last in [false, true] {
                    let options = fast()
                        .with_block_type(block_type)
                        .with_block_splitting_last(splitting_last);
                    let compressed = deflate(input, &options).unwrap();
                    assert_eq!(
                        &inflate(&compressed),
                        input,
                        "Roundtrip failed for {:?} with {} bytes",
                        block_type,
                        input.len()
                    );
                }
            }
        }
    }

    #[test]
    fn test_stored_blocks_are_bounded() {
        let input: Vec<u8> = (0..150_000u32).map(|i| (i * 31 % 251) as u8).collect();
        for splitting in [false, true] {
            let options = fast()
                .with_block_type(BlockType::Stored)
                .with_block_splitting(splitting);
            let compressed = deflate(&input, &options).unwrap();
            // Three blocks of five header bytes each.
            assert_eq!(compressed.len(), input.len() + 15);
            assert_eq!(inflate(&compressed), input);
        }
    }

    #[test]
    fn test_dynamic_beats_fixed() {
        let input = b"AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA\
                      BBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB\
                      CCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCC\
                      DDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDD";

        let dynamic = deflate(input, &fast()).unwrap();
        let fixed = deflate(input, &fast().with_block_type(BlockType::Fixed)).unwrap();
        assert!(
            dynamic.len() <= fixed.len(),
            "Dynamic ({} bytes) should be <= fixed ({} bytes)",
            dynamic.len(),
            fixed.len()
        );
        assert_eq!(inflate(&dynamic), input);
        assert_eq!(inflate(&fixed), input);
    }

    #[test]
    fn test_deflate_part_with_dictionary() {
        let mut data = b"shared prefix, shared prefix, ".repeat(20);
        data.extend_from_slice(b"shared prefix once more");
        let split = 300;
        let options = fast();

        let mut deflater = Deflater::new(&options, Vec::new());
        deflater.deflate_part(&data, 0, split, false).unwrap();
        deflater.deflate_part(&data, split, data.len(), true).unwrap();
        let compressed = deflater.finish().unwrap();
        assert_eq!(inflate(&compressed), data);
    }

    #[test]
    fn test_master_blocks() {
        let input: Vec<u8> = b"0123456789abcdef".repeat(200);
        let options = fast().with_master_block_size(1000);
        let compressed = deflate(&input, &options).unwrap();
        assert_eq!(inflate(&compressed), input);

        let exact = fast().with_master_block_size(input.len());
        assert_eq!(inflate(&deflate(&input, &exact).unwrap()), input);
    }

    #[test]
    fn test_bits_written_tracks_output() {
        let options = fast();
        let mut deflater = Deflater::new(&options, Vec::new());
        deflater.deflate(b"abcabcabcabc", true).unwrap();
        let bits = deflater.bits_written();
        let out = deflater.finish().unwrap();
        assert_eq!(out.len() as u64, bits.div_ceil(8));
    }
}
