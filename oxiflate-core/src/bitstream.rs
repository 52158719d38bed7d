//! Bit-level output for DEFLATE streams.
//!
//! DEFLATE packs data elements starting at the least significant bit of
//! each byte. Extra bits and header fields are written LSB-first, while
//! Huffman codes are written starting from their most significant bit
//! (RFC 1951 Section 3.1.1). `BitWriter` supports both orders.
//!
//! # Example
//!
//! ```
//! use oxiflate_core::bitstream::BitWriter;
//!
//! let mut writer = BitWriter::new(Vec::new());
//! writer.write_bits(0b101, 3).unwrap();
//! writer.write_huffman_bits(0b11, 2).unwrap();
//! let output = writer.into_inner().unwrap();
//! assert_eq!(output, vec![0b0001_1101]);
//! ```

use crate::error::Result;
use std::io::Write;

/// A bit-level writer that wraps any `Write` implementation.
///
/// Bits are accumulated in a 64-bit buffer and complete bytes are handed to
/// the inner writer as soon as they are available. The writer keeps a running
/// total of every bit it has accepted, which makes it usable as a bit counter
/// when wrapped around [`std::io::sink`].
///
/// Partial bytes are only emitted by [`BitWriter::flush`] or
/// [`BitWriter::into_inner`]; dropping a writer discards them.
#[derive(Debug)]
pub struct BitWriter<W: Write> {
    writer: W,
    /// Pending bits, LSB-first.
    buffer: u64,
    bits_in_buffer: u8,
    total_bits_written: u64,
}

impl<W: Write> BitWriter<W> {
    /// Create a new `BitWriter` wrapping the given writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buffer: 0,
            bits_in_buffer: 0,
            total_bits_written: 0,
        }
    }

    /// Pad the last byte with zeros, flush, and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.writer)
    }

    /// Total number of bits accepted so far, including alignment padding.
    pub fn bits_written(&self) -> u64 {
        self.total_bits_written
    }

    #[inline]
    fn drain_bytes(&mut self) -> Result<()> {
        if self.bits_in_buffer >= 32 {
            let word = (self.buffer as u32).to_le_bytes();
            self.writer.write_all(&word)?;
            self.buffer >>= 32;
            self.bits_in_buffer -= 32;
        }

        while self.bits_in_buffer >= 8 {
            self.writer.write_all(&[self.buffer as u8])?;
            self.buffer >>= 8;
            self.bits_in_buffer -= 8;
        }
        Ok(())
    }

    /// Write up to 32 bits, least significant bit first.
    ///
    /// This is the order for header fields and extra bits.
    #[inline]
    pub fn write_bits(&mut self, value: u32, count: u8) -> Result<()> {
        debug_assert!(count <= 32, "cannot write more than 32 bits at once");

        if count == 0 {
            return Ok(());
        }

        let value = if count == 32 {
            value
        } else {
            value & ((1u32 << count) - 1)
        };

        self.buffer |= (value as u64) << self.bits_in_buffer;
        self.bits_in_buffer += count;
        self.total_bits_written += count as u64;

        self.drain_bytes()
    }

    /// Write a Huffman code of `length` bits, most significant bit first.
    #[inline]
    pub fn write_huffman_bits(&mut self, code: u32, length: u8) -> Result<()> {
        if length == 0 {
            return Ok(());
        }
        let reversed = code.reverse_bits() >> (32 - length as u32);
        self.write_bits(reversed, length)
    }

    /// Write a single bit.
    #[inline(always)]
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        self.buffer |= (bit as u64) << self.bits_in_buffer;
        self.bits_in_buffer += 1;
        self.total_bits_written += 1;

        if self.bits_in_buffer >= 8 {
            self.drain_bytes()?;
        }

        Ok(())
    }

    /// Pad to the next byte boundary with zero bits.
    pub fn align_to_byte(&mut self) -> Result<()> {
        let partial = (self.total_bits_written % 8) as u8;
        if partial != 0 {
            self.write_bits(0, 8 - partial)?;
        }
        Ok(())
    }

    /// Write whole bytes.
    ///
    /// When the stream is byte aligned the slice goes straight to the inner
    /// writer; otherwise each byte is shifted in bit by bit.
    pub fn write_bytes(&mut self, buf: &[u8]) -> Result<()> {
        self.drain_bytes()?;

        if self.bits_in_buffer > 0 {
            for &byte in buf {
                self.write_bits(byte as u32, 8)?;
            }
        } else {
            self.writer.write_all(buf)?;
            self.total_bits_written += buf.len() as u64 * 8;
        }

        Ok(())
    }

    /// Pad the final partial byte with zeros and flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.align_to_byte()?;
        self.drain_bytes()?;
        self.writer.flush()?;
        Ok(())
    }
}
