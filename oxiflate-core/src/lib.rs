//! # OxiFlate Core
//!
//! Shared building blocks for the OxiFlate compressor:
//!
//! - [`bitstream`]: LSB-first bit output with MSB-first Huffman codes
//! - [`crc`]: CRC-32 for gzip trailers
//! - [`adler`]: Adler-32 for zlib trailers
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Container                                               │
//! │     gzip (RFC 1952), zlib (RFC 1950), raw deflate       │
//! ├─────────────────────────────────────────────────────────┤
//! │ Codec                                                   │
//! │     optimal LZ77 parse, package-merge Huffman codes     │
//! ├─────────────────────────────────────────────────────────┤
//! │ BitStream (this crate)                                  │
//! │     BitWriter, CRC-32, Adler-32                         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxiflate_core::{Adler32, BitWriter, Crc32};
//!
//! let mut writer = BitWriter::new(Vec::new());
//! writer.write_bits(0b011, 3).unwrap();
//! assert_eq!(writer.into_inner().unwrap(), vec![0b011]);
//!
//! assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
//! assert_eq!(Adler32::checksum(b"Wikipedia"), 0x11E60398);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod adler;
pub mod bitstream;
pub mod crc;
pub mod error;

// Re-exports for convenience
pub use adler::Adler32;
pub use bitstream::BitWriter;
pub use crc::Crc32;
pub use error::{OxiFlateError, Result};
