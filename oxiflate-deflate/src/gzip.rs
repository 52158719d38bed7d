//! GZIP container (RFC 1952).
//!
//! # Format
//!
//! ```text
//! +---+---+---+---+---+---+---+---+---+---+============+---+---+---+---+---+---+---+---+
//! |ID1|ID2|CM |FLG|     MTIME     |XFL|OS | compressed |     CRC32     |     ISIZE     |
//! +---+---+---+---+---+---+---+---+---+---+============+---+---+---+---+---+---+---+---+
//! ```
//!
//! Members are written without a file name, comment or timestamp.

use crate::deflate::deflate;
use crate::options::Options;
use oxiflate_core::Crc32;
use oxiflate_core::error::Result;
use std::io::Write;

/// GZIP magic bytes.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// GZIP compression method: DEFLATE.
pub const CM_DEFLATE: u8 = 8;

/// Extra flags value announcing maximum compression.
pub const XFL_MAX_COMPRESSION: u8 = 2;

/// Operating system byte for "unknown".
pub const OS_UNKNOWN: u8 = 255;

/// GZIP member header without optional fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GzipHeader {
    /// Modification time (Unix timestamp), 0 if unavailable.
    pub mtime: u32,
    /// Extra flags.
    pub xfl: u8,
    /// Operating system.
    pub os: u8,
}

impl Default for GzipHeader {
    fn default() -> Self {
        Self {
            mtime: 0,
            xfl: XFL_MAX_COMPRESSION,
            os: OS_UNKNOWN,
        }
    }
}

impl GzipHeader {
    /// Create a header with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// The ten header bytes.
    pub fn to_bytes(&self) -> [u8; 10] {
        let mtime = self.mtime.to_le_bytes();
        [
            GZIP_MAGIC[0],
            GZIP_MAGIC[1],
            CM_DEFLATE,
            0, // no flags
            mtime[0],
            mtime[1],
            mtime[2],
            mtime[3],
            self.xfl,
            self.os,
        ]
    }

    /// Write the header to a writer.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }
}

/// Compress `data` as one gzip member and write it to `sink`.
///
/// The member is built in memory and written in one go.
pub fn write_gzip<W: Write>(options: &Options, data: &[u8], sink: &mut W) -> Result<()> {
    let compressed = deflate(data, options)?;

    let mut output = Vec::with_capacity(compressed.len() + 18);
    GzipHeader::new().write(&mut output)?;
    output.extend_from_slice(&compressed);
    output.extend_from_slice(&Crc32::compute(data).to_le_bytes());
    output.extend_from_slice(&(data.len() as u32).to_le_bytes());

    if options.verbose {
        log::info!(
            "Original Size: {}, Gzip: {}, Compression: {:.6}% Removed",
            data.len(),
            output.len(),
            removed_percent(data.len(), output.len())
        );
    }

    sink.write_all(&output)?;
    Ok(())
}

pub(crate) fn removed_percent(original: usize, compressed: usize) -> f64 {
    if original == 0 {
        0.0
    } else {
        100.0 * (original as f64 - compressed as f64) / original as f64
    }
}

/// Compress data into a gzip member.
///
/// # Example
///
/// ```
/// use oxiflate_deflate::{Options, gzip_compress};
///
/// let data = b"Hello, World! Hello, World!";
/// let compressed = gzip_compress(data, &Options::default()).unwrap();
/// assert_eq!(&compressed[..3], &[0x1F, 0x8B, 0x08]);
/// ```
pub fn gzip_compress(input: &[u8], options: &Options) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    write_gzip(options, input, &mut output)?;
    Ok(output)
}
