//! Zlib container (RFC 1950).
//!
//! The zlib format wraps raw DEFLATE data with a two-byte header and an
//! Adler-32 checksum.
//!
//! # Format
//!
//! ```text
//! +---+---+============+---+---+---+---+
//! |CMF|FLG| compressed |    ADLER32    |
//! +---+---+============+---+---+---+---+
//! ```
//!
//! - CMF: Compression Method and Flags
//!   - Bits 0-3: CM (Compression Method) - 8 for DEFLATE
//!   - Bits 4-7: CINFO (Compression Info) - log2(window size) - 8
//! - FLG: Flags
//!   - Bits 0-4: FCHECK - check bits so (CMF*256 + FLG) mod 31 == 0
//!   - Bit 5: FDICT - preset dictionary present (never set here)
//!   - Bits 6-7: FLEVEL - compression level (0-3)
//! - ADLER32: Adler-32 checksum of uncompressed data (big-endian)

use crate::deflate::deflate;
use crate::gzip::removed_percent;
use crate::options::Options;
use oxiflate_core::Adler32;
use oxiflate_core::error::Result;
use std::io::Write;

/// CMF byte: CM=8 (DEFLATE), CINFO=7 (32KB window).
pub const ZLIB_CMF: u8 = 0x78;

/// FLEVEL field value announcing maximum compression.
pub const FLEVEL_MAXIMUM: u8 = 3;

/// The two zlib header bytes: maximum compression, no preset dictionary.
pub fn zlib_header() -> [u8; 2] {
    let flg = FLEVEL_MAXIMUM << 6;
    let check = ((ZLIB_CMF as u16) << 8 | flg as u16) % 31;
    let fcheck = if check == 0 { 0 } else { 31 - check as u8 };
    [ZLIB_CMF, flg | fcheck]
}

/// Compress `data` as a zlib stream and write it to `sink`.
pub fn write_zlib<W: Write>(options: &Options, data: &[u8], sink: &mut W) -> Result<()> {
    let compressed = deflate(data, options)?;

    let mut output = Vec::with_capacity(compressed.len() + 6);
    output.extend_from_slice(&zlib_header());
    output.extend_from_slice(&compressed);
    output.extend_from_slice(&Adler32::checksum(data).to_be_bytes());

    if options.verbose {
        log::info!(
            "Original Size: {}, Zlib: {}, Compression: {:.6}% Removed",
            data.len(),
            output.len(),
            removed_percent(data.len(), output.len())
        );
    }

    sink.write_all(&output)?;
    Ok(())
}

/// Compress data using zlib format.
///
/// # Example
///
/// ```
/// use oxiflate_deflate::{Options, zlib_compress};
///
/// let data = b"Hello, World! Hello, World!";
/// let compressed = zlib_compress(data, &Options::default()).unwrap();
/// assert_eq!(&compressed[..2], &[0x78, 0xDA]);
/// ```
pub fn zlib_compress(input: &[u8], options: &Options) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    write_zlib(options, input, &mut output)?;
    Ok(output)
}
