//! Symbol tables for DEFLATE (RFC 1951 Section 3.2.5 and 3.2.6).
//!
//! Lengths 3-258 map to literal/length symbols 257-285 and distances
//! 1-32768 map to distance symbols 0-29, each followed by a number of
//! extra bits selecting the exact value within the symbol's range.

/// Shortest match DEFLATE can express.
pub const MIN_MATCH: usize = 3;

/// Longest match DEFLATE can express.
pub const MAX_MATCH: usize = 258;

/// Sliding window size. Must be a power of two.
pub const WINDOW_SIZE: usize = 32768;

/// Mask wrapping positions into the window.
pub const WINDOW_MASK: usize = WINDOW_SIZE - 1;

/// Number of literal/length symbols, including the two reserved ones.
pub const NUM_LITLEN: usize = 288;

/// Number of distance symbols, including the two reserved ones.
pub const NUM_DIST: usize = 32;

/// End-of-block symbol.
pub const END_OF_BLOCK: usize = 256;

/// Length code base values for symbols 257-285.
pub const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, // 257-264
    11, 13, 15, 17, // 265-268
    19, 23, 27, 31, // 269-272
    35, 43, 51, 59, // 273-276
    67, 83, 99, 115, // 277-280
    131, 163, 195, 227, // 281-284
    258, // 285
];

/// Number of extra bits for length symbols 257-285.
pub const LENGTH_EXTRA_BITS: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, // 257-264
    1, 1, 1, 1, // 265-268
    2, 2, 2, 2, // 269-272
    3, 3, 3, 3, // 273-276
    4, 4, 4, 4, // 277-280
    5, 5, 5, 5, // 281-284
    0, // 285
];

/// Smallest distance of each distance symbol 0-29.
pub const DISTANCE_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Order in which code length code lengths are transmitted.
pub const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Literal/length symbol of every match length, indexed by length.
static LENGTH_SYMBOL: [u16; MAX_MATCH + 1] = {
    let mut table = [0u16; MAX_MATCH + 1];
    let mut code = 0;
    while code < 28 {
        let mut length = LENGTH_BASE[code] as usize;
        while length < LENGTH_BASE[code + 1] as usize {
            table[length] = 257 + code as u16;
            length += 1;
        }
        code += 1;
    }
    // 258 has its own zero-extra-bit symbol even though 284 could reach it.
    table[MAX_MATCH] = 285;
    table
};

/// Literal/length symbol for a match length (3-258).
#[inline]
pub fn length_symbol(length: u16) -> u16 {
    debug_assert!(
        (MIN_MATCH..=MAX_MATCH).contains(&(length as usize)),
        "length out of range: {}",
        length
    );
    LENGTH_SYMBOL[length as usize]
}

/// Number of extra bits that follow a match length's symbol.
#[inline]
pub fn length_extra_bits(length: u16) -> u8 {
    LENGTH_EXTRA_BITS[(length_symbol(length) - 257) as usize]
}

/// Convert a length (3-258) to `(symbol, extra_bits, extra_value)`.
pub fn length_to_code(length: u16) -> (u16, u8, u16) {
    let index = (length_symbol(length) - 257) as usize;
    (
        257 + index as u16,
        LENGTH_EXTRA_BITS[index],
        length - LENGTH_BASE[index],
    )
}

/// Distance symbol (0-29) for a distance (1-32768).
///
/// Above 4, every power of two is split into two symbols, so the symbol is
/// twice the position of the top bit of `distance - 1` plus the bit below it.
#[inline]
pub fn distance_symbol(distance: u16) -> u16 {
    debug_assert!(distance >= 1, "distance out of range: {}", distance);
    let d = distance as u32 - 1;
    if d < 4 {
        return d as u16;
    }
    let top = 31 - d.leading_zeros();
    (2 * top + ((d >> (top - 1)) & 1)) as u16
}

/// Number of extra bits that follow a distance's symbol.
#[inline]
pub fn distance_extra_bits(distance: u16) -> u8 {
    let d = distance as u32 - 1;
    if d < 4 {
        0
    } else {
        (30 - d.leading_zeros()) as u8
    }
}

/// Value of the extra bits that follow a distance's symbol.
#[inline]
pub fn distance_extra_value(distance: u16) -> u16 {
    let bits = distance_extra_bits(distance);
    ((distance as u32 - 1) & ((1u32 << bits) - 1)) as u16
}

/// Convert a distance (1-32768) to `(symbol, extra_bits, extra_value)`.
pub fn distance_to_code(distance: u16) -> (u16, u8, u16) {
    (
        distance_symbol(distance),
        distance_extra_bits(distance),
        distance_extra_value(distance),
    )
}

/// Fixed literal/length code lengths (RFC 1951 Section 3.2.6).
///
/// - Symbols 0-143: 8 bits
/// - Symbols 144-255: 9 bits
/// - Symbols 256-279: 7 bits
/// - Symbols 280-287: 8 bits
pub fn fixed_litlen_lengths() -> [u8; NUM_LITLEN] {
    let mut lengths = [8u8; NUM_LITLEN];
    lengths[144..256].fill(9);
    lengths[256..280].fill(7);
    lengths
}

/// Fixed distance code lengths: every symbol uses 5 bits.
pub fn fixed_distance_lengths() -> [u8; NUM_DIST] {
    [5u8; NUM_DIST]
}
