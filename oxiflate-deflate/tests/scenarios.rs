//! End-to-end behavior: sizes, determinism, and code properties.

use flate2::read::{DeflateDecoder, GzDecoder};
use oxiflate_deflate::{
    BlockState, BlockType, CodeLengths, Format, Options, calculate_block_size, compress_to_vec,
    deflate,
};
use oxiflate_deflate::huffman::canonical_codes;
use oxiflate_deflate::tables::CODE_LENGTH_ORDER;
use std::io::Read;

fn inflate(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    DeflateDecoder::new(data).read_to_end(&mut out).unwrap();
    out
}

fn random_bytes(size: usize) -> Vec<u8> {
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    (0..size)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state as u8
        })
        .collect()
}

/// Words with skewed frequencies and a little noise.
fn prose(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state = 1u32;
    while data.len() < size {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let word: &[u8] = match state >> 28 {
            0..=5 => b"the ",
            6..=8 => b"compression ",
            9..=10 => b"of ",
            11 => b"deflate ",
            12 => b"streams ",
            13 => b"is ",
            14 => b"optimal, ",
            _ => b"\n",
        };
        data.extend_from_slice(word);
        if state & 0xFF < 8 {
            data.push(b'0' + (state >> 8) as u8 % 10);
        }
    }
    data.truncate(size);
    data
}

#[test]
fn test_empty_gzip() {
    let compressed = compress_to_vec(&Options::default(), Format::Gzip, b"").unwrap();
    assert!(compressed.len() >= 18);
    let mut out = Vec::new();
    GzDecoder::new(&compressed[..]).read_to_end(&mut out).unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_long_run_compresses_tightly() {
    let data = vec![0x41u8; 100_000];
    let compressed = deflate(&data, &Options::default()).unwrap();
    assert!(
        compressed.len() < data.len() / 100,
        "{} bytes",
        compressed.len()
    );
    assert_eq!(inflate(&compressed), data);
}

#[test]
fn test_incompressible_overhead_is_bounded() {
    let data = random_bytes(64);
    // One stored block: five header bytes.
    let stored = data.len() + 5;
    // A fixed block spends at most 9 bits per literal plus 10 bits, i.e. 74
    // bytes here, and is always tried for short parses.
    for (format, framing) in [(Format::Deflate, 0), (Format::Zlib, 6), (Format::Gzip, 18)] {
        let compressed = compress_to_vec(&Options::default(), format, &data).unwrap();
        assert!(
            compressed.len() <= stored + framing + 5,
            "{:?}: {} bytes",
            format,
            compressed.len()
        );
    }
}

#[test]
fn test_frequent_bytes_get_shorter_codes() {
    // 'q' occurs exactly once, so it can only be coded as a literal.
    let mut data = b"q".to_vec();
    let mut state = 99u32;
    for _ in 0..4000 {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
        let byte = match (state >> 16) % 16 {
            0..=8 => b'e',
            9..=11 => b't',
            12..=13 => b'a',
            14 => b'o',
            _ => b'n',
        };
        data.push(byte);
    }

    let options = Options::default()
        .with_iterations(5)
        .with_block_type(BlockType::Dynamic);
    let tokens = BlockState::new(&options, &data, 0, data.len()).lz77_optimal();
    let lengths = CodeLengths::dynamic(&tokens);
    assert!(lengths.litlen[b'q' as usize] > 0);
    assert!(lengths.litlen[b'e' as usize] > 0);
    assert!(lengths.litlen[b'e' as usize] < lengths.litlen[b'q' as usize]);
}

#[test]
fn test_more_iterations_never_hurt() {
    let data = prose(10_000);
    let one = deflate(&data, &Options::default().with_iterations(1)).unwrap();
    let fifteen = deflate(&data, &Options::default().with_iterations(15)).unwrap();
    assert!(fifteen.len() <= one.len(), "{} > {}", fifteen.len(), one.len());
    assert_eq!(inflate(&fifteen), data);
}

#[test]
fn test_iteration_counts_monotone() {
    let data = prose(6_000);
    let mut previous = usize::MAX;
    for iterations in [1, 2, 4, 8, 12] {
        let size = deflate(&data, &Options::default().with_iterations(iterations))
            .unwrap()
            .len();
        assert!(size <= previous, "{} iterations: {} > {}", iterations, size, previous);
        previous = size;
    }
}

#[test]
fn test_zero_iterations_behaves_as_one() {
    let data = prose(3_000);
    let zero = deflate(&data, &Options::default().with_iterations(0)).unwrap();
    let one = deflate(&data, &Options::default().with_iterations(1)).unwrap();
    assert_eq!(zero, one);
}

#[test]
fn test_deterministic_output() {
    let data = prose(8_000);
    let options = Options::default().with_iterations(10);
    for format in [Format::Deflate, Format::Zlib, Format::Gzip] {
        let first = compress_to_vec(&options, format, &data).unwrap();
        let second = compress_to_vec(&options, format, &data).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_code_length_properties() {
    let inputs = [prose(5_000), random_bytes(2_000), vec![7u8; 700], b"x".to_vec()];
    for data in &inputs {
        let options = Options::default().with_iterations(2);
        let tokens = BlockState::new(&options, data, 0, data.len()).lz77_optimal();
        let lengths = CodeLengths::dynamic(&tokens);

        for table in [&lengths.litlen[..], &lengths.dist[..]] {
            assert!(table.iter().all(|&l| l <= 15));
            let kraft: f64 = table
                .iter()
                .filter(|&&l| l > 0)
                .map(|&l| 2f64.powi(-(l as i32)))
                .sum();
            assert!(kraft <= 1.0, "kraft sum {}", kraft);
        }
        assert!(lengths.dist[..30].iter().filter(|&&l| l > 0).count() >= 2);

        // The written block is exactly as large as computed.
        let dynamic_bits = calculate_block_size(&tokens, BlockType::Dynamic);
        let fixed_bits = calculate_block_size(&tokens, BlockType::Fixed);
        assert!(dynamic_bits > 0 && fixed_bits > 0);
    }
}

#[test]
fn test_dynamic_output_beats_stored_on_text() {
    let data = prose(20_000);
    let stored = deflate(&data, &Options::default().with_block_type(BlockType::Stored)).unwrap();
    let fixed = deflate(
        &data,
        &Options::default().with_iterations(3).with_block_type(BlockType::Fixed),
    )
    .unwrap();
    let dynamic = deflate(&data, &Options::default().with_iterations(3)).unwrap();
    assert!(dynamic.len() <= fixed.len());
    assert!(fixed.len() < stored.len());
    assert_eq!(inflate(&dynamic), data);
}

/// LSB-first reader over a DEFLATE stream.
struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl BitReader<'_> {
    fn bit(&mut self) -> u32 {
        let bit = (self.data[self.pos / 8] >> (self.pos % 8)) & 1;
        self.pos += 1;
        bit as u32
    }

    fn bits(&mut self, count: u32) -> u32 {
        (0..count).fold(0, |value, i| value | (self.bit() << i))
    }

    /// Decode one symbol of the canonical code described by `lengths`.
    fn symbol(&mut self, lengths: &[u8]) -> usize {
        let codes = canonical_codes(lengths);
        let (mut code, mut length) = (0u32, 0u8);
        loop {
            code = (code << 1) | self.bit();
            length += 1;
            assert!(length <= 15, "no symbol matches");
            if let Some(symbol) = (0..lengths.len()).find(|&s| lengths[s] == length && codes[s] == code) {
                return symbol;
            }
        }
    }
}

#[test]
fn test_single_distance_stream_carries_two_distance_codes() {
    // Every match has distance 1, so only one distance symbol is used.
    let data = vec![b'A'; 50_000];
    let options = Options::default()
        .with_iterations(2)
        .with_block_splitting(false);
    let compressed = deflate(&data, &options).unwrap();
    assert_eq!(inflate(&compressed), data);

    let mut reader = BitReader {
        data: &compressed,
        pos: 0,
    };
    assert_eq!(reader.bits(1), 1, "single final block");
    assert_eq!(reader.bits(2), 2, "dynamic block");

    let hlit = reader.bits(5) as usize + 257;
    let hdist = reader.bits(5) as usize + 1;
    let hclen = reader.bits(4) as usize + 4;
    let mut clcl = [0u8; 19];
    for &symbol in &CODE_LENGTH_ORDER[..hclen] {
        clcl[symbol] = reader.bits(3) as u8;
    }

    let mut lengths: Vec<u8> = Vec::with_capacity(hlit + hdist);
    while lengths.len() < hlit + hdist {
        match reader.symbol(&clcl) {
            value @ 0..=15 => lengths.push(value as u8),
            16 => {
                let previous = *lengths.last().unwrap();
                let repeat = 3 + reader.bits(2) as usize;
                lengths.extend(std::iter::repeat_n(previous, repeat));
            }
            17 => {
                let repeat = 3 + reader.bits(3) as usize;
                lengths.extend(std::iter::repeat_n(0, repeat));
            }
            _ => {
                let repeat = 11 + reader.bits(7) as usize;
                lengths.extend(std::iter::repeat_n(0, repeat));
            }
        }
    }
    assert_eq!(lengths.len(), hlit + hdist);

    let dist_lengths = &lengths[hlit..];
    assert!(hdist >= 2, "HDIST covers {} codes", hdist);
    assert_eq!(dist_lengths.iter().filter(|&&l| l > 0).count(), 2);
    assert!(dist_lengths[0] > 0 && dist_lengths[1] > 0);
}
