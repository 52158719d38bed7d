//! Round trips through independent decoders.

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use oxiflate_deflate::{BlockType, Deflater, Format, Options, compress_to_vec, deflate};
use std::io::Read;

fn decode(format: Format, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    match format {
        Format::Deflate => DeflateDecoder::new(data).read_to_end(&mut out),
        Format::Zlib => ZlibDecoder::new(data).read_to_end(&mut out),
        Format::Gzip => GzDecoder::new(data).read_to_end(&mut out),
    }
    .unwrap();
    out
}

fn lcg_bytes(size: usize, seed: u64) -> Vec<u8> {
    let mut state = seed;
    (0..size)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 56) as u8
        })
        .collect()
}

fn text(size: usize) -> Vec<u8> {
    let words = [
        "alpha ", "beta ", "gamma ", "delta ", "epsilon ", "zeta ", "eta ", "theta ", "\n",
    ];
    let mut data = Vec::with_capacity(size);
    let mut state = 7u32;
    while data.len() < size {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
        data.extend_from_slice(words[(state >> 16) as usize % words.len()].as_bytes());
    }
    data.truncate(size);
    data
}

fn corpus() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("empty", Vec::new()),
        ("one_byte", vec![0x42]),
        ("two_bytes", b"ab".to_vec()),
        ("all_values", (0..=255u8).collect()),
        ("zeros", vec![0u8; 5000]),
        ("text", text(12_000)),
        ("random", lcg_bytes(3000, 1)),
        ("mixed", {
            let mut data = text(4000);
            data.extend(lcg_bytes(2000, 9));
            data.extend(text(4000));
            data
        }),
    ]
}

#[test]
fn test_all_formats_round_trip() {
    let options = Options::default().with_iterations(3);
    for (name, data) in corpus() {
        for format in [Format::Deflate, Format::Zlib, Format::Gzip] {
            let compressed = compress_to_vec(&options, format, &data).unwrap();
            assert_eq!(
                decode(format, &compressed),
                data,
                "{} failed for {:?}",
                name,
                format
            );
        }
    }
}

#[test]
fn test_block_types_round_trip() {
    for block_type in [BlockType::Stored, BlockType::Fixed, BlockType::Dynamic] {
        let options = Options::default()
            .with_iterations(2)
            .with_block_type(block_type);
        for (name, data) in corpus() {
            let compressed = deflate(&data, &options).unwrap();
            assert_eq!(
                decode(Format::Deflate, &compressed),
                data,
                "{} failed for {:?}",
                name,
                block_type
            );
        }
    }
}

#[test]
fn test_splitting_modes_round_trip() {
    let data = corpus().pop().map(|(_, data)| data).unwrap();
    let variants = [
        Options::default().with_block_splitting(false),
        Options::default().with_block_splitting_last(true),
        Options::default().with_block_splitting_max(0),
        Options::default().with_block_splitting_max(2),
        Options::default()
            .with_block_splitting_last(true)
            .with_block_type(BlockType::Fixed),
    ];
    for options in variants {
        let options = options.with_iterations(2);
        let compressed = deflate(&data, &options).unwrap();
        assert_eq!(decode(Format::Deflate, &compressed), data, "{:?}", options);
    }
}

#[test]
fn test_master_blocks_round_trip() {
    let data = text(50_000);
    for master_block_size in [0, 1, 4096, 20_000, 49_999, 50_000] {
        let options = Options::default()
            .with_iterations(1)
            .with_master_block_size(master_block_size);
        // Single-byte master blocks are slow; keep that case short.
        let input = if master_block_size == 1 { &data[..300] } else { &data[..] };
        let compressed = deflate(input, &options).unwrap();
        assert_eq!(decode(Format::Deflate, &compressed), input, "master {}", master_block_size);
    }
}

#[test]
fn test_far_matches() {
    // Repeats data from 32767 bytes back, the farthest the matcher looks.
    let head = lcg_bytes(32_767, 3);
    let mut data = head.clone();
    data.extend_from_slice(&head[..1000]);
    let options = Options::default().with_iterations(1);
    let compressed = deflate(&data, &options).unwrap();
    assert_eq!(decode(Format::Deflate, &compressed), data);
    assert!(compressed.len() < head.len() + 500);
}

#[test]
fn test_deflate_part_chain() {
    let data = text(30_000);
    let options = Options::default().with_iterations(2);
    let mut deflater = Deflater::new(&options, Vec::new());
    let bounds = [0, 7_000, 7_001, 19_000, 30_000];
    for (i, window) in bounds.windows(2).enumerate() {
        let last = i == bounds.len() - 2;
        deflater.deflate_part(&data, window[0], window[1], last).unwrap();
    }
    let compressed = deflater.finish().unwrap();
    assert_eq!(decode(Format::Deflate, &compressed), data);
}
