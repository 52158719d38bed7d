//! Compressing independent chunks on several threads.
//!
//! Each chunk becomes its own gzip member; concatenated members form a valid
//! multi-member gzip file.

use flate2::read::MultiGzDecoder;
use oxiflate_deflate::{Options, gzip_compress};
use rayon::prelude::*;
use std::io::Read;

fn log_lines(count: usize) -> Vec<u8> {
    let mut data = Vec::new();
    for i in 0..count {
        let line = format!(
            "2024-01-{:02} 12:{:02}:{:02} INFO request id={} status={} bytes={}\n",
            i % 28 + 1,
            i % 60,
            (i * 7) % 60,
            i,
            if i % 11 == 0 { 404 } else { 200 },
            (i * 131) % 9000
        );
        data.extend_from_slice(line.as_bytes());
    }
    data
}

#[test]
fn test_parallel_gzip_members() {
    let data = log_lines(1500);
    let options = Options::default().with_iterations(2);

    let members: Vec<Vec<u8>> = data
        .par_chunks(16 * 1024)
        .map(|chunk| gzip_compress(chunk, &options))
        .collect::<Result<_, _>>()
        .unwrap();
    assert!(members.len() > 1);

    let joined: Vec<u8> = members.concat();
    let mut out = Vec::new();
    MultiGzDecoder::new(&joined[..]).read_to_end(&mut out).unwrap();
    assert_eq!(out, data);
}

#[test]
fn test_parallel_matches_sequential() {
    let data = log_lines(600);
    let options = Options::default().with_iterations(3);

    let parallel: Vec<Vec<u8>> = data
        .par_chunks(8 * 1024)
        .map(|chunk| gzip_compress(chunk, &options).unwrap())
        .collect();
    let sequential: Vec<Vec<u8>> = data
        .chunks(8 * 1024)
        .map(|chunk| gzip_compress(chunk, &options).unwrap())
        .collect();
    assert_eq!(parallel, sequential);
}
