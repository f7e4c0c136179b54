#![no_main]

use flate2::read::DeflateDecoder;
use flatekit::{compress_with, decompress, CompressionLevel, DeflateConfig};
use libfuzzer_sys::fuzz_target;
use std::io::Read;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the level and block size, the rest is the payload
    let (control, payload) = data.split_at(1);
    let payload = if payload.len() > 64 * 1024 { &payload[..64 * 1024] } else { payload };
    let config = DeflateConfig {
        compression_level: CompressionLevel::from_level(control[0] % 10),
        max_block_tokens: 1 + (control[0] as usize >> 4) * 1024,
    };

    let compressed = compress_with(payload, 0, payload.len(), &config).unwrap();
    let ours = decompress(&compressed, 0, compressed.len(), None).unwrap();
    assert_eq!(ours, payload, "Round-trip mismatch");

    let mut decoder = DeflateDecoder::new(&compressed[..]);
    let mut theirs = Vec::new();
    decoder.read_to_end(&mut theirs).unwrap();
    assert_eq!(theirs, payload, "flate2 disagrees with our encoder");
});
