#![no_main]

use flate2::read::DeflateDecoder;
use libfuzzer_sys::fuzz_target;
use std::io::Read;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must never panic the decoder
    let ours = flatekit::decompress(data, 0, data.len(), None);

    // Whatever we accept, the reference must decode to the same bytes
    if let Ok(ours) = ours {
        let mut decoder = DeflateDecoder::new(data);
        let mut theirs = Vec::new();
        if decoder.read_to_end(&mut theirs).is_ok() {
            assert_eq!(ours, theirs, "Decoded output differs from flate2");
        }
    }
});
