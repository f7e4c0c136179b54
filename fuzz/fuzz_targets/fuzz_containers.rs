#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Container parsers must reject garbage without panicking
    let _ = flatekit::gzip::decompress(data);
    let _ = flatekit::zlib::decompress(data);
    let _ = flatekit::tar::TarArchive::parse(data);
});
