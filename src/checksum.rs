//! CRC32 (gzip) and Adler32 (zlib) checksums
//!
//! Both checksums can be continued from a previous value (the `seed`) and
//! combined from the checksums of two adjacent pieces, so large inputs can
//! be summed piecewise.

/// Incremental CRC32 hasher
pub use crc32fast::Hasher as Crc32;

/// Largest prime below 2^16
const ADLER_MOD: u32 = 65521;

/// Bytes that can be summed before `b` may overflow a u32
const ADLER_NMAX: usize = 5552;

/// CRC32 of `data`, continuing from `seed` (0 for a fresh checksum)
pub fn crc32(data: &[u8], seed: u32) -> u32 {
    let mut hasher = Crc32::new_with_initial(seed);
    hasher.update(data);
    hasher.finalize()
}

/// CRC32 of `A || B` given `crc32(A)`, `crc32(B)` and the length of B
pub fn crc32_combine(crc_a: u32, crc_b: u32, len_b: u64) -> u32 {
    let mut a = Crc32::new_with_initial(crc_a);
    let b = Crc32::new_with_initial_len(crc_b, len_b);
    a.combine(&b);
    a.finalize()
}

/// Adler32 of `data`, continuing from `seed` (1 for a fresh checksum)
pub fn adler32(data: &[u8], seed: u32) -> u32 {
    let mut hasher = Adler32::from_checksum(seed);
    hasher.update(data);
    hasher.finish()
}

/// Adler32 of `A || B` given `adler32(A)`, `adler32(B)` and the length of B
pub fn adler32_combine(adler_a: u32, adler_b: u32, len_b: u64) -> u32 {
    let rem = (len_b % ADLER_MOD as u64) as u32;
    let a1 = adler_a & 0xffff;
    let a2 = adler_a >> 16;
    let b1 = adler_b & 0xffff;
    let b2 = adler_b >> 16;

    // s1 = a1 + b1 - 1, s2 = a2 + b2 + rem * a1 - rem, all mod 65521
    let s1 = (a1 + b1 + ADLER_MOD - 1) % ADLER_MOD;
    let s2 = ((rem * a1) % ADLER_MOD + a2 + b2 + ADLER_MOD - rem) % ADLER_MOD;
    s1 | (s2 << 16)
}

/// Incremental Adler32 hasher
#[derive(Clone, Debug)]
pub struct Adler32 {
    a: u32,
    b: u32,
}

impl Adler32 {
    pub fn new() -> Self {
        Self { a: 1, b: 0 }
    }

    /// Resume from a previously computed checksum
    pub fn from_checksum(checksum: u32) -> Self {
        Self { a: checksum & 0xffff, b: checksum >> 16 }
    }

    pub fn update(&mut self, data: &[u8]) {
        for chunk in data.chunks(ADLER_NMAX) {
            for &byte in chunk {
                self.a += byte as u32;
                self.b += self.a;
            }
            self.a %= ADLER_MOD;
            self.b %= ADLER_MOD;
        }
    }

    pub fn finish(&self) -> u32 {
        (self.b << 16) | self.a
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}
