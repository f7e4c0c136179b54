use super::canonical::build_codes_from_lengths;
use super::decoder::HuffmanDecoder;
use lazy_static::lazy_static;

/// Fixed Huffman literal/length code lengths (RFC 1951 section 3.2.6)
pub fn fixed_literal_lengths() -> [u8; 288] {
    let mut lengths = [0u8; 288];
    lengths[0..=143].fill(8); // 0-143: 8 bits
    lengths[144..=255].fill(9); // 144-255: 9 bits
    lengths[256..=279].fill(7); // 256-279: 7 bits
    lengths[280..=287].fill(8); // 280-287: 8 bits
    lengths
}

/// Fixed Huffman distance code lengths (all 5 bits)
pub fn fixed_distance_lengths() -> [u8; 32] {
    [5u8; 32]
}

lazy_static! {
    /// Fixed literal/length codes, `(code, length)` per symbol
    pub static ref FIXED_LITERAL_CODES: Vec<(u32, u8)> =
        build_codes_from_lengths(&fixed_literal_lengths());

    /// Fixed distance codes, `(code, length)` per symbol
    pub static ref FIXED_DISTANCE_CODES: Vec<(u32, u8)> =
        build_codes_from_lengths(&fixed_distance_lengths());

    pub static ref FIXED_LITERAL_DECODER: HuffmanDecoder =
        HuffmanDecoder::from_trusted_lengths(&fixed_literal_lengths());

    pub static ref FIXED_DISTANCE_DECODER: HuffmanDecoder =
        HuffmanDecoder::from_trusted_lengths(&fixed_distance_lengths());
}
