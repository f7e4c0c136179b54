//! Canonical Huffman code assignment (RFC 1951 section 3.2.2).
//!
//! Both directions derive their tables from here: the encoder turns code
//! lengths into bit patterns, the decoder turns the same lengths into
//! first-code/first-symbol ranges.

/// Longest code length DEFLATE allows
pub const MAX_BITS: usize = 15;

/// Count the number of codes of each length (index 0 is always zero)
pub fn count_lengths(lengths: &[u8]) -> [u16; MAX_BITS + 1] {
    let mut bl_count = [0u16; MAX_BITS + 1];
    for &len in lengths {
        if len > 0 {
            bl_count[len as usize] += 1;
        }
    }
    bl_count
}

/// Compute the first code value for each bit length
pub fn first_codes(bl_count: &[u16; MAX_BITS + 1]) -> [u32; MAX_BITS + 1] {
    let mut next_code = [0u32; MAX_BITS + 1];
    let mut code = 0u32;
    for bits in 1..=MAX_BITS {
        code = (code + bl_count[bits - 1] as u32) << 1;
        next_code[bits] = code;
    }
    next_code
}

/// Build canonical Huffman codes from code lengths
///
/// Returns `(code, length)` per symbol; unused symbols get `(0, 0)`.
/// Codes are MSB-first and must be bit-reversed before being packed into a
/// DEFLATE stream. Lengths must not exceed [`MAX_BITS`].
pub fn build_codes_from_lengths(lengths: &[u8]) -> Vec<(u32, u8)> {
    let mut next_code = first_codes(&count_lengths(lengths));

    let mut codes = vec![(0u32, 0u8); lengths.len()];
    for (sym, &len) in lengths.iter().enumerate() {
        if len > 0 {
            codes[sym] = (next_code[len as usize], len);
            next_code[len as usize] += 1;
        }
    }

    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc_example() {
        // RFC 1951 3.2.2: ABCDEFGH with lengths (3, 3, 3, 3, 3, 2, 4, 4)
        let lengths = [3u8, 3, 3, 3, 3, 2, 4, 4];
        let codes = build_codes_from_lengths(&lengths);
        let expected = [
            (0b010, 3),
            (0b011, 3),
            (0b100, 3),
            (0b101, 3),
            (0b110, 3),
            (0b00, 2),
            (0b1110, 4),
            (0b1111, 4),
        ];
        assert_eq!(codes, expected);
    }

    #[test]
    fn test_unused_symbols() {
        let lengths = [0u8, 1, 0, 2, 2];
        let codes = build_codes_from_lengths(&lengths);
        assert_eq!(codes, vec![(0, 0), (0b0, 1), (0, 0), (0b10, 2), (0b11, 2)]);
    }

    #[test]
    fn test_first_codes() {
        let bl_count = count_lengths(&[3, 3, 3, 3, 3, 2, 4, 4]);
        assert_eq!(bl_count[2], 1);
        assert_eq!(bl_count[3], 5);
        assert_eq!(bl_count[4], 2);

        let next_code = first_codes(&bl_count);
        assert_eq!(next_code[2], 0b00);
        assert_eq!(next_code[3], 0b010);
        assert_eq!(next_code[4], 0b1110);
    }
}
