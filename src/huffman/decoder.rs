use super::canonical::{count_lengths, first_codes, MAX_BITS};
use crate::bits::BitReader;
use crate::error::{Error, Result};

/// Canonical Huffman decoder
///
/// Codes are matched one bit at a time against the canonical ranges of each
/// length, so no explicit code table has to be materialized.
#[derive(Debug, Clone)]
pub struct HuffmanDecoder {
    /// Maximum code length in use (0 for an empty table)
    max_bits: u8,
    /// Number of codes of each length
    counts: [u16; MAX_BITS + 1],
    /// First canonical code of each length
    first_code: [u32; MAX_BITS + 1],
    /// Index into `symbols` of the first symbol of each length
    first_index: [u16; MAX_BITS + 1],
    /// Symbols sorted by code length, then by symbol value
    symbols: Vec<u16>,
}

impl HuffmanDecoder {
    /// Build from code lengths received in a dynamic block header
    ///
    /// Rejects lengths above 15 and over-subscribed sets. Incomplete sets are
    /// accepted; reading an unassigned prefix fails at decode time.
    pub fn from_code_lengths(lengths: &[u8]) -> Result<Self> {
        if let Some(&len) = lengths.iter().find(|&&len| len as usize > MAX_BITS) {
            return Err(Error::InvalidCodeLength(len));
        }

        let counts = count_lengths(lengths);
        let mut left: i32 = 1;
        for &count in &counts[1..] {
            left = (left << 1) - count as i32;
            if left < 0 {
                return Err(Error::HuffmanOversubscribed);
            }
        }

        Ok(Self::from_trusted_lengths(lengths))
    }

    /// Build from lengths known to form a valid code (the fixed tables)
    pub(crate) fn from_trusted_lengths(lengths: &[u8]) -> Self {
        let counts = count_lengths(lengths);
        let first_code = first_codes(&counts);
        let max_bits = (1..=MAX_BITS).rev().find(|&bits| counts[bits] > 0).unwrap_or(0) as u8;

        let mut first_index = [0u16; MAX_BITS + 1];
        let mut index = 0u16;
        for bits in 1..=MAX_BITS {
            first_index[bits] = index;
            index += counts[bits];
        }

        // Stable sort keeps increasing symbol order within a length
        let mut symbols: Vec<u16> =
            (0..lengths.len() as u16).filter(|&sym| lengths[sym as usize] > 0).collect();
        symbols.sort_by_key(|&sym| lengths[sym as usize]);

        Self { max_bits, counts, first_code, first_index, symbols }
    }

    /// Decode next symbol from bitstream
    pub fn decode(&self, bits: &mut BitReader<'_>) -> Result<u16> {
        let mut code = 0u32;
        for len in 1..=self.max_bits as usize {
            code = (code << 1) | bits.read_bits(1)?;

            let count = self.counts[len] as u32;
            let offset = code.wrapping_sub(self.first_code[len]);
            if offset < count {
                let idx = self.first_index[len] as usize + offset as usize;
                return Ok(self.symbols[idx]);
            }
        }

        Err(Error::InvalidCode(code as u16))
    }

    /// Check if this decoder is empty (no symbols)
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Longest code length in the table
    pub fn max_bits(&self) -> u8 {
        self.max_bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::BitWriter;
    use crate::huffman::canonical::build_codes_from_lengths;
    use crate::huffman::tables::{FIXED_DISTANCE_DECODER, FIXED_LITERAL_DECODER};

    #[test]
    fn test_fixed_literal_length() {
        let decoder = &*FIXED_LITERAL_DECODER;
        assert!(!decoder.is_empty());
        assert_eq!(decoder.max_bits(), 9);
    }

    #[test]
    fn test_fixed_distance() {
        let decoder = &*FIXED_DISTANCE_DECODER;
        assert!(!decoder.is_empty());
        assert_eq!(decoder.max_bits(), 5);
    }

    #[test]
    fn test_simple_decode() {
        // Simple 2-symbol table: symbol 0 = code 0 (1 bit), symbol 1 = code 1 (1 bit)
        let decoder = HuffmanDecoder::from_code_lengths(&[1, 1]).unwrap();

        let data = [0b00000000];
        let mut reader = BitReader::new(&data);
        assert_eq!(decoder.decode(&mut reader).unwrap(), 0);

        let data = [0b00000001];
        let mut reader = BitReader::new(&data);
        assert_eq!(decoder.decode(&mut reader).unwrap(), 1);
    }

    #[test]
    fn test_decode_every_fixed_literal() {
        let codes = build_codes_from_lengths(&crate::huffman::tables::fixed_literal_lengths());
        let mut writer = BitWriter::new();
        for &(code, len) in &codes {
            writer.write_bits_reversed(code, len);
        }
        let data = writer.finish();

        let mut reader = BitReader::new(&data);
        for sym in 0..codes.len() as u16 {
            assert_eq!(FIXED_LITERAL_DECODER.decode(&mut reader).unwrap(), sym);
        }
    }

    #[test]
    fn test_oversubscribed() {
        let result = HuffmanDecoder::from_code_lengths(&[1, 1, 1]);
        assert!(matches!(result, Err(Error::HuffmanOversubscribed)));
    }

    #[test]
    fn test_invalid_code_length() {
        let result = HuffmanDecoder::from_code_lengths(&[16, 1]);
        assert!(matches!(result, Err(Error::InvalidCodeLength(16))));
    }

    #[test]
    fn test_incomplete_code_rejects_unassigned_prefix() {
        // Single one-bit code: prefix "1" is unassigned
        let decoder = HuffmanDecoder::from_code_lengths(&[1]).unwrap();
        let data = [0b00000010];
        let mut reader = BitReader::new(&data);
        assert_eq!(decoder.decode(&mut reader).unwrap(), 0);
        assert!(matches!(decoder.decode(&mut reader), Err(Error::InvalidCode(_))));
    }

    #[test]
    fn test_empty_table() {
        let decoder = HuffmanDecoder::from_code_lengths(&[0, 0, 0]).unwrap();
        assert!(decoder.is_empty());
        let data = [0xFF];
        let mut reader = BitReader::new(&data);
        assert!(matches!(decoder.decode(&mut reader), Err(Error::InvalidCode(_))));
    }
}
