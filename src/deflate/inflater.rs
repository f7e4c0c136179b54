use super::tables::{
    decode_distance, decode_length, CODE_LENGTH_ORDER, DISTANCE_TABLE, END_OF_BLOCK,
    LENGTH_TABLE, NUM_DISTANCE_SYMBOLS, NUM_LITERAL_SYMBOLS,
};
use super::window::SlidingWindow;
use super::BlockType;
use crate::bits::BitReader;
use crate::error::{Error, Result};
use crate::huffman::tables::{FIXED_DISTANCE_DECODER, FIXED_LITERAL_DECODER};
use crate::huffman::HuffmanDecoder;

/// Block-at-a-time DEFLATE decoder
///
/// Each call to [`Inflator::inflate_block`] decodes one block and returns,
/// so a caller can interleave decoding with other work. The sliding window
/// and bit position persist between calls.
pub struct Inflator<'a> {
    bits: BitReader<'a>,
    window: SlidingWindow,
    /// Whether we've seen the final block
    finished: bool,
    blocks_decoded: u64,
}

impl<'a> Inflator<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            bits: BitReader::new(data),
            window: SlidingWindow::new(),
            finished: false,
            blocks_decoded: 0,
        }
    }

    /// Decode the next block, appending its bytes to `out`
    ///
    /// Returns the type of the block decoded, or `None` once the final block
    /// has already been consumed.
    pub fn inflate_block(&mut self, out: &mut Vec<u8>) -> Result<Option<BlockType>> {
        if self.finished {
            return Ok(None);
        }

        let is_final = self.bits.read_bit()?;
        let btype = self.bits.read_bits(2)? as u8;
        let block_type = BlockType::from_bits(btype).ok_or(Error::InvalidBlockType(btype))?;
        let start_len = out.len();

        match block_type {
            BlockType::Stored => self.inflate_stored(out)?,
            BlockType::FixedHuffman => {
                self.inflate_symbols(&FIXED_LITERAL_DECODER, &FIXED_DISTANCE_DECODER, out)?
            }
            BlockType::DynamicHuffman => {
                let (lit_decoder, dist_decoder) = self.read_dynamic_tables()?;
                self.inflate_symbols(&lit_decoder, &dist_decoder, out)?
            }
        }

        log::trace!(
            "inflated {:?} block #{} ({} bytes, final={})",
            block_type,
            self.blocks_decoded,
            out.len() - start_len,
            is_final
        );

        self.blocks_decoded += 1;
        if is_final {
            self.finished = true;
        }
        Ok(Some(block_type))
    }

    /// Decode blocks until the final block completes
    pub fn inflate_to_end(&mut self, out: &mut Vec<u8>) -> Result<()> {
        while self.inflate_block(out)?.is_some() {}
        Ok(())
    }

    /// Copy a stored (uncompressed) block
    fn inflate_stored(&mut self, out: &mut Vec<u8>) -> Result<()> {
        self.bits.align_to_byte();

        let len = self.bits.read_u16_le()?;
        let nlen = self.bits.read_u16_le()?;
        if len != !nlen {
            return Err(Error::LengthMismatch { len, nlen });
        }

        let start = out.len();
        out.resize(start + len as usize, 0);
        self.bits.read_bytes(&mut out[start..])?;
        self.window.push_bytes(&out[start..]);
        Ok(())
    }

    /// Read a dynamic block header and build its two decoders
    fn read_dynamic_tables(&mut self) -> Result<(HuffmanDecoder, HuffmanDecoder)> {
        let hlit = self.bits.read_bits(5)? as usize + 257;
        let hdist = self.bits.read_bits(5)? as usize + 1;
        let hclen = self.bits.read_bits(4)? as usize + 4;

        if hlit > NUM_LITERAL_SYMBOLS || hdist > NUM_DISTANCE_SYMBOLS {
            return Err(Error::InvalidCodeLengths);
        }

        let mut cl_lengths = [0u8; 19];
        for &sym in CODE_LENGTH_ORDER.iter().take(hclen) {
            cl_lengths[sym] = self.bits.read_bits(3)? as u8;
        }
        let cl_decoder = HuffmanDecoder::from_code_lengths(&cl_lengths)?;

        let total = hlit + hdist;
        let mut lengths = Vec::with_capacity(total);

        while lengths.len() < total {
            let sym = cl_decoder.decode(&mut self.bits)?;
            let (value, repeat) = match sym {
                0..=15 => (sym as u8, 1),
                16 => {
                    let prev = *lengths.last().ok_or(Error::InvalidCodeLengths)?;
                    (prev, self.bits.read_bits(2)? as usize + 3)
                }
                17 => (0, self.bits.read_bits(3)? as usize + 3),
                18 => (0, self.bits.read_bits(7)? as usize + 11),
                _ => return Err(Error::InvalidCode(sym)),
            };

            if lengths.len() + repeat > total {
                return Err(Error::InvalidCodeLengths);
            }
            lengths.resize(lengths.len() + repeat, value);
        }

        let (lit_lengths, dist_lengths) = lengths.split_at(hlit);
        if lit_lengths[END_OF_BLOCK as usize] == 0 {
            return Err(Error::InvalidCodeLengths);
        }

        // An all-zero distance table is legal for literal-only blocks; any
        // attempt to use it fails with InvalidCode
        let lit_decoder = HuffmanDecoder::from_code_lengths(lit_lengths)?;
        let dist_decoder = HuffmanDecoder::from_code_lengths(dist_lengths)?;
        Ok((lit_decoder, dist_decoder))
    }

    /// Decode literal/length symbols until end-of-block
    fn inflate_symbols(
        &mut self,
        lit_decoder: &HuffmanDecoder,
        dist_decoder: &HuffmanDecoder,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        loop {
            let sym = lit_decoder.decode(&mut self.bits)?;

            match sym {
                0..=255 => {
                    let byte = sym as u8;
                    self.window.push_byte(byte);
                    out.push(byte);
                }
                END_OF_BLOCK => return Ok(()),
                257..=285 => {
                    let (_, extra_bits) = LENGTH_TABLE[(sym - 257) as usize];
                    let extra = self.bits.read_bits(extra_bits)?;
                    let length = decode_length(sym, extra).ok_or(Error::InvalidCode(sym))?;

                    let dist_sym = dist_decoder.decode(&mut self.bits)?;
                    let (_, dist_extra_bits) =
                        *DISTANCE_TABLE.get(dist_sym as usize).ok_or(Error::InvalidCode(dist_sym))?;
                    let dist_extra = self.bits.read_bits(dist_extra_bits)?;
                    let distance =
                        decode_distance(dist_sym, dist_extra).ok_or(Error::InvalidCode(dist_sym))?;

                    self.window.copy_match(distance, length, out)?;
                }
                _ => return Err(Error::InvalidCode(sym)),
            }
        }
    }

    /// Check if we've finished decoding
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of blocks decoded so far
    pub fn blocks_decoded(&self) -> u64 {
        self.blocks_decoded
    }

    /// Bytes of compressed input consumed so far
    ///
    /// Once [`is_finished`](Self::is_finished) is true this is the exact
    /// length of the DEFLATE stream, padding bits included.
    pub fn bytes_consumed(&self) -> usize {
        self.bits.bytes_consumed()
    }

    /// Total bytes of output produced so far
    pub fn total_out(&self) -> u64 {
        self.window.total_written()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inflate_all(data: &[u8]) -> Result<Vec<u8>> {
        let mut inflator = Inflator::new(data);
        let mut out = Vec::new();
        inflator.inflate_to_end(&mut out)?;
        Ok(out)
    }

    #[test]
    fn test_stored_block() {
        // Stored block: BFINAL=1, BTYPE=00, LEN=5, NLEN=!5, "Hello"
        let data = [
            0b00000001, // BFINAL=1, BTYPE=00 (stored) - packed LSB first
            0x05, 0x00, // LEN = 5
            0xFA, 0xFF, // NLEN = !5 = 0xFFFA
            b'H', b'e', b'l', b'l', b'o',
        ];

        let mut inflator = Inflator::new(&data);
        let mut out = Vec::new();
        assert_eq!(inflator.inflate_block(&mut out).unwrap(), Some(BlockType::Stored));
        assert_eq!(out, b"Hello");
        assert!(inflator.is_finished());
        assert_eq!(inflator.bytes_consumed(), data.len());
        assert_eq!(inflator.inflate_block(&mut out).unwrap(), None);
    }

    #[test]
    fn test_stored_length_mismatch() {
        let data = [0x01, 0x05, 0x00, 0xFB, 0xFF, b'H', b'e', b'l', b'l', b'o'];
        assert!(matches!(
            inflate_all(&data),
            Err(Error::LengthMismatch { len: 5, nlen: 0xFFFB })
        ));
    }

    #[test]
    fn test_empty_fixed_block() {
        assert_eq!(inflate_all(&[0x03, 0x00]).unwrap(), b"");
    }

    #[test]
    fn test_fixed_block_from_zlib() {
        // zlib level 6 output for b"Hello, World!"
        let data = [
            0xf3, 0x48, 0xcd, 0xc9, 0xc9, 0xd7, 0x51, 0x08, 0xcf, 0x2f, 0xca, 0x49, 0x51, 0x04,
            0x00,
        ];
        assert_eq!(inflate_all(&data).unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_fixed_block_with_overlapping_match() {
        // zlib level 6 output for b"A" * 10
        let data = [0x73, 0x74, 0x84, 0x01, 0x00];
        assert_eq!(inflate_all(&data).unwrap(), vec![b'A'; 10]);
    }

    #[test]
    fn test_reserved_block_type() {
        // BFINAL=1, BTYPE=11
        assert!(matches!(inflate_all(&[0x07]), Err(Error::InvalidBlockType(3))));
    }

    #[test]
    fn test_truncated_stream() {
        // Fixed block with no end-of-block code
        assert!(matches!(inflate_all(&[0xf3, 0x48]), Err(Error::UnexpectedEof)));
        assert!(matches!(inflate_all(&[]), Err(Error::UnexpectedEof)));
    }

    #[test]
    fn test_distance_before_start() {
        // Fixed block: literal 'a', then match length 3 distance 2, then EOB.
        // Only one byte has been produced, so distance 2 is out of range.
        use crate::bits::BitWriter;
        use crate::huffman::tables::{FIXED_DISTANCE_CODES, FIXED_LITERAL_CODES};

        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bits(1, 2);
        let (code, len) = FIXED_LITERAL_CODES[b'a' as usize];
        writer.write_bits_reversed(code, len);
        let (code, len) = FIXED_LITERAL_CODES[257];
        writer.write_bits_reversed(code, len);
        let (code, len) = FIXED_DISTANCE_CODES[1];
        writer.write_bits_reversed(code, len);
        let (code, len) = FIXED_LITERAL_CODES[256];
        writer.write_bits_reversed(code, len);
        let data = writer.finish();

        assert!(matches!(
            inflate_all(&data),
            Err(Error::InvalidDistance { distance: 2, available: 1 })
        ));
    }

    #[test]
    fn test_fixed_invalid_distance_symbol() {
        // Fixed distance symbols 30 and 31 never appear in valid data
        use crate::bits::BitWriter;
        use crate::huffman::tables::{FIXED_DISTANCE_CODES, FIXED_LITERAL_CODES};

        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bits(1, 2);
        let (code, len) = FIXED_LITERAL_CODES[b'a' as usize];
        writer.write_bits_reversed(code, len);
        let (code, len) = FIXED_LITERAL_CODES[257];
        writer.write_bits_reversed(code, len);
        let (code, len) = FIXED_DISTANCE_CODES[30];
        writer.write_bits_reversed(code, len);
        let data = writer.finish();

        assert!(matches!(inflate_all(&data), Err(Error::InvalidCode(30))));
    }

    #[test]
    fn test_multiple_blocks() {
        // Non-final stored "ab" followed by a final stored "c"
        let data = [
            0x00, 0x02, 0x00, 0xFD, 0xFF, b'a', b'b', //
            0x01, 0x01, 0x00, 0xFE, 0xFF, b'c',
        ];
        let mut inflator = Inflator::new(&data);
        let mut out = Vec::new();
        inflator.inflate_to_end(&mut out).unwrap();
        assert_eq!(out, b"abc");
        assert_eq!(inflator.blocks_decoded(), 2);
        assert_eq!(inflator.total_out(), 3);
    }

    #[test]
    fn test_dynamic_header_repeat_without_previous() {
        use crate::bits::BitWriter;

        // Dynamic block whose code length alphabet only holds symbols 16 and
        // 17 (both 1 bit); the first code length symbol is 16
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bits(2, 2);
        writer.write_bits(0, 5); // HLIT = 257
        writer.write_bits(0, 5); // HDIST = 1
        writer.write_bits(0, 4); // HCLEN = 4
        writer.write_bits(1, 3); // length of symbol 16
        writer.write_bits(1, 3); // length of symbol 17
        writer.write_bits(0, 3); // symbol 18
        writer.write_bits(0, 3); // symbol 0
        writer.write_bits_reversed(0, 1); // symbol 16
        writer.write_bits(0, 2);
        let data = writer.finish();

        assert!(matches!(inflate_all(&data), Err(Error::InvalidCodeLengths)));
    }
}
