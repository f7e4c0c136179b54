use super::lz77::MatchFinder;
use super::tokens::Token;
use super::BlockType;
use crate::bits::BitWriter;
use crate::huffman::encoder::{write_dynamic_block, write_fixed_block};
use crate::huffman::{DynamicCodes, FrequencyCounter};
use crate::DeflateConfig;

/// Largest payload a single stored block can carry
const MAX_STORED_LEN: usize = 65535;

/// Statistics accumulated across [`Deflator::deflate`] calls
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeflateStats {
    pub input_bytes: u64,
    pub output_bytes: u64,
    /// Physical blocks, counting each piece of a split stored block
    pub blocks_written: u64,
    pub stored_blocks: u64,
    pub fixed_blocks: u64,
    pub dynamic_blocks: u64,
}

impl DeflateStats {
    fn record(&mut self, block_type: BlockType, count: u64) {
        self.blocks_written += count;
        match block_type {
            BlockType::Stored => self.stored_blocks += count,
            BlockType::FixedHuffman => self.fixed_blocks += count,
            BlockType::DynamicHuffman => self.dynamic_blocks += count,
        }
    }
}

/// DEFLATE encoder
///
/// Runs the match finder over the input, cuts the token stream into blocks
/// of at most `max_block_tokens` tokens and writes each block with whichever
/// encoding the compression level allows that comes out smallest.
pub struct Deflator {
    config: DeflateConfig,
    stats: DeflateStats,
}

impl Deflator {
    pub fn new(config: DeflateConfig) -> Self {
        Self { config, stats: DeflateStats::default() }
    }

    /// Compress `data` into a complete raw DEFLATE stream
    pub fn deflate(&mut self, data: &[u8]) -> Vec<u8> {
        let level = self.config.compression_level;
        let mut writer = BitWriter::with_capacity(data.len() / 2 + 64);

        if data.is_empty() {
            // A lone end-of-block code: 03 00
            write_fixed_block(&mut writer, &[], true);
            self.stats.record(BlockType::FixedHuffman, 1);
        } else {
            let max_tokens = self.config.max_block_tokens.max(1);
            let mut finder =
                MatchFinder::new(data, level.max_chain(), level.use_lazy_matching()).peekable();
            let mut tokens = Vec::with_capacity(max_tokens.min(data.len()));
            let mut block_start = 0;

            loop {
                tokens.clear();
                tokens.extend(finder.by_ref().take(max_tokens));
                let is_final = finder.peek().is_none();

                let block_len: usize = tokens.iter().map(Token::uncompressed_size).sum();
                let bytes = &data[block_start..block_start + block_len];
                self.write_block(&mut writer, &tokens, bytes, is_final);
                block_start += block_len;

                if is_final {
                    break;
                }
            }
        }

        let output = writer.finish();
        self.stats.input_bytes += data.len() as u64;
        self.stats.output_bytes += output.len() as u64;

        log::debug!(
            "deflated {} bytes into {} (level {}, {} stored, {} fixed, {} dynamic blocks so far)",
            data.len(),
            output.len(),
            level.level(),
            self.stats.stored_blocks,
            self.stats.fixed_blocks,
            self.stats.dynamic_blocks
        );

        output
    }

    /// Get accumulated statistics
    pub fn stats(&self) -> &DeflateStats {
        &self.stats
    }

    /// Encode one block of tokens covering `bytes` as the cheapest allowed type
    fn write_block(
        &mut self,
        writer: &mut BitWriter,
        tokens: &[Token],
        bytes: &[u8],
        is_final: bool,
    ) {
        let level = self.config.compression_level;
        let stored_bits = stored_block_bits(bytes.len(), writer.bit_len());

        if level.use_stored_only() {
            log::trace!("block of {} bytes: stored only", bytes.len());
            let pieces = write_stored_blocks(writer, bytes, is_final);
            self.stats.record(BlockType::Stored, pieces);
            return;
        }

        let mut freq = FrequencyCounter::new();
        freq.count_tokens(tokens);
        let fixed_bits = freq.fixed_block_bits();

        let dynamic = if level.use_fixed_huffman() {
            None
        } else {
            let codes = DynamicCodes::from_frequencies(&freq);
            let bits = codes.block_bits(&freq);
            Some((codes, bits))
        };
        let dynamic_bits = dynamic.as_ref().map_or(u64::MAX, |(_, bits)| *bits);

        log::debug!(
            "block of {} tokens / {} bytes: stored={} fixed={} dynamic={} bits",
            tokens.len(),
            bytes.len(),
            stored_bits,
            fixed_bits,
            dynamic.as_ref().map_or_else(|| "n/a".to_string(), |(_, bits)| bits.to_string())
        );

        match dynamic {
            Some((codes, bits)) if bits < fixed_bits && bits < stored_bits => {
                write_dynamic_block(writer, &codes, tokens, is_final);
                self.stats.record(BlockType::DynamicHuffman, 1);
            }
            _ if stored_bits < fixed_bits.min(dynamic_bits) => {
                let pieces = write_stored_blocks(writer, bytes, is_final);
                self.stats.record(BlockType::Stored, pieces);
            }
            _ => {
                write_fixed_block(writer, tokens, is_final);
                self.stats.record(BlockType::FixedHuffman, 1);
            }
        }
    }
}

impl Default for Deflator {
    fn default() -> Self {
        Self::new(DeflateConfig::default())
    }
}

/// Size in bits of `len` bytes written as stored blocks starting at bit
/// offset `bit_pos`
fn stored_block_bits(len: usize, bit_pos: u64) -> u64 {
    let pieces = stored_pieces(len);
    // Header, then padding to the byte boundary; later pieces start aligned
    let first_pad = (8 - (bit_pos + 3) % 8) % 8;
    let later_pad = 5 * (pieces - 1);
    pieces * (3 + 32) + first_pad + later_pad + len as u64 * 8
}

/// Number of stored blocks needed for `len` bytes (at least one)
fn stored_pieces(len: usize) -> u64 {
    (len.max(1) as u64 + MAX_STORED_LEN as u64 - 1) / MAX_STORED_LEN as u64
}

/// Write `bytes` as one or more stored blocks; only the last piece of a
/// final block carries BFINAL. Returns the number of blocks written.
fn write_stored_blocks(writer: &mut BitWriter, bytes: &[u8], is_final: bool) -> u64 {
    let pieces = stored_pieces(bytes.len());
    let mut chunks = bytes.chunks(MAX_STORED_LEN);

    for i in 0..pieces {
        let chunk = chunks.next().unwrap_or(&[]);
        let len = chunk.len() as u16;

        writer.write_bit(is_final && i + 1 == pieces); // BFINAL
        writer.write_bits(0, 2); // BTYPE = 00
        writer.align_to_byte();
        writer.write_u16_le(len);
        writer.write_u16_le(!len);
        writer.write_bytes(chunk);
    }
    pieces
}
