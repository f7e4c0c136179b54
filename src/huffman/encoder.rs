use super::canonical::build_codes_from_lengths;
use super::tables::{FIXED_DISTANCE_CODES, FIXED_LITERAL_CODES};
use crate::bits::BitWriter;
use crate::deflate::tables::{
    encode_distance, encode_length, CODE_LENGTH_ORDER, END_OF_BLOCK, NUM_DISTANCE_SYMBOLS,
    NUM_LITERAL_SYMBOLS,
};
use crate::deflate::tokens::Token;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Maximum code length for literal/length and distance alphabets (RFC 1951)
const MAX_CODE_LENGTH: u8 = 15;

/// Maximum code length for the code length alphabet
const MAX_CL_CODE_LENGTH: u8 = 7;

/// Size of the code length (meta) alphabet
const NUM_CL_SYMBOLS: usize = 19;

/// Block header bits: BFINAL + BTYPE
const BLOCK_HEADER_BITS: u64 = 3;

/// Frequency counter for dynamic Huffman code generation
#[derive(Clone, Debug)]
pub struct FrequencyCounter {
    /// Frequencies for literal (0-255), EOB (256), and length codes (257-285)
    pub literal_freq: [u32; NUM_LITERAL_SYMBOLS],
    /// Frequencies for distance codes (0-29)
    pub distance_freq: [u32; NUM_DISTANCE_SYMBOLS],
    /// Extra bits carried by all length and distance codes
    pub extra_bits: u64,
}

impl FrequencyCounter {
    pub fn new() -> Self {
        Self {
            literal_freq: [0; NUM_LITERAL_SYMBOLS],
            distance_freq: [0; NUM_DISTANCE_SYMBOLS],
            extra_bits: 0,
        }
    }

    /// Count frequencies from tokens
    pub fn count_tokens(&mut self, tokens: &[Token]) {
        for token in tokens {
            match *token {
                Token::Literal(byte) => {
                    self.literal_freq[byte as usize] += 1;
                }
                Token::Match { length, distance } => {
                    if let Some((len_code, _, extra)) = encode_length(length) {
                        self.literal_freq[len_code as usize] += 1;
                        self.extra_bits += extra as u64;
                    }
                    if let Some((dist_code, _, extra)) = encode_distance(distance) {
                        self.distance_freq[dist_code as usize] += 1;
                        self.extra_bits += extra as u64;
                    }
                }
            }
        }
        // Every block ends with exactly one EOB
        self.literal_freq[END_OF_BLOCK as usize] = 1;
    }

    /// Get the number of literal/length codes needed (HLIT + 257)
    pub fn num_literal_codes(&self) -> usize {
        let last = (257..NUM_LITERAL_SYMBOLS)
            .rev()
            .find(|&i| self.literal_freq[i] > 0)
            .unwrap_or(END_OF_BLOCK as usize);
        last + 1
    }

    /// Get the number of distance codes needed (HDIST + 1)
    pub fn num_distance_codes(&self) -> usize {
        let last =
            (0..NUM_DISTANCE_SYMBOLS).rev().find(|&i| self.distance_freq[i] > 0).unwrap_or(0);
        last + 1
    }

    /// Bits needed to code the counted symbols with the given tables,
    /// excluding any block header
    pub fn body_bits(&self, lit_codes: &[(u32, u8)], dist_codes: &[(u32, u8)]) -> u64 {
        let lit: u64 = self
            .literal_freq
            .iter()
            .zip(lit_codes)
            .map(|(&freq, &(_, len))| freq as u64 * len as u64)
            .sum();
        let dist: u64 = self
            .distance_freq
            .iter()
            .zip(dist_codes)
            .map(|(&freq, &(_, len))| freq as u64 * len as u64)
            .sum();
        lit + dist + self.extra_bits
    }

    /// Total size in bits of a fixed Huffman block for the counted tokens
    pub fn fixed_block_bits(&self) -> u64 {
        BLOCK_HEADER_BITS + self.body_bits(&FIXED_LITERAL_CODES, &FIXED_DISTANCE_CODES)
    }
}

impl Default for FrequencyCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute Huffman code lengths for given frequencies with a maximum length limit.
///
/// Returns a vector of code lengths (0 for unused symbols). Whenever at least
/// one symbol is used the result is a complete prefix code: a lone symbol is
/// paired with a neighbour so that both get a one-bit code.
pub fn compute_code_lengths(frequencies: &[u32], max_bits: u8) -> Vec<u8> {
    let n = frequencies.len();

    let symbols: Vec<(usize, u32)> =
        frequencies.iter().enumerate().filter(|(_, &f)| f > 0).map(|(i, &f)| (i, f)).collect();

    match symbols.len() {
        0 => vec![0; n],
        1 => {
            let mut lengths = vec![0u8; n];
            let sym = symbols[0].0;
            lengths[sym] = 1;
            let partner = if sym == 0 { 1 } else { 0 };
            if partner < n {
                lengths[partner] = 1;
            }
            lengths
        }
        _ => {
            let mut lengths = huffman_depths(&symbols, n);
            limit_code_lengths(&mut lengths, &symbols, max_bits);
            lengths
        }
    }
}

/// Build an unrestricted Huffman tree and return each leaf's depth
///
/// The tree lives in an arena: leaves occupy the first `symbols.len()`
/// slots, internal nodes are appended as they are merged, and each node
/// records its parent's index.
fn huffman_depths(symbols: &[(usize, u32)], n: usize) -> Vec<u8> {
    let leaves = symbols.len();
    let mut parent = vec![usize::MAX; 2 * leaves - 1];

    // Ties break on node index so the result is deterministic
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> =
        symbols.iter().enumerate().map(|(node, &(_, freq))| Reverse((freq as u64, node))).collect();

    let mut next_node = leaves;
    while let (Some(Reverse((freq_a, a))), Some(Reverse((freq_b, b)))) = (heap.pop(), heap.pop())
    {
        parent[a] = next_node;
        parent[b] = next_node;
        heap.push(Reverse((freq_a + freq_b, next_node)));
        next_node += 1;
    }

    // Parents are always created after their children, so walking the arena
    // backwards visits every parent before its children
    let mut depth = vec![0u32; next_node];
    for node in (0..next_node.saturating_sub(1)).rev() {
        depth[node] = depth[parent[node]] + 1;
    }

    let mut lengths = vec![0u8; n];
    for (node, &(sym, _)) in symbols.iter().enumerate() {
        lengths[sym] = depth[node].min(u8::MAX as u32) as u8;
    }
    lengths
}

/// Limit code lengths to `max_bits` while keeping the code complete
///
/// Lengths are first clamped, then the per-length counts are rebalanced
/// until the Kraft sum is exactly one, and finally the lengths are handed
/// back out with the shortest codes going to the most frequent symbols.
fn limit_code_lengths(lengths: &mut [u8], symbols: &[(usize, u32)], max_bits: u8) {
    let max_len = symbols.iter().map(|&(sym, _)| lengths[sym]).max().unwrap_or(0);
    if max_len <= max_bits {
        return;
    }

    let max = max_bits as usize;
    let mut bl_count = vec![0u32; max + 1];
    for &(sym, _) in symbols {
        bl_count[(lengths[sym] as usize).min(max)] += 1;
    }

    // Kraft sum in units of 2^-max_bits
    let capacity = 1u64 << max;
    let mut kraft: u64 = (1..=max).map(|bits| (bl_count[bits] as u64) << (max - bits)).sum();

    // Over-subscribed: push the deepest short code one level down
    while kraft > capacity {
        let Some(bits) = (1..max).rev().find(|&b| bl_count[b] > 0) else {
            break;
        };
        bl_count[bits] -= 1;
        bl_count[bits + 1] += 1;
        kraft -= 1 << (max - bits - 1);
    }

    // Under-subscribed: pull the deepest code that still fits one level up
    while kraft < capacity {
        let room = capacity - kraft;
        let Some(bits) = (2..=max).rev().find(|&b| bl_count[b] > 0 && (1u64 << (max - b)) <= room)
        else {
            break;
        };
        bl_count[bits] -= 1;
        bl_count[bits - 1] += 1;
        kraft += 1 << (max - bits);
    }

    let mut sorted_syms: Vec<(usize, u32)> = symbols.to_vec();
    sorted_syms.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut sorted = sorted_syms.iter();
    for (bits, &count) in bl_count.iter().enumerate().skip(1) {
        for _ in 0..count {
            if let Some(&(sym, _)) = sorted.next() {
                lengths[sym] = bits as u8;
            }
        }
    }
}

/// RLE encode code lengths using symbols 16, 17, 18
///
/// Returns `(symbol, extra_value)` pairs.
pub fn rle_encode_lengths(lengths: &[u8]) -> Vec<(u8, u8)> {
    let mut result = Vec::new();
    let mut i = 0;

    while i < lengths.len() {
        let len = lengths[i];
        let run = lengths[i..].iter().take_while(|&&l| l == len).count();
        let mut remaining = run;

        if len == 0 {
            while remaining > 0 {
                if remaining >= 11 {
                    let count = remaining.min(138);
                    result.push((18, (count - 11) as u8));
                    remaining -= count;
                } else if remaining >= 3 {
                    let count = remaining.min(10);
                    result.push((17, (count - 3) as u8));
                    remaining -= count;
                } else {
                    result.push((0, 0));
                    remaining -= 1;
                }
            }
        } else {
            result.push((len, 0));
            remaining -= 1;

            while remaining > 0 {
                if remaining >= 3 {
                    let count = remaining.min(6);
                    result.push((16, (count - 3) as u8));
                    remaining -= count;
                } else {
                    result.push((len, 0));
                    remaining -= 1;
                }
            }
        }

        i += run;
    }

    result
}

/// Extra bits following a code length symbol
fn rle_extra_bits(sym: u8) -> u8 {
    match sym {
        16 => 2, // 3-6 repeats
        17 => 3, // 3-10 zeros
        18 => 7, // 11-138 zeros
        _ => 0,
    }
}

/// Per-block dynamic Huffman tables plus the encoded block header
#[derive(Clone, Debug)]
pub struct DynamicCodes {
    pub lit_lengths: Vec<u8>,
    pub dist_lengths: Vec<u8>,
    pub lit_codes: Vec<(u32, u8)>,
    pub dist_codes: Vec<(u32, u8)>,
    cl_codes: Vec<(u32, u8)>,
    cl_lengths: Vec<u8>,
    rle: Vec<(u8, u8)>,
    hclen: usize,
}

impl DynamicCodes {
    /// Derive code lengths, codes and the header encoding from frequencies
    pub fn from_frequencies(freq: &FrequencyCounter) -> Self {
        let num_lit = freq.num_literal_codes();
        // Two slots leave room to pair a lone distance code
        let num_dist = freq.num_distance_codes().max(2);

        let lit_lengths = compute_code_lengths(&freq.literal_freq[..num_lit], MAX_CODE_LENGTH);
        let mut dist_lengths =
            compute_code_lengths(&freq.distance_freq[..num_dist], MAX_CODE_LENGTH);

        // A literal-only block still sends a complete distance code
        if dist_lengths.iter().all(|&l| l == 0) {
            dist_lengths[0] = 1;
            dist_lengths[1] = 1;
        }

        let combined: Vec<u8> = lit_lengths.iter().chain(dist_lengths.iter()).copied().collect();
        let rle = rle_encode_lengths(&combined);

        let mut cl_freq = [0u32; NUM_CL_SYMBOLS];
        for &(sym, _) in &rle {
            cl_freq[sym as usize] += 1;
        }
        let cl_lengths = compute_code_lengths(&cl_freq, MAX_CL_CODE_LENGTH);
        let cl_codes = build_codes_from_lengths(&cl_lengths);

        // Trailing zero lengths in transmission order are dropped (min 4)
        let hclen = (0..NUM_CL_SYMBOLS)
            .rev()
            .find(|&i| cl_lengths[CODE_LENGTH_ORDER[i]] > 0)
            .map_or(4, |i| (i + 1).max(4));

        Self {
            lit_codes: build_codes_from_lengths(&lit_lengths),
            dist_codes: build_codes_from_lengths(&dist_lengths),
            lit_lengths,
            dist_lengths,
            cl_codes,
            cl_lengths,
            rle,
            hclen,
        }
    }

    /// Size in bits of the dynamic header (HLIT through the RLE lengths)
    pub fn header_bits(&self) -> u64 {
        let rle_bits: u64 = self
            .rle
            .iter()
            .map(|&(sym, _)| self.cl_codes[sym as usize].1 as u64 + rle_extra_bits(sym) as u64)
            .sum();
        5 + 5 + 4 + 3 * self.hclen as u64 + rle_bits
    }

    /// Total size in bits of a dynamic block for the counted tokens
    pub fn block_bits(&self, freq: &FrequencyCounter) -> u64 {
        BLOCK_HEADER_BITS + self.header_bits() + freq.body_bits(&self.lit_codes, &self.dist_codes)
    }

    /// Write the dynamic Huffman block header (RFC 1951 section 3.2.7)
    pub fn write_header(&self, writer: &mut BitWriter) {
        writer.write_bits((self.lit_lengths.len() - 257) as u32, 5);
        writer.write_bits((self.dist_lengths.len() - 1) as u32, 5);
        writer.write_bits((self.hclen - 4) as u32, 4);

        for &sym in CODE_LENGTH_ORDER.iter().take(self.hclen) {
            writer.write_bits(self.cl_lengths[sym] as u32, 3);
        }

        for &(sym, extra) in &self.rle {
            let (code, len) = self.cl_codes[sym as usize];
            writer.write_bits_reversed(code, len);
            writer.write_bits(extra as u32, rle_extra_bits(sym));
        }
    }
}

/// Write a complete fixed Huffman block (header, tokens, end-of-block)
pub fn write_fixed_block(writer: &mut BitWriter, tokens: &[Token], is_final: bool) {
    writer.write_bit(is_final); // BFINAL
    writer.write_bits(1, 2); // BTYPE = 01
    write_tokens(writer, tokens, &FIXED_LITERAL_CODES, &FIXED_DISTANCE_CODES);
}

/// Write a complete dynamic Huffman block (header, tokens, end-of-block)
pub fn write_dynamic_block(
    writer: &mut BitWriter,
    codes: &DynamicCodes,
    tokens: &[Token],
    is_final: bool,
) {
    writer.write_bit(is_final); // BFINAL
    writer.write_bits(2, 2); // BTYPE = 10
    codes.write_header(writer);
    write_tokens(writer, tokens, &codes.lit_codes, &codes.dist_codes);
}

/// Encode tokens using provided Huffman codes, followed by end-of-block
fn write_tokens(
    writer: &mut BitWriter,
    tokens: &[Token],
    lit_codes: &[(u32, u8)],
    dist_codes: &[(u32, u8)],
) {
    for token in tokens {
        match *token {
            Token::Literal(byte) => {
                let (code, len) = lit_codes[byte as usize];
                writer.write_bits_reversed(code, len);
            }
            Token::Match { length, distance } => {
                debug_assert!(token.is_valid_at(usize::MAX), "match out of range: {:?}", token);

                if let Some((len_code, extra_val, extra_bits)) = encode_length(length) {
                    let (code, code_len) = lit_codes[len_code as usize];
                    writer.write_bits_reversed(code, code_len);
                    writer.write_bits(extra_val as u32, extra_bits);
                }

                if let Some((dist_code, extra_val, extra_bits)) = encode_distance(distance) {
                    let (code, code_len) = dist_codes[dist_code as usize];
                    writer.write_bits_reversed(code, code_len);
                    writer.write_bits(extra_val as u32, extra_bits);
                }
            }
        }
    }

    let (code, len) = lit_codes[END_OF_BLOCK as usize];
    writer.write_bits_reversed(code, len);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Kraft sum scaled by 2^15; a complete code sums to exactly 2^15
    fn kraft_sum(lengths: &[u8]) -> u64 {
        lengths.iter().filter(|&&l| l > 0).map(|&l| 1u64 << (15 - l)).sum()
    }

    #[test]
    fn test_frequency_counter() {
        let mut freq = FrequencyCounter::new();
        let tokens = vec![
            Token::Literal(b'a'),
            Token::Literal(b'a'),
            Token::Literal(b'b'),
            Token::Match { length: 3, distance: 1 },
            Token::Match { length: 12, distance: 6 },
        ];
        freq.count_tokens(&tokens);

        assert_eq!(freq.literal_freq[b'a' as usize], 2);
        assert_eq!(freq.literal_freq[b'b' as usize], 1);
        assert_eq!(freq.literal_freq[256], 1);
        // Length 3 -> code 257, length 12 -> code 265 (+1 extra bit)
        assert_eq!(freq.literal_freq[257], 1);
        assert_eq!(freq.literal_freq[265], 1);
        // Distance 1 -> code 0, distance 6 -> code 4 (+1 extra bit)
        assert_eq!(freq.distance_freq[0], 1);
        assert_eq!(freq.distance_freq[4], 1);
        assert_eq!(freq.extra_bits, 2);
        assert_eq!(freq.num_literal_codes(), 266);
        assert_eq!(freq.num_distance_codes(), 5);
    }

    #[test]
    fn test_compute_code_lengths() {
        let freqs = [1u32, 1, 1, 1];
        let lengths = compute_code_lengths(&freqs, 15);
        assert_eq!(lengths, vec![2, 2, 2, 2]);
    }

    #[test]
    fn test_compute_code_lengths_skewed() {
        let freqs = [100u32, 1, 1, 1];
        let lengths = compute_code_lengths(&freqs, 15);
        assert_eq!(lengths[0], 1);
        assert!(lengths[1..].iter().all(|&l| l >= 2));
        assert_eq!(kraft_sum(&lengths), 1 << 15);
    }

    #[test]
    fn test_compute_code_lengths_single_symbol() {
        let lengths = compute_code_lengths(&[0, 0, 7, 0], 15);
        assert_eq!(lengths, vec![1, 0, 1, 0]);

        let lengths = compute_code_lengths(&[9, 0], 15);
        assert_eq!(lengths, vec![1, 1]);
    }

    #[test]
    fn test_compute_code_lengths_respects_limit() {
        // Fibonacci frequencies produce a maximally skewed tree
        let mut freqs = vec![1u32, 1];
        while freqs.len() < 30 {
            let next = freqs[freqs.len() - 1] + freqs[freqs.len() - 2];
            freqs.push(next);
        }

        let unlimited = huffman_depths(
            &freqs.iter().copied().enumerate().collect::<Vec<_>>(),
            freqs.len(),
        );
        assert!(unlimited.iter().any(|&l| l > 15));

        let lengths = compute_code_lengths(&freqs, 15);
        assert!(lengths.iter().all(|&l| (1..=15).contains(&l)));
        assert_eq!(kraft_sum(&lengths), 1 << 15);

        let cl_lengths = compute_code_lengths(&freqs[..19], 7);
        assert!(cl_lengths.iter().all(|&l| (1..=7).contains(&l)));
        let kraft7: u64 = cl_lengths.iter().map(|&l| 1u64 << (7 - l)).sum();
        assert_eq!(kraft7, 1 << 7);
    }

    #[test]
    fn test_rle_encode_zeros() {
        let encoded = rle_encode_lengths(&[0u8; 20]);
        assert_eq!(encoded, vec![(18, 9)]); // 20 - 11 = 9

        let encoded = rle_encode_lengths(&[0u8; 140]);
        assert_eq!(encoded, vec![(18, 127), (0, 0), (0, 0)]);

        let encoded = rle_encode_lengths(&[0u8; 7]);
        assert_eq!(encoded, vec![(17, 4)]);
    }

    #[test]
    fn test_rle_encode_repeat() {
        // 5, then repeat 6, then repeat 3
        let encoded = rle_encode_lengths(&[5u8; 10]);
        assert_eq!(encoded, vec![(5, 0), (16, 3), (16, 0)]);

        let encoded = rle_encode_lengths(&[4, 4, 4, 7]);
        assert_eq!(encoded, vec![(4, 0), (4, 0), (4, 0), (7, 0)]);
    }

    #[test]
    fn test_dynamic_codes_complete() {
        let mut freq = FrequencyCounter::new();
        let tokens: Vec<Token> = b"hello hello hello world"
            .iter()
            .map(|&b| Token::Literal(b))
            .chain([Token::Match { length: 10, distance: 6 }])
            .collect();
        freq.count_tokens(&tokens);

        let codes = DynamicCodes::from_frequencies(&freq);
        assert_eq!(kraft_sum(&codes.lit_lengths), 1 << 15);
        assert_eq!(kraft_sum(&codes.dist_lengths), 1 << 15);
        assert!(codes.lit_lengths[256] > 0);
        assert!(codes.hclen >= 4 && codes.hclen <= 19);
    }

    #[test]
    fn test_dynamic_codes_literal_only() {
        let mut freq = FrequencyCounter::new();
        freq.count_tokens(&[Token::Literal(b'x')]);

        let codes = DynamicCodes::from_frequencies(&freq);
        assert_eq!(codes.dist_lengths, vec![1, 1]);
        assert_eq!(codes.lit_lengths.len(), 257);
        assert_eq!(kraft_sum(&codes.lit_lengths), 1 << 15);
    }

    #[test]
    fn test_block_bits_match_written_size() {
        let tokens = vec![
            Token::Literal(b'a'),
            Token::Literal(b'b'),
            Token::Match { length: 20, distance: 2 },
            Token::Literal(b'c'),
        ];
        let mut freq = FrequencyCounter::new();
        freq.count_tokens(&tokens);

        let mut writer = BitWriter::new();
        write_fixed_block(&mut writer, &tokens, true);
        assert_eq!(writer.bit_len(), freq.fixed_block_bits());

        let codes = DynamicCodes::from_frequencies(&freq);
        let mut writer = BitWriter::new();
        write_dynamic_block(&mut writer, &codes, &tokens, true);
        assert_eq!(writer.bit_len(), codes.block_bits(&freq));
    }

    #[test]
    fn test_fixed_block_header() {
        let mut writer = BitWriter::new();
        write_fixed_block(&mut writer, &[], true);
        // BFINAL=1, BTYPE=01, EOB = 7 zero bits
        assert_eq!(writer.finish(), vec![0x03, 0x00]);
    }

    #[test]
    fn test_dynamic_block_header() {
        let tokens = [Token::Literal(b'H'), Token::Literal(b'i')];
        let mut freq = FrequencyCounter::new();
        freq.count_tokens(&tokens);
        let codes = DynamicCodes::from_frequencies(&freq);

        let mut writer = BitWriter::new();
        write_dynamic_block(&mut writer, &codes, &tokens, true);
        let data = writer.finish();
        // BFINAL=1, BTYPE=10 -> 101 in the first three bits
        assert_eq!(data[0] & 0x07, 0x05);
    }
}
