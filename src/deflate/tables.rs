use lazy_static::lazy_static;

/// Shortest back-reference DEFLATE can express
pub const MIN_MATCH: usize = 3;

/// Longest back-reference DEFLATE can express
pub const MAX_MATCH: usize = 258;

/// Largest back-reference distance (window size)
pub const MAX_DISTANCE: usize = 32768;

/// End-of-block symbol in the literal/length alphabet
pub const END_OF_BLOCK: u16 = 256;

/// Number of literal/length symbols that may appear in a valid stream
pub const NUM_LITERAL_SYMBOLS: usize = 286;

/// Number of distance symbols that may appear in a valid stream
pub const NUM_DISTANCE_SYMBOLS: usize = 30;

/// Length codes 257-285: base length and extra bits
/// Index by (code - 257)
pub const LENGTH_TABLE: [(u16, u8); 29] = [
    (3, 0),
    (4, 0),
    (5, 0),
    (6, 0),
    (7, 0),
    (8, 0),
    (9, 0),
    (10, 0),
    (11, 1),
    (13, 1),
    (15, 1),
    (17, 1),
    (19, 2),
    (23, 2),
    (27, 2),
    (31, 2),
    (35, 3),
    (43, 3),
    (51, 3),
    (59, 3),
    (67, 4),
    (83, 4),
    (99, 4),
    (115, 4),
    (131, 5),
    (163, 5),
    (195, 5),
    (227, 5),
    (258, 0), // 285 is a single length, not 227 + 32
];

/// Distance codes 0-29: base distance and extra bits
pub const DISTANCE_TABLE: [(u16, u8); 30] = [
    (1, 0),
    (2, 0),
    (3, 0),
    (4, 0),
    (5, 1),
    (7, 1),
    (9, 2),
    (13, 2),
    (17, 3),
    (25, 3),
    (33, 4),
    (49, 4),
    (65, 5),
    (97, 5),
    (129, 6),
    (193, 6),
    (257, 7),
    (385, 7),
    (513, 8),
    (769, 8),
    (1025, 9),
    (1537, 9),
    (2049, 10),
    (3073, 10),
    (4097, 11),
    (6145, 11),
    (8193, 12),
    (12289, 12),
    (16385, 13),
    (24577, 13),
];

/// Order of code length alphabet for dynamic Huffman blocks
pub const CODE_LENGTH_ORDER: [usize; 19] =
    [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

lazy_static! {
    /// Length code index (code - 257) for every length 3..=258, indexed by
    /// `length - 3`
    static ref LENGTH_CODE_INDEX: [u8; 256] = {
        let mut index = [0u8; 256];
        for (i, &(base, extra_bits)) in LENGTH_TABLE.iter().enumerate() {
            let span = if i == LENGTH_TABLE.len() - 1 { 1 } else { 1usize << extra_bits };
            for len in base as usize..base as usize + span {
                index[len - MIN_MATCH] = i as u8;
            }
        }
        index
    };
}

/// Decode a length value from a length code (257-285) and extra bits
pub fn decode_length(code: u16, extra_bits: u32) -> Option<u16> {
    if !(257..=285).contains(&code) {
        return None;
    }
    let (base, _) = LENGTH_TABLE[(code - 257) as usize];
    Some(base + extra_bits as u16)
}

/// Decode a distance value from a distance code (0-29) and extra bits
pub fn decode_distance(code: u16, extra_bits: u32) -> Option<u16> {
    let &(base, _) = DISTANCE_TABLE.get(code as usize)?;
    Some(base + extra_bits as u16)
}

/// Find the length code for a match length
/// Returns (code, extra_value, extra_bits)
pub fn encode_length(length: u16) -> Option<(u16, u16, u8)> {
    if !(MIN_MATCH as u16..=MAX_MATCH as u16).contains(&length) {
        return None;
    }
    let i = LENGTH_CODE_INDEX[length as usize - MIN_MATCH] as usize;
    let (base, extra_bits) = LENGTH_TABLE[i];
    Some((257 + i as u16, length - base, extra_bits))
}

/// Find the distance code for a match distance
/// Returns (code, extra_value, extra_bits)
pub fn encode_distance(distance: u16) -> Option<(u16, u16, u8)> {
    if distance == 0 {
        return None;
    }
    // Last entry whose base is <= distance
    let i = DISTANCE_TABLE.partition_point(|&(base, _)| base <= distance) - 1;
    let (base, extra_bits) = DISTANCE_TABLE[i];
    Some((i as u16, distance - base, extra_bits))
}
