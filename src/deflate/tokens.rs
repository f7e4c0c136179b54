use super::tables::{MAX_DISTANCE, MAX_MATCH, MIN_MATCH};

/// Represents a single token in the LZ77 stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    /// A literal byte
    Literal(u8),
    /// A back-reference: copy `length` bytes from `distance` bytes back
    Match { length: u16, distance: u16 },
}

impl Token {
    /// Returns the uncompressed size this token represents
    pub fn uncompressed_size(&self) -> usize {
        match self {
            Token::Literal(_) => 1,
            Token::Match { length, .. } => *length as usize,
        }
    }

    /// Whether a match stays inside DEFLATE's length and distance limits
    /// given `produced` bytes of history
    pub fn is_valid_at(&self, produced: usize) -> bool {
        match *self {
            Token::Literal(_) => true,
            Token::Match { length, distance } => {
                (MIN_MATCH..=MAX_MATCH).contains(&(length as usize))
                    && distance >= 1
                    && distance as usize <= produced.min(MAX_DISTANCE)
            }
        }
    }
}
