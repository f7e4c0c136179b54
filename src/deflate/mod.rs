pub mod deflater;
pub mod inflater;
pub mod lz77;
pub mod tables;
pub mod tokens;
pub mod window;

pub use deflater::{DeflateStats, Deflator};
pub use inflater::Inflator;
pub use lz77::MatchFinder;
pub use tokens::Token;

/// DEFLATE block encodings, numbered as their 2-bit BTYPE field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlockType {
    Stored = 0,
    FixedHuffman = 1,
    DynamicHuffman = 2,
}

impl BlockType {
    /// Map a BTYPE field to a block type; 3 is reserved
    pub fn from_bits(btype: u8) -> Option<Self> {
        match btype {
            0 => Some(Self::Stored),
            1 => Some(Self::FixedHuffman),
            2 => Some(Self::DynamicHuffman),
            _ => None,
        }
    }

    /// The 2-bit BTYPE field for this block type
    pub fn bits(&self) -> u8 {
        *self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_type_bits() {
        for btype in 0..3 {
            assert_eq!(BlockType::from_bits(btype).map(|b| b.bits()), Some(btype));
        }
        assert_eq!(BlockType::from_bits(3), None);
    }
}
