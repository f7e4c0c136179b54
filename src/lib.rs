pub mod bits;
pub mod checksum;
pub mod deflate;
pub mod error;
pub mod gzip;
pub mod huffman;
pub mod tar;
pub mod zlib;

pub use deflate::{BlockType, DeflateStats, Deflator, Inflator, Token};
pub use error::{Error, Result};

/// Compression level (0-9)
///
/// - Level 0: Stored blocks only
/// - Levels 1-3: Greedy matching, fixed Huffman tables (or stored)
/// - Levels 4-9: Lazy matching, dynamic Huffman per block (or fixed/stored)
///
/// Higher levels walk longer hash chains when searching for matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionLevel {
    Level0 = 0,
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
    Level4 = 4,
    Level5 = 5,
    #[default]
    Level6 = 6,
    Level7 = 7,
    Level8 = 8,
    Level9 = 9,
}

impl CompressionLevel {
    /// Create from numeric level (0-9), clamped to valid range
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Self::Level0,
            1 => Self::Level1,
            2 => Self::Level2,
            3 => Self::Level3,
            4 => Self::Level4,
            5 => Self::Level5,
            6 => Self::Level6,
            7 => Self::Level7,
            8 => Self::Level8,
            _ => Self::Level9,
        }
    }

    /// Get numeric level (0-9)
    pub fn level(&self) -> u8 {
        *self as u8
    }

    /// Whether this level only writes stored blocks (level 0)
    pub fn use_stored_only(&self) -> bool {
        matches!(self, Self::Level0)
    }

    /// Whether this level is limited to fixed Huffman tables (levels 1-3)
    pub fn use_fixed_huffman(&self) -> bool {
        matches!(self, Self::Level1 | Self::Level2 | Self::Level3)
    }

    /// Maximum hash chain candidates examined per position (0 = no matching)
    pub fn max_chain(&self) -> usize {
        match self {
            Self::Level0 => 0,
            Self::Level1 => 4,
            Self::Level2 => 8,
            Self::Level3 => 16,
            Self::Level4 => 32,
            Self::Level5 => 64,
            Self::Level6 => 128,
            Self::Level7 => 256,
            Self::Level8 => 1024,
            Self::Level9 => 4096,
        }
    }

    /// Whether this level uses one-step lazy matching (levels 4-9)
    pub fn use_lazy_matching(&self) -> bool {
        self.level() >= 4
    }
}

/// Configuration for DEFLATE encoding
#[derive(Clone, Debug)]
pub struct DeflateConfig {
    /// Compression level (0-9)
    pub compression_level: CompressionLevel,
    /// Maximum number of LZ77 tokens per block (default: 16384)
    pub max_block_tokens: usize,
}

impl Default for DeflateConfig {
    fn default() -> Self {
        Self { compression_level: CompressionLevel::default(), max_block_tokens: 16384 }
    }
}

/// Resolve `start..start + length` against `data`
fn checked_range(data: &[u8], start: usize, length: usize) -> Result<&[u8]> {
    start
        .checked_add(length)
        .and_then(|end| data.get(start..end))
        .ok_or(Error::InvalidRange { start, length, available: data.len() })
}

/// Largest output a DEFLATE stream can expand to per input byte
const MAX_EXPANSION: usize = 1032;

/// Initial output capacity for inflating `input_len` bytes
///
/// A hint is capped at the most the input could possibly produce.
pub(crate) fn output_capacity(input_len: usize, hint: Option<usize>) -> usize {
    let ceiling = input_len.saturating_mul(MAX_EXPANSION).max(64);
    hint.unwrap_or_else(|| input_len.saturating_mul(3)).min(ceiling)
}

/// Compress `data[start..start + length]` into a raw DEFLATE stream with the
/// default configuration
pub fn compress(data: &[u8], start: usize, length: usize) -> Result<Vec<u8>> {
    compress_with(data, start, length, &DeflateConfig::default())
}

/// Compress `data[start..start + length]` into a raw DEFLATE stream
pub fn compress_with(
    data: &[u8],
    start: usize,
    length: usize,
    config: &DeflateConfig,
) -> Result<Vec<u8>> {
    let input = checked_range(data, start, length)?;
    Ok(Deflator::new(config.clone()).deflate(input))
}

/// Decompress the raw DEFLATE stream in `data[start..start + length]`
///
/// `expected_size_hint` only preallocates the output buffer. Bytes after the
/// final block are ignored. On error no partial output is returned.
pub fn decompress(
    data: &[u8],
    start: usize,
    length: usize,
    expected_size_hint: Option<usize>,
) -> Result<Vec<u8>> {
    let input = checked_range(data, start, length)?;
    let mut out = Vec::with_capacity(output_capacity(input.len(), expected_size_hint));
    Inflator::new(input).inflate_to_end(&mut out)?;
    Ok(out)
}
