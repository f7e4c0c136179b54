use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Input range errors
    #[error("Invalid input range: start={start}, length={length}, available={available}")]
    InvalidRange { start: usize, length: usize, available: usize },

    // DEFLATE decoding errors
    #[error("Unexpected end of input")]
    UnexpectedEof,

    #[error("Invalid DEFLATE block type: {0}")]
    InvalidBlockType(u8),

    #[error("Invalid Huffman code (last symbol or prefix: {0})")]
    InvalidCode(u16),

    #[error("Invalid Huffman code length: {0} (max 15)")]
    InvalidCodeLength(u8),

    #[error("Huffman code oversubscribed: more codes than possible for bit length")]
    HuffmanOversubscribed,

    #[error("Invalid code length sequence in dynamic block header")]
    InvalidCodeLengths,

    #[error("Back-reference distance {distance} exceeds available window {available}")]
    InvalidDistance { distance: u16, available: usize },

    #[error("Stored block length mismatch: LEN={len}, NLEN={nlen}")]
    LengthMismatch { len: u16, nlen: u16 },

    // Gzip container errors
    #[error("Invalid gzip magic bytes: expected 0x1f8b, got 0x{0:04x}")]
    InvalidGzipMagic(u16),

    #[error("Unsupported compression method: {0} (only DEFLATE/8 supported)")]
    UnsupportedCompressionMethod(u8),

    #[error("Invalid gzip header field: {0}")]
    InvalidGzipField(&'static str),

    #[error("Gzip header CRC mismatch: expected 0x{expected:04x}, got 0x{found:04x}")]
    GzipHeaderCrcMismatch { expected: u16, found: u16 },

    // Zlib container errors
    #[error("Invalid zlib header: 0x{0:04x}")]
    InvalidZlibHeader(u16),

    #[error("Zlib preset dictionaries are not supported")]
    PresetDictionary,

    // Checksum errors
    #[error("CRC32 mismatch: expected 0x{expected:08x}, got 0x{found:08x}")]
    Crc32Mismatch { expected: u32, found: u32 },

    #[error("Adler32 mismatch: expected 0x{expected:08x}, got 0x{found:08x}")]
    Adler32Mismatch { expected: u32, found: u32 },

    #[error("Size mismatch: expected {expected} bytes, got {found}")]
    SizeMismatch { expected: u32, found: u32 },

    // Tar errors
    #[error("Tar entry name too long: {0} bytes (max 100)")]
    TarNameTooLong(usize),

    #[error("Tar header checksum mismatch: expected {expected}, got {found}")]
    TarChecksumMismatch { expected: u32, found: u32 },

    #[error("Invalid tar header field {field}: {value:?}")]
    InvalidTarField { field: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, Error>;
