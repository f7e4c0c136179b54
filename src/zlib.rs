//! Zlib container (RFC 1950) around raw DEFLATE

use crate::checksum::adler32;
use crate::deflate::{Deflator, Inflator};
use crate::error::{Error, Result};
use crate::{output_capacity, CompressionLevel, DeflateConfig};

const DEFLATE_IDENTIFIER: u8 = 0x8;

/// CINFO for a 32KB window (log2(window) - 8)
const MAX_WINDOW_INFO: u8 = 7;

const FDICT: u8 = 1 << 5;

/// Parsed CMF/FLG header pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZlibHeader {
    /// Window size in bytes (256 to 32768)
    pub window_size: usize,
    /// FLEVEL compression hint (0 = fastest .. 3 = maximum)
    pub level_hint: u8,
}

impl ZlibHeader {
    /// Header advertising a 32KB window and the hint matching `level`
    pub fn for_level(level: CompressionLevel) -> Self {
        let level_hint = match level.level() {
            0 | 1 => 0,
            2..=5 => 1,
            6 => 2,
            _ => 3,
        };
        Self { window_size: 1 << (MAX_WINDOW_INFO + 8), level_hint }
    }

    /// Parse and validate the two header bytes
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let (cmf, flg) = match bytes {
            [cmf, flg, ..] => (*cmf, *flg),
            _ => return Err(Error::UnexpectedEof),
        };

        let word = u16::from_be_bytes([cmf, flg]);
        if word % 31 != 0 {
            return Err(Error::InvalidZlibHeader(word));
        }
        if cmf & 0x0f != DEFLATE_IDENTIFIER {
            return Err(Error::UnsupportedCompressionMethod(cmf & 0x0f));
        }
        let window_info = cmf >> 4;
        if window_info > MAX_WINDOW_INFO {
            return Err(Error::InvalidZlibHeader(word));
        }
        if flg & FDICT != 0 {
            return Err(Error::PresetDictionary);
        }

        Ok(Self { window_size: 1 << (window_info + 8), level_hint: flg >> 6 })
    }

    /// Encode as CMF, FLG with FCHECK filled in
    pub fn to_bytes(&self) -> [u8; 2] {
        let window_info =
            (self.window_size.trailing_zeros() as u8).saturating_sub(8).min(MAX_WINDOW_INFO);
        let cmf = (window_info << 4) | DEFLATE_IDENTIFIER;
        let flg = (self.level_hint & 0x3) << 6;
        let rem = u16::from_be_bytes([cmf, flg]) % 31;
        let fcheck = if rem == 0 { 0 } else { 31 - rem as u8 };
        [cmf, flg | fcheck]
    }
}

/// Compress `data` into a zlib stream
pub fn compress(data: &[u8], config: &DeflateConfig) -> Vec<u8> {
    let body = Deflator::new(config.clone()).deflate(data);

    let mut output = Vec::with_capacity(body.len() + 6);
    output.extend_from_slice(&ZlibHeader::for_level(config.compression_level).to_bytes());
    output.extend_from_slice(&body);
    output.extend_from_slice(&adler32(data, 1).to_be_bytes());
    output
}

/// Decompress a zlib stream, verifying its Adler32 checksum
///
/// Bytes after the checksum are ignored.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let header = ZlibHeader::parse(data)?;
    log::debug!(
        "zlib stream: window {} bytes, level hint {}",
        header.window_size,
        header.level_hint
    );

    let body = &data[2..];
    let mut output = Vec::with_capacity(output_capacity(body.len(), None));
    let mut inflator = Inflator::new(body);
    inflator.inflate_to_end(&mut output)?;

    let checksum_start = inflator.bytes_consumed();
    let checksum = body.get(checksum_start..checksum_start + 4).ok_or(Error::UnexpectedEof)?;
    let expected = u32::from_be_bytes([checksum[0], checksum[1], checksum[2], checksum[3]]);

    let found = adler32(&output, 1);
    if found != expected {
        return Err(Error::Adler32Mismatch { expected, found });
    }
    Ok(output)
}
