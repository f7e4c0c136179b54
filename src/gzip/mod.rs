//! Gzip container (RFC 1952) around raw DEFLATE

pub mod header;

pub use header::{GzipHeader, GzipTrailer};

use crate::checksum::crc32;
use crate::deflate::{Deflator, Inflator};
use crate::error::{Error, Result};
use crate::{output_capacity, DeflateConfig};
use std::io::Cursor;

/// Compress `data` into a single gzip member
pub fn compress(data: &[u8], config: &DeflateConfig, header: &GzipHeader) -> Result<Vec<u8>> {
    let body = Deflator::new(config.clone()).deflate(data);

    let mut output = Vec::with_capacity(body.len() + 32);
    header.write(&mut output)?;
    output.extend_from_slice(&body);
    GzipTrailer::for_data(data).write(&mut output)?;

    log::debug!("gzip member: {} bytes in, {} bytes out", data.len(), output.len());
    Ok(output)
}

/// Decompress every member of a gzip file and concatenate their contents
///
/// Each member's CRC32 and ISIZE are verified. Zero padding after the last
/// member is ignored; any other trailing bytes must form another member.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(output_capacity(data.len(), None));
    let mut offset = 0;
    let mut members = 0u64;

    loop {
        let rest = &data[offset..];
        if members > 0 && rest.iter().all(|&b| b == 0) {
            break;
        }

        let mut cursor = Cursor::new(rest);
        let header = GzipHeader::parse(&mut cursor)?;
        let body_start = offset + cursor.position() as usize;

        let member_start = output.len();
        let mut inflator = Inflator::new(&data[body_start..]);
        inflator.inflate_to_end(&mut output)?;

        let trailer_start = body_start + inflator.bytes_consumed();
        let trailer = GzipTrailer::parse(&mut &data[trailer_start..])?;
        let member = &output[member_start..];

        let found = crc32(member, 0);
        if found != trailer.crc32 {
            return Err(Error::Crc32Mismatch { expected: trailer.crc32, found });
        }
        let found = member.len() as u32;
        if found != trailer.isize {
            return Err(Error::SizeMismatch { expected: trailer.isize, found });
        }

        log::debug!(
            "gzip member {} ({:?}): {} bytes",
            members,
            header.filename.as_deref().unwrap_or("<unnamed>"),
            member.len()
        );

        members += 1;
        offset = trailer_start + 8;
    }

    Ok(output)
}
