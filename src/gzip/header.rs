use crate::checksum::Crc32;
use crate::error::{Error, Result};
use std::io::{Read, Write};

/// Gzip magic bytes as a little-endian u16
pub const GZIP_MAGIC: u16 = 0x8b1f;

/// Compression method for DEFLATE
pub const CM_DEFLATE: u8 = 8;

/// OS byte for "unknown"
pub const OS_UNKNOWN: u8 = 0xff;

/// Gzip header flags (RFC 1952)
pub const FTEXT: u8 = 1 << 0;
pub const FHCRC: u8 = 1 << 1;
pub const FEXTRA: u8 = 1 << 2;
pub const FNAME: u8 = 1 << 3;
pub const FCOMMENT: u8 = 1 << 4;

/// Gzip header (RFC 1952)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GzipHeader {
    pub compression_method: u8,
    pub flags: u8,
    pub mtime: u32,
    pub extra_flags: u8,
    pub os: u8,
    pub extra: Option<Vec<u8>>,
    pub filename: Option<String>,
    pub comment: Option<String>,
    pub header_crc: Option<u16>,
}

impl GzipHeader {
    /// Parse a gzip header from a reader
    ///
    /// When FHCRC is set the stored header CRC is checked against the bytes
    /// actually read.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let mut reader = CrcReader::new(reader);

        let mut buf = [0u8; 10];
        reader.read_exact(&mut buf).map_err(|_| Error::UnexpectedEof)?;

        // Check magic bytes
        let magic = u16::from_le_bytes([buf[0], buf[1]]);
        if magic != GZIP_MAGIC {
            return Err(Error::InvalidGzipMagic(magic));
        }

        // Compression method (must be 8 for DEFLATE)
        let compression_method = buf[2];
        if compression_method != CM_DEFLATE {
            return Err(Error::UnsupportedCompressionMethod(compression_method));
        }

        let flags = buf[3];
        let mtime = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let extra_flags = buf[8];
        let os = buf[9];

        // Parse optional fields based on flags
        let extra = if flags & FEXTRA != 0 {
            let mut xlen_buf = [0u8; 2];
            reader.read_exact(&mut xlen_buf).map_err(|_| Error::UnexpectedEof)?;
            let xlen = u16::from_le_bytes(xlen_buf) as usize;

            let mut extra_data = vec![0u8; xlen];
            reader.read_exact(&mut extra_data).map_err(|_| Error::UnexpectedEof)?;
            Some(extra_data)
        } else {
            None
        };

        let filename =
            if flags & FNAME != 0 { Some(read_null_terminated_string(&mut reader)?) } else { None };

        let comment = if flags & FCOMMENT != 0 {
            Some(read_null_terminated_string(&mut reader)?)
        } else {
            None
        };

        let header_crc = if flags & FHCRC != 0 {
            let expected = reader.crc16();
            let mut crc_buf = [0u8; 2];
            reader.read_exact(&mut crc_buf).map_err(|_| Error::UnexpectedEof)?;
            let found = u16::from_le_bytes(crc_buf);
            if found != expected {
                return Err(Error::GzipHeaderCrcMismatch { expected, found });
            }
            Some(found)
        } else {
            None
        };

        Ok(GzipHeader {
            compression_method,
            flags,
            mtime,
            extra_flags,
            os,
            extra,
            filename,
            comment,
            header_crc,
        })
    }

    /// Write the header
    ///
    /// FEXTRA, FNAME and FCOMMENT are derived from which optional fields are
    /// present; FTEXT and FHCRC are taken from `flags`. Names and comments
    /// are written as Latin-1, so characters above U+00FF are rejected.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut flags = self.flags & (FTEXT | FHCRC);
        if self.extra.is_some() {
            flags |= FEXTRA;
        }
        if self.filename.is_some() {
            flags |= FNAME;
        }
        if self.comment.is_some() {
            flags |= FCOMMENT;
        }

        let mut header = Vec::with_capacity(32);
        header.extend_from_slice(&GZIP_MAGIC.to_le_bytes());
        header.push(CM_DEFLATE);
        header.push(flags);
        header.extend_from_slice(&self.mtime.to_le_bytes());
        header.push(self.extra_flags);
        header.push(self.os);

        if let Some(extra) = &self.extra {
            let xlen = u16::try_from(extra.len()).map_err(|_| Error::InvalidGzipField("extra"))?;
            header.extend_from_slice(&xlen.to_le_bytes());
            header.extend_from_slice(extra);
        }
        if let Some(name) = &self.filename {
            header.extend(encode_string(name, "filename")?);
            header.push(0);
        }
        if let Some(comment) = &self.comment {
            header.extend(encode_string(comment, "comment")?);
            header.push(0);
        }
        if flags & FHCRC != 0 {
            let crc16 = crc32fast::hash(&header) as u16;
            header.extend_from_slice(&crc16.to_le_bytes());
        }

        writer.write_all(&header)?;
        Ok(())
    }

    /// Check if the FTEXT flag is set
    pub fn is_text(&self) -> bool {
        self.flags & FTEXT != 0
    }

    /// Check if the FEXTRA flag is set
    pub fn has_extra(&self) -> bool {
        self.flags & FEXTRA != 0
    }

    /// Check if the FNAME flag is set
    pub fn has_filename(&self) -> bool {
        self.flags & FNAME != 0
    }

    /// Check if the FCOMMENT flag is set
    pub fn has_comment(&self) -> bool {
        self.flags & FCOMMENT != 0
    }

    /// Check if the FHCRC flag is set
    pub fn has_header_crc(&self) -> bool {
        self.flags & FHCRC != 0
    }
}

impl Default for GzipHeader {
    /// Minimal header: no optional fields, mtime 0, OS unknown
    fn default() -> Self {
        Self {
            compression_method: CM_DEFLATE,
            flags: 0,
            mtime: 0,
            extra_flags: 0,
            os: OS_UNKNOWN,
            extra: None,
            filename: None,
            comment: None,
            header_crc: None,
        }
    }
}

/// Gzip trailer (8 bytes at end of each member)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GzipTrailer {
    pub crc32: u32,
    pub isize: u32,
}

impl GzipTrailer {
    /// Trailer for a member holding `data`
    pub fn for_data(data: &[u8]) -> Self {
        Self { crc32: crc32fast::hash(data), isize: data.len() as u32 }
    }

    /// Parse a gzip trailer from a reader
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf).map_err(|_| Error::UnexpectedEof)?;

        let crc32 = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let isize = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);

        Ok(GzipTrailer { crc32, isize })
    }

    /// Write CRC32 then ISIZE, both little endian
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.crc32.to_le_bytes())?;
        writer.write_all(&self.isize.to_le_bytes())?;
        Ok(())
    }
}

/// Reader adapter that checksums everything read through it
struct CrcReader<'r, R: Read> {
    inner: &'r mut R,
    hasher: Crc32,
}

impl<'r, R: Read> CrcReader<'r, R> {
    fn new(inner: &'r mut R) -> Self {
        Self { inner, hasher: Crc32::new() }
    }

    /// Low 16 bits of the CRC32 of the bytes read so far
    fn crc16(&self) -> u16 {
        self.hasher.clone().finalize() as u16
    }
}

impl<R: Read> Read for CrcReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}

/// Read a null-terminated string from a reader
fn read_null_terminated_string<R: Read>(reader: &mut R) -> Result<String> {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        reader.read_exact(&mut byte).map_err(|_| Error::UnexpectedEof)?;
        if byte[0] == 0 {
            break;
        }
        bytes.push(byte[0]);
    }

    // ISO-8859-1 maps each byte to the code point of the same value
    Ok(bytes.into_iter().map(char::from).collect())
}

/// Encode a header string as Latin-1
fn encode_string(value: &str, field: &'static str) -> Result<Vec<u8>> {
    value
        .chars()
        .map(|c| match u8::try_from(c) {
            Ok(0) | Err(_) => Err(Error::InvalidGzipField(field)),
            Ok(b) => Ok(b),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_minimal_header() {
        // Minimal gzip header: magic, method, flags=0, mtime=0, xfl, os
        let data = vec![
            0x1f, 0x8b, // magic
            0x08, // method (DEFLATE)
            0x00, // flags
            0x00, 0x00, 0x00, 0x00, // mtime
            0x00, // extra flags
            0xff, // OS (unknown)
        ];

        let mut cursor = Cursor::new(data);
        let header = GzipHeader::parse(&mut cursor).unwrap();

        assert_eq!(header, GzipHeader::default());
        assert_eq!(cursor.position(), 10);
    }

    #[test]
    fn test_parse_header_with_filename() {
        let data = vec![
            0x1f, 0x8b, // magic
            0x08, // method
            0x08, // flags (FNAME)
            0x00, 0x00, 0x00, 0x00, // mtime
            0x00, // extra flags
            0x03, // OS (Unix)
            b't', b'e', b's', b't', b'.', b't', b'x', b't', 0x00, // filename
        ];

        let mut cursor = Cursor::new(data);
        let header = GzipHeader::parse(&mut cursor).unwrap();

        assert!(header.has_filename());
        assert_eq!(header.filename.as_deref(), Some("test.txt"));
    }

    #[test]
    fn test_invalid_magic() {
        let data = vec![0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff];
        let mut cursor = Cursor::new(data);
        let result = GzipHeader::parse(&mut cursor);
        assert!(matches!(result, Err(Error::InvalidGzipMagic(_))));
    }

    #[test]
    fn test_unsupported_method() {
        let data = vec![0x1f, 0x8b, 0x07, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff];
        let result = GzipHeader::parse(&mut Cursor::new(data));
        assert!(matches!(result, Err(Error::UnsupportedCompressionMethod(7))));
    }

    #[test]
    fn test_truncated_header() {
        let data = vec![0x1f, 0x8b, 0x08, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, b'a'];
        let result = GzipHeader::parse(&mut Cursor::new(data));
        assert!(matches!(result, Err(Error::UnexpectedEof)));
    }

    #[test]
    fn test_write_then_parse_all_fields() {
        let header = GzipHeader {
            flags: FTEXT | FHCRC,
            mtime: 1_700_000_000,
            extra_flags: 2,
            os: 3,
            extra: Some(vec![b'A', b'B', 2, 0, 0xde, 0xad]),
            filename: Some("café.txt".to_string()),
            comment: Some("made in a test".to_string()),
            ..GzipHeader::default()
        };

        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        // Latin-1 encodes 'é' as a single byte
        assert!(bytes.windows(4).any(|w| w == [b'c', b'a', b'f', 0xe9]));

        let mut cursor = Cursor::new(&bytes);
        let parsed = GzipHeader::parse(&mut cursor).unwrap();
        assert_eq!(cursor.position() as usize, bytes.len());
        assert_eq!(parsed.flags, FTEXT | FHCRC | FEXTRA | FNAME | FCOMMENT);
        assert_eq!(parsed.mtime, header.mtime);
        assert_eq!(parsed.extra, header.extra);
        assert_eq!(parsed.filename, header.filename);
        assert_eq!(parsed.comment, header.comment);
        assert!(parsed.is_text());
        assert!(parsed.has_header_crc());
    }

    #[test]
    fn test_header_crc_mismatch() {
        let header = GzipHeader { flags: FHCRC, ..GzipHeader::default() };
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 12);

        bytes[4] ^= 0x01; // corrupt mtime
        let result = GzipHeader::parse(&mut Cursor::new(&bytes));
        assert!(matches!(result, Err(Error::GzipHeaderCrcMismatch { .. })));
    }

    #[test]
    fn test_write_rejects_nul_in_name() {
        let header = GzipHeader { filename: Some("a\0b".to_string()), ..GzipHeader::default() };
        let result = header.write(&mut Vec::new());
        assert!(matches!(result, Err(Error::InvalidGzipField("filename"))));
    }

    #[test]
    fn test_write_rejects_non_latin1() {
        let header =
            GzipHeader { comment: Some("snow \u{2603}".to_string()), ..Default::default() };
        let result = header.write(&mut Vec::new());
        assert!(matches!(result, Err(Error::InvalidGzipField("comment"))));
    }

    #[test]
    fn test_latin1_names_roundtrip() {
        // Encodes to C3 A9, which would also be valid UTF-8 for 'é'
        let header =
            GzipHeader { filename: Some("\u{c3}\u{a9}".to_string()), ..Default::default() };
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        assert_eq!(&bytes[10..], &[0xc3, 0xa9, 0x00]);

        let parsed = GzipHeader::parse(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(parsed.filename.as_deref(), Some("\u{c3}\u{a9}"));
    }

    #[test]
    fn test_trailer() {
        let data = vec![
            0x12, 0x34, 0x56, 0x78, // CRC32
            0x00, 0x10, 0x00, 0x00, // ISIZE (4096)
        ];
        let mut cursor = Cursor::new(data.clone());
        let trailer = GzipTrailer::parse(&mut cursor).unwrap();

        assert_eq!(trailer.crc32, 0x78563412);
        assert_eq!(trailer.isize, 4096);

        let mut written = Vec::new();
        trailer.write(&mut written).unwrap();
        assert_eq!(written, data);
    }

    #[test]
    fn test_trailer_for_data() {
        let trailer = GzipTrailer::for_data(b"123456789");
        assert_eq!(trailer, GzipTrailer { crc32: 0xCBF4_3926, isize: 9 });
    }
}
