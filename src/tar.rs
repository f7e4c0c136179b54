//! Ustar archive writer and reader

use crate::error::{Error, Result};

/// Size of a header or data block
pub const BLOCK_SIZE: usize = 512;

/// Archives are padded to a whole number of records
pub const RECORD_SIZE: usize = 20 * BLOCK_SIZE;

// Header field offsets and widths
const NAME: (usize, usize) = (0, 100);
const MODE: (usize, usize) = (100, 8);
const UID: (usize, usize) = (108, 8);
const GID: (usize, usize) = (116, 8);
const SIZE: (usize, usize) = (124, 12);
const MTIME: (usize, usize) = (136, 12);
const CHECKSUM: (usize, usize) = (148, 8);
const TYPEFLAG: usize = 156;
const MAGIC: (usize, usize) = (257, 6);
const VERSION: (usize, usize) = (263, 2);
const PREFIX: (usize, usize) = (345, 155);

const USTAR_MAGIC: &[u8; 6] = b"ustar\0";
const USTAR_VERSION: &[u8; 2] = b"00";

/// Kind of archive member
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryType {
    /// Regular file (`'0'`, or NUL in old archives)
    File,
    /// Directory (`'5'`)
    Directory,
    /// Any other type flag, kept as-is
    Other(u8),
}

impl EntryType {
    fn from_flag(flag: u8) -> Self {
        match flag {
            b'0' | 0 => Self::File,
            b'5' => Self::Directory,
            other => Self::Other(other),
        }
    }

    fn flag(&self) -> u8 {
        match self {
            Self::File => b'0',
            Self::Directory => b'5',
            Self::Other(flag) => *flag,
        }
    }
}

/// One archive member
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TarEntry {
    pub name: String,
    pub entry_type: EntryType,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub mtime: u64,
    pub data: Vec<u8>,
}

/// Builds an in-memory ustar archive
pub struct TarBuilder {
    output: Vec<u8>,
    entries: usize,
}

impl TarBuilder {
    pub fn new() -> Self {
        Self { output: Vec::with_capacity(RECORD_SIZE), entries: 0 }
    }

    /// Append a regular file
    pub fn append_file(&mut self, name: &str, data: &[u8], mode: u32, mtime: u64) -> Result<()> {
        self.append(&TarEntry {
            name: name.to_string(),
            entry_type: EntryType::File,
            mode,
            uid: 0,
            gid: 0,
            mtime,
            data: data.to_vec(),
        })
    }

    /// Append a directory; a trailing `/` is added to the name if missing
    pub fn append_dir(&mut self, name: &str, mode: u32, mtime: u64) -> Result<()> {
        let name = if name.ends_with('/') { name.to_string() } else { format!("{}/", name) };
        self.append(&TarEntry {
            name,
            entry_type: EntryType::Directory,
            mode,
            uid: 0,
            gid: 0,
            mtime,
            data: Vec::new(),
        })
    }

    /// Append an entry: header block, then data padded to the block size
    pub fn append(&mut self, entry: &TarEntry) -> Result<()> {
        let header = encode_header(entry)?;
        self.output.extend_from_slice(&header);
        self.output.extend_from_slice(&entry.data);
        self.output.resize(self.output.len() + padding(entry.data.len()), 0);
        self.entries += 1;

        log::trace!("tar: appended {:?} ({} bytes)", entry.name, entry.data.len());
        Ok(())
    }

    /// Number of entries appended so far
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Write the end-of-archive marker and pad to a full record
    pub fn finish(mut self) -> Vec<u8> {
        self.output.resize(self.output.len() + 2 * BLOCK_SIZE, 0);
        let records = (self.output.len() + RECORD_SIZE - 1) / RECORD_SIZE;
        self.output.resize(records * RECORD_SIZE, 0);

        log::debug!("tar: {} entries, {} bytes", self.entries, self.output.len());
        self.output
    }
}

impl Default for TarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Entries read back from an archive
#[derive(Clone, Debug, Default)]
pub struct TarArchive {
    entries: Vec<TarEntry>,
}

impl TarArchive {
    /// Parse every entry up to the end-of-archive marker
    ///
    /// Header checksums are verified. An archive that stops exactly on a block
    /// boundary without the zero blocks is accepted; one cut inside a header
    /// or data region is not.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut entries = Vec::new();
        let mut offset = 0;

        while offset < data.len() {
            let header = data.get(offset..offset + BLOCK_SIZE).ok_or(Error::UnexpectedEof)?;
            if header.iter().all(|&b| b == 0) {
                break;
            }

            let found = parse_octal(field(header, CHECKSUM), "checksum")? as u32;
            let expected = header_checksum(header);
            if found != expected {
                return Err(Error::TarChecksumMismatch { expected, found });
            }

            let size = parse_octal(field(header, SIZE), "size")? as usize;
            let data_start = offset + BLOCK_SIZE;
            let body = data.get(data_start..data_start + size).ok_or(Error::UnexpectedEof)?;

            let name = parse_string(field(header, NAME));
            let prefix = parse_string(field(header, PREFIX));
            let name = if prefix.is_empty() { name } else { format!("{}/{}", prefix, name) };

            entries.push(TarEntry {
                name,
                entry_type: EntryType::from_flag(header[TYPEFLAG]),
                mode: parse_octal(field(header, MODE), "mode")? as u32,
                uid: parse_octal(field(header, UID), "uid")? as u32,
                gid: parse_octal(field(header, GID), "gid")? as u32,
                mtime: parse_octal(field(header, MTIME), "mtime")?,
                data: body.to_vec(),
            });

            offset = data_start + size + padding(size);
        }

        log::debug!("tar: parsed {} entries", entries.len());
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[TarEntry] {
        &self.entries
    }

    /// Find an entry by exact name
    pub fn get(&self, name: &str) -> Option<&TarEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn into_entries(self) -> Vec<TarEntry> {
        self.entries
    }
}

/// Zero bytes needed to round `len` up to a block boundary
fn padding(len: usize) -> usize {
    (BLOCK_SIZE - len % BLOCK_SIZE) % BLOCK_SIZE
}

fn field(header: &[u8], (start, len): (usize, usize)) -> &[u8] {
    &header[start..start + len]
}

/// Build the 512-byte header block for `entry`
fn encode_header(entry: &TarEntry) -> Result<[u8; BLOCK_SIZE]> {
    let name = entry.name.as_bytes();
    if name.len() > NAME.1 {
        return Err(Error::TarNameTooLong(name.len()));
    }

    let mut header = [0u8; BLOCK_SIZE];
    header[..name.len()].copy_from_slice(name);
    write_octal(&mut header, MODE, entry.mode as u64, "mode")?;
    write_octal(&mut header, UID, entry.uid as u64, "uid")?;
    write_octal(&mut header, GID, entry.gid as u64, "gid")?;
    write_octal(&mut header, SIZE, entry.data.len() as u64, "size")?;
    write_octal(&mut header, MTIME, entry.mtime, "mtime")?;
    header[TYPEFLAG] = entry.entry_type.flag();
    header[MAGIC.0..MAGIC.0 + MAGIC.1].copy_from_slice(USTAR_MAGIC);
    header[VERSION.0..VERSION.0 + VERSION.1].copy_from_slice(USTAR_VERSION);

    // Six octal digits, NUL, space
    let checksum = header_checksum(&header);
    let digits = format!("{:06o}", checksum);
    let (start, _) = CHECKSUM;
    header[start..start + 6].copy_from_slice(digits.as_bytes());
    header[start + 6] = 0;
    header[start + 7] = b' ';

    Ok(header)
}

/// Write `value` as zero-padded octal digits followed by NUL
fn write_octal(
    header: &mut [u8],
    (start, len): (usize, usize),
    value: u64,
    name: &'static str,
) -> Result<()> {
    let digits = format!("{:0width$o}", value, width = len - 1);
    if digits.len() > len - 1 {
        return Err(Error::InvalidTarField { field: name, value: value.to_string() });
    }
    header[start..start + len - 1].copy_from_slice(digits.as_bytes());
    header[start + len - 1] = 0;
    Ok(())
}

/// Sum of all header bytes with the checksum field counted as spaces
fn header_checksum(header: &[u8]) -> u32 {
    let (start, len) = CHECKSUM;
    header
        .iter()
        .enumerate()
        .map(|(i, &b)| if (start..start + len).contains(&i) { b' ' as u32 } else { b as u32 })
        .sum()
}

fn parse_string(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).into_owned()
}

fn parse_octal(bytes: &[u8], name: &'static str) -> Result<u64> {
    let s = parse_string(bytes);
    let s = s.trim_matches(|c: char| c == ' ' || c == '\0');
    if s.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(s, 8)
        .map_err(|_| Error::InvalidTarField { field: name, value: s.to_string() })
}
