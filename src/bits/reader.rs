use crate::error::{Error, Result};

/// Bit-level reader for DEFLATE streams
///
/// DEFLATE uses LSB-first bit ordering within bytes.
/// Bits are read from LSB to MSB within each byte.
///
/// The reader works over an in-memory slice and keeps a 64-bit look-ahead
/// buffer, so it can be parked between blocks and resumed without losing
/// bit position.
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Next byte of `data` to move into the buffer
    pos: usize,
    /// Buffer holding up to 64 bits
    buffer: u64,
    /// Number of valid bits in buffer (0-64)
    bits_available: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, buffer: 0, bits_available: 0 }
    }

    /// Ensure at least `n` bits are available in buffer
    ///
    /// Refills whole bytes while there is room, so most calls touch the
    /// slice once per several reads.
    #[inline]
    fn fill_buffer(&mut self, n: u8) -> Result<()> {
        debug_assert!(n <= 57, "Cannot request more than 57 bits at once");

        if self.bits_available >= n {
            return Ok(());
        }

        while self.bits_available <= 56 && self.pos < self.data.len() {
            self.buffer |= (self.data[self.pos] as u64) << self.bits_available;
            self.bits_available += 8;
            self.pos += 1;
        }

        if self.bits_available < n {
            return Err(Error::UnexpectedEof);
        }
        Ok(())
    }

    /// Read `n` bits (1-32) in LSB-first order (standard DEFLATE order)
    pub fn read_bits(&mut self, n: u8) -> Result<u32> {
        debug_assert!(n <= 32, "Cannot read more than 32 bits at once");

        if n == 0 {
            return Ok(0);
        }

        self.fill_buffer(n)?;

        let mask = (1u64 << n) - 1;
        let result = (self.buffer & mask) as u32;
        self.buffer >>= n;
        self.bits_available -= n;

        Ok(result)
    }

    /// Read a single bit
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Discard remaining bits in current byte, align to next byte boundary
    pub fn align_to_byte(&mut self) {
        let discard = self.bits_available % 8;
        if discard > 0 {
            self.buffer >>= discard;
            self.bits_available -= discard;
        }
    }

    /// Read a 16-bit little-endian value (aligns to byte boundary first)
    pub fn read_u16_le(&mut self) -> Result<u16> {
        self.align_to_byte();
        let lo = self.read_bits(8)? as u16;
        let hi = self.read_bits(8)? as u16;
        Ok(lo | (hi << 8))
    }

    /// Read exactly `buf.len()` bytes (aligns to byte boundary first)
    ///
    /// Drains whole bytes still held in the bit buffer, then copies the rest
    /// straight from the input slice.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        self.align_to_byte();

        let mut filled = 0;
        while filled < buf.len() && self.bits_available >= 8 {
            buf[filled] = self.buffer as u8;
            self.buffer >>= 8;
            self.bits_available -= 8;
            filled += 1;
        }

        let rest = buf.len() - filled;
        if self.data.len() - self.pos < rest {
            return Err(Error::UnexpectedEof);
        }
        buf[filled..].copy_from_slice(&self.data[self.pos..self.pos + rest]);
        self.pos += rest;
        Ok(())
    }

    /// Number of input bytes consumed so far, counting a partially read
    /// byte as consumed. Bytes sitting unread in the look-ahead buffer are
    /// not counted.
    pub fn bytes_consumed(&self) -> usize {
        self.pos - (self.bits_available / 8) as usize
    }
}
