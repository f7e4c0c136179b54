/// Bit-level writer for DEFLATE output
///
/// Writes bits LSB-first to match DEFLATE format. Bits accumulate in a
/// 64-bit buffer and are flushed to the output a byte at a time.
pub struct BitWriter {
    /// Accumulated output bytes
    output: Vec<u8>,
    /// Pending bits not yet flushed to `output`
    buffer: u64,
    /// Number of valid bits in `buffer` (0-7 between calls)
    bits_in_buffer: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::with_capacity(65536)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { output: Vec::with_capacity(capacity), buffer: 0, bits_in_buffer: 0 }
    }

    /// Write `n` bits (1-32) from value in LSB-first order
    pub fn write_bits(&mut self, value: u32, n: u8) {
        debug_assert!(n <= 32);

        if n == 0 {
            return;
        }

        let mask = (1u64 << n) - 1;
        self.buffer |= (value as u64 & mask) << self.bits_in_buffer;
        self.bits_in_buffer += n;

        while self.bits_in_buffer >= 8 {
            self.output.push(self.buffer as u8);
            self.buffer >>= 8;
            self.bits_in_buffer -= 8;
        }
    }

    /// Write a single bit
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(bit as u32, 1);
    }

    /// Write bits in reversed order (for Huffman codes stored MSB-first)
    /// The code is `length` bits, with MSB first
    #[inline]
    pub fn write_bits_reversed(&mut self, code: u32, length: u8) {
        self.write_bits(reverse_bits(code, length), length);
    }

    /// Pad to byte boundary with zero bits
    pub fn align_to_byte(&mut self) {
        if self.bits_in_buffer > 0 {
            self.output.push(self.buffer as u8);
            self.buffer = 0;
            self.bits_in_buffer = 0;
        }
    }

    /// Write a 16-bit value in little-endian
    pub fn write_u16_le(&mut self, value: u16) {
        self.write_bits(value as u32, 16);
    }

    /// Write raw bytes
    ///
    /// Byte-aligned writes are appended directly; otherwise each byte goes
    /// through the bit buffer.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.bits_in_buffer == 0 {
            self.output.extend_from_slice(bytes);
        } else {
            for &b in bytes {
                self.write_bits(b as u32, 8);
            }
        }
    }

    /// Finish and return the output bytes
    pub fn finish(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.output
    }

    /// Number of bits written so far
    pub fn bit_len(&self) -> u64 {
        self.output.len() as u64 * 8 + self.bits_in_buffer as u64
    }

    /// Get current output length in bytes (including partial byte)
    pub fn len(&self) -> usize {
        self.output.len() + if self.bits_in_buffer > 0 { 1 } else { 0 }
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.output.is_empty() && self.bits_in_buffer == 0
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reverse the bottom `n` bits of `value`
pub(crate) fn reverse_bits(value: u32, n: u8) -> u32 {
    if n == 0 {
        return 0;
    }
    value.reverse_bits() >> (32 - n as u32)
}
