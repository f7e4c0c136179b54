use super::tables::MAX_DISTANCE;
use crate::error::{Error, Result};

const WINDOW_MASK: usize = MAX_DISTANCE - 1;

/// 32KB circular buffer holding the most recent decoded output
pub struct SlidingWindow {
    buffer: Box<[u8]>,
    /// Next write position (0-32767)
    write_pos: usize,
    /// Total bytes ever written
    total_written: u64,
}

impl SlidingWindow {
    pub fn new() -> Self {
        Self { buffer: vec![0u8; MAX_DISTANCE].into_boxed_slice(), write_pos: 0, total_written: 0 }
    }

    /// Add a single byte to the window
    #[inline]
    pub fn push_byte(&mut self, byte: u8) {
        self.buffer[self.write_pos] = byte;
        self.write_pos = (self.write_pos + 1) & WINDOW_MASK;
        self.total_written += 1;
    }

    /// Add multiple bytes to the window
    ///
    /// Only the last 32KB of `bytes` can survive, so anything older is
    /// skipped and the rest is copied in at most two runs.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.total_written += bytes.len() as u64;
        let tail = &bytes[bytes.len().saturating_sub(MAX_DISTANCE)..];
        self.write_pos = (self.write_pos + (bytes.len() - tail.len())) & WINDOW_MASK;

        let first = tail.len().min(MAX_DISTANCE - self.write_pos);
        self.buffer[self.write_pos..self.write_pos + first].copy_from_slice(&tail[..first]);
        let rest = &tail[first..];
        self.buffer[..rest.len()].copy_from_slice(rest);
        self.write_pos = (self.write_pos + tail.len()) & WINDOW_MASK;
    }

    /// Replay a back-reference: copy `length` bytes starting `distance` bytes
    /// back, appending them to both the window and `out`
    ///
    /// `distance = 1` means the most recently written byte. Length may exceed
    /// distance; the copy then repeats bytes it has just produced.
    pub fn copy_match(&mut self, distance: u16, length: u16, out: &mut Vec<u8>) -> Result<()> {
        let available = self.available();
        if distance == 0 || distance as usize > available {
            return Err(Error::InvalidDistance { distance, available });
        }

        out.reserve(length as usize);
        let mut read_pos = (self.write_pos + MAX_DISTANCE - distance as usize) & WINDOW_MASK;
        for _ in 0..length {
            let byte = self.buffer[read_pos];
            read_pos = (read_pos + 1) & WINDOW_MASK;
            self.push_byte(byte);
            out.push(byte);
        }
        Ok(())
    }

    /// Get available window size
    pub fn available(&self) -> usize {
        self.total_written.min(MAX_DISTANCE as u64) as usize
    }

    /// Get total bytes written
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Reset the window
    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.total_written = 0;
    }
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self::new()
    }
}
