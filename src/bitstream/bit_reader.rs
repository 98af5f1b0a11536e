//! Bit reader for coded substreams.
//!
//! Reads bits from a byte slice, MSB first.

use super::BitSource;
use crate::error::{CabacError, Result};

/// Bit reader that reads from a byte slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    bit_pos: u64,
    /// Current bit buffer (up to 32 bits), left-aligned
    buffer: u32,
    /// Bits available in buffer
    bits_in_buffer: u32,
}

impl<'a> BitReader<'a> {
    /// Create a new bit reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        let mut reader = Self {
            data,
            pos: 0,
            bit_pos: 0,
            buffer: 0,
            bits_in_buffer: 0,
        };
        reader.fill_buffer();
        reader
    }

    /// Fill the buffer with more bytes.
    fn fill_buffer(&mut self) {
        while self.bits_in_buffer <= 24 && self.pos < self.data.len() {
            self.buffer |= u32::from(self.data[self.pos]) << (24 - self.bits_in_buffer);
            self.bits_in_buffer += 8;
            self.pos += 1;
        }
    }

    /// Peek at the next n bits without consuming them.
    #[inline]
    pub fn peek_bits(&self, n: u32) -> u32 {
        debug_assert!(n > 0 && n <= 16);
        self.buffer >> (32 - n)
    }

    /// Read n bits and advance the position.
    #[inline]
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        debug_assert!(n <= 16);
        if n == 0 {
            return Ok(0);
        }

        if n > self.bits_in_buffer {
            return Err(CabacError::StreamExhausted {
                requested: n,
                available: self.remaining_bits(),
            });
        }

        let value = self.peek_bits(n);
        self.advance_bits(n);
        Ok(value)
    }

    /// Advance by n bits.
    #[inline]
    fn advance_bits(&mut self, n: u32) {
        self.buffer <<= n;
        self.bits_in_buffer = self.bits_in_buffer.saturating_sub(n);
        self.bit_pos += u64::from(n);
        self.fill_buffer();
    }

    /// Read a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Bits left before the next byte boundary.
    pub fn bits_to_alignment(&self) -> u32 {
        ((8 - self.bit_pos % 8) % 8) as u32
    }

    /// Get the current bit position.
    pub fn bit_position(&self) -> u64 {
        self.bit_pos
    }

    /// Check if at end of data.
    pub fn is_eof(&self) -> bool {
        self.bits_in_buffer == 0 && self.pos >= self.data.len()
    }

    /// Remaining bits available.
    pub fn remaining_bits(&self) -> u64 {
        u64::from(self.bits_in_buffer) + ((self.data.len() - self.pos) as u64 * 8)
    }
}

impl BitSource for BitReader<'_> {
    #[inline]
    fn read(&mut self, num_bits: u32) -> Result<u32> {
        self.read_bits(num_bits)
    }

    fn bits_read(&self) -> u64 {
        self.bit_pos
    }

    fn bits_remaining(&self) -> u64 {
        self.remaining_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bits() {
        let data = [0b10110100, 0b11001010];
        let mut reader = BitReader::new(&data);

        assert_eq!(reader.read_bits(4).unwrap(), 0b1011);
        assert_eq!(reader.read_bits(4).unwrap(), 0b0100);
        assert_eq!(reader.read_bits(8).unwrap(), 0b11001010);
    }

    #[test]
    fn test_read_across_bytes() {
        let data = [0b10110100, 0b11001010];
        let mut reader = BitReader::new(&data);

        assert_eq!(reader.read_bits(9).unwrap(), 0b101101001);
        assert_eq!(reader.bits_to_alignment(), 7);
        assert_eq!(reader.read_bits(7).unwrap(), 0b1001010);
        assert_eq!(reader.bits_to_alignment(), 0);
    }

    #[test]
    fn test_peek_bits() {
        let data = [0b10110100];
        let reader = BitReader::new(&data);

        assert_eq!(reader.peek_bits(4), 0b1011);
        assert_eq!(reader.peek_bits(8), 0b10110100);
    }

    #[test]
    fn test_eof() {
        let data = [0xFF];
        let mut reader = BitReader::new(&data);

        assert!(!reader.is_eof());
        reader.read_bits(8).unwrap();
        assert!(reader.is_eof());
        assert_eq!(
            reader.read_bit(),
            Err(CabacError::StreamExhausted {
                requested: 1,
                available: 0
            })
        );
    }

    #[test]
    fn test_long_stream_position() {
        let data = vec![0xA5; 64];
        let mut reader = BitReader::new(&data);
        let mut total = 0;
        while reader.remaining_bits() >= 3 {
            reader.read(3).unwrap();
            total += 3;
        }
        assert_eq!(reader.bits_read(), total);
        assert_eq!(reader.bits_remaining(), 64 * 8 - total);
    }
}
