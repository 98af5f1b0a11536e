//! Bit writer backed by an owned byte buffer.

use super::BitSink;

/// Partially filled byte at the tail of a [`BitWriter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitCursor {
    /// Bits collected so far, right-aligned
    value: u8,
    /// Number of bits collected (0-7)
    len: u8,
}

impl BitCursor {
    /// Push one bit, returning the completed byte when it fills up.
    #[inline]
    pub fn push(&mut self, bit: bool) -> Option<u8> {
        self.value = (self.value << 1) | u8::from(bit);
        self.len += 1;
        if self.len == 8 {
            let byte = self.value;
            *self = Self::default();
            Some(byte)
        } else {
            None
        }
    }

    /// Number of bits waiting for a full byte.
    pub fn len(&self) -> u32 {
        u32::from(self.len)
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pending bits left-aligned in a byte, zero padded.
    pub fn padded(&self) -> u8 {
        if self.len == 0 {
            0
        } else {
            self.value << (8 - self.len)
        }
    }
}

/// Growable MSB-first bit buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitWriter {
    bytes: Vec<u8>,
    cursor: BitCursor,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            cursor: BitCursor::default(),
        }
    }

    /// Append a single bit.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        if let Some(byte) = self.cursor.push(bit) {
            self.bytes.push(byte);
        }
    }

    /// Whether the next bit starts a new byte.
    pub fn is_aligned(&self) -> bool {
        self.cursor.is_empty()
    }

    /// Completed bytes, excluding any partial tail.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// All written bits, the partial tail zero padded.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.bytes.clone();
        if !self.cursor.is_empty() {
            out.push(self.cursor.padded());
        }
        out
    }

    /// Consume the writer, zero padding the partial tail.
    pub fn into_bytes(mut self) -> Vec<u8> {
        if !self.cursor.is_empty() {
            self.bytes.push(self.cursor.padded());
        }
        self.bytes
    }
}

impl BitSink for BitWriter {
    #[inline]
    fn write(&mut self, value: u32, num_bits: u32) {
        debug_assert!(num_bits <= 32);
        if num_bits == 8 && self.cursor.is_empty() {
            self.bytes.push(value as u8);
            return;
        }
        for shift in (0..num_bits).rev() {
            self.write_bit((value >> shift) & 1 != 0);
        }
    }

    fn written_bits(&self) -> u64 {
        self.bytes.len() as u64 * 8 + u64::from(self.cursor.len())
    }

    fn rewind(&mut self, bit_count: u64) {
        debug_assert!(bit_count <= self.written_bits());
        let keep_bytes = (bit_count / 8) as usize;
        let tail_bits = (bit_count % 8) as u32;

        // Recover the tail bits before truncating their byte.
        let mut cursor = BitCursor::default();
        if tail_bits > 0 {
            let source = if keep_bytes < self.bytes.len() {
                self.bytes[keep_bytes]
            } else {
                self.cursor.padded()
            };
            for i in 0..tail_bits {
                cursor.push((source >> (7 - i)) & 1 != 0);
            }
        }
        self.bytes.truncate(keep_bytes);
        self.cursor = cursor;
    }
}
