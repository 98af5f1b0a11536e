//! Bit-level I/O for the arithmetic coder.
//!
//! The coder never touches bytes directly: the encoder appends through a
//! [`BitSink`] and the decoder consumes through a [`BitSource`]. Both move
//! bits most-significant first.
//!
//! | Type | Trait | Use |
//! |------|-------|-----|
//! | [`BitWriter`] | [`BitSink`] | Real emission into an owned byte buffer |
//! | [`BitCounter`] | [`BitSink`] | Rate accounting without storing anything |
//! | [`BitReader`] | [`BitSource`] | Decoding from a byte slice |

mod bit_counter;
mod bit_reader;
mod bit_writer;

pub use bit_counter::BitCounter;
pub use bit_reader::BitReader;
pub use bit_writer::{BitCursor, BitWriter};

use crate::error::Result;

/// Append-only destination for encoder output.
pub trait BitSink {
    /// Append the low `num_bits` bits of `value`, MSB first.
    fn write(&mut self, value: u32, num_bits: u32);

    /// Number of bits appended so far.
    fn written_bits(&self) -> u64;

    /// Drop everything appended after `bit_count`.
    ///
    /// Only used to undo speculative work; `bit_count` must not exceed
    /// [`written_bits`](Self::written_bits).
    fn rewind(&mut self, bit_count: u64);

    /// Append a stop bit and zero bits up to the next byte boundary.
    fn write_trailing_bits(&mut self) {
        self.write(1, 1);
        let pad = (8 - (self.written_bits() % 8) as u32) % 8;
        if pad > 0 {
            self.write(0, pad);
        }
    }
}

/// Bit supply for the decoder.
pub trait BitSource {
    /// Read `num_bits` (at most 16) bits, MSB first.
    fn read(&mut self, num_bits: u32) -> Result<u32>;

    /// Number of bits consumed so far.
    fn bits_read(&self) -> u64;

    /// Number of bits still available.
    fn bits_remaining(&self) -> u64;
}

impl<T: BitSink + ?Sized> BitSink for &mut T {
    #[inline]
    fn write(&mut self, value: u32, num_bits: u32) {
        (**self).write(value, num_bits);
    }

    #[inline]
    fn written_bits(&self) -> u64 {
        (**self).written_bits()
    }

    fn rewind(&mut self, bit_count: u64) {
        (**self).rewind(bit_count);
    }
}

impl<T: BitSource + ?Sized> BitSource for &mut T {
    #[inline]
    fn read(&mut self, num_bits: u32) -> Result<u32> {
        (**self).read(num_bits)
    }

    fn bits_read(&self) -> u64 {
        (**self).bits_read()
    }

    fn bits_remaining(&self) -> u64 {
        (**self).bits_remaining()
    }
}
