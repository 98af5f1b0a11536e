//! Sink that only counts bits.

use super::BitSink;

/// Counts written bits and discards them.
///
/// Backs encoders that only exist to measure rate during mode decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitCounter {
    bits: u64,
}

impl BitCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything counted so far.
    pub fn reset(&mut self) {
        self.bits = 0;
    }
}

impl BitSink for BitCounter {
    #[inline(always)]
    fn write(&mut self, _value: u32, num_bits: u32) {
        self.bits += u64::from(num_bits);
    }

    fn written_bits(&self) -> u64 {
        self.bits
    }

    fn rewind(&mut self, bit_count: u64) {
        debug_assert!(bit_count <= self.bits);
        self.bits = bit_count;
    }
}
