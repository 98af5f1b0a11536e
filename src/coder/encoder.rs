//! CABAC binary arithmetic encoder.
//!
//! Register layout follows the classic 9-bit `range` / 10-bit `low` engine.
//! Carries are resolved with an outstanding-bit counter: while `low` sits
//! astride the half-way point the next bit is unknown, so renormalization
//! only counts it and the following decided bit is emitted together with
//! that many complemented bits.

use std::fmt;

use tracing::debug;

use super::observer::{BinEvent, BinKind, BinObserver};
use super::{
    check_range, expect_open, expect_state, BinEncoder, CoderOptions, CoderState, INITIAL_RANGE,
    MIN_RANGE,
};
use crate::bitstream::BitSink;
use crate::context::ContextModel;
use crate::error::Result;
use crate::tables::LPS_TABLE;

/// Bits collected until a full byte can go to the sink.
///
/// A fresh byte waits for nine bits: the very first bit produced after
/// `start()` is always zero and never reaches the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingByte {
    value: u32,
    bits_left: u32,
}

impl PendingByte {
    const FIRST: Self = Self {
        value: 0,
        bits_left: 9,
    };
    const EMPTY: Self = Self {
        value: 0,
        bits_left: 8,
    };

    #[inline]
    fn push(&mut self, bit: bool) -> Option<u8> {
        self.value = (self.value << 1) | u32::from(bit);
        self.bits_left -= 1;
        if self.bits_left == 0 {
            let byte = (self.value & 0xFF) as u8;
            *self = Self::EMPTY;
            Some(byte)
        } else {
            None
        }
    }

    /// Bits that will reach the sink.
    #[inline]
    fn real_bits(&self) -> u32 {
        8u32.saturating_sub(self.bits_left)
    }
}

/// Saved encoder state, see [`CabacEncoder::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSnapshot {
    low: u32,
    range: u32,
    bits_to_follow: u32,
    pending: PendingByte,
    state: CoderState,
    bins_coded: u64,
    bin_index: u64,
    bit_base: u64,
    sink_bits: u64,
}

impl EncoderSnapshot {
    /// Sink position the snapshot rewinds to.
    pub fn sink_bits(&self) -> u64 {
        self.sink_bits
    }
}

/// Arithmetic encoder writing into any [`BitSink`].
///
/// # Example
///
/// ```
/// use hevc_cabac::{BitWriter, CabacEncoder, ContextModel};
///
/// let mut ctx = ContextModel::new(0, false);
/// let mut enc = CabacEncoder::new(BitWriter::new());
/// enc.start();
/// for bin in [true, false, true, true, false] {
///     enc.encode_bin(bin, &mut ctx).unwrap();
/// }
/// enc.finish_unit().unwrap();
/// let bytes = enc.into_sink().into_bytes();
/// assert!(!bytes.is_empty());
/// ```
pub struct CabacEncoder<S: BitSink> {
    sink: S,
    low: u32,
    range: u32,
    bits_to_follow: u32,
    pending: PendingByte,
    state: CoderState,
    options: CoderOptions,
    bins_coded: u64,
    bin_index: u64,
    /// Sink position accounting restarts from
    bit_base: u64,
    observer: Option<Box<dyn BinObserver>>,
}

impl<S: BitSink> CabacEncoder<S> {
    pub fn new(sink: S) -> Self {
        Self::with_options(sink, CoderOptions::default())
    }

    pub fn with_options(sink: S, options: CoderOptions) -> Self {
        Self {
            sink,
            low: 0,
            range: INITIAL_RANGE,
            bits_to_follow: 0,
            pending: PendingByte::FIRST,
            state: CoderState::Uninitialized,
            options,
            bins_coded: 0,
            bin_index: 0,
            bit_base: 0,
            observer: None,
        }
    }

    /// Report every coded bin to `observer`.
    pub fn with_observer(mut self, observer: impl BinObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Begin a coded unit.
    pub fn start(&mut self) {
        self.low = 0;
        self.range = INITIAL_RANGE;
        self.bits_to_follow = 0;
        self.pending = PendingByte::FIRST;
        self.bins_coded = 0;
        self.bit_base = self.sink.written_bits();
        self.state = CoderState::Ready;
        debug!(sink_bits = self.bit_base, "CABAC encoder started");
    }

    /// Code one bin with the probability held by `ctx`, then adapt `ctx`.
    pub fn encode_bin(&mut self, bin: bool, ctx: &mut ContextModel) -> Result<()> {
        expect_state(self.state, CoderState::Ready)?;
        self.notify(
            BinKind::Context {
                state: ctx.state(),
                mps: ctx.mps(),
            },
            bin,
        );

        let lps = u32::from(LPS_TABLE[usize::from(ctx.state())][((self.range >> 6) & 3) as usize]);
        self.range -= lps;
        if bin == ctx.mps() {
            ctx.update_mps();
        } else {
            self.low += self.range;
            self.range = lps;
            ctx.update_lps();
        }
        self.renormalize()
    }

    /// Code one equiprobable bin.
    pub fn encode_bin_ep(&mut self, bin: bool) -> Result<()> {
        expect_state(self.state, CoderState::Ready)?;
        self.notify(BinKind::Bypass, bin);

        self.low <<= 1;
        if bin {
            self.low += self.range;
        }
        if self.low >= 1024 {
            self.put_bit(true);
            self.low -= 1024;
        } else if self.low < 512 {
            self.put_bit(false);
        } else {
            self.low -= 512;
            self.bits_to_follow += 1;
        }
        Ok(())
    }

    /// Code the low `num_bins` bits of `value` as bypass bins, MSB first.
    pub fn encode_bins_ep(&mut self, value: u32, num_bins: u32) -> Result<()> {
        debug_assert!(num_bins <= 32);
        for shift in (0..num_bins).rev() {
            self.encode_bin_ep((value >> shift) & 1 != 0)?;
        }
        Ok(())
    }

    /// Code the terminating bin. A `true` bin ends the coded unit.
    pub fn encode_bin_trm(&mut self, bin: bool) -> Result<()> {
        expect_state(self.state, CoderState::Ready)?;
        self.notify(BinKind::Terminate, bin);

        self.range -= 2;
        if bin {
            self.low += self.range;
            self.range = 2;
        }
        self.renormalize()?;
        if bin {
            self.state = CoderState::Terminated;
        }
        Ok(())
    }

    /// Flush `low` and the pending byte to the sink.
    pub fn finish(&mut self) -> Result<()> {
        expect_open(self.state)?;

        self.put_bit((self.low >> 9) & 1 != 0);
        let bit = (self.low >> 8) & 1 != 0;
        if let Some(byte) = self.pending.push(bit) {
            self.sink.write(u32::from(byte), 8);
        }

        let tail = self.pending.real_bits();
        if tail > 0 {
            let mask = (1u32 << tail) - 1;
            self.sink.write(self.pending.value & mask, tail);
        }
        self.pending = PendingByte::EMPTY;
        self.state = CoderState::Finished;

        debug!(
            bits = self.num_written_bits(),
            bins = self.bins_coded,
            "CABAC encoder finished"
        );
        Ok(())
    }

    /// Close a coded unit so a decoder consumes exactly the emitted bits:
    /// terminating bin `1`, flush, then a stop bit and zero alignment.
    ///
    /// A terminating `1` already coded is not repeated.
    pub fn finish_unit(&mut self) -> Result<()> {
        if self.state != CoderState::Terminated {
            self.encode_bin_trm(true)?;
        }
        self.finish()?;
        self.sink.write_trailing_bits();
        Ok(())
    }

    /// Restart rate accounting from the current sink position.
    ///
    /// Outstanding and pending bits are dropped, so the stream written so far
    /// is no longer decodable. Only meant for coders that measure rate.
    pub fn reset_bits(&mut self) {
        self.low &= 0xFF;
        self.bits_to_follow = 0;
        self.pending = PendingByte::FIRST;
        self.bit_base = self.sink.written_bits();
    }

    /// Whole bits produced since the last `start()` or `reset_bits()`,
    /// counting bits still held back by the carry logic.
    pub fn num_written_bits(&self) -> u64 {
        self.sink.written_bits() - self.bit_base
            + u64::from(self.bits_to_follow)
            + u64::from(self.pending.real_bits())
    }

    /// Bins coded since `start()`; zero unless `count_bins` is enabled.
    pub fn bins_coded(&self) -> u64 {
        self.bins_coded
    }

    pub fn state(&self) -> CoderState {
        self.state
    }

    pub fn range(&self) -> u32 {
        self.range
    }

    pub fn low(&self) -> u32 {
        self.low
    }

    pub fn options(&self) -> CoderOptions {
        self.options
    }

    /// Capture registers and the sink position.
    pub fn snapshot(&self) -> EncoderSnapshot {
        EncoderSnapshot {
            low: self.low,
            range: self.range,
            bits_to_follow: self.bits_to_follow,
            pending: self.pending,
            state: self.state,
            bins_coded: self.bins_coded,
            bin_index: self.bin_index,
            bit_base: self.bit_base,
            sink_bits: self.sink.written_bits(),
        }
    }

    /// Return to `snapshot`, dropping sink output written after it.
    pub fn restore(&mut self, snapshot: &EncoderSnapshot) {
        self.sink.rewind(snapshot.sink_bits);
        self.low = snapshot.low;
        self.range = snapshot.range;
        self.bits_to_follow = snapshot.bits_to_follow;
        self.pending = snapshot.pending;
        self.state = snapshot.state;
        self.bins_coded = snapshot.bins_coded;
        self.bin_index = snapshot.bin_index;
        self.bit_base = snapshot.bit_base;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn renormalize(&mut self) -> Result<()> {
        while self.range < MIN_RANGE {
            if self.low >= 512 {
                self.put_bit(true);
                self.low -= 512;
            } else if self.low < 256 {
                self.put_bit(false);
            } else {
                self.bits_to_follow += 1;
                self.low -= 256;
            }
            self.low <<= 1;
            self.range <<= 1;
        }
        if self.options.check_invariants {
            check_range(self.range)?;
        }
        Ok(())
    }

    #[inline]
    fn put_bit(&mut self, bit: bool) {
        self.push_bit(bit);
        while self.bits_to_follow > 0 {
            self.push_bit(!bit);
            self.bits_to_follow -= 1;
        }
    }

    #[inline]
    fn push_bit(&mut self, bit: bool) {
        if let Some(byte) = self.pending.push(bit) {
            self.sink.write(u32::from(byte), 8);
        }
    }

    #[inline]
    fn notify(&mut self, kind: BinKind, bin: bool) {
        if self.options.count_bins {
            self.bins_coded += 1;
        }
        if let Some(observer) = self.observer.as_mut() {
            observer.on_bin(&BinEvent {
                index: self.bin_index,
                kind,
                bin,
            });
        }
        self.bin_index += 1;
    }
}

impl<S: BitSink> fmt::Debug for CabacEncoder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CabacEncoder")
            .field("low", &self.low)
            .field("range", &self.range)
            .field("bits_to_follow", &self.bits_to_follow)
            .field("state", &self.state)
            .field("written_bits", &self.num_written_bits())
            .finish_non_exhaustive()
    }
}

impl<S: BitSink> BinEncoder for CabacEncoder<S> {
    type Snapshot = EncoderSnapshot;

    fn start(&mut self) {
        Self::start(self);
    }

    fn encode_bin(&mut self, bin: bool, ctx: &mut ContextModel) -> Result<()> {
        Self::encode_bin(self, bin, ctx)
    }

    fn encode_bin_ep(&mut self, bin: bool) -> Result<()> {
        Self::encode_bin_ep(self, bin)
    }

    fn encode_bins_ep(&mut self, value: u32, num_bins: u32) -> Result<()> {
        Self::encode_bins_ep(self, value, num_bins)
    }

    fn encode_bin_trm(&mut self, bin: bool) -> Result<()> {
        Self::encode_bin_trm(self, bin)
    }

    fn finish(&mut self) -> Result<()> {
        Self::finish(self)
    }

    fn num_written_bits(&self) -> u64 {
        Self::num_written_bits(self)
    }

    fn reset_bits(&mut self) {
        Self::reset_bits(self);
    }

    fn snapshot(&self) -> EncoderSnapshot {
        Self::snapshot(self)
    }

    fn restore(&mut self, snapshot: &EncoderSnapshot) {
        Self::restore(self, snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitstream::{BitCounter, BitWriter};
    use crate::error::CabacError;

    fn started() -> CabacEncoder<BitWriter> {
        let mut enc = CabacEncoder::new(BitWriter::new());
        enc.start();
        enc
    }

    #[test]
    fn test_start_registers() {
        let enc = started();
        assert_eq!(enc.range(), 510);
        assert_eq!(enc.low(), 0);
        assert_eq!(enc.num_written_bits(), 0);
        assert_eq!(enc.state(), CoderState::Ready);
    }

    #[test]
    fn test_encode_before_start() {
        let mut enc = CabacEncoder::new(BitWriter::new());
        let mut ctx = ContextModel::default();
        assert_eq!(
            enc.encode_bin(true, &mut ctx),
            Err(CabacError::InvalidState {
                expected: CoderState::Ready,
                actual: CoderState::Uninitialized,
            })
        );
        // Context untouched on error
        assert_eq!(ctx, ContextModel::default());
    }

    #[test]
    fn test_encode_after_finish() {
        let mut enc = started();
        enc.finish().unwrap();
        assert!(matches!(
            enc.encode_bin_ep(true),
            Err(CabacError::InvalidState {
                actual: CoderState::Finished,
                ..
            })
        ));
        // Restart is allowed
        enc.start();
        enc.encode_bin_ep(true).unwrap();
    }

    #[test]
    fn test_range_stays_in_interval() {
        let mut enc = started();
        let mut ctx = ContextModel::new(30, true);
        for i in 0..500u32 {
            enc.encode_bin(i % 7 == 0, &mut ctx).unwrap();
            assert!((256..=510).contains(&enc.range()), "range {}", enc.range());
            enc.encode_bin_ep(i % 3 == 0).unwrap();
            assert!(enc.low() < 1024);
        }
    }

    #[test]
    fn test_mps_run_at_saturation_is_cheap() {
        let mut enc = started();
        let mut ctx = ContextModel::new(62, true);
        for _ in 0..1000 {
            enc.encode_bin(true, &mut ctx).unwrap();
        }
        // ~0.029 bit per bin
        assert!(enc.num_written_bits() < 60, "{}", enc.num_written_bits());
    }

    #[test]
    fn test_bypass_costs_one_bit_each() {
        let mut enc = started();
        enc.encode_bins_ep(0b1011_0010_1110, 12).unwrap();
        // One leading bit is still undecided
        assert_eq!(enc.num_written_bits(), 11);
        // Flush adds two register bits
        enc.finish().unwrap();
        assert_eq!(enc.num_written_bits(), 13);
        assert_eq!(enc.sink().written_bits(), 13);
    }

    #[test]
    fn test_bit_accounting_matches_sink() {
        let mut enc = started();
        let mut ctx = ContextModel::new(5, false);
        for i in 0..333u32 {
            enc.encode_bin(i % 5 == 1, &mut ctx).unwrap();
        }
        enc.finish().unwrap();
        assert_eq!(enc.num_written_bits(), enc.sink().written_bits());
    }

    #[test]
    fn test_nothing_after_terminate() {
        let mut enc = started();
        enc.encode_bin_trm(true).unwrap();
        assert_eq!(enc.state(), CoderState::Terminated);
        assert_eq!(
            enc.encode_bin_ep(true),
            Err(CabacError::InvalidState {
                expected: CoderState::Ready,
                actual: CoderState::Terminated,
            })
        );
        let mut ctx = ContextModel::new(5, false);
        assert!(enc.encode_bin(false, &mut ctx).is_err());
        assert!(enc.encode_bin_trm(true).is_err());

        enc.finish_unit().unwrap();
        assert_eq!(enc.state(), CoderState::Finished);
        let mut direct = started();
        direct.finish_unit().unwrap();
        assert_eq!(enc.into_sink().into_bytes(), direct.into_sink().into_bytes());
    }

    #[test]
    fn test_finish_unit_is_byte_aligned() {
        let mut enc = started();
        enc.finish_unit().unwrap();
        // 9 register bits minus the dropped leading bit, then the stop bit
        assert_eq!(enc.sink().written_bits(), 16);
        assert!(enc.sink().is_aligned());
    }

    #[test]
    fn test_reset_bits_keeps_contexts() {
        let mut enc = CabacEncoder::new(BitCounter::new());
        enc.start();
        let mut ctx = ContextModel::new(10, true);
        for _ in 0..64 {
            enc.encode_bin(false, &mut ctx).unwrap();
        }
        let before = ctx;
        enc.reset_bits();
        assert_eq!(enc.num_written_bits(), 0);
        assert_eq!(ctx, before);
        assert!(enc.low() < 256);
    }

    #[test]
    fn test_snapshot_restore_rewinds_sink() {
        let mut enc = started();
        let mut ctx = ContextModel::new(20, false);
        enc.encode_bins_ep(0xA5, 8).unwrap();
        let snap = enc.snapshot();
        let ctx_before = ctx;

        for _ in 0..40 {
            enc.encode_bin(true, &mut ctx).unwrap();
        }
        enc.restore(&snap);
        ctx = ctx_before;
        assert_eq!(enc.sink().written_bits(), snap.sink_bits());

        enc.encode_bin(false, &mut ctx).unwrap();
        enc.finish_unit().unwrap();
        let resumed = enc.into_sink().into_bytes();

        let mut fresh = started();
        let mut ctx = ContextModel::new(20, false);
        fresh.encode_bins_ep(0xA5, 8).unwrap();
        fresh.encode_bin(false, &mut ctx).unwrap();
        fresh.finish_unit().unwrap();
        assert_eq!(resumed, fresh.into_sink().into_bytes());
    }

    #[test]
    fn test_bin_counting() {
        let options = CoderOptions {
            count_bins: true,
            ..CoderOptions::default()
        };
        let mut enc = CabacEncoder::with_options(BitCounter::new(), options);
        enc.start();
        let mut ctx = ContextModel::default();
        enc.encode_bin(true, &mut ctx).unwrap();
        enc.encode_bins_ep(3, 2).unwrap();
        enc.encode_bin_trm(false).unwrap();
        assert_eq!(enc.bins_coded(), 4);

        let mut quiet = CabacEncoder::new(BitCounter::new());
        quiet.start();
        quiet.encode_bin_ep(true).unwrap();
        assert_eq!(quiet.bins_coded(), 0);
    }
}
