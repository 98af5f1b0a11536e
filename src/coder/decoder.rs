//! CABAC binary arithmetic decoder.
//!
//! Mirrors [`CabacEncoder`](super::CabacEncoder) register for register: the
//! 9-bit `value` window tracks the encoder's `low` relative to the current
//! interval, so both sides renormalize on exactly the same bins.

use std::fmt;

use tracing::{debug, warn};

use super::observer::{BinEvent, BinKind, BinObserver};
use super::{check_range, expect_state, CoderOptions, CoderState, INITIAL_RANGE, MIN_RANGE};
use crate::bitstream::BitSource;
use crate::context::ContextModel;
use crate::error::{CabacError, Result};
use crate::tables::LPS_TABLE;

/// Arithmetic decoder reading from any [`BitSource`].
pub struct CabacDecoder<S: BitSource> {
    source: S,
    range: u32,
    value: u32,
    state: CoderState,
    options: CoderOptions,
    bins_decoded: u64,
    bin_index: u64,
    observer: Option<Box<dyn BinObserver>>,
}

impl<S: BitSource> CabacDecoder<S> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, CoderOptions::default())
    }

    pub fn with_options(source: S, options: CoderOptions) -> Self {
        Self {
            source,
            range: INITIAL_RANGE,
            value: 0,
            state: CoderState::Uninitialized,
            options,
            bins_decoded: 0,
            bin_index: 0,
            observer: None,
        }
    }

    /// Report every decoded bin to `observer`.
    pub fn with_observer(mut self, observer: impl BinObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Begin a coded unit by loading the first 9 bits.
    ///
    /// On failure the decoder is left `Uninitialized`.
    pub fn start(&mut self) -> Result<()> {
        self.state = CoderState::Uninitialized;
        self.range = INITIAL_RANGE;
        self.value = 0;
        self.bins_decoded = 0;
        let value = self.read(9)?;
        if value >= self.range {
            return Err(CabacError::InvariantViolation {
                register: "value",
                value,
            });
        }
        self.value = value;
        self.state = CoderState::Ready;
        debug!(bit_position = self.source.bits_read(), "CABAC decoder started");
        Ok(())
    }

    /// Decode one bin with the probability held by `ctx`, then adapt `ctx`.
    pub fn decode_bin(&mut self, ctx: &mut ContextModel) -> Result<bool> {
        expect_state(self.state, CoderState::Ready)?;
        let kind = BinKind::Context {
            state: ctx.state(),
            mps: ctx.mps(),
        };

        let lps = u32::from(LPS_TABLE[usize::from(ctx.state())][((self.range >> 6) & 3) as usize]);
        self.range -= lps;
        let bin = if self.value < self.range {
            let bin = ctx.mps();
            ctx.update_mps();
            bin
        } else {
            self.value -= self.range;
            self.range = lps;
            let bin = !ctx.mps();
            ctx.update_lps();
            bin
        };

        self.renormalize()?;
        self.notify(kind, bin);
        Ok(bin)
    }

    /// Decode one equiprobable bin.
    pub fn decode_bin_ep(&mut self) -> Result<bool> {
        expect_state(self.state, CoderState::Ready)?;
        self.value = (self.value << 1) | self.read(1)?;
        let bin = self.value >= self.range;
        if bin {
            self.value -= self.range;
        }
        self.notify(BinKind::Bypass, bin);
        Ok(bin)
    }

    /// Decode `num_bins` bypass bins, MSB first.
    pub fn decode_bins_ep(&mut self, num_bins: u32) -> Result<u32> {
        debug_assert!(num_bins <= 32);
        let mut value = 0u32;
        for _ in 0..num_bins {
            value = (value << 1) | u32::from(self.decode_bin_ep()?);
        }
        Ok(value)
    }

    /// Decode the terminating bin.
    pub fn decode_bin_trm(&mut self) -> Result<bool> {
        expect_state(self.state, CoderState::Ready)?;
        self.range -= 2;
        let bin = self.value >= self.range;
        if bin {
            self.state = CoderState::Terminated;
        } else {
            self.renormalize()?;
        }
        self.notify(BinKind::Terminate, bin);
        Ok(bin)
    }

    /// Consume the alignment bits after the terminating bin.
    ///
    /// Fails with [`CabacError::TrailingBits`] if any of them is set.
    pub fn finish(&mut self) -> Result<()> {
        expect_state(self.state, CoderState::Terminated)?;
        let pad = ((8 - self.source.bits_read() % 8) % 8) as u32;
        if self.read(pad)? != 0 {
            return Err(CabacError::TrailingBits);
        }
        self.state = CoderState::Finished;
        debug!(
            bit_position = self.source.bits_read(),
            bins = self.bins_decoded,
            "CABAC decoder finished"
        );
        Ok(())
    }

    /// Bins decoded since `start()`; zero unless `count_bins` is enabled.
    pub fn bins_decoded(&self) -> u64 {
        self.bins_decoded
    }

    pub fn state(&self) -> CoderState {
        self.state
    }

    pub fn range(&self) -> u32 {
        self.range
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    fn renormalize(&mut self) -> Result<()> {
        while self.range < MIN_RANGE {
            self.range <<= 1;
            self.value = (self.value << 1) | self.read(1)?;
        }
        if self.options.check_invariants {
            check_range(self.range)?;
        }
        Ok(())
    }

    #[inline]
    fn read(&mut self, num_bits: u32) -> Result<u32> {
        self.source.read(num_bits).inspect_err(|err| {
            warn!(
                bit_position = self.source.bits_read(),
                bins = self.bin_index,
                "CABAC decoder ran out of input: {err}"
            );
        })
    }

    #[inline]
    fn notify(&mut self, kind: BinKind, bin: bool) {
        if self.options.count_bins {
            self.bins_decoded += 1;
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

impl<S: BitSource> fmt::Debug for CabacDecoder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CabacDecoder")
            .field("range", &self.range)
            .field("value", &self.value)
            .field("state", &self.state)
            .field("bit_position", &self.source.bits_read())
            .finish_non_exhaustive()
    }
}
