//! Binary arithmetic coding engine.
//!
//! ## Coders
//!
//! | Type | Direction | Output |
//! |------|-----------|--------|
//! | [`CabacEncoder`] | bins → bits | Any [`BitSink`](crate::BitSink) |
//! | [`CabacDecoder`] | bits → bins | Reads a [`BitSource`](crate::BitSource) |
//! | [`BitEstimator`] | bins → cost | Fractional bits, nothing emitted |
//!
//! The encoder and the estimator share the [`BinEncoder`] capability set, so
//! syntax code can be written once and pointed at either real emission or
//! cost probing.
//!
//! ## Bin kinds
//!
//! | Kind | Probability | Context update |
//! |------|-------------|----------------|
//! | Context-coded | Adaptive, from a [`ContextModel`] | Yes |
//! | Bypass (EP) | Fixed 1/2 | No |
//! | Terminate | Fixed, `2 / range` | No |
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized --start()--> Ready --finish()--> Finished
//!                              ^                    |
//!                              +------start()-------+
//! ```
//!
//! A terminating bin equal to `1` moves encoder and decoder alike to
//! `Terminated`, where only `finish()` (or a new `start()`) is accepted.
//! The encoder also accepts `finish()` straight from `Ready`.

mod decoder;
mod encoder;
mod estimator;
mod observer;

pub use decoder::CabacDecoder;
pub use encoder::{CabacEncoder, EncoderSnapshot};
pub use estimator::{bin_cost, bypass_cost, terminate_cost, BitEstimator, EstimatorSnapshot};
pub use observer::{BinEvent, BinKind, BinObserver, TraceObserver};

use crate::context::ContextModel;
use crate::error::{CabacError, Result};

/// Initial value of the `range` register.
pub const INITIAL_RANGE: u32 = 510;

/// Lower bound of `range` after renormalization.
pub const MIN_RANGE: u32 = 256;

/// Upper bound of `range` after renormalization.
pub const MAX_RANGE: u32 = 510;

/// Lifecycle of a coder instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoderState {
    /// Constructed, `start()` not called yet
    Uninitialized,
    /// Accepting bins
    Ready,
    /// Terminating bin `1` coded, `finish()` pending
    Terminated,
    /// Flushed by `finish()`
    Finished,
}

/// Tunables shared by encoder and decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoderOptions {
    /// Count every coded bin (see `bins_coded()`).
    pub count_bins: bool,
    /// Verify the `range` interval after every renormalization.
    pub check_invariants: bool,
}

impl Default for CoderOptions {
    fn default() -> Self {
        Self {
            count_bins: false,
            check_invariants: cfg!(debug_assertions),
        }
    }
}

/// Operations every bin-level encoder backend provides.
pub trait BinEncoder {
    /// Saved state for rollback.
    type Snapshot: Clone;

    /// Reset to the start of a coded unit.
    fn start(&mut self);

    /// Code one bin against a context.
    fn encode_bin(&mut self, bin: bool, ctx: &mut ContextModel) -> Result<()>;

    /// Code one equiprobable bin.
    fn encode_bin_ep(&mut self, bin: bool) -> Result<()>;

    /// Code the low `num_bins` bits of `value` as bypass bins, MSB first.
    fn encode_bins_ep(&mut self, value: u32, num_bins: u32) -> Result<()> {
        debug_assert!(num_bins <= 32);
        for shift in (0..num_bins).rev() {
            self.encode_bin_ep((value >> shift) & 1 != 0)?;
        }
        Ok(())
    }

    /// Code the terminating bin.
    fn encode_bin_trm(&mut self, bin: bool) -> Result<()>;

    /// Flush the coded unit.
    fn finish(&mut self) -> Result<()>;

    /// Whole bits produced since the last `start()`/`reset_bits()`.
    fn num_written_bits(&self) -> u64;

    /// Restart rate accounting without touching contexts.
    fn reset_bits(&mut self);

    fn snapshot(&self) -> Self::Snapshot;

    fn restore(&mut self, snapshot: &Self::Snapshot);
}

#[inline]
pub(crate) fn expect_state(actual: CoderState, expected: CoderState) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(CabacError::InvalidState { expected, actual })
    }
}

/// Encoder-side `finish()` guard: `Ready` or `Terminated`.
#[inline]
pub(crate) fn expect_open(actual: CoderState) -> Result<()> {
    match actual {
        CoderState::Ready | CoderState::Terminated => Ok(()),
        _ => Err(CabacError::InvalidState {
            expected: CoderState::Ready,
            actual,
        }),
    }
}

#[inline]
pub(crate) fn check_range(range: u32) -> Result<()> {
    if (MIN_RANGE..=MAX_RANGE).contains(&range) {
        Ok(())
    } else {
        Err(CabacError::InvariantViolation {
            register: "range",
            value: range,
        })
    }
}
