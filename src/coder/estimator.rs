//! Fractional bit-cost estimation.
//!
//! Costs are in 1/32768 bit units ([`FRAC_BITS_SHIFT`]). A context-coded bin
//! costs `-log2(p)` for the probability its context currently assigns to it;
//! a bypass bin costs exactly one bit.

use super::{expect_open, expect_state, BinEncoder, CoderState};
use crate::context::ContextModel;
use crate::error::Result;
use crate::tables::{ENTROPY_BITS, FRAC_BITS_ONE, FRAC_BITS_SHIFT, TERMINATE_STATE};

/// Cost of coding `bin` against `ctx`.
#[inline]
pub fn bin_cost(ctx: &ContextModel, bin: bool) -> u32 {
    ENTROPY_BITS[usize::from(ctx.state())][usize::from(bin != ctx.mps())]
}

/// Cost of one bypass bin.
#[inline]
pub const fn bypass_cost() -> u32 {
    FRAC_BITS_ONE
}

/// Cost of the terminating bin; `true` is the rare outcome.
#[inline]
pub fn terminate_cost(bin: bool) -> u32 {
    ENTROPY_BITS[usize::from(TERMINATE_STATE)][usize::from(bin)]
}

/// Saved accumulator, see [`BitEstimator::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimatorSnapshot {
    frac_bits: u64,
    state: CoderState,
}

/// [`BinEncoder`] that adds up costs instead of producing bits.
///
/// Contexts are read but never adapted, so every bin is costed against the
/// state the caller handed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitEstimator {
    frac_bits: u64,
    state: CoderState,
}

impl Default for BitEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl BitEstimator {
    pub const fn new() -> Self {
        Self {
            frac_bits: 0,
            state: CoderState::Uninitialized,
        }
    }

    /// Accumulated cost in 1/32768 bit units.
    pub fn frac_bits(&self) -> u64 {
        self.frac_bits
    }

    /// Accumulated cost in bits.
    pub fn bits(&self) -> f64 {
        self.frac_bits as f64 / f64::from(FRAC_BITS_ONE)
    }

    pub fn state(&self) -> CoderState {
        self.state
    }

    #[inline]
    fn add(&mut self, cost: u32) -> Result<()> {
        expect_state(self.state, CoderState::Ready)?;
        self.frac_bits += u64::from(cost);
        Ok(())
    }
}

impl BinEncoder for BitEstimator {
    type Snapshot = EstimatorSnapshot;

    fn start(&mut self) {
        self.frac_bits = 0;
        self.state = CoderState::Ready;
    }

    fn encode_bin(&mut self, bin: bool, ctx: &mut ContextModel) -> Result<()> {
        self.add(bin_cost(ctx, bin))
    }

    fn encode_bin_ep(&mut self, _bin: bool) -> Result<()> {
        self.add(bypass_cost())
    }

    fn encode_bins_ep(&mut self, _value: u32, num_bins: u32) -> Result<()> {
        self.add(bypass_cost() * num_bins)
    }

    fn encode_bin_trm(&mut self, bin: bool) -> Result<()> {
        self.add(terminate_cost(bin))?;
        if bin {
            self.state = CoderState::Terminated;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        expect_open(self.state)?;
        self.state = CoderState::Finished;
        Ok(())
    }

    fn num_written_bits(&self) -> u64 {
        self.frac_bits >> FRAC_BITS_SHIFT
    }

    fn reset_bits(&mut self) {
        self.frac_bits = 0;
    }

    fn snapshot(&self) -> EstimatorSnapshot {
        EstimatorSnapshot {
            frac_bits: self.frac_bits,
            state: self.state,
        }
    }

    fn restore(&mut self, snapshot: &EstimatorSnapshot) {
        self.frac_bits = snapshot.frac_bits;
        self.state = snapshot.state;
    }
}
