//! Adaptive probability contexts.
//!
//! A [`ContextModel`] tracks one probability state: a state index in
//! `0..=63` and the current most probable symbol. Every bin coded against a
//! context moves it along [`NEXT_STATE_MPS`] or [`NEXT_STATE_LPS`].
//!
//! Contexts live in a [`ContextModelSet`], addressed by
//! `(component, size class, index)` and initialized from an [`InitTable`].
//!
//! ## Initialization
//!
//! | Step | Formula |
//! |------|---------|
//! | slope | `(init_value >> 4) * 5 - 45` |
//! | offset | `((init_value & 15) << 3) - 16` |
//! | pre-state | `clip(1, 126, ((slope * clip(0, 51, qp)) >> 4) + offset)` |
//! | split | `pre <= 63` → `(63 - pre, mps 0)`, else `(pre - 64, mps 1)` |

mod set;

pub use set::{
    ContextAddress, ContextModelSet, ContextSetSnapshot, ContextShape, InitTable, SliceType,
};

use crate::tables::{MAX_CONTEXT_STATE, NEXT_STATE_LPS, NEXT_STATE_MPS, NUM_STATES};

/// Smallest slice QP used for context initialization.
pub const MIN_INIT_QP: i32 = 0;
/// Largest slice QP used for context initialization.
pub const MAX_INIT_QP: i32 = 51;

/// One adaptive probability state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ContextModel {
    /// Probability state index (0-63)
    state: u8,
    /// Most probable symbol
    mps: bool,
}

impl ContextModel {
    /// Create a context with an explicit state.
    ///
    /// States past the last table row are clamped to it.
    pub const fn new(state: u8, mps: bool) -> Self {
        let last = (NUM_STATES - 1) as u8;
        let state = if state > last { last } else { state };
        Self { state, mps }
    }

    /// Create a context initialized for a slice QP.
    pub fn with_init(init_value: u8, qp: i32) -> Self {
        let mut ctx = Self::default();
        ctx.init(init_value, qp);
        ctx
    }

    /// Derive `(state, mps)` from an 8-bit init value and the slice QP.
    pub fn init(&mut self, init_value: u8, qp: i32) {
        let slope = i32::from(init_value >> 4) * 5 - 45;
        let offset = (i32::from(init_value & 15) << 3) - 16;
        let qp = qp.clamp(MIN_INIT_QP, MAX_INIT_QP);

        let pre_state = (((slope * qp) >> 4) + offset).clamp(1, 126);

        if pre_state <= 63 {
            self.state = (63 - pre_state) as u8;
            self.mps = false;
        } else {
            self.state = (pre_state - 64) as u8;
            self.mps = true;
        }
    }

    /// Current probability state.
    #[inline(always)]
    pub fn state(&self) -> u8 {
        self.state
    }

    /// Current most probable symbol.
    #[inline(always)]
    pub fn mps(&self) -> bool {
        self.mps
    }

    /// Advance after coding the most probable symbol.
    #[inline(always)]
    pub fn update_mps(&mut self) {
        self.state = NEXT_STATE_MPS[self.state as usize];
    }

    /// Retreat after coding the least probable symbol.
    ///
    /// At state 0 the symbols swap roles.
    #[inline(always)]
    pub fn update_lps(&mut self) {
        if self.state == 0 {
            self.mps = !self.mps;
        }
        self.state = NEXT_STATE_LPS[self.state as usize];
    }

    /// Apply the transition for a coded bin.
    #[inline]
    pub fn update(&mut self, bin: bool) {
        if bin == self.mps {
            self.update_mps();
        } else {
            self.update_lps();
        }
    }

    /// Whether the context has converged to its most skewed state.
    pub fn is_saturated(&self) -> bool {
        self.state == MAX_CONTEXT_STATE
    }
}
