//! Error types for the CABAC engine.
//!
//! This module provides the [`CabacError`] type which covers every way a coded
//! unit can be aborted by the entropy engine.
//!
//! ## Error Categories
//!
//! | Category | Errors | Description |
//! |----------|--------|-------------|
//! | Input | [`StreamExhausted`], [`TrailingBits`], [`MissingTerminator`] | The bitstream handed to a decoder is short or malformed |
//! | Programming | [`InvalidAddress`], [`InvalidState`], [`InitTableShape`], [`ShapeMismatch`] | A call site broke the engine's contract |
//! | Internal | [`InvariantViolation`] | Register state left its valid interval (an engine bug or a corrupt first byte) |
//!
//! None of these are recoverable inside the engine: encoder and decoder would
//! drift apart if coding continued, so the current coded unit must be dropped.
//!
//! ## Example
//!
//! ```rust
//! use hevc_cabac::{BitReader, CabacDecoder, CabacError};
//!
//! let mut decoder = CabacDecoder::new(BitReader::new(&[0x00]));
//! match decoder.start() {
//!     Err(CabacError::StreamExhausted { requested, .. }) => assert_eq!(requested, 9),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```
//!
//! [`StreamExhausted`]: CabacError::StreamExhausted
//! [`TrailingBits`]: CabacError::TrailingBits
//! [`MissingTerminator`]: CabacError::MissingTerminator
//! [`InvalidAddress`]: CabacError::InvalidAddress
//! [`InvalidState`]: CabacError::InvalidState
//! [`InitTableShape`]: CabacError::InitTableShape
//! [`ShapeMismatch`]: CabacError::ShapeMismatch
//! [`InvariantViolation`]: CabacError::InvariantViolation

use std::fmt;

use crate::coder::CoderState;
use crate::context::{ContextAddress, ContextShape};

/// Error type for CABAC operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CabacError {
    /// The bit source ran dry while more bins were requested.
    ///
    /// Decoder only. The coded unit being decoded is lost.
    StreamExhausted {
        /// Number of bits the decoder tried to read.
        requested: u32,
        /// Number of bits that were still available.
        available: u64,
    },

    /// A context lookup fell outside the declared shape of its set.
    InvalidAddress {
        /// The offending address.
        address: ContextAddress,
        /// The shape the set was declared with.
        shape: ContextShape,
    },

    /// A register left its valid interval.
    ///
    /// `range` outside `[256, 510]` after renormalization, or a decoder
    /// starting with `value >= range`.
    InvariantViolation {
        /// Register name.
        register: &'static str,
        /// Observed value.
        value: u32,
    },

    /// A coder operation was issued in the wrong lifecycle state.
    ///
    /// For example encoding a bin before `start()` or after `finish()`.
    InvalidState {
        /// State the operation requires.
        expected: CoderState,
        /// State the coder was actually in.
        actual: CoderState,
    },

    /// An init table holds the wrong number of values for its shape.
    InitTableShape {
        /// Number of init values required.
        expected: usize,
        /// Number of init values supplied.
        actual: usize,
    },

    /// An init table built for one shape was applied to a set of another.
    ShapeMismatch {
        /// Shape of the context set.
        expected: ContextShape,
        /// Shape of the init table.
        actual: ContextShape,
    },

    /// The alignment bits after the terminating bin were not all zero.
    TrailingBits,

    /// A coded unit ended without its terminating bin set.
    MissingTerminator,
}

impl fmt::Display for CabacError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StreamExhausted {
                requested,
                available,
            } => write!(
                f,
                "Bitstream exhausted: requested {} bits, {} available",
                requested, available
            ),
            Self::InvalidAddress { address, shape } => {
                write!(f, "Invalid context address {} for shape {}", address, shape)
            }
            Self::InvariantViolation { register, value } => {
                write!(f, "Coder invariant violated: {} = {}", register, value)
            }
            Self::InvalidState { expected, actual } => {
                write!(f, "Coder is {:?}, operation requires {:?}", actual, expected)
            }
            Self::InitTableShape { expected, actual } => write!(
                f,
                "Init table mismatch: expected {} values, got {}",
                expected, actual
            ),
            Self::ShapeMismatch { expected, actual } => write!(
                f,
                "Init table shape {} does not match context set shape {}",
                actual, expected
            ),
            Self::TrailingBits => write!(f, "Non-zero alignment bits after terminating bin"),
            Self::MissingTerminator => write!(f, "Coded unit is not terminated"),
        }
    }
}

impl std::error::Error for CabacError {}

pub type Result<T> = std::result::Result<T, CabacError>;
