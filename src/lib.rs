//! Context-adaptive binary arithmetic coding for HEVC-family codecs.
//!
//! Turns a sequence of bins, each optionally tied to an adaptive probability
//! context, into a compact bitstream, and recovers the exact bins and context
//! evolution from it. Encoder and decoder stay in lock-step bit for bit.
//!
//! ## Layers
//! - [`tables`] - LPS ranges, state transitions and fractional bit costs
//! - [`context`] - adaptive contexts and addressable context sets
//! - [`bitstream`] - bit sinks and sources
//! - [`coder`] - encoder, decoder and bit-cost estimator
//! - [`session`] - coder + owned contexts, checkpoints, RD helpers, substreams
//!
//! ## Features
//! - Core library depends only on `tracing`
//! - `parallel` - rayon-backed substream coding and candidate ranking, plus a
//!   crossbeam channel bin observer
//!
//! ## Example
//!
//! ```
//! use hevc_cabac::{
//!     BitReader, BitWriter, CabacDecoder, CabacEncoder, ContextAddress, ContextModelSet,
//!     ContextShape, EntropyDecoder, EntropyEncoder, InitTable, SliceType,
//! };
//!
//! let table = InitTable::filled(ContextShape::flat(4), 154);
//! let contexts = ContextModelSet::from_table(&table, SliceType::I, 26);
//!
//! let mut enc = EntropyEncoder::new(CabacEncoder::new(BitWriter::new()), contexts.clone());
//! enc.start();
//! enc.encode(true, ContextAddress::flat(2))?;
//! enc.encode_bypass_bins(0b101, 3)?;
//! enc.finish_unit()?;
//! let bytes = enc.into_parts().0.into_sink().into_bytes();
//!
//! let mut dec = EntropyDecoder::new(CabacDecoder::new(BitReader::new(&bytes)), contexts);
//! dec.start()?;
//! assert!(dec.decode(ContextAddress::flat(2))?);
//! assert_eq!(dec.decode_bypass_bins(3)?, 0b101);
//! dec.finish_unit()?;
//! # Ok::<(), hevc_cabac::CabacError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod bitstream;
pub mod coder;
pub mod context;
pub mod error;
pub mod session;
pub mod tables;


pub use bitstream::{BitCounter, BitCursor, BitReader, BitSink, BitSource, BitWriter};
pub use coder::{
    BinEncoder, BinEvent, BinKind, BinObserver, BitEstimator, CabacDecoder, CabacEncoder,
    CoderOptions, CoderState, EncoderSnapshot, EstimatorSnapshot, TraceObserver,
};
pub use context::{
    ContextAddress, ContextModel, ContextModelSet, ContextSetSnapshot, ContextShape, InitTable,
    SliceType,
};
pub use error::{CabacError, Result};
pub use session::rd::{estimate_ops, measure_trial, rank_candidates};
pub use session::substream::{decode_substreams, encode_substreams, SubstreamJob};
pub use session::{BinOp, Checkpoint, EntropyDecoder, EntropyEncoder};
