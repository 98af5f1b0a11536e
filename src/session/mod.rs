//! Coder sessions: one coder plus the contexts it exclusively owns.
//!
//! Syntax-level code talks to an [`EntropyEncoder`] or [`EntropyDecoder`] in
//! terms of context addresses instead of juggling `&mut ContextModel`
//! borrows. Sessions also pair coder and context snapshots so a trial
//! encoding can be undone in one call.

pub mod rd;
pub mod substream;

use tracing::debug;

use crate::bitstream::{BitSink, BitSource};
use crate::coder::{BinEncoder, CabacDecoder, CabacEncoder, CoderState};
use crate::context::{ContextAddress, ContextModelSet, ContextSetSnapshot};
use crate::error::{CabacError, Result};

/// One bin in syntax order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    /// Context-coded bin
    Context { bin: bool, address: ContextAddress },
    /// Bypass bin
    Bypass(bool),
    /// Terminating bin
    Terminate(bool),
}

impl BinOp {
    /// The bin value carried by the op.
    pub fn bin(&self) -> bool {
        match *self {
            Self::Context { bin, .. } | Self::Bypass(bin) | Self::Terminate(bin) => bin,
        }
    }
}

/// Coder and context state captured together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint<T> {
    coder: T,
    contexts: ContextSetSnapshot,
    bits: u64,
}

impl<T> Checkpoint<T> {
    /// Bits written when the checkpoint was taken.
    pub fn bits(&self) -> u64 {
        self.bits
    }
}

/// Encoding session over any [`BinEncoder`].
#[derive(Debug)]
pub struct EntropyEncoder<E: BinEncoder> {
    coder: E,
    contexts: ContextModelSet,
}

impl<E: BinEncoder> EntropyEncoder<E> {
    pub fn new(coder: E, contexts: ContextModelSet) -> Self {
        Self { coder, contexts }
    }

    pub fn start(&mut self) {
        self.coder.start();
    }

    /// Code `bin` with the context at `address`.
    #[inline]
    pub fn encode(&mut self, bin: bool, address: ContextAddress) -> Result<()> {
        let ctx = self.contexts.get_mut(address)?;
        self.coder.encode_bin(bin, ctx)
    }

    #[inline]
    pub fn encode_bypass(&mut self, bin: bool) -> Result<()> {
        self.coder.encode_bin_ep(bin)
    }

    /// Code the low `num_bins` bits of `value` as bypass bins, MSB first.
    pub fn encode_bypass_bins(&mut self, value: u32, num_bins: u32) -> Result<()> {
        self.coder.encode_bins_ep(value, num_bins)
    }

    pub fn encode_terminate(&mut self, bin: bool) -> Result<()> {
        self.coder.encode_bin_trm(bin)
    }

    pub fn encode_op(&mut self, op: &BinOp) -> Result<()> {
        match *op {
            BinOp::Context { bin, address } => self.encode(bin, address),
            BinOp::Bypass(bin) => self.encode_bypass(bin),
            BinOp::Terminate(bin) => self.encode_terminate(bin),
        }
    }

    pub fn encode_ops(&mut self, ops: &[BinOp]) -> Result<()> {
        ops.iter().try_for_each(|op| self.encode_op(op))
    }

    pub fn finish(&mut self) -> Result<()> {
        self.coder.finish()
    }

    pub fn num_written_bits(&self) -> u64 {
        self.coder.num_written_bits()
    }

    /// Capture coder and contexts for a later [`rollback`](Self::rollback).
    pub fn checkpoint(&self) -> Checkpoint<E::Snapshot> {
        Checkpoint {
            coder: self.coder.snapshot(),
            contexts: self.contexts.snapshot(),
            bits: self.coder.num_written_bits(),
        }
    }

    /// Undo everything coded since `checkpoint` was taken.
    pub fn rollback(&mut self, checkpoint: &Checkpoint<E::Snapshot>) {
        let dropped = self.coder.num_written_bits().saturating_sub(checkpoint.bits);
        self.coder.restore(&checkpoint.coder);
        self.contexts.restore(&checkpoint.contexts);
        debug!(dropped_bits = dropped, "Entropy session rolled back");
    }

    pub fn contexts(&self) -> &ContextModelSet {
        &self.contexts
    }

    pub fn contexts_mut(&mut self) -> &mut ContextModelSet {
        &mut self.contexts
    }

    pub fn coder(&self) -> &E {
        &self.coder
    }

    pub fn into_parts(self) -> (E, ContextModelSet) {
        (self.coder, self.contexts)
    }
}

impl<S: BitSink> EntropyEncoder<CabacEncoder<S>> {
    /// Terminate, flush and byte-align the coded unit.
    ///
    /// A script that already ended on a terminating `1` is only flushed.
    pub fn finish_unit(&mut self) -> Result<()> {
        self.coder.finish_unit()
    }
}

/// Decoding session mirroring [`EntropyEncoder`].
#[derive(Debug)]
pub struct EntropyDecoder<S: BitSource> {
    decoder: CabacDecoder<S>,
    contexts: ContextModelSet,
}

impl<S: BitSource> EntropyDecoder<S> {
    pub fn new(decoder: CabacDecoder<S>, contexts: ContextModelSet) -> Self {
        Self { decoder, contexts }
    }

    pub fn start(&mut self) -> Result<()> {
        self.decoder.start()
    }

    #[inline]
    pub fn decode(&mut self, address: ContextAddress) -> Result<bool> {
        let ctx = self.contexts.get_mut(address)?;
        self.decoder.decode_bin(ctx)
    }

    #[inline]
    pub fn decode_bypass(&mut self) -> Result<bool> {
        self.decoder.decode_bin_ep()
    }

    pub fn decode_bypass_bins(&mut self, num_bins: u32) -> Result<u32> {
        self.decoder.decode_bins_ep(num_bins)
    }

    pub fn decode_terminate(&mut self) -> Result<bool> {
        self.decoder.decode_bin_trm()
    }

    /// Decode a bin of the same kind and address as `op`; its bin value is
    /// ignored.
    pub fn decode_op(&mut self, op: &BinOp) -> Result<bool> {
        match *op {
            BinOp::Context { address, .. } => self.decode(address),
            BinOp::Bypass(_) => self.decode_bypass(),
            BinOp::Terminate(_) => self.decode_terminate(),
        }
    }

    pub fn decode_ops(&mut self, ops: &[BinOp]) -> Result<Vec<bool>> {
        ops.iter().map(|op| self.decode_op(op)).collect()
    }

    /// Read the terminating bin and the alignment that closes a unit.
    ///
    /// A terminating `1` already decoded by the script counts as the closing bin.
    pub fn finish_unit(&mut self) -> Result<()> {
        if self.decoder.state() != CoderState::Terminated && !self.decoder.decode_bin_trm()? {
            return Err(CabacError::MissingTerminator);
        }
        self.decoder.finish()
    }

    /// Consume the alignment after a terminating bin already decoded.
    pub fn finish(&mut self) -> Result<()> {
        self.decoder.finish()
    }

    pub fn contexts(&self) -> &ContextModelSet {
        &self.contexts
    }

    pub fn decoder(&self) -> &CabacDecoder<S> {
        &self.decoder
    }

    pub fn into_parts(self) -> (CabacDecoder<S>, ContextModelSet) {
        (self.decoder, self.contexts)
    }
}
