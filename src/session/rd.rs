//! Rate helpers for mode decision.
//!
//! Two ways to price a candidate bin script:
//! - [`estimate_ops`] / [`rank_candidates`]: table lookups only, contexts
//!   held at their current states. Cheap enough to probe many candidates.
//! - [`measure_trial`]: actually codes the script on a live session and
//!   rolls it back, giving the exact rate including context adaptation.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{BinOp, EntropyEncoder};
use crate::coder::{BinEncoder, BitEstimator};
use crate::context::ContextModelSet;
use crate::error::Result;

/// Estimated cost of `ops` in 1/32768 bit units.
///
/// Every context-coded bin is priced against the state `contexts` holds now;
/// nothing is mutated.
pub fn estimate_ops(contexts: &ContextModelSet, ops: &[BinOp]) -> Result<u64> {
    let mut estimator = BitEstimator::new();
    estimator.start();
    for op in ops {
        match *op {
            BinOp::Context { bin, address } => {
                let mut ctx = *contexts.get(address)?;
                estimator.encode_bin(bin, &mut ctx)?;
            }
            BinOp::Bypass(bin) => estimator.encode_bin_ep(bin)?,
            BinOp::Terminate(bin) => estimator.encode_bin_trm(bin)?,
        }
    }
    Ok(estimator.frac_bits())
}

/// Estimate every candidate and sort them cheapest first.
///
/// Returns `(candidate index, cost)` pairs; ties keep candidate order.
pub fn rank_candidates(
    contexts: &ContextModelSet,
    candidates: &[Vec<BinOp>],
) -> Result<Vec<(usize, u64)>> {
    #[cfg(feature = "parallel")]
    let costs = candidates
        .par_iter()
        .map(|ops| estimate_ops(contexts, ops))
        .collect::<Result<Vec<_>>>()?;

    #[cfg(not(feature = "parallel"))]
    let costs = candidates
        .iter()
        .map(|ops| estimate_ops(contexts, ops))
        .collect::<Result<Vec<_>>>()?;

    let mut ranked: Vec<(usize, u64)> = costs.into_iter().enumerate().collect();
    ranked.sort_by_key(|&(index, cost)| (cost, index));
    Ok(ranked)
}

/// Code `ops` on `session`, report the bits it took, then roll back.
///
/// The session is left exactly as it was, even when coding fails.
pub fn measure_trial<E: BinEncoder>(session: &mut EntropyEncoder<E>, ops: &[BinOp]) -> Result<u64> {
    let checkpoint = session.checkpoint();
    let coded = session.encode_ops(ops);
    let bits = session.num_written_bits().saturating_sub(checkpoint.bits());
    session.rollback(&checkpoint);
    coded.map(|()| bits)
}
