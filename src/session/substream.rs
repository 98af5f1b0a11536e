//! Independent substreams.
//!
//! Each job gets its own coder, context set and buffer, so jobs can run on
//! separate threads without sharing anything mutable. With the `parallel`
//! feature jobs are spread over the rayon pool; results always come back in
//! job order.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use super::{BinOp, EntropyDecoder, EntropyEncoder};
use crate::bitstream::{BitReader, BitWriter};
use crate::coder::{CabacDecoder, CabacEncoder};
use crate::context::{ContextModelSet, InitTable, SliceType};
use crate::error::Result;

/// One substream to code.
#[derive(Debug, Clone, Copy)]
pub struct SubstreamJob<'a> {
    pub table: &'a InitTable,
    pub slice_type: SliceType,
    pub qp: i32,
    /// Bins of the substream; the closing terminating bin is added on top
    pub ops: &'a [BinOp],
}

impl SubstreamJob<'_> {
    fn contexts(&self) -> ContextModelSet {
        ContextModelSet::from_table(self.table, self.slice_type, self.qp)
    }

    /// Code the job into a byte-aligned stream.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut session = EntropyEncoder::new(CabacEncoder::new(BitWriter::new()), self.contexts());
        session.start();
        session.encode_ops(self.ops)?;
        session.finish_unit()?;
        Ok(session.into_parts().0.into_sink().into_bytes())
    }

    /// Decode `stream` following the job's bin kinds and addresses.
    pub fn decode(&self, stream: &[u8]) -> Result<Vec<bool>> {
        let mut session =
            EntropyDecoder::new(CabacDecoder::new(BitReader::new(stream)), self.contexts());
        session.start()?;
        let bins = session.decode_ops(self.ops)?;
        session.finish_unit()?;
        Ok(bins)
    }
}

/// Encode every job, one stream per job.
pub fn encode_substreams(jobs: &[SubstreamJob<'_>]) -> Result<Vec<Vec<u8>>> {
    debug!(jobs = jobs.len(), "Encoding substreams");

    #[cfg(feature = "parallel")]
    let streams = jobs
        .par_iter()
        .map(SubstreamJob::encode)
        .collect::<Result<Vec<_>>>()?;

    #[cfg(not(feature = "parallel"))]
    let streams = jobs
        .iter()
        .map(SubstreamJob::encode)
        .collect::<Result<Vec<_>>>()?;

    debug!(
        bytes = streams.iter().map(Vec::len).sum::<usize>(),
        "Substreams encoded"
    );
    Ok(streams)
}

/// Decode `streams[i]` against `jobs[i]`.
pub fn decode_substreams(jobs: &[SubstreamJob<'_>], streams: &[Vec<u8>]) -> Result<Vec<Vec<bool>>> {
    debug_assert_eq!(jobs.len(), streams.len());
    debug!(jobs = jobs.len(), "Decoding substreams");

    #[cfg(feature = "parallel")]
    let bins = jobs
        .par_iter()
        .zip(streams.par_iter())
        .map(|(job, stream)| job.decode(stream))
        .collect::<Result<Vec<_>>>()?;

    #[cfg(not(feature = "parallel"))]
    let bins = jobs
        .iter()
        .zip(streams)
        .map(|(job, stream)| job.decode(stream))
        .collect::<Result<Vec<_>>>()?;

    Ok(bins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextAddress, ContextShape};
    use crate::error::CabacError;

    fn ops_for(seed: usize) -> Vec<BinOp> {
        (0..200)
            .map(|i| {
                let mix = i * 7 + seed * 13;
                if mix % 4 == 0 {
                    BinOp::Bypass(mix % 3 == 0)
                } else {
                    BinOp::Context {
                        bin: mix % 5 < 2,
                        address: ContextAddress::flat(mix % 6),
                    }
                }
            })
            .collect()
    }

    #[test]
    fn test_substreams_roundtrip() {
        let shape = ContextShape::flat(6);
        let table = InitTable::uniform(shape, &[154, 139, 63, 107, 200, 95]).unwrap();
        let scripts: Vec<Vec<BinOp>> = (0..8).map(ops_for).collect();
        let jobs: Vec<SubstreamJob<'_>> = scripts
            .iter()
            .enumerate()
            .map(|(i, ops)| SubstreamJob {
                table: &table,
                slice_type: if i % 2 == 0 { SliceType::I } else { SliceType::P },
                qp: 22 + i as i32,
                ops,
            })
            .collect();

        let streams = encode_substreams(&jobs).unwrap();
        assert_eq!(streams.len(), jobs.len());
        for (job, stream) in jobs.iter().zip(&streams) {
            assert_eq!(stream, &job.encode().unwrap());
        }

        let decoded = decode_substreams(&jobs, &streams).unwrap();
        for (bins, ops) in decoded.iter().zip(&scripts) {
            let expected: Vec<bool> = ops.iter().map(BinOp::bin).collect();
            assert_eq!(bins, &expected);
        }
    }

    #[test]
    fn test_corrupt_substream() {
        let table = InitTable::filled(ContextShape::flat(6), 154);
        let ops = ops_for(1);
        let job = SubstreamJob {
            table: &table,
            slice_type: SliceType::B,
            qp: 30,
            ops: &ops,
        };
        let mut stream = job.encode().unwrap();
        stream.truncate(stream.len() / 2);
        assert!(matches!(
            decode_substreams(&[job], &[stream]),
            Err(CabacError::StreamExhausted { .. })
        ));
    }
}
