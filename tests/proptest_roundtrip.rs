//! Property-based tests for the arithmetic coder.
//!
//! Uses proptest to drive random bin scripts through encoder and decoder and
//! check that bins, contexts and bit counts line up.

use hevc_cabac::{
    estimate_ops, BinOp, BitCounter, BitReader, BitSink, BitWriter, CabacDecoder, CabacEncoder,
    ContextAddress, ContextModel, ContextModelSet, ContextShape, EntropyDecoder, EntropyEncoder,
    InitTable, SliceType,
};
use proptest::prelude::*;

const SHAPE: ContextShape = ContextShape::new(2, 2, 4);

fn address() -> impl Strategy<Value = ContextAddress> {
    (0..SHAPE.components, 0..SHAPE.size_classes, 0..SHAPE.contexts)
        .prop_map(|(component, size_class, index)| ContextAddress::new(component, size_class, index))
}

fn bin_op() -> impl Strategy<Value = BinOp> {
    prop_oneof![
        6 => (any::<bool>(), address()).prop_map(|(bin, address)| BinOp::Context { bin, address }),
        3 => any::<bool>().prop_map(BinOp::Bypass),
        1 => Just(BinOp::Terminate(false)),
    ]
}

fn init_table() -> impl Strategy<Value = InitTable> {
    prop::collection::vec(any::<u8>(), SHAPE.len() * SliceType::COUNT)
        .prop_map(|values| InitTable::new(SHAPE, values).unwrap())
}

fn slice_type() -> impl Strategy<Value = SliceType> {
    prop_oneof![Just(SliceType::I), Just(SliceType::P), Just(SliceType::B)]
}

fn encode(contexts: ContextModelSet, ops: &[BinOp]) -> (Vec<u8>, ContextModelSet) {
    let mut enc = EntropyEncoder::new(CabacEncoder::new(BitWriter::new()), contexts);
    enc.start();
    enc.encode_ops(ops).unwrap();
    enc.finish_unit().unwrap();
    let (coder, contexts) = enc.into_parts();
    (coder.into_sink().into_bytes(), contexts)
}

// =============================================================================
// Round-trip
// =============================================================================

proptest! {
    /// Any script decodes back to its bins with identical final contexts.
    #[test]
    fn roundtrip_bin_scripts(
        table in init_table(),
        slice_type in slice_type(),
        qp in -6i32..=60,
        mut ops in prop::collection::vec(bin_op(), 0..400),
        closed in any::<bool>(),
    ) {
        // Scripts may carry their own closing terminator
        if closed {
            ops.push(BinOp::Terminate(true));
        }
        let contexts = ContextModelSet::from_table(&table, slice_type, qp);
        let (bytes, enc_contexts) = encode(contexts.clone(), &ops);

        let mut dec = EntropyDecoder::new(CabacDecoder::new(BitReader::new(&bytes)), contexts);
        dec.start().unwrap();
        let bins = dec.decode_ops(&ops).unwrap();
        dec.finish_unit().unwrap();

        let expected: Vec<bool> = ops.iter().map(BinOp::bin).collect();
        prop_assert_eq!(bins, expected);
        prop_assert_eq!(dec.contexts(), &enc_contexts);
        prop_assert!(dec.decoder().source().is_eof());
    }

    /// Bypass values of any width survive a round trip.
    #[test]
    fn roundtrip_bypass_values(values in prop::collection::vec((any::<u32>(), 1u32..=32), 1..50)) {
        let mut enc = CabacEncoder::new(BitWriter::new());
        enc.start();
        for &(value, width) in &values {
            enc.encode_bins_ep(value, width).unwrap();
        }
        enc.finish_unit().unwrap();
        let bytes = enc.into_sink().into_bytes();

        let mut dec = CabacDecoder::new(BitReader::new(&bytes));
        dec.start().unwrap();
        for &(value, width) in &values {
            let mask = if width == 32 { u32::MAX } else { (1 << width) - 1 };
            prop_assert_eq!(dec.decode_bins_ep(width).unwrap(), value & mask);
        }
        prop_assert!(dec.decode_bin_trm().unwrap());
        dec.finish().unwrap();
    }
}

// =============================================================================
// Invariants
// =============================================================================

proptest! {
    /// `range` stays inside [256, 510] after every bin.
    #[test]
    fn range_stays_in_interval(
        state in 0u8..=62,
        mps in any::<bool>(),
        bins in prop::collection::vec(any::<bool>(), 1..300),
    ) {
        let mut enc = CabacEncoder::new(BitCounter::new());
        enc.start();
        let mut ctx = ContextModel::new(state, mps);
        for bin in bins {
            enc.encode_bin(bin, &mut ctx).unwrap();
            prop_assert!((256..=510).contains(&enc.range()));
            prop_assert!(ctx.state() <= 62);
        }
    }

    /// After `finish()` the bit count equals what reached the sink.
    #[test]
    fn bit_count_matches_sink(ops in prop::collection::vec(bin_op(), 0..300)) {
        let mut enc = EntropyEncoder::new(
            CabacEncoder::new(BitWriter::new()),
            ContextModelSet::new(SHAPE),
        );
        enc.start();
        enc.encode_ops(&ops).unwrap();
        enc.finish().unwrap();
        let written = enc.coder().sink().written_bits();
        prop_assert_eq!(enc.num_written_bits(), written);
    }

    /// Same input and initial state always give the same bytes.
    #[test]
    fn encoding_is_deterministic(
        table in init_table(),
        qp in 0i32..=51,
        ops in prop::collection::vec(bin_op(), 0..200),
    ) {
        let contexts = ContextModelSet::from_table(&table, SliceType::I, qp);
        let first = encode(contexts.clone(), &ops);
        let second = encode(contexts, &ops);
        prop_assert_eq!(first, second);
    }

    /// Estimation never mutates the contexts it reads.
    #[test]
    fn estimation_is_pure(
        table in init_table(),
        ops in prop::collection::vec(bin_op(), 0..200),
    ) {
        let contexts = ContextModelSet::from_table(&table, SliceType::B, 30);
        let before = contexts.clone();
        let cost = estimate_ops(&contexts, &ops).unwrap();
        prop_assert_eq!(&contexts, &before);
        if ops.is_empty() {
            prop_assert_eq!(cost, 0);
        }
    }
}
