//! Benchmarks for the arithmetic coder.
//!
//! Run with: `cargo bench`
//! Compare with baseline: `cargo bench -- --save-baseline main`
//! Compare against baseline: `cargo bench -- --baseline main`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use hevc_cabac::{
    estimate_ops, rank_candidates, BinOp, BitCounter, BitReader, BitWriter, CabacDecoder,
    CabacEncoder, ContextAddress, ContextModelSet, ContextShape, EntropyDecoder, EntropyEncoder,
    InitTable, SliceType,
};

const NUM_BINS: usize = 64 * 1024;

fn shape() -> ContextShape {
    ContextShape::new(2, 4, 8)
}

/// Deterministic script with a realistic mix of skewed and bypass bins.
fn bin_script(len: usize) -> Vec<BinOp> {
    let shape = shape();
    let mut seed = 0x2545_F491_u32;
    (0..len)
        .map(|_| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            match seed % 16 {
                0..=11 => BinOp::Context {
                    bin: seed % 7 == 0,
                    address: ContextAddress::new(
                        (seed as usize >> 8) % shape.components,
                        (seed as usize >> 12) % shape.size_classes,
                        (seed as usize >> 16) % shape.contexts,
                    ),
                },
                12..=14 => BinOp::Bypass(seed & 0x100 != 0),
                _ => BinOp::Terminate(false),
            }
        })
        .collect()
}

fn contexts() -> ContextModelSet {
    let table = InitTable::filled(shape(), 139);
    ContextModelSet::from_table(&table, SliceType::B, 32)
}

fn encode(ops: &[BinOp]) -> Vec<u8> {
    let mut enc = EntropyEncoder::new(CabacEncoder::new(BitWriter::new()), contexts());
    enc.start();
    enc.encode_ops(ops).expect("encode failed");
    enc.finish_unit().expect("finish failed");
    enc.into_parts().0.into_sink().into_bytes()
}

/// Benchmark encoding into a byte buffer and into a bit counter
fn bench_encode(c: &mut Criterion) {
    let ops = bin_script(NUM_BINS);

    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Elements(NUM_BINS as u64));

    group.bench_function("bit_writer", |b| {
        b.iter(|| black_box(encode(black_box(&ops))));
    });

    group.bench_function("bit_counter", |b| {
        b.iter(|| {
            let mut enc = EntropyEncoder::new(CabacEncoder::new(BitCounter::new()), contexts());
            enc.start();
            enc.encode_ops(black_box(&ops)).expect("encode failed");
            enc.finish_unit().expect("finish failed");
            black_box(enc.num_written_bits())
        });
    });

    group.finish();
}

/// Benchmark decoding
fn bench_decode(c: &mut Criterion) {
    let ops = bin_script(NUM_BINS);
    let bytes = encode(&ops);

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Elements(NUM_BINS as u64));

    group.bench_function("bin_script", |b| {
        b.iter(|| {
            let mut dec =
                EntropyDecoder::new(CabacDecoder::new(BitReader::new(black_box(&bytes))), contexts());
            dec.start().expect("start failed");
            let bins = dec.decode_ops(&ops).expect("decode failed");
            dec.finish_unit().expect("finish failed");
            black_box(bins)
        });
    });

    group.finish();
}

/// Benchmark rate estimation
fn bench_estimate(c: &mut Criterion) {
    let contexts = contexts();
    let ops = bin_script(NUM_BINS);
    let candidates: Vec<Vec<BinOp>> = ops.chunks(256).map(<[BinOp]>::to_vec).collect();

    let mut group = c.benchmark_group("estimate");
    group.throughput(Throughput::Elements(NUM_BINS as u64));

    group.bench_function("estimate_ops", |b| {
        b.iter(|| black_box(estimate_ops(&contexts, black_box(&ops))));
    });

    group.bench_function("rank_candidates", |b| {
        b.iter(|| black_box(rank_candidates(&contexts, black_box(&candidates))));
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_estimate);
criterion_main!(benches);
