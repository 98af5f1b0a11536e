#![no_main]
use hevc_cabac::{
    decode_substreams, encode_substreams, BinOp, ContextAddress, ContextShape, InitTable,
    SliceType, SubstreamJob,
};
use libfuzzer_sys::fuzz_target;

const SHAPE: ContextShape = ContextShape::new(1, 2, 8);

fn to_ops(data: &[u8]) -> Vec<BinOp> {
    data.iter()
        .map(|&byte| match byte >> 6 {
            0 | 1 => BinOp::Context {
                bin: byte & 1 != 0,
                address: ContextAddress::new(0, usize::from(byte >> 5) & 1, usize::from(byte >> 1) & 7),
            },
            2 => BinOp::Bypass(byte & 1 != 0),
            _ => BinOp::Terminate(false),
        })
        .collect()
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let init_value = data[0];
    let qp = i32::from(data[1] % 64) - 6;
    let table = InitTable::filled(SHAPE, init_value);

    // Split the rest into up to four independent substreams
    let scripts: Vec<Vec<BinOp>> = data[2..].chunks(64).take(4).map(to_ops).collect();
    let jobs: Vec<SubstreamJob<'_>> = scripts
        .iter()
        .enumerate()
        .map(|(i, ops)| SubstreamJob {
            table: &table,
            slice_type: [SliceType::I, SliceType::P, SliceType::B][i % 3],
            qp,
            ops,
        })
        .collect();

    let streams = encode_substreams(&jobs).expect("encoding a valid script cannot fail");
    let decoded = decode_substreams(&jobs, &streams).expect("decoding own output cannot fail");
    for (bins, ops) in decoded.iter().zip(&scripts) {
        let expected: Vec<bool> = ops.iter().map(BinOp::bin).collect();
        assert_eq!(bins, &expected);
    }
});
