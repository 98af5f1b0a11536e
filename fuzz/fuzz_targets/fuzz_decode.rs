#![no_main]
use hevc_cabac::{
    BitReader, CabacDecoder, ContextAddress, ContextModelSet, ContextShape, EntropyDecoder,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // First byte picks the decoding pattern, the rest is the stream
    let pattern = data[0];
    let stream = &data[1..];

    let contexts = ContextModelSet::new(ContextShape::flat(8));
    let mut dec = EntropyDecoder::new(CabacDecoder::new(BitReader::new(stream)), contexts);
    if dec.start().is_err() {
        return;
    }

    for i in 0..stream.len() * 8 {
        let step = (usize::from(pattern) + i) % 5;
        let result = match step {
            0 | 1 | 2 => dec.decode(ContextAddress::flat(i % 8)),
            3 => dec.decode_bypass(),
            _ => dec.decode_terminate(),
        };
        match result {
            Ok(true) if step == 4 => {
                let _ = dec.finish();
                return;
            }
            Ok(_) => {}
            Err(_) => return,
        }
    }
});
