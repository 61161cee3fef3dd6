#![no_main]

use libfuzzer_sys::fuzz_target;
use pagedo_core::PrimitiveReader;

fuzz_target!(|data: &[u8]| {
    // Drive the reader with opcodes taken from the input itself. Length
    // prefixes are attacker-controlled; reads must fail cleanly.
    let Some((&ops, rest)) = data.split_first() else {
        return;
    };
    let mut reader = PrimitiveReader::new(rest);
    for shift in 0..4 {
        let step = match (ops >> (shift * 2)) & 0b11 {
            0 => reader.read_str().map(drop),
            1 => reader.read_bytes().map(drop),
            2 => reader.read_i64().map(drop),
            _ => reader.read_f64().map(drop),
        };
        if step.is_err() {
            break;
        }
    }
    assert!(reader.position() <= rest.len());
});
