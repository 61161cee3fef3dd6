#![no_main]

use libfuzzer_sys::fuzz_target;
use pagedo_codec::{ChunkFormat, CommandRegistry};
use pagedo_core::testing::{SetNumber, SetText, Sheet};

fuzz_target!(|data: &[u8]| {
    // Chunk files come from disk and may be truncated or corrupted.
    // Every serializer must reject bad input with an error, never a panic.
    let registry = CommandRegistry::<Sheet>::new()
        .with::<SetText>()
        .with::<SetNumber>();

    for format in ChunkFormat::ALL {
        let serializer = format.serializer::<Sheet>();
        let Ok(chunk) = serializer.decode(data, &registry) else {
            continue;
        };

        // Re-encoding what decoded must not change the command count.
        if let Ok(bytes) = serializer.encode(&chunk, &registry)
            && let Ok(again) = serializer.decode(&bytes, &registry)
        {
            assert_eq!(again.len(), chunk.len());
        }
    }
});
