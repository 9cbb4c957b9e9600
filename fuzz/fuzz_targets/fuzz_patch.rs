#![no_main]

use arbitrary::Arbitrary;
use bsdelta::{PatchConfig, PatchReader, apply_patch};
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    old: &'a [u8],
    patch: &'a [u8],
}

fuzz_target!(|input: Input| {
    // Arbitrary patches must fail cleanly, never panic
    let config = PatchConfig {
        max_output_size: 1 << 20,
    };
    let applied = apply_patch(input.old, &mut Cursor::new(input.patch), &config);

    // The reader validates the same bounds as the decoder
    if let Ok(rebuilt) = applied {
        let summary = PatchReader::new(Cursor::new(input.patch))
            .and_then(|reader| reader.summarize())
            .expect("applied patch must summarize");
        assert_eq!(summary.new_size, rebuilt.len() as u64);
    }
});
