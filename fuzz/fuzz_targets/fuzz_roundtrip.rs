#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    old: &'a [u8],
    new: &'a [u8],
}

fuzz_target!(|input: Input| {
    let delta = bsdelta::diff(input.old, input.new).expect("diff failed");
    let rebuilt = bsdelta::patch(input.old, &delta).expect("patch failed");
    assert_eq!(rebuilt, input.new);
});
