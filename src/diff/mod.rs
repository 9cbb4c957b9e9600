//! Delta encoding
//!
//! Produces a patch that turns an old buffer into a new one. The suffix index
//! of the old buffer is built once per call and dropped when encoding ends.

pub mod encoder;

pub use encoder::DeltaEncoder;

use crate::config::DiffConfig;
use crate::error::Result;
use std::io::Write;

/// Write a complete patch (header and records) for `old -> new` to `sink`
pub fn write_patch<W: Write>(
    old: &[u8],
    new: &[u8],
    sink: &mut W,
    config: &DiffConfig,
) -> Result<()> {
    DeltaEncoder::with_config(old, new, config.clone()).write_patch(sink)
}
