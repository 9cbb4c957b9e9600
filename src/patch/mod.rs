//! Patch application and inspection
//!
//! - `decoder`: Rebuilds the new buffer from the old buffer and the records
//! - `reader`: Walks records without the old buffer (summaries, validation)

pub mod decoder;
pub mod reader;

pub use decoder::PatchDecoder;
pub use reader::{PatchReader, PatchSummary};

use crate::config::PatchConfig;
use crate::error::Result;
use crate::format::PatchHeader;
use std::io::Read;

/// Read a complete patch (header and records) from `source` and rebuild the
/// new buffer
pub fn apply_patch<R: Read>(old: &[u8], source: &mut R, config: &PatchConfig) -> Result<Vec<u8>> {
    let header = PatchHeader::read_from(source)?;
    PatchDecoder::with_config(old, config.clone()).decode(source, header.new_size)
}
