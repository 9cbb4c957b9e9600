//! # bsdelta - Binary Delta Encoding
//!
//! bsdelta computes compact binary patches between two byte buffers and
//! applies them. Patches use the classic bsdiff record layout: an 8-byte
//! output size followed by (control triple, diff bytes, extra bytes) records.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`suffix_array`] - Suffix sorting of the old buffer and longest-match search
//! - [`diff`] - Delta encoder (greedy block scan over the new buffer)
//! - [`patch`] - Patch decoder and record reader
//! - [`format`] - Wire format shared by both directions
//! - [`config`] - Encoder and decoder tunables
//! - [`output`] - Terminal summaries for the command line tool
//! - [`utils`] - Integer encoding, allocation, progress display
//!
//! ## Quick Start
//!
//! ```
//! let old = b"The quick brown fox jumps over the lazy dog";
//! let new = b"The quick brown cat jumps over the lazy dog!";
//!
//! let patch = bsdelta::diff(old, new).unwrap();
//! let rebuilt = bsdelta::patch(old, &patch).unwrap();
//! assert_eq!(rebuilt, new);
//! ```
//!
//! Patches are not compressed. Callers that want smaller patches wrap the
//! sink and source in the compressor of their choice.

pub mod config;
pub mod diff;
pub mod error;
pub mod format;
pub mod output;
pub mod patch;
pub mod suffix_array;
pub mod utils;

pub use config::{Config, DiffConfig, PatchConfig};
pub use diff::{DeltaEncoder, write_patch};
pub use error::{CorruptKind, Error, Result};
pub use format::{ControlTriple, PatchHeader};
pub use patch::{PatchDecoder, PatchReader, PatchSummary, apply_patch};
pub use suffix_array::{SuffixArrayBuilder, SuffixIndex, SuffixMatch};

/// Build a complete patch turning `old` into `new`
pub fn diff(old: &[u8], new: &[u8]) -> Result<Vec<u8>> {
    let mut patch = Vec::new();
    write_patch(old, new, &mut patch, &DiffConfig::default())?;
    Ok(patch)
}

/// Apply a complete patch to `old`
pub fn patch(old: &[u8], patch: &[u8]) -> Result<Vec<u8>> {
    apply_patch(old, &mut std::io::Cursor::new(patch), &PatchConfig::default())
}
