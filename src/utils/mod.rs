//! Utility functions shared by the encoder and the decoder.
//!
//! ## Modules
//!
//! - [`encoding`] - Sign-magnitude 8-byte integers used on the patch wire
//! - [`progress`] - Progress spinner (no-op without the `progress` feature)

pub mod encoding;
pub mod progress;

pub use encoding::*;

use crate::error::{Error, Result};

/// Allocate a filled vector, reporting failure instead of aborting
pub(crate) fn try_alloc<T: Clone>(len: usize, fill: T, what: &'static str) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| Error::Alloc {
        what,
        bytes: (len as u64).saturating_mul(std::mem::size_of::<T>() as u64),
    })?;
    buf.resize(len, fill);
    Ok(buf)
}
