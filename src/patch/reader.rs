//! Forward-only walk over a patch stream
//!
//! Reads control triples without the old buffer, skipping payload bytes.
//! Bounds are validated the same way the decoder validates them, so a patch
//! that walks cleanly here only fails to apply on I/O errors.

use crate::error::{CorruptKind, Error, Result};
use crate::format::{ControlTriple, PatchHeader, check_bounds};
use serde::{Deserialize, Serialize};
use std::io::{self, Read};

/// Reader over the records of one patch
pub struct PatchReader<R> {
    source: R,
    header: PatchHeader,
    new_pos: u64,
}

impl<R: Read> PatchReader<R> {
    /// Read the header and position at the first record
    pub fn new(mut source: R) -> Result<Self> {
        let header = PatchHeader::read_from(&mut source)?;
        Ok(Self {
            source,
            header,
            new_pos: 0,
        })
    }

    pub fn header(&self) -> &PatchHeader {
        &self.header
    }

    /// Read the next control triple and skip its payload
    ///
    /// Returns `Ok(None)` once the declared output size is reached.
    pub fn next_control(&mut self) -> Result<Option<ControlTriple>> {
        let size = self.header.new_size;
        if self.new_pos >= size {
            return Ok(None);
        }

        let triple = ControlTriple::read_from(&mut self.source)?;
        let (copy_len, extra_len) = triple.lengths()?;

        check_bounds(self.new_pos, copy_len, size)?;
        self.skip(copy_len)?;
        self.new_pos += copy_len;

        check_bounds(self.new_pos, extra_len, size)?;
        self.skip(extra_len)?;
        self.new_pos += extra_len;

        Ok(Some(triple))
    }

    /// Walk all records and collect statistics
    pub fn summarize(mut self) -> Result<PatchSummary> {
        let mut summary = PatchSummary {
            new_size: self.header.new_size,
            patch_size: PatchHeader::SIZE as u64,
            ..Default::default()
        };

        while let Some(triple) = self.next_control()? {
            if summary.records == 0 {
                summary.min_seek = triple.seek;
                summary.max_seek = triple.seek;
            }
            summary.records += 1;
            summary.copy_bytes += triple.copy_len as u64;
            summary.extra_bytes += triple.extra_len as u64;
            summary.min_seek = summary.min_seek.min(triple.seek);
            summary.max_seek = summary.max_seek.max(triple.seek);
        }

        summary.trailing_bytes = io::copy(&mut self.source, &mut io::sink())?;
        summary.patch_size += summary.records * ControlTriple::SIZE as u64
            + summary.copy_bytes
            + summary.extra_bytes
            + summary.trailing_bytes;

        Ok(summary)
    }

    fn skip(&mut self, len: u64) -> Result<()> {
        let skipped = io::copy(&mut (&mut self.source).take(len), &mut io::sink())?;
        if skipped < len {
            return Err(Error::CorruptPatch(CorruptKind::Truncated));
        }
        Ok(())
    }
}

/// Statistics about one patch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSummary {
    /// Size of the reconstructed output
    pub new_size: u64,
    /// Total size of the patch stream, including trailing bytes
    pub patch_size: u64,
    /// Number of records
    pub records: u64,
    /// Bytes reconstructed from diff + old
    pub copy_bytes: u64,
    /// Bytes stored verbatim
    pub extra_bytes: u64,
    pub min_seek: i64,
    pub max_seek: i64,
    /// Bytes following the last record (ignored when patching)
    pub trailing_bytes: u64,
}

impl PatchSummary {
    /// Fraction of the output reconstructed from the old buffer
    pub fn copy_ratio(&self) -> f64 {
        if self.new_size == 0 {
            return 0.0;
        }
        self.copy_bytes as f64 / self.new_size as f64
    }
}
