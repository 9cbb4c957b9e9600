//! Patch decoder
//!
//! Replays records against the old buffer. Every record is bounds-checked
//! against the declared output size before anything is read into the output.
//! The declared size is untrusted: [`PatchDecoder::decode`] grows its output
//! only as payload bytes actually arrive.

use crate::config::PatchConfig;
use crate::error::{CorruptKind, Error, Result};
use crate::format::{ControlTriple, check_bounds};
use std::io::Read;

/// Largest step by which a growing output is extended before reading
const GROW_STEP: u64 = 1 << 16;

/// Decoder reconstructing new buffers from one old buffer
pub struct PatchDecoder<'a> {
    old: &'a [u8],
    config: PatchConfig,
}

impl<'a> PatchDecoder<'a> {
    pub fn new(old: &'a [u8]) -> Self {
        Self::with_config(old, PatchConfig::default())
    }

    pub fn with_config(old: &'a [u8], config: PatchConfig) -> Self {
        Self { old, config }
    }

    /// Reconstruct `out_size` bytes from the records in `source`
    pub fn decode<R: Read>(&self, source: &mut R, out_size: u64) -> Result<Vec<u8>> {
        self.config.check_output(out_size)?;
        if usize::try_from(out_size).is_err() {
            return Err(Error::TooLarge {
                what: "Output",
                size: out_size,
                limit: usize::MAX as u64,
            });
        }

        let mut out = Vec::new();
        self.replay(source, &mut out, out_size)?;
        Ok(out)
    }

    /// Reconstruct into a caller-owned buffer; its length is the output size
    ///
    /// On error the contents of `out` are unspecified.
    pub fn decode_into<R: Read>(&self, source: &mut R, out: &mut [u8]) -> Result<()> {
        let size = out.len() as u64;
        self.replay(source, &mut FixedOutput { buf: out, pos: 0 }, size)
    }

    fn replay<R: Read, O: Output>(&self, source: &mut R, out: &mut O, size: u64) -> Result<()> {
        let mut old_pos: i64 = 0;
        let mut new_pos: u64 = 0;

        while new_pos < size {
            let triple = ControlTriple::read_from(source)?;
            let (copy_len, extra_len) = triple.lengths()?;

            check_bounds(new_pos, copy_len, size)?;
            let copy = out.fill_from(source, copy_len)?;
            add_old_bytes(copy, self.old, old_pos);

            new_pos += copy_len;
            old_pos = advance(old_pos, triple.copy_len)?;

            check_bounds(new_pos, extra_len, size)?;
            out.fill_from(source, extra_len)?;

            new_pos += extra_len;
            old_pos = advance(old_pos, triple.seek)?;
        }

        Ok(())
    }
}

/// Destination of reconstructed bytes
trait Output {
    /// Read the next `len` payload bytes from `source` into the output and
    /// return them. `len` is already bounds-checked.
    fn fill_from<R: Read>(&mut self, source: &mut R, len: u64) -> Result<&mut [u8]>;
}

impl Output for Vec<u8> {
    fn fill_from<R: Read>(&mut self, source: &mut R, len: u64) -> Result<&mut [u8]> {
        let start = self.len();
        let mut remaining = len;

        // At most one step is allocated ahead of the bytes actually read
        while remaining > 0 {
            let step = remaining.min(GROW_STEP) as usize;
            self.try_reserve(step).map_err(|_| Error::Alloc {
                what: "patch output",
                bytes: (self.len() + step) as u64,
            })?;
            let filled = self.len();
            self.resize(filled + step, 0);
            source
                .read_exact(&mut self[filled..])
                .map_err(Error::from_read)?;
            remaining -= step as u64;
        }

        Ok(&mut self[start..])
    }
}

/// Caller-owned output buffer with a write cursor
struct FixedOutput<'o> {
    buf: &'o mut [u8],
    pos: usize,
}

impl Output for FixedOutput<'_> {
    fn fill_from<R: Read>(&mut self, source: &mut R, len: u64) -> Result<&mut [u8]> {
        let start = self.pos;
        let end = start + len as usize;
        self.pos = end;

        let dst = &mut self.buf[start..end];
        source.read_exact(dst).map_err(Error::from_read)?;
        Ok(dst)
    }
}

#[inline]
fn advance(old_pos: i64, by: i64) -> Result<i64> {
    old_pos
        .checked_add(by)
        .ok_or(Error::CorruptPatch(CorruptKind::SeekOverflow))
}

/// Add old bytes onto diff bytes; positions outside the old buffer add nothing
fn add_old_bytes(diff: &mut [u8], old: &[u8], old_pos: i64) {
    let len = diff.len() as i64;
    let first = old_pos.saturating_neg().clamp(0, len);
    let end = (old.len() as i64).saturating_sub(old_pos).clamp(0, len);

    for i in first..end {
        let byte = &mut diff[i as usize];
        *byte = byte.wrapping_add(old[(old_pos + i) as usize]);
    }
}
