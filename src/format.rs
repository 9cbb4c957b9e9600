//! Patch wire format shared by the encoder and the decoder.
//!
//! A patch is an 8-byte header holding the reconstructed size, followed by
//! records. Each record is a control triple (three 8-byte integers) then
//! `copy_len` diff bytes then `extra_len` literal bytes. All integers use the
//! sign-magnitude encoding from [`crate::utils::encoding`].

use crate::error::{CorruptKind, Error, Result};
use crate::utils::encoding::{OFFSET_SIZE, decode_offset, encode_offset, read_offset, write_offset};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// One patch block: how many bytes to copy-with-diff, how many literal bytes
/// follow, and how far to move the old cursor afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlTriple {
    /// Bytes reconstructed by adding diff bytes to old bytes
    pub copy_len: i64,
    /// Bytes copied verbatim from the patch
    pub extra_len: i64,
    /// Signed adjustment of the old cursor for the next record
    pub seek: i64,
}

impl ControlTriple {
    /// Size of an encoded triple in bytes
    pub const SIZE: usize = 3 * OFFSET_SIZE; // 24 bytes

    pub fn new(copy_len: i64, extra_len: i64, seek: i64) -> Self {
        Self {
            copy_len,
            extra_len,
            seek,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..8].copy_from_slice(&encode_offset(self.copy_len));
        buf[8..16].copy_from_slice(&encode_offset(self.extra_len));
        buf[16..24].copy_from_slice(&encode_offset(self.seek));
        buf
    }

    pub fn from_bytes(buf: &[u8; Self::SIZE]) -> Self {
        let field = |i: usize| {
            let mut raw = [0u8; OFFSET_SIZE];
            raw.copy_from_slice(&buf[i * OFFSET_SIZE..(i + 1) * OFFSET_SIZE]);
            decode_offset(&raw)
        };
        Self::new(field(0), field(1), field(2))
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Read a triple; a short read is reported as a truncated patch
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        reader.read_exact(&mut buf).map_err(Error::from_read)?;
        Ok(Self::from_bytes(&buf))
    }

    /// Copy and extra lengths as unsigned values, rejecting negatives
    pub fn lengths(&self) -> Result<(u64, u64)> {
        for len in [self.copy_len, self.extra_len] {
            if len < 0 {
                return Err(Error::CorruptPatch(CorruptKind::NegativeLength(len)));
            }
        }
        Ok((self.copy_len as u64, self.extra_len as u64))
    }
}

/// Patch header: the size of the reconstructed output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchHeader {
    pub new_size: u64,
}

impl PatchHeader {
    /// Size of header in bytes
    pub const SIZE: usize = OFFSET_SIZE;

    pub fn new(new_size: u64) -> Self {
        Self { new_size }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let size = i64::try_from(self.new_size).map_err(|_| Error::TooLarge {
            what: "Output",
            size: self.new_size,
            limit: i64::MAX as u64,
        })?;
        write_offset(writer, size)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let size = read_offset(reader).map_err(Error::from_read)?;
        if size < 0 {
            return Err(Error::CorruptPatch(CorruptKind::NegativeSize(size)));
        }
        Ok(Self::new(size as u64))
    }
}

/// Check that `len` bytes starting at `pos` fit within `size`
pub(crate) fn check_bounds(pos: u64, len: u64, size: u64) -> Result<()> {
    match pos.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(Error::CorruptPatch(CorruptKind::OutOfBounds { pos, len, size })),
    }
}
