//! Sign-magnitude integer encoding used on the patch wire.
//!
//! Each integer occupies 8 bytes: the magnitude in little-endian order in the
//! low 63 bits, and the sign in the top bit of the last byte.

use std::io::{self, Read, Write};

/// Size of one encoded integer
pub const OFFSET_SIZE: usize = 8;

const SIGN_BIT: u8 = 0x80;

/// Encode an i64 as 8 sign-magnitude bytes
#[inline]
pub fn encode_offset(value: i64) -> [u8; OFFSET_SIZE] {
    let mut buf = value.unsigned_abs().to_le_bytes();
    if value < 0 {
        buf[7] |= SIGN_BIT;
    }
    buf
}

/// Decode 8 sign-magnitude bytes into an i64
///
/// A set sign bit with zero magnitude decodes as 0.
#[inline]
pub fn decode_offset(buf: &[u8; OFFSET_SIZE]) -> i64 {
    let mut magnitude = *buf;
    magnitude[7] &= !SIGN_BIT;
    // Top bit is cleared, so the magnitude always fits in an i64
    let value = u64::from_le_bytes(magnitude) as i64;
    if buf[7] & SIGN_BIT != 0 { -value } else { value }
}

/// Write a sign-magnitude i64
pub fn write_offset<W: Write>(writer: &mut W, value: i64) -> io::Result<()> {
    writer.write_all(&encode_offset(value))
}

/// Read a sign-magnitude i64
pub fn read_offset<R: Read>(reader: &mut R) -> io::Result<i64> {
    let mut buf = [0u8; OFFSET_SIZE];
    reader.read_exact(&mut buf)?;
    Ok(decode_offset(&buf))
}
