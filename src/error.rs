//! Error types for delta encoding and patching.

use thiserror::Error;

/// Result type alias for bsdelta operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the encoder and the decoder.
///
/// Every failure aborts the whole call; there is no partial success.
#[derive(Error, Debug)]
pub enum Error {
    /// A working buffer could not be allocated
    #[error("Failed to allocate {bytes} bytes for {what}")]
    Alloc { what: &'static str, bytes: u64 },

    /// The output sink or input source failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The patch stream is malformed
    #[error("Corrupt patch: {0}")]
    CorruptPatch(CorruptKind),

    /// An input or output exceeds the configured limit
    #[error("{what} size {size} exceeds limit {limit}")]
    TooLarge {
        what: &'static str,
        size: u64,
        limit: u64,
    },
}

/// What exactly was wrong with a corrupt patch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptKind {
    /// The stream ended before the declared output was reconstructed
    Truncated,
    /// The header declares a negative output size
    NegativeSize(i64),
    /// A control triple carries a negative copy or extra length
    NegativeLength(i64),
    /// A record would write past the declared output size
    OutOfBounds { pos: u64, len: u64, size: u64 },
    /// The old-buffer cursor overflowed while seeking
    SeekOverflow,
}

impl std::fmt::Display for CorruptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorruptKind::Truncated => write!(f, "unexpected end of stream"),
            CorruptKind::NegativeSize(size) => write!(f, "negative output size {}", size),
            CorruptKind::NegativeLength(len) => write!(f, "negative record length {}", len),
            CorruptKind::OutOfBounds { pos, len, size } => write!(
                f,
                "record of {} bytes at offset {} exceeds output size {}",
                len, pos, size
            ),
            CorruptKind::SeekOverflow => write!(f, "old cursor overflow"),
        }
    }
}

impl Error {
    /// Map a read failure, treating a short read as truncation
    pub(crate) fn from_read(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::CorruptPatch(CorruptKind::Truncated)
        } else {
            Error::Io(err)
        }
    }

    /// Returns true if this error reports a malformed patch
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::CorruptPatch(_))
    }
}
