//! Types for the suffix index of the old buffer

/// Suffix index: every suffix start offset of a buffer of `n` bytes, plus the
/// empty suffix at offset `n`, in lexicographic order of the suffixes.
///
/// The empty suffix sorts before every other suffix, so `get(0) == n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixIndex {
    entries: Vec<i64>,
}

impl SuffixIndex {
    /// Wrap a fully sorted slot array (no pending run markers)
    pub(crate) fn from_sorted(entries: Vec<i64>) -> Self {
        debug_assert!(entries.iter().all(|&e| e >= 0));
        Self { entries }
    }

    /// Number of entries (buffer length + 1)
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true for a built index, which always holds the empty suffix
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Offset of the suffix at `rank`
    #[inline]
    pub fn get(&self, rank: usize) -> usize {
        self.entries[rank] as usize
    }

    /// Length of the indexed buffer
    #[inline]
    pub fn text_len(&self) -> usize {
        self.entries.len() - 1
    }
}

/// Best match for a probe found by [`SuffixIndex::search`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuffixMatch {
    /// Length of the common prefix between probe and old suffix
    pub length: usize,
    /// Start of the matching suffix in the old buffer
    pub position: usize,
}

/// Decoded view of one working slot of the index during construction.
///
/// While sorting, a negative slot `-L` stands for a run of `L` suffixes whose
/// final order is already known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Offset of a suffix still waiting for refinement
    Unsorted(usize),
    /// Run of this many settled entries starting here
    SortedRun(usize),
}

impl Slot {
    #[inline]
    pub(crate) fn decode(raw: i64) -> Self {
        if raw < 0 {
            Slot::SortedRun(raw.unsigned_abs() as usize)
        } else {
            Slot::Unsorted(raw as usize)
        }
    }

    #[inline]
    pub(crate) fn sorted_run(len: usize) -> i64 {
        -(len as i64)
    }
}
