//! Longest-match search over a suffix index
//!
//! Binary search narrows the rank range until two candidates remain, then
//! the longer common prefix of the two wins.

use super::types::{SuffixIndex, SuffixMatch};

impl SuffixIndex {
    /// Find the old-buffer suffix sharing the longest prefix with `probe`
    ///
    /// `old` must be the buffer this index was built from. A result with
    /// `length == 0` means nothing useful matched.
    pub fn search(&self, old: &[u8], probe: &[u8]) -> SuffixMatch {
        debug_assert_eq!(old.len(), self.text_len());

        let mut lo = 0;
        let mut hi = self.text_len();

        while hi - lo >= 2 {
            let mid = lo + (hi - lo) / 2;
            let suffix = &old[self.get(mid)..];
            let cmp_len = suffix.len().min(probe.len());

            if suffix[..cmp_len] < probe[..cmp_len] {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let lo_pos = self.get(lo);
        let hi_pos = self.get(hi);
        let lo_len = match_len(&old[lo_pos..], probe);
        let hi_len = match_len(&old[hi_pos..], probe);

        if lo_len > hi_len {
            SuffixMatch {
                length: lo_len,
                position: lo_pos,
            }
        } else {
            SuffixMatch {
                length: hi_len,
                position: hi_pos,
            }
        }
    }
}

/// Length of the common prefix of two byte strings
#[inline]
pub fn match_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
