//! Suffix array builder
//!
//! Sorts every suffix of the old buffer by rank doubling (Larsson-Sadakane
//! qsufsort):
//! 1. Bucket suffixes by their first byte
//! 2. Repeatedly refine unsettled groups using the rank of the suffix `h`
//!    bytes further on as the key, doubling `h` each pass
//! 3. Invert the rank array into the final index
//!
//! Two owned arrays are used: `index` (slot -> suffix offset, with negative
//! run markers for settled stretches) and `rank` (suffix offset -> group
//! rank). Group refinement uses an explicit work stack, so the depth of the
//! ternary partitioning never depends on the input.

use super::types::{Slot, SuffixIndex};
use crate::error::Result;
use crate::utils::try_alloc;

/// Groups smaller than this are sorted by repeated minimum selection
const SMALL_GROUP: usize = 16;

/// Builder for the suffix index of one buffer
pub struct SuffixArrayBuilder<'a> {
    text: &'a [u8],
}

impl<'a> SuffixArrayBuilder<'a> {
    pub fn new(text: &'a [u8]) -> Self {
        Self { text }
    }

    /// Sort all suffixes of the text
    ///
    /// Fails only if the two working arrays cannot be allocated.
    pub fn build(self) -> Result<SuffixIndex> {
        let slots = self.text.len() + 1;
        let mut index = try_alloc(slots, 0i64, "suffix index")?;
        let mut rank = try_alloc(slots, 0i64, "rank array")?;

        let mut sorter = Sorter {
            index: &mut index,
            rank: &mut rank,
            stack: Vec::new(),
        };
        sorter.seed(self.text);
        sorter.refine();
        sorter.invert();

        Ok(SuffixIndex::from_sorted(index))
    }
}

/// Pending refinement work
#[derive(Debug, Clone, Copy)]
enum Task {
    /// Order the slots `start..start + len` by their key
    Split { start: usize, len: usize },
    /// Give the tied slots `start..start + len` their shared final rank
    Settle { start: usize, len: usize },
}

struct Sorter<'s> {
    index: &'s mut [i64],
    rank: &'s mut [i64],
    stack: Vec<Task>,
}

impl Sorter<'_> {
    /// Bucket suffixes by first byte and assign initial ranks
    fn seed(&mut self, text: &[u8]) {
        let n = text.len();
        let mut buckets = [0usize; 256];

        for &b in text {
            buckets[b as usize] += 1;
        }
        for i in 1..256 {
            buckets[i] += buckets[i - 1];
        }
        // Shift so each bucket holds the slot just before its first member
        for i in (1..256).rev() {
            buckets[i] = buckets[i - 1];
        }
        buckets[0] = 0;

        for (offset, &b) in text.iter().enumerate() {
            buckets[b as usize] += 1;
            self.index[buckets[b as usize]] = offset as i64;
        }
        self.index[0] = n as i64;

        // Rank of a suffix is the last slot of its bucket
        for (offset, &b) in text.iter().enumerate() {
            self.rank[offset] = buckets[b as usize] as i64;
        }
        self.rank[n] = 0;

        for i in 1..256 {
            if buckets[i] == buckets[i - 1] + 1 {
                self.index[buckets[i]] = Slot::sorted_run(1);
            }
        }
        // The empty suffix is always first
        self.index[0] = Slot::sorted_run(1);
    }

    /// Run doubling passes until one run covers the whole index
    fn refine(&mut self) {
        let total = self.index.len();
        let mut h = 1;

        while self.index[0] != Slot::sorted_run(total) {
            let mut run = 0;
            let mut i = 0;

            while i < total {
                match Slot::decode(self.index[i]) {
                    Slot::SortedRun(len) => {
                        run += len;
                        i += len;
                    }
                    Slot::Unsorted(suffix) => {
                        // Merge the settled runs before this group
                        if run > 0 {
                            self.index[i - run] = Slot::sorted_run(run);
                        }
                        let len = self.rank[suffix] as usize + 1 - i;
                        self.split(i, len, h);
                        i += len;
                        run = 0;
                    }
                }
            }
            if run > 0 {
                self.index[i - run] = Slot::sorted_run(run);
            }

            h += h;
        }
    }

    /// Turn the rank array into the sorted index
    fn invert(&mut self) {
        for (suffix, &rank) in self.rank.iter().enumerate() {
            self.index[rank as usize] = suffix as i64;
        }
    }

    /// Sort key of the suffix at `slot` for depth `h`
    #[inline]
    fn key(&self, slot: usize, h: usize) -> i64 {
        let suffix = self.index[slot] as usize;
        self.rank.get(suffix + h).copied().unwrap_or(0)
    }

    /// Refine one group that shares a rank at depth `h / 2`
    fn split(&mut self, start: usize, len: usize, h: usize) {
        self.stack.push(Task::Split { start, len });

        while let Some(task) = self.stack.pop() {
            match task {
                Task::Split { start, len } if len < SMALL_GROUP => {
                    self.select_sort(start, len, h)
                }
                Task::Split { start, len } => self.partition(start, len, h),
                Task::Settle { start, len } => self.settle(start, len),
            }
        }
    }

    /// Sort a small group by repeatedly pulling its minimum keys forward
    fn select_sort(&mut self, start: usize, len: usize, h: usize) {
        let end = start + len;
        let mut k = start;

        while k < end {
            let mut min = self.key(k, h);
            let mut tied = 1;

            for i in k + 1..end {
                let key = self.key(i, h);
                if key < min {
                    min = key;
                    tied = 0;
                }
                if key == min {
                    self.index.swap(k + tied, i);
                    tied += 1;
                }
            }

            self.settle(k, tied);
            k += tied;
        }
    }

    /// Three-way partition around the middle key.
    ///
    /// Queues the lower part, then the settling of the equal part, then the
    /// higher part, so they run in that order.
    fn partition(&mut self, start: usize, len: usize, h: usize) {
        let end = start + len;
        let pivot = self.key(start + len / 2, h);

        let mut lower = 0;
        let mut equal = 0;
        for i in start..end {
            let key = self.key(i, h);
            if key < pivot {
                lower += 1;
            } else if key == pivot {
                equal += 1;
            }
        }
        let equal_start = start + lower;
        let higher_start = equal_start + equal;

        let mut i = start;
        let mut eq = 0;
        let mut hi = 0;
        while i < equal_start {
            let key = self.key(i, h);
            if key < pivot {
                i += 1;
            } else if key == pivot {
                self.index.swap(i, equal_start + eq);
                eq += 1;
            } else {
                self.index.swap(i, higher_start + hi);
                hi += 1;
            }
        }
        while equal_start + eq < higher_start {
            if self.key(equal_start + eq, h) == pivot {
                eq += 1;
            } else {
                self.index.swap(equal_start + eq, higher_start + hi);
                hi += 1;
            }
        }

        if end > higher_start {
            self.stack.push(Task::Split {
                start: higher_start,
                len: end - higher_start,
            });
        }
        self.stack.push(Task::Settle {
            start: equal_start,
            len: equal,
        });
        if lower > 0 {
            self.stack.push(Task::Split { start, len: lower });
        }
    }

    /// Assign a tied group the rank of its last slot
    fn settle(&mut self, start: usize, len: usize) {
        let group_rank = (start + len - 1) as i64;
        for slot in start..start + len {
            let suffix = self.index[slot] as usize;
            self.rank[suffix] = group_rank;
        }
        if len == 1 {
            self.index[start] = Slot::sorted_run(1);
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Adjacent ranks hold non-decreasing suffixes, empty suffix first
        #[test]
        fn sorted_order(text in prop::collection::vec(0u8..4, 0..600)) {
            let index = SuffixArrayBuilder::new(&text).build().unwrap();
            prop_assert_eq!(index.len(), text.len() + 1);
            prop_assert_eq!(index.get(0), text.len());
            for r in 1..index.len() {
                let a = &text[index.get(r - 1)..];
                let b = &text[index.get(r)..];
                prop_assert!(a < b);
            }
        }

        /// The index is a permutation of all offsets
        #[test]
        fn permutation(text in prop::collection::vec(any::<u8>(), 0..300)) {
            let index = SuffixArrayBuilder::new(&text).build().unwrap();
            let mut seen = vec![false; text.len() + 1];
            for r in 0..index.len() {
                let offset = index.get(r);
                prop_assert!(!seen[offset]);
                seen[offset] = true;
            }
        }
    }
}
