//! Delta encoder
//!
//! Walks the new buffer once, looking up each position in the suffix index of
//! the old buffer. A block closes when a fresh match either lines up exactly
//! with the running alignment of the previous block, or beats that alignment
//! by more than the configured slack. Each closed block is emitted as one
//! record: a stretch of diff bytes continuing the previous match, followed by
//! the literal bytes that no match covered.

use crate::config::DiffConfig;
use crate::error::Result;
use crate::format::{ControlTriple, PatchHeader};
use crate::suffix_array::{SuffixArrayBuilder, SuffixIndex};
use crate::utils::try_alloc;
use std::io::Write;

/// Encoder for one (old, new) pair
pub struct DeltaEncoder<'a> {
    old: &'a [u8],
    new: &'a [u8],
    config: DiffConfig,
}

/// Cursor state carried between blocks
#[derive(Debug, Default, Clone, Copy)]
struct Block {
    /// Start of the current block in the new buffer
    scan: i64,
    /// Start of the current block's match in the old buffer
    pos: i64,
    /// `pos - scan` of the previous match
    offset: i64,
}

impl<'a> DeltaEncoder<'a> {
    pub fn new(old: &'a [u8], new: &'a [u8]) -> Self {
        Self::with_config(old, new, DiffConfig::default())
    }

    pub fn with_config(old: &'a [u8], new: &'a [u8], config: DiffConfig) -> Self {
        Self { old, new, config }
    }

    /// Write header and records
    pub fn write_patch<W: Write>(&self, sink: &mut W) -> Result<()> {
        self.config.check_input("New", self.new.len())?;
        PatchHeader::new(self.new.len() as u64).write_to(sink)?;
        self.encode(sink)
    }

    /// Write the records only (no header)
    ///
    /// On error, whatever was already written to `sink` is incomplete.
    pub fn encode<W: Write>(&self, sink: &mut W) -> Result<()> {
        self.config.check_input("Old", self.old.len())?;
        self.config.check_input("New", self.new.len())?;

        let index = SuffixArrayBuilder::new(self.old).build()?;
        self.encode_with_index(&index, sink)
    }

    /// Write the records using a prebuilt index of the old buffer
    pub fn encode_with_index<W: Write>(&self, index: &SuffixIndex, sink: &mut W) -> Result<()> {
        let old = self.old;
        let new = self.new;
        let old_size = old.len() as i64;
        let new_size = new.len() as i64;
        let slack = i64::try_from(self.config.match_slack).unwrap_or(i64::MAX);

        let mut scratch = try_alloc(new.len(), 0u8, "diff scratch")?;

        // Old byte at `o` equals new byte at `n`
        let aligned = |o: i64, n: i64| o >= 0 && o < old_size && old[o as usize] == new[n as usize];

        let mut last = Block::default();
        let mut scan: i64 = 0;
        let mut len: i64 = 0;
        let mut pos: i64 = 0;

        while scan < new_size {
            let mut old_score: i64 = 0;
            scan += len;
            let mut scored = scan;

            while scan < new_size {
                let found = index.search(old, &new[scan as usize..]);
                len = found.length as i64;
                pos = found.position as i64;

                while scored < scan + len {
                    if aligned(scored + last.offset, scored) {
                        old_score += 1;
                    }
                    scored += 1;
                }

                if (len == old_score && len != 0) || len > old_score.saturating_add(slack) {
                    break;
                }

                if aligned(scan + last.offset, scan) {
                    old_score -= 1;
                }
                scan += 1;
            }

            if len == old_score && scan != new_size {
                continue;
            }

            let mut lenf = forward_extension(old, new, last, scan);
            let mut lenb = if scan < new_size {
                backward_extension(old, new, last, scan, pos)
            } else {
                0
            };

            if last.scan + lenf > scan - lenb {
                let overlap = (last.scan + lenf) - (scan - lenb);
                let forward = (last.scan + lenf - overlap, last.pos + lenf - overlap);
                let backward = (scan - lenb, pos - lenb);
                let lens = split_overlap(old, new, forward, backward, overlap);
                lenf += lens - overlap;
                lenb -= lens;
            }

            let extra_start = last.scan + lenf;
            let extra_len = (scan - lenb) - extra_start;
            let triple = ControlTriple::new(lenf, extra_len, (pos - lenb) - (last.pos + lenf));
            triple.write_to(sink)?;

            let diff = &mut scratch[..lenf as usize];
            let new_run = &new[last.scan as usize..];
            let old_run = &old[last.pos as usize..];
            for (i, byte) in diff.iter_mut().enumerate() {
                *byte = new_run[i].wrapping_sub(old_run[i]);
            }
            sink.write_all(diff)?;
            sink.write_all(&new[extra_start as usize..(extra_start + extra_len) as usize])?;

            last = Block {
                scan: scan - lenb,
                pos: pos - lenb,
                offset: pos - scan,
            };
        }

        Ok(())
    }
}

/// How many bytes after the previous block to encode as diff against the old
/// buffer, maximising `2 * matches - length`
fn forward_extension(old: &[u8], new: &[u8], last: Block, scan: i64) -> i64 {
    let old_size = old.len() as i64;
    let mut matches = 0;
    let mut best_matches = 0;
    let mut lenf = 0;

    let mut i = 0;
    while last.scan + i < scan && last.pos + i < old_size {
        if old[(last.pos + i) as usize] == new[(last.scan + i) as usize] {
            matches += 1;
        }
        i += 1;
        if matches * 2 - i > best_matches * 2 - lenf {
            best_matches = matches;
            lenf = i;
        }
    }

    lenf
}

/// How many bytes before the new match to attribute to it, by the same rule
fn backward_extension(old: &[u8], new: &[u8], last: Block, scan: i64, pos: i64) -> i64 {
    let mut matches = 0;
    let mut best_matches = 0;
    let mut lenb = 0;

    let mut i = 1;
    while scan >= last.scan + i && pos >= i {
        if old[(pos - i) as usize] == new[(scan - i) as usize] {
            matches += 1;
        }
        if matches * 2 - i > best_matches * 2 - lenb {
            best_matches = matches;
            lenb = i;
        }
        i += 1;
    }

    lenb
}

/// Where to cut when the forward and backward extensions overlap.
///
/// `forward` and `backward` are the (new, old) start offsets of the
/// overlapping span as seen by each extension. Returns how many overlapping
/// bytes stay with the forward extension.
fn split_overlap(
    old: &[u8],
    new: &[u8],
    forward: (i64, i64),
    backward: (i64, i64),
    overlap: i64,
) -> i64 {
    let mut score = 0;
    let mut best = 0;
    let mut lens = 0;

    for i in 0..overlap {
        if new[(forward.0 + i) as usize] == old[(forward.1 + i) as usize] {
            score += 1;
        }
        if new[(backward.0 + i) as usize] == old[(backward.1 + i) as usize] {
            score -= 1;
        }
        if score > best {
            best = score;
            lens = i + 1;
        }
    }

    lens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::PatchReader;
    use std::io::Cursor;

    fn records(old: &[u8], new: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        DeltaEncoder::new(old, new).encode(&mut out).unwrap();
        out
    }

    fn controls(old: &[u8], new: &[u8]) -> Vec<ControlTriple> {
        let mut patch = Vec::new();
        DeltaEncoder::new(old, new).write_patch(&mut patch).unwrap();
        let mut reader = PatchReader::new(Cursor::new(patch)).unwrap();
        let mut triples = Vec::new();
        while let Some(triple) = reader.next_control().unwrap() {
            triples.push(triple);
        }
        triples
    }

    #[test]
    fn test_empty_new_writes_nothing() {
        assert!(records(b"anything", b"").is_empty());
        assert!(records(b"", b"").is_empty());
    }

    #[test]
    fn test_empty_old_is_all_extra() {
        let out = records(b"", b"HELLO");
        let triple = ControlTriple::from_bytes(out[..24].try_into().unwrap());
        assert_eq!(triple, ControlTriple::new(0, 5, 0));
        assert_eq!(&out[24..], b"HELLO");
    }

    #[test]
    fn test_identical_is_single_copy() {
        // The closing seek rewinds to the last match start
        let triples = controls(b"BABAR", b"BABAR");
        assert_eq!(triples, vec![ControlTriple::new(5, 0, -5)]);
    }

    /// Append one expected record
    fn block(
        out: &mut Vec<u8>,
        (copy_len, extra_len, seek): (i64, i64, i64),
        diff: &[u8],
        extra: &[u8],
    ) {
        out.extend_from_slice(&ControlTriple::new(copy_len, extra_len, seek).to_bytes());
        out.extend_from_slice(diff);
        out.extend_from_slice(extra);
    }

    // Record streams below are the exact output of the classic bsdiff scan.

    #[test]
    fn test_golden_overlap_split() {
        // Backward extension overlaps the forward one by 9; 8 stay forward
        let out = records(b"bbbbdaaaddcdbbddbacabbab", b"bbbbdaaadcabbddbacabbab");
        let mut want = Vec::new();
        block(&mut want, (8, 0, 1), &[0; 8], b"");
        let mut diff = [0u8; 15];
        diff[2] = 253;
        block(&mut want, (15, 0, -12), &diff, b"");
        assert_eq!(out, want);
    }

    #[test]
    fn test_golden_full_overlap() {
        let out = records(b"xzzzxzzxxxzzyzxzx.xx.yzzx.", b".zzzzzxxzxzyzxzx.xx.yzzx.");
        let mut want = Vec::new();
        block(&mut want, (4, 0, 1), &[182, 0, 0, 0], b"");
        let mut diff = [0u8; 21];
        diff[4] = 2;
        diff[5] = 254;
        block(&mut want, (21, 0, -14), &diff, b"");
        assert_eq!(out, want);
    }

    #[test]
    fn test_golden_extension_ties() {
        // Ties in the 2 * matches - length score must not extend either side
        let out = records(b"y.zzzyzyyxxxzy..z", b"y.zxzxzyzyyxxxzy..z");
        let mut want = Vec::new();
        block(&mut want, (3, 3, 1), &[0; 3], b"xzx");
        block(&mut want, (13, 0, -12), &[0; 13], b"");
        assert_eq!(out, want);
    }

    #[test]
    fn test_golden_text_edit() {
        let out = records(
            b"The quick brown fox jumps over the lazy dog. The quick brown fox.",
            b"The quick red fox jumped over the lazy dogs. The quick brown cat.",
        );
        let mut want = Vec::new();
        block(&mut want, (10, 3, 5), &[0; 10], b"red");
        block(&mut want, (9, 2, 1), &[0; 9], b"ed");
        block(&mut want, (18, 1, 0), &[0; 18], b"s");
        block(&mut want, (18, 4, 3), &[0; 18], b"cat.");
        assert_eq!(out, want);
    }

    #[test]
    fn test_golden_repeated_bytes() {
        let out = records(b"aaaaaaaaaa", b"aaaaaaaaaaaaaaa");
        let mut want = Vec::new();
        block(&mut want, (10, 5, -1), &[0; 10], b"aaaaa");
        assert_eq!(out, want);
    }

    #[test]
    fn test_diff_bytes_are_wrapping_differences() {
        let old = [10u8, 20, 30, 40, 50, 60, 70, 80];
        let mut new = old;
        new[3] = 0; // 0 - 40 wraps
        let out = records(&old, &new);

        let triple = ControlTriple::from_bytes(out[..24].try_into().unwrap());
        assert_eq!(triple.copy_len, 8);
        assert_eq!(triple.extra_len, 0);
        assert_eq!(&out[24..32], &[0, 0, 0, 216, 0, 0, 0, 0]);
    }

    #[test]
    fn test_deterministic() {
        let old: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 251) as u8).collect();
        let mut new = old.clone();
        new.splice(100..200, b"inserted text".iter().copied());
        new.extend_from_slice(&old[..500]);
        assert_eq!(records(&old, &new), records(&old, &new));
    }

    #[test]
    fn test_sink_failure_propagates() {
        struct FailingSink;
        impl Write for FailingSink {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let err = DeltaEncoder::new(b"old", b"new")
            .encode(&mut FailingSink)
            .unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }

    #[test]
    fn test_input_limit() {
        let config = DiffConfig {
            max_input_size: 3,
            ..Default::default()
        };
        let err = DeltaEncoder::with_config(b"abcd", b"ab", config)
            .encode(&mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, crate::Error::TooLarge { what: "Old", .. }));
    }

    #[test]
    fn test_forward_extension_prefers_dense_matches() {
        let old = b"abcdXXXX";
        let new = b"abcdYYYY";
        let last = Block::default();
        assert_eq!(forward_extension(old, new, last, 8), 4);
    }

    #[test]
    fn test_backward_extension() {
        let old = b"xxxxabcd";
        let new = b"yyyyabcd";
        let last = Block::default();
        // New match starts at the end of both buffers
        assert_eq!(backward_extension(old, new, last, 8, 8), 4);
    }

    #[test]
    fn test_split_overlap_keeps_better_side() {
        // Forward side matches the first two bytes, backward side the rest
        let old = b"abXYcd";
        let new = b"abcd";
        assert_eq!(split_overlap(old, new, (0, 0), (0, 2), 4), 2);
    }
}
