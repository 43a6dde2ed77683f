//! Sequence similarity for fuzzy keyword matching
//!
//! Ratcliff/Obershelp matching: find the longest common block, then recurse
//! into the unmatched text on either side. The similarity ratio is
//! `2 * M / (|a| + |b|)` where `M` is the total length of all matched blocks.
//!
//! Comparison is over Unicode scalar values, so accented headlines score the
//! same way regardless of their UTF-8 byte length.

use std::collections::HashMap;

/// Sequences at least this long drop "popular" elements from the index
const AUTOJUNK_MIN_LEN: usize = 200;

/// Similarity ratio between two strings (0.0 - 1.0)
///
/// Two empty strings are identical (1.0).
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matched = BlockMatcher::new(&a, &b).matched_len();
    2.0 * matched as f64 / total as f64
}

/// A common block: `a[a_start..a_start + len] == b[b_start..b_start + len]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    a_start: usize,
    b_start: usize,
    len: usize,
}

struct BlockMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions of each element of `b`, minus popular elements
    b_index: HashMap<char, Vec<usize>>,
}

impl<'a> BlockMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b_index: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b_index.entry(*c).or_default().push(j);
        }

        if b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b_index.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b_index }
    }

    /// Longest block inside `a[a_lo..a_hi]` x `b[b_lo..b_hi]`, earliest in `a` on ties
    fn longest_block(&self, a_lo: usize, a_hi: usize, b_lo: usize, b_hi: usize) -> Block {
        let mut best = Block {
            a_start: a_lo,
            b_start: b_lo,
            len: 0,
        };

        // run length of the block ending at b[j], for the previous row of a
        let mut run_at: HashMap<usize, usize> = HashMap::new();
        for i in a_lo..a_hi {
            let mut next_run_at = HashMap::new();
            if let Some(positions) = self.b_index.get(&self.a[i]) {
                for &j in positions {
                    if j < b_lo {
                        continue;
                    }
                    if j >= b_hi {
                        break;
                    }
                    let previous = if j > 0 {
                        run_at.get(&(j - 1)).copied().unwrap_or(0)
                    } else {
                        0
                    };
                    let len = previous + 1;
                    next_run_at.insert(j, len);
                    if len > best.len {
                        best = Block {
                            a_start: i + 1 - len,
                            b_start: j + 1 - len,
                            len,
                        };
                    }
                }
            }
            run_at = next_run_at;
        }

        // Popular elements were left out of the index; let equal neighbours extend the block
        while best.a_start > a_lo
            && best.b_start > b_lo
            && self.a[best.a_start - 1] == self.b[best.b_start - 1]
        {
            best.a_start -= 1;
            best.b_start -= 1;
            best.len += 1;
        }
        while best.a_start + best.len < a_hi
            && best.b_start + best.len < b_hi
            && self.a[best.a_start + best.len] == self.b[best.b_start + best.len]
        {
            best.len += 1;
        }

        best
    }

    /// Total length of all matching blocks
    fn matched_len(&self) -> usize {
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        let mut matched = 0;

        while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
            let block = self.longest_block(a_lo, a_hi, b_lo, b_hi);
            if block.len == 0 {
                continue;
            }
            matched += block.len;

            if a_lo < block.a_start && b_lo < block.b_start {
                pending.push((a_lo, block.a_start, b_lo, block.b_start));
            }
            let a_end = block.a_start + block.len;
            let b_end = block.b_start + block.len;
            if a_end < a_hi && b_end < b_hi {
                pending.push((a_end, a_hi, b_end, b_hi));
            }
        }

        matched
    }
}
