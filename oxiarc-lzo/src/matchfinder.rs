//! Hash-chain match finder for the leveled encoder.
//!
//! Positions are bucketed by a hash of their next three bytes; each bucket
//! is a singly linked chain through `prev`, newest first. The chain table is
//! a ring larger than the format's maximum distance, so every link walked
//! within the window is still valid.

use crate::format::{MAX_DISTANCE, MIN_MATCH, match_cost};

/// Hash table size (must be power of 2).
const HASH_LOG: u32 = 15;
const HASH_SIZE: usize = 1 << HASH_LOG;

/// Chain ring size (must be a power of 2 above the maximum distance).
const CHAIN_SIZE: usize = 1 << 16;
const CHAIN_MASK: usize = CHAIN_SIZE - 1;

const EMPTY: usize = usize::MAX;

/// A back-reference candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Match {
    pub distance: usize,
    pub len: usize,
}

impl Match {
    /// Bytes saved by coding this match instead of its literals.
    ///
    /// Returns `None` if the match is not encodable after `literals_before`.
    #[inline]
    pub(crate) fn savings(self, literals_before: usize) -> Option<isize> {
        match_cost(self.distance, self.len, literals_before)
            .map(|cost| self.len as isize - cost as isize)
    }
}

/// Search limits for one lookup.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SearchLimits {
    /// Maximum chain links to follow.
    pub max_chain: usize,
    /// Stop searching once a match this long is found.
    pub nice_length: usize,
}

/// Hash chains over one input.
pub(crate) struct HashChain {
    head: Vec<usize>,
    prev: Vec<usize>,
    /// Next position not yet inserted.
    next_insert: usize,
}

impl HashChain {
    pub(crate) fn new() -> Self {
        Self {
            head: vec![EMPTY; HASH_SIZE],
            prev: vec![EMPTY; CHAIN_SIZE],
            next_insert: 0,
        }
    }

    /// Hash 3 bytes for position lookup.
    #[inline]
    fn hash3(input: &[u8], pos: usize) -> usize {
        let val = u32::from(input[pos])
            | (u32::from(input[pos + 1]) << 8)
            | (u32::from(input[pos + 2]) << 16);
        (val.wrapping_mul(2654435761) >> (32 - HASH_LOG)) as usize
    }

    /// Insert every position before `end` that has not been inserted yet.
    pub(crate) fn insert_until(&mut self, input: &[u8], end: usize) {
        let limit = end.min(input.len().saturating_sub(MIN_MATCH - 1));
        while self.next_insert < limit {
            let pos = self.next_insert;
            let h = Self::hash3(input, pos);
            self.prev[pos & CHAIN_MASK] = self.head[h];
            self.head[h] = pos;
            self.next_insert += 1;
        }
        self.next_insert = self.next_insert.max(end);
    }

    /// Walk the chain for `pos`, calling `visit(distance, len)` for each
    /// candidate of at least [`MIN_MATCH`] bytes, nearest first.
    ///
    /// `visit` returns `false` to stop the walk early. Candidates that cannot
    /// beat `floor` bytes are skipped without a full comparison.
    fn walk(
        &self,
        input: &[u8],
        pos: usize,
        max_chain: usize,
        mut floor: usize,
        mut visit: impl FnMut(usize, usize) -> bool,
    ) {
        if pos + MIN_MATCH > input.len() {
            return;
        }

        let limit = input.len() - pos;
        let mut candidate = self.head[Self::hash3(input, pos)];
        let mut links = 0;

        while candidate != EMPTY && candidate < pos && links < max_chain {
            let distance = pos - candidate;
            if distance > MAX_DISTANCE {
                break;
            }

            // Quick reject: a candidate that differs at `floor` cannot be longer.
            if floor < limit && input[candidate + floor] == input[pos + floor] {
                let len = match_length(input, candidate, pos, limit);
                if len >= MIN_MATCH {
                    floor = floor.max(len);
                    if !visit(distance, len) {
                        return;
                    }
                }
            }

            let next = self.prev[candidate & CHAIN_MASK];
            if next >= candidate {
                break;
            }
            candidate = next;
            links += 1;
        }
    }

    /// Best-scoring match at `pos` after a literal run of `literals_before`.
    pub(crate) fn find(
        &self,
        input: &[u8],
        pos: usize,
        limits: SearchLimits,
        literals_before: usize,
    ) -> Option<Match> {
        let mut best: Option<(Match, isize)> = None;

        self.walk(input, pos, limits.max_chain, 0, |distance, len| {
            let candidate = Match { distance, len };
            if let Some(savings) = candidate.savings(literals_before) {
                let better = match best {
                    None => savings > 0,
                    Some((current, best_savings)) => {
                        savings > best_savings || (savings == best_savings && len > current.len)
                    }
                };
                if better {
                    best = Some((candidate, savings));
                }
            }
            len < limits.nice_length
        });

        best.map(|(m, _)| m)
    }

    /// Collect the nearest match for each new longest length at `pos`.
    ///
    /// `out` is cleared and receives candidates with strictly increasing
    /// lengths (and non-decreasing distances).
    pub(crate) fn candidates(
        &self,
        input: &[u8],
        pos: usize,
        limits: SearchLimits,
        out: &mut Vec<Match>,
    ) {
        out.clear();
        let mut longest = MIN_MATCH - 1;
        self.walk(input, pos, limits.max_chain, 0, |distance, len| {
            if len > longest {
                longest = len;
                out.push(Match { distance, len });
            }
            len < limits.nice_length
        });
    }
}

/// Length of the common prefix of `input[a..]` and `input[b..]`, up to `limit`.
#[inline]
pub(crate) fn match_length(input: &[u8], a: usize, b: usize, limit: usize) -> usize {
    input[a..]
        .iter()
        .zip(&input[b..b + limit])
        .take_while(|(x, y)| x == y)
        .count()
}
