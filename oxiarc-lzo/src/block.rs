//! Greedy LZO1X block compression.
//!
//! Single pass, single candidate per position: a hash of the next three
//! bytes maps to the most recent position with the same hash. The first
//! worthwhile match is taken. Runs of incompressible data are skipped over
//! with a growing stride.

use crate::format::{M2_MAX_OFFSET, MAX_DISTANCE, MIN_MATCH};
use crate::matchfinder::match_length;
use crate::writer::TokenWriter;

/// Hash table size (must be power of 2).
const HASH_LOG: u32 = 14;
const HASH_SIZE: usize = 1 << HASH_LOG; // 16K entries

/// Literal run length (as a power of two) after which the scan stride grows.
const SKIP_TRIGGER: u32 = 5;

const EMPTY: usize = usize::MAX;

/// Compress data into an LZO1X block with the greedy encoder.
///
/// Never fails: incompressible input degrades to literal runs.
pub fn compress(input: &[u8]) -> Vec<u8> {
    BlockEncoder::new(input).encode()
}

/// Greedy LZO1X encoder.
struct BlockEncoder<'a> {
    input: &'a [u8],
    hash_table: Vec<usize>,
}

impl<'a> BlockEncoder<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            hash_table: vec![EMPTY; HASH_SIZE],
        }
    }

    /// Compute hash for 3 bytes.
    #[inline]
    fn hash(data: &[u8], pos: usize) -> usize {
        let val = u32::from(data[pos])
            | (u32::from(data[pos + 1]) << 8)
            | (u32::from(data[pos + 2]) << 16);
        ((val.wrapping_mul(2654435761)) >> (32 - HASH_LOG)) as usize
    }

    /// Whether a match saves bytes over its literals.
    ///
    /// Three-byte matches only pay off in the two-byte M2 form.
    #[inline]
    fn worthwhile(distance: usize, len: usize) -> bool {
        distance <= MAX_DISTANCE && (len > MIN_MATCH || distance <= M2_MAX_OFFSET)
    }

    fn encode(&mut self) -> Vec<u8> {
        let input = self.input;
        let len = input.len();
        let mut writer = TokenWriter::new(input);

        let mut pos = 0;
        while pos + MIN_MATCH <= len {
            let h = Self::hash(input, pos);
            let candidate = self.hash_table[h];
            self.hash_table[h] = pos;

            if candidate != EMPTY
                && input[candidate..candidate + MIN_MATCH] == input[pos..pos + MIN_MATCH]
            {
                let distance = pos - candidate;
                let tail_limit = len - pos - MIN_MATCH;
                let match_len = MIN_MATCH
                    + match_length(input, candidate + MIN_MATCH, pos + MIN_MATCH, tail_limit);

                if Self::worthwhile(distance, match_len) && writer.copy(pos, distance, match_len)
                {
                    // Seed the table with the tail of the match.
                    let tail = pos + match_len - 1;
                    if tail + MIN_MATCH <= len {
                        self.hash_table[Self::hash(input, tail)] = tail;
                    }
                    pos += match_len;
                    continue;
                }
            }

            pos += 1 + ((pos - writer.anchor()) >> SKIP_TRIGGER);
        }

        writer.finish()
    }
}
