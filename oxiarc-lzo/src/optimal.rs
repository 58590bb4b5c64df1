//! Leveled LZO1X compression.
//!
//! Levels trade search effort for ratio. Every level walks hash chains
//! (see [`crate::matchfinder`]) and scores candidates by the bytes they save
//! in their actual token class, so a short near match can beat a longer far
//! one. Levels 4 and up defer a match when a nearby position offers a better
//! one (lazy matching). Level 9 replaces the lazy parse with a cost-driven
//! optimal parse over the whole block.
//!
//! A deeper search is not always a smaller output: a long far match taken
//! early can leave the rest of the block worse off. Levels 6 and up therefore
//! also compress at the level below and keep the smaller result, so output
//! size never grows with the level from 5 on.

use crate::format::{
    MAX_INITIAL_RUN, MAX_SHORT_RUN, MIN_MATCH, extension_size, literal_header_cost, match_cost,
};
use crate::matchfinder::{HashChain, Match, SearchLimits};
use crate::writer::TokenWriter;
use oxiarc_core::error::Result;
use oxiarc_core::traits::CompressionLevel;

/// Longest match length the optimal parse prices edge by edge.
///
/// Longer matches are taken whole and the parse skips searching inside them.
const OPTIMAL_NICE_LENGTH: usize = 128;

/// Search parameters for one compression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelParams {
    /// Maximum hash chain links followed per search.
    pub max_chain: usize,
    /// A match at least this long ends the search.
    pub nice_length: usize,
    /// Once the current match is this long, lazy lookahead searches a
    /// quarter of the chain.
    pub good_length: usize,
    /// Matches at least this long are taken without looking ahead.
    pub max_lazy: usize,
    /// Positions looked ahead for a better match (0 disables lazy matching).
    pub lazy_steps: usize,
    /// Use the optimal parse instead of the lazy parse.
    pub optimal: bool,
    /// Also compress at the level below and keep the smaller output.
    pub fallback: bool,
}

impl LevelParams {
    const fn new(
        max_chain: usize,
        nice_length: usize,
        good_length: usize,
        max_lazy: usize,
        lazy_steps: usize,
    ) -> Self {
        Self {
            max_chain,
            nice_length,
            good_length,
            max_lazy,
            lazy_steps,
            optimal: false,
            fallback: false,
        }
    }

    /// Same search, keeping the level below's output when it is smaller.
    const fn with_fallback(self) -> Self {
        Self {
            fallback: true,
            ..self
        }
    }

    /// Parameters for a level.
    pub fn for_level(level: CompressionLevel) -> Self {
        LEVEL_TABLE[table_index(level)]
    }

    fn search_limits(&self) -> SearchLimits {
        SearchLimits {
            max_chain: self.max_chain,
            nice_length: self.nice_length,
        }
    }
}

/// Level 1 through 9.
const LEVEL_TABLE: [LevelParams; 9] = [
    LevelParams::new(4, 8, 0, 0, 0),
    LevelParams::new(8, 16, 0, 0, 0),
    LevelParams::new(16, 32, 0, 0, 0),
    LevelParams::new(16, 16, 4, 4, 1),
    LevelParams::new(32, 32, 8, 16, 1),
    LevelParams::new(64, 64, 16, 32, 1).with_fallback(),
    LevelParams::new(256, 64, 16, 32, 2).with_fallback(),
    LevelParams::new(1024, 128, 32, 64, 2).with_fallback(),
    LevelParams {
        optimal: true,
        ..LevelParams::new(4096, 128, 128, 128, 0).with_fallback()
    },
];

fn table_index(level: CompressionLevel) -> usize {
    usize::from(level.level() - CompressionLevel::MIN_LEVEL)
}

/// Compress data into an LZO1X block at an effort level (1-9).
///
/// # Errors
///
/// [`oxiarc_core::OxiArcError::InvalidLevel`] if `level` is outside 1-9.
/// Nothing is compressed in that case.
pub fn compress_leveled(input: &[u8], level: u8) -> Result<Vec<u8>> {
    let level = CompressionLevel::new(level)?;
    Ok(LeveledEncoder::with_level(level).compress(input))
}

/// Leveled LZO1X encoder.
///
/// Holds only the level parameters; search state is built per call, so one
/// encoder can be shared across threads.
#[derive(Debug, Clone, Copy)]
pub struct LeveledEncoder {
    level: CompressionLevel,
    params: LevelParams,
}

impl LeveledEncoder {
    /// Create an encoder at the default level.
    pub fn new() -> Self {
        Self::with_level(CompressionLevel::default())
    }

    /// Create an encoder at a specific level.
    pub fn with_level(level: CompressionLevel) -> Self {
        Self {
            level,
            params: LevelParams::for_level(level),
        }
    }

    /// The encoder's level.
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// The search parameters in effect.
    pub fn params(&self) -> LevelParams {
        self.params
    }

    /// Compress one block.
    pub fn compress(&self, input: &[u8]) -> Vec<u8> {
        let mut index = table_index(self.level);
        let mut best = LEVEL_TABLE[index].parse(input);
        while LEVEL_TABLE[index].fallback && index > 0 {
            index -= 1;
            let lower = LEVEL_TABLE[index].parse(input);
            if lower.len() < best.len() {
                best = lower;
            }
        }
        best
    }
}

impl Default for LeveledEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelParams {
    /// Run this level's own parse.
    fn parse(&self, input: &[u8]) -> Vec<u8> {
        if self.optimal {
            self.optimal_parse(input)
        } else {
            self.lazy_parse(input)
        }
    }

    /// Hash-chain parse with optional lazy evaluation.
    fn lazy_parse(&self, input: &[u8]) -> Vec<u8> {
        let params = *self;
        let full = params.search_limits();
        let reduced = SearchLimits {
            max_chain: (params.max_chain / 4).max(1),
            ..full
        };

        let mut chain = HashChain::new();
        let mut writer = TokenWriter::new(input);
        let mut pos = 0;

        while pos + MIN_MATCH <= input.len() {
            chain.insert_until(input, pos);
            let Some(mut best) = chain.find(input, pos, full, pos - writer.anchor()) else {
                pos += 1;
                continue;
            };

            let mut start = pos;
            let mut step = 1;
            while step <= params.lazy_steps && best.len < params.max_lazy {
                let ahead = start + step;
                if ahead + MIN_MATCH > input.len() {
                    break;
                }
                chain.insert_until(input, ahead);

                let limits = if best.len >= params.good_length {
                    reduced
                } else {
                    full
                };
                let current = savings(best, start - writer.anchor());
                let literals = ahead - writer.anchor();
                match chain.find(input, ahead, limits, literals) {
                    Some(next) if savings(next, literals) > current => {
                        best = next;
                        start = ahead;
                        step = 1;
                    }
                    _ => step += 1,
                }
            }

            if writer.copy(start, best.distance, best.len) {
                pos = start + best.len;
            } else {
                pos = start + 1;
            }
        }

        writer.finish()
    }

    /// Shortest-path parse over a graph of literal and match edges.
    ///
    /// Node `i` is "the first `i` bytes are encoded". Edge weights are
    /// encoded sizes, including the literal run header bytes a literal adds
    /// to the run it extends.
    fn optimal_parse(&self, input: &[u8]) -> Vec<u8> {
        let len = input.len();
        let limits = SearchLimits {
            max_chain: self.max_chain,
            nice_length: self.nice_length.min(OPTIMAL_NICE_LENGTH),
        };

        let mut nodes = vec![Node::UNREACHED; len + 1];
        nodes[0] = Node {
            cost: 0,
            ..Node::UNREACHED
        };

        let mut chain = HashChain::new();
        let mut candidates = Vec::new();
        let mut search_from = 0;

        for pos in 0..len {
            let node = nodes[pos];

            let literals = node.literals + 1;
            let from_start = node.literals == pos;
            let cost = node.cost + 1 + run_header_cost(literals, from_start)
                - run_header_cost(node.literals, from_start);
            nodes[pos + 1].relax(Node {
                cost,
                literals,
                ..Node::UNREACHED
            });

            if pos < search_from || pos + MIN_MATCH > len {
                continue;
            }

            chain.insert_until(input, pos);
            chain.candidates(input, pos, limits, &mut candidates);

            let mut shortest = MIN_MATCH;
            for m in &candidates {
                if m.len >= limits.nice_length {
                    if let Some(c) = match_cost(m.distance, m.len, node.literals) {
                        nodes[pos + m.len].relax(Node::matched(node.cost + c, *m));
                        search_from = pos + m.len;
                    }
                    break;
                }

                for l in shortest..=m.len {
                    if let Some(c) = match_cost(m.distance, l, node.literals) {
                        nodes[pos + l].relax(Node::matched(
                            node.cost + c,
                            Match {
                                distance: m.distance,
                                len: l,
                            },
                        ));
                    }
                }
                shortest = m.len + 1;
            }
        }

        let mut path = Vec::new();
        let mut pos = len;
        while pos > 0 {
            let node = nodes[pos];
            if node.match_len == 0 {
                pos -= 1;
            } else {
                pos -= node.match_len;
                path.push((pos, node.distance, node.match_len));
            }
        }

        let mut writer = TokenWriter::new(input);
        for &(start, distance, match_len) in path.iter().rev() {
            let emitted = writer.copy(start, distance, match_len);
            debug_assert!(emitted, "parse chose an unencodable match");
        }
        writer.finish()
    }
}

/// Bytes saved by `m`, with unencodable matches scoring lowest.
fn savings(m: Match, literals_before: usize) -> isize {
    m.savings(literals_before).unwrap_or(isize::MIN)
}

/// Header bytes for a literal run of `len` bytes.
///
/// A run at the very start of the block has its own one-byte form.
fn run_header_cost(len: usize, from_start: bool) -> usize {
    match len {
        0 => 0,
        1..=MAX_INITIAL_RUN if from_start => 1,
        _ if from_start && len > MAX_SHORT_RUN => 1 + extension_size(len - MAX_SHORT_RUN),
        _ => literal_header_cost(len),
    }
}

/// Best known way to reach a position.
#[derive(Debug, Clone, Copy)]
struct Node {
    cost: usize,
    /// Length of the literal run ending here (0 after a match).
    literals: usize,
    /// Length of the match ending here, 0 if reached by a literal.
    match_len: usize,
    distance: usize,
}

impl Node {
    const UNREACHED: Self = Self {
        cost: usize::MAX,
        literals: 0,
        match_len: 0,
        distance: 0,
    };

    fn matched(cost: usize, m: Match) -> Self {
        Self {
            cost,
            literals: 0,
            match_len: m.len,
            distance: m.distance,
        }
    }

    #[inline]
    fn relax(&mut self, candidate: Self) {
        if candidate.cost < self.cost {
            *self = candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compress, decompress};

    fn sample_text() -> Vec<u8> {
        let mut data = Vec::new();
        for i in 0..120 {
            data.extend_from_slice(b"The quick brown fox jumps over the lazy dog. ");
            data.extend_from_slice(format!("Line {} of {}; ", i, i * 7 % 13).as_bytes());
        }
        data
    }

    fn roundtrip(data: &[u8], level: u8) -> Vec<u8> {
        let compressed = compress_leveled(data, level).unwrap();
        let decompressed = decompress(&compressed, compressed.len(), data.len()).unwrap();
        assert_eq!(decompressed, data, "level {level}");
        compressed
    }

    #[test]
    fn test_level_table() {
        for level in CompressionLevel::all() {
            let params = LevelParams::for_level(level);
            assert!(params.max_chain > 0);
            assert!(params.nice_length >= MIN_MATCH);
            assert_eq!(params.optimal, level == CompressionLevel::BEST);
            assert_eq!(params.fallback, level.level() >= 6);
        }
        assert_eq!(LevelParams::for_level(CompressionLevel::FAST).lazy_steps, 0);
    }

    #[test]
    fn test_invalid_level() {
        assert!(compress_leveled(b"abc", 0).is_err());
        assert!(compress_leveled(b"abc", 10).is_err());
    }

    #[test]
    fn test_empty_input() {
        for level in 1..=9 {
            assert_eq!(compress_leveled(b"", level).unwrap(), [0x11, 0x00, 0x00]);
        }
    }

    #[test]
    fn test_all_levels_roundtrip() {
        let text = sample_text();
        for level in 1..=9 {
            roundtrip(b"x", level);
            roundtrip(b"abcabcabcabc", level);
            roundtrip(&text, level);
        }
    }

    #[test]
    fn test_best_level_not_worse_than_fast() {
        let text = sample_text();
        let fast = roundtrip(&text, 1);
        let best = roundtrip(&text, 9);
        assert!(
            best.len() <= fast.len(),
            "level 9: {}, level 1: {}",
            best.len(),
            fast.len()
        );
        assert!(best.len() < text.len() / 2);
    }

    #[test]
    fn test_fallback_keeps_smaller_output() {
        let mut data = sample_text();
        data.extend((0..4000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 11) as u8 & 0x0F));
        for level in CompressionLevel::all() {
            let encoder = LeveledEncoder::with_level(level);
            let out = encoder.compress(&data);
            assert!(out.len() <= encoder.params().parse(&data).len());
            if encoder.params().fallback {
                let below = roundtrip(&data, level.level() - 1);
                assert!(out.len() <= below.len(), "level {}", level.level());
            }
        }
    }

    #[test]
    fn test_optimal_parse_roundtrip() {
        let params = LevelParams::for_level(CompressionLevel::BEST);
        let mut data = sample_text();
        data.extend((0..3000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8));
        data.extend_from_within(1000..1500);
        let out = params.optimal_parse(&data);
        assert_eq!(decompress(&out, out.len(), 0).unwrap(), data);
    }

    #[test]
    fn test_long_runs() {
        let data = vec![0u8; 100_000];
        for level in [1, 6, 9] {
            let compressed = roundtrip(&data, level);
            assert!(compressed.len() < 1000, "level {level}: {}", compressed.len());
        }
        let greedy = compress(&data);
        assert!(greedy.len() < 1000);
    }

    #[test]
    fn test_run_header_cost() {
        assert_eq!(run_header_cost(0, true), 0);
        assert_eq!(run_header_cost(3, true), 1);
        assert_eq!(run_header_cost(238, true), 1);
        assert_eq!(run_header_cost(239, true), 2);
        assert_eq!(run_header_cost(3, false), 0);
        assert_eq!(run_header_cost(4, false), 1);
    }

    #[test]
    fn test_encoder_accessors() {
        let encoder = LeveledEncoder::default();
        assert_eq!(encoder.level(), CompressionLevel::DEFAULT);
        assert_eq!(encoder.params(), LevelParams::for_level(CompressionLevel::DEFAULT));
    }
}
