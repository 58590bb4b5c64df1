//! LZO1X format definitions.
//!
//! An LZO1X block is a sequence of tokens. Every token is either a literal
//! run or a match; the block ends with a distinguished M4 match whose
//! distance resolves to zero.
//!
//! Match classes, selected by the value of the leading byte:
//!
//! ```text
//! byte     class  length                    distance
//! 64..=255 M2     3..=8 (3 bits)            1..=2048   (3 bits + 1 byte)
//! 32..=63  M3     3.. (5 bits, 0 = ext/31)  1..=16384  (14 bits, LE u16 >> 2)
//! 16..=31  M4     3.. (3 bits, 0 = ext/7)   16385..=49151 (1 + 14 bits, +0x4000)
//! 0..=15   M1     2 after 1-3 literals      1..=1024   (2 bits + 1 byte)
//!                 3 after a run of 4+       2049..=3072
//! ```
//!
//! The low two bits of a match's second-to-last byte give the number of
//! literals (0-3) that follow it. Longer runs use a literal token.
//!
//! Length extension: when an inline length field is zero, each following
//! `0x00` byte adds 255 and the first non-zero byte adds its value plus the
//! class base.

/// Leading byte of a stream that starts with an inline literal run is `17 + n`.
pub const INITIAL_RUN_BIAS: usize = 17;
/// Longest literal run expressible by the initial-run byte.
pub const MAX_INITIAL_RUN: usize = 255 - INITIAL_RUN_BIAS;

/// Literal runs this short ride in the previous match's low two bits.
pub const MAX_CARRIED_LITERALS: usize = 3;
/// Longest literal run with an inline 4-bit length (`n - 3` in 1..=15).
pub const MAX_SHORT_RUN: usize = 18;
/// Extension base of the literal run token.
pub const LITERAL_EXT_BASE: usize = 15;

/// Shortest match any encoder emits outside the M1 forms.
pub const MIN_MATCH: usize = 3;

/// M1 (two-byte match after 1-3 literals) maximum distance.
pub const M1_MAX_OFFSET: usize = 0x0400;
/// M1 length after 1-3 literals.
pub const M1_LEN: usize = 2;
/// M1 length after a literal run of four or more.
pub const M1_RUN_LEN: usize = 3;
/// Distance bias of the M1 form that follows a literal run of four or more.
pub const M1_RUN_MIN_OFFSET: usize = M2_MAX_OFFSET + 1;
/// Largest distance of the M1 form that follows a literal run of four or more.
pub const M1_RUN_MAX_OFFSET: usize = M2_MAX_OFFSET + M1_MAX_OFFSET;

/// M2 maximum distance.
pub const M2_MAX_OFFSET: usize = 0x0800;
/// M2 maximum length.
pub const M2_MAX_LEN: usize = 8;

/// M3 maximum distance.
pub const M3_MAX_OFFSET: usize = 0x4000;
/// Longest M3 length with an inline length field.
pub const M3_MAX_LEN: usize = 33;
/// M3 length-extension base.
pub const M3_EXT_BASE: usize = 31;
/// M3 token marker.
pub const M3_MARKER: u8 = 32;

/// M4 maximum distance.
pub const M4_MAX_OFFSET: usize = 0xBFFF;
/// Longest M4 length with an inline length field.
pub const M4_MAX_LEN: usize = 9;
/// M4 length-extension base.
pub const M4_EXT_BASE: usize = 7;
/// M4 token marker.
pub const M4_MARKER: u8 = 16;
/// Fixed distance bias of M4 matches.
pub const M4_BIAS: usize = 0x4000;

/// Largest distance any match can reference.
pub const MAX_DISTANCE: usize = M4_MAX_OFFSET;

/// The end-of-stream sentinel: an M4 token with a zero distance.
pub const END_MARKER: [u8; 3] = [M4_MARKER | 1, 0, 0];

/// Token class selected by a match-dispatch byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchClass {
    /// Short match following literals (token `0..=15`).
    M1,
    /// Near match with inline length (token `64..=255`).
    M2,
    /// Medium-distance match (token `32..=63`).
    M3,
    /// Far match, also carries the end marker (token `16..=31`).
    M4,
}

impl MatchClass {
    /// Classify a match-dispatch byte.
    #[inline]
    pub fn of(token: u8) -> Self {
        match token {
            64..=255 => Self::M2,
            32..=63 => Self::M3,
            16..=31 => Self::M4,
            _ => Self::M1,
        }
    }

    /// Pick the narrowest class for a match.
    ///
    /// `literals_before` is the length of the literal run directly preceding
    /// the match (0 if the previous token was a match). Returns `None` when
    /// no encoding can represent the match in this context.
    pub fn select(distance: usize, len: usize, literals_before: usize) -> Option<Self> {
        if distance == 0 {
            return None;
        }
        match len {
            0 | 1 => None,
            M1_LEN => (distance <= M1_MAX_OFFSET
                && (1..=MAX_CARRIED_LITERALS).contains(&literals_before))
            .then_some(Self::M1),
            _ if len == M1_RUN_LEN
                && literals_before > MAX_CARRIED_LITERALS
                && (M1_RUN_MIN_OFFSET..=M1_RUN_MAX_OFFSET).contains(&distance) =>
            {
                Some(Self::M1)
            }
            _ if distance <= M2_MAX_OFFSET && len <= M2_MAX_LEN => Some(Self::M2),
            _ if distance <= M3_MAX_OFFSET => Some(Self::M3),
            _ if distance <= M4_MAX_OFFSET => Some(Self::M4),
            _ => None,
        }
    }
}

/// Number of bytes needed for a length extension carrying `value` (>= 1).
#[inline]
pub fn extension_size(value: usize) -> usize {
    1 + (value - 1) / 255
}

/// Append a length extension for `value` (>= 1).
pub fn push_extension(output: &mut Vec<u8>, value: usize) {
    debug_assert!(value >= 1);
    let mut remaining = value;
    while remaining > 255 {
        output.push(0);
        remaining -= 255;
    }
    output.push(remaining as u8);
}

/// Encoded size of a match token, in bytes.
///
/// Returns `None` if the match cannot be represented in this context.
pub fn match_cost(distance: usize, len: usize, literals_before: usize) -> Option<usize> {
    let cost = match MatchClass::select(distance, len, literals_before)? {
        MatchClass::M1 | MatchClass::M2 => 2,
        MatchClass::M3 if len <= M3_MAX_LEN => 3,
        MatchClass::M3 => 3 + extension_size(len - M3_MAX_LEN),
        MatchClass::M4 if len <= M4_MAX_LEN => 3,
        MatchClass::M4 => 3 + extension_size(len - M4_MAX_LEN),
    };
    Some(cost)
}

/// Header bytes spent on a mid-stream literal run of `len` bytes.
pub fn literal_header_cost(len: usize) -> usize {
    match len {
        0..=MAX_CARRIED_LITERALS => 0,
        4..=MAX_SHORT_RUN => 1,
        _ => 1 + extension_size(len - MAX_SHORT_RUN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_tokens() {
        assert_eq!(MatchClass::of(0), MatchClass::M1);
        assert_eq!(MatchClass::of(15), MatchClass::M1);
        assert_eq!(MatchClass::of(16), MatchClass::M4);
        assert_eq!(MatchClass::of(31), MatchClass::M4);
        assert_eq!(MatchClass::of(32), MatchClass::M3);
        assert_eq!(MatchClass::of(63), MatchClass::M3);
        assert_eq!(MatchClass::of(64), MatchClass::M2);
        assert_eq!(MatchClass::of(255), MatchClass::M2);
    }

    #[test]
    fn test_select_class_boundaries() {
        assert_eq!(MatchClass::select(2048, 8, 0), Some(MatchClass::M2));
        assert_eq!(MatchClass::select(2049, 8, 0), Some(MatchClass::M3));
        assert_eq!(MatchClass::select(1, 9, 0), Some(MatchClass::M3));
        assert_eq!(MatchClass::select(16384, 3, 0), Some(MatchClass::M3));
        assert_eq!(MatchClass::select(16385, 3, 0), Some(MatchClass::M4));
        assert_eq!(MatchClass::select(49151, 100, 0), Some(MatchClass::M4));
        assert_eq!(MatchClass::select(49152, 100, 0), None);
        assert_eq!(MatchClass::select(0, 5, 0), None);
    }

    #[test]
    fn test_select_m1_context() {
        // Two-byte matches only after 1-3 literals.
        assert_eq!(MatchClass::select(1024, 2, 1), Some(MatchClass::M1));
        assert_eq!(MatchClass::select(1024, 2, 0), None);
        assert_eq!(MatchClass::select(1024, 2, 4), None);
        assert_eq!(MatchClass::select(1025, 2, 2), None);

        // Three-byte matches in 2049..=3072 after a long run.
        assert_eq!(MatchClass::select(2049, 3, 4), Some(MatchClass::M1));
        assert_eq!(MatchClass::select(3072, 3, 20), Some(MatchClass::M1));
        assert_eq!(MatchClass::select(3073, 3, 20), Some(MatchClass::M3));
        assert_eq!(MatchClass::select(2049, 3, 3), Some(MatchClass::M3));
    }

    #[test]
    fn test_extension_encoding() {
        let mut out = Vec::new();
        push_extension(&mut out, 1);
        assert_eq!(out, [1]);

        out.clear();
        push_extension(&mut out, 255);
        assert_eq!(out, [255]);

        out.clear();
        push_extension(&mut out, 256);
        assert_eq!(out, [0, 1]);
        assert_eq!(extension_size(256), 2);

        out.clear();
        push_extension(&mut out, 510);
        assert_eq!(out, [0, 255]);
        assert_eq!(extension_size(510), 2);
        assert_eq!(extension_size(511), 3);
    }

    #[test]
    fn test_costs() {
        assert_eq!(match_cost(100, 8, 0), Some(2));
        assert_eq!(match_cost(100, 33, 0), Some(3));
        assert_eq!(match_cost(100, 34, 0), Some(4));
        assert_eq!(match_cost(20000, 9, 0), Some(3));
        assert_eq!(match_cost(20000, 10, 0), Some(4));
        assert_eq!(match_cost(60000, 10, 0), None);

        assert_eq!(literal_header_cost(3), 0);
        assert_eq!(literal_header_cost(4), 1);
        assert_eq!(literal_header_cost(18), 1);
        assert_eq!(literal_header_cost(19), 2);
    }
}
