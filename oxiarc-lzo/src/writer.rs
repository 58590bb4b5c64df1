//! Token emitter shared by the LZO1X encoders.
//!
//! Encoders decide *what* to emit (where matches start, their distance and
//! length); [`TokenWriter`] decides *how*: it flushes pending literals with
//! the right run form, picks the narrowest match class, patches short
//! literal runs into the previous match's carry bits, and closes the block
//! with the end marker.

use crate::format::{
    END_MARKER, INITIAL_RUN_BIAS, M1_RUN_LEN, M1_RUN_MIN_OFFSET, M3_MARKER, M3_MAX_LEN,
    M4_BIAS, M4_MARKER, M4_MAX_LEN, MAX_CARRIED_LITERALS, MAX_INITIAL_RUN, MAX_SHORT_RUN,
    MatchClass, push_extension,
};

/// Builds an LZO1X block from literal/match decisions over one input.
pub(crate) struct TokenWriter<'a> {
    input: &'a [u8],
    output: Vec<u8>,
    /// Start of the literals not yet written.
    anchor: usize,
    /// Byte whose low two bits carry the literal count after the last match.
    carry_index: Option<usize>,
}

impl<'a> TokenWriter<'a> {
    pub(crate) fn new(input: &'a [u8]) -> Self {
        // Worst case is all literals plus run headers and the end marker.
        let capacity = input.len() + input.len() / 16 + 64 + END_MARKER.len();
        Self {
            input,
            output: Vec::with_capacity(capacity),
            anchor: 0,
            carry_index: None,
        }
    }

    /// Start of the pending literal run.
    #[inline]
    pub(crate) fn anchor(&self) -> usize {
        self.anchor
    }

    /// Emit the literals before `pos`, then a match copying `len` bytes from
    /// `distance` bytes back.
    ///
    /// Returns `false` (and emits nothing) if no token can represent the
    /// match after the pending literal run; those bytes then stay pending.
    pub(crate) fn copy(&mut self, pos: usize, distance: usize, len: usize) -> bool {
        debug_assert!(pos >= self.anchor && pos + len <= self.input.len());
        let literals = pos - self.anchor;
        let Some(class) = MatchClass::select(distance, len, literals) else {
            return false;
        };

        self.flush_literals(pos);
        self.push_match(class, distance, len);
        self.anchor = pos + len;
        true
    }

    /// Emit the trailing literals and the end marker.
    pub(crate) fn finish(mut self) -> Vec<u8> {
        self.flush_literals(self.input.len());
        self.output.extend_from_slice(&END_MARKER);
        self.output
    }

    fn flush_literals(&mut self, end: usize) {
        let len = end - self.anchor;
        if len == 0 {
            return;
        }

        match self.carry_index {
            Some(index) if len <= MAX_CARRIED_LITERALS => {
                self.output[index] |= len as u8;
            }
            None if self.output.is_empty() && len <= MAX_INITIAL_RUN => {
                self.output.push((INITIAL_RUN_BIAS + len) as u8);
            }
            _ if len <= MAX_SHORT_RUN => {
                debug_assert!(len > MAX_CARRIED_LITERALS);
                self.output.push((len - 3) as u8);
            }
            _ => {
                self.output.push(0);
                push_extension(&mut self.output, len - MAX_SHORT_RUN);
            }
        }

        self.output.extend_from_slice(&self.input[self.anchor..end]);
        self.anchor = end;
    }

    fn push_match(&mut self, class: MatchClass, distance: usize, len: usize) {
        match class {
            MatchClass::M1 => {
                let off = if len == M1_RUN_LEN {
                    distance - M1_RUN_MIN_OFFSET
                } else {
                    distance - 1
                };
                self.output.push(((off & 3) << 2) as u8);
                self.output.push((off >> 2) as u8);
            }
            MatchClass::M2 => {
                let off = distance - 1;
                self.output.push((((len - 1) << 5) | ((off & 7) << 2)) as u8);
                self.output.push((off >> 3) as u8);
            }
            MatchClass::M3 => {
                let off = distance - 1;
                if len <= M3_MAX_LEN {
                    self.output.push(M3_MARKER | (len - 2) as u8);
                } else {
                    self.output.push(M3_MARKER);
                    push_extension(&mut self.output, len - M3_MAX_LEN);
                }
                self.output.push(((off & 0x3F) << 2) as u8);
                self.output.push((off >> 6) as u8);
            }
            MatchClass::M4 => {
                let off = distance - M4_BIAS;
                let high = ((off >> 11) & 8) as u8;
                if len <= M4_MAX_LEN {
                    self.output.push(M4_MARKER | high | (len - 2) as u8);
                } else {
                    self.output.push(M4_MARKER | high);
                    push_extension(&mut self.output, len - M4_MAX_LEN);
                }
                self.output.push(((off & 0x3F) << 2) as u8);
                self.output.push(((off >> 6) & 0xFF) as u8);
            }
        }
        self.carry_index = Some(self.output.len() - 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompress;

    fn roundtrip(input: &[u8], output: &[u8]) {
        let decoded = decompress(output, output.len(), input.len()).expect("decode failed");
        assert_eq!(decoded, input);
    }

    #[test]
    fn test_empty_block_is_end_marker() {
        let writer = TokenWriter::new(b"");
        assert_eq!(writer.finish(), END_MARKER);
    }

    #[test]
    fn test_initial_short_run() {
        let input = b"abc";
        let out = TokenWriter::new(input).finish();
        assert_eq!(out, [17 + 3, b'a', b'b', b'c', 0x11, 0, 0]);
        roundtrip(input, &out);
    }

    #[test]
    fn test_long_initial_run_uses_literal_token() {
        let input: Vec<u8> = (0..300u32).map(|i| (i * 7) as u8).collect();
        let out = TokenWriter::new(&input).finish();
        // 300 - 18 = 282 = one 0x00 continuation (255) + 27.
        assert_eq!(&out[..3], &[0, 0, 27]);
        roundtrip(&input, &out);
    }

    #[test]
    fn test_carried_literals_patch_previous_match() {
        let input = b"abcdabcdXY";
        let mut writer = TokenWriter::new(input);
        assert!(writer.copy(4, 4, 4));
        let out = writer.finish();
        // Initial run, M2 token with carry of 2, two literals, end marker.
        assert_eq!(out[0], 17 + 4);
        assert_eq!(out[5] & 3, 2);
        roundtrip(input, &out);
    }

    #[test]
    fn test_every_match_class() {
        let mut input = Vec::new();
        let mut seed: u32 = 0x1234_5678;
        for _ in 0..20000 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            input.push((seed >> 16) as u8);
        }
        let far = input.len();
        input.extend_from_within(far - 18000..far - 18000 + 40);
        let mid = input.len();
        input.extend_from_within(mid - 5000..mid - 5000 + 40);
        let near = input.len();
        input.extend_from_within(near - 100..near - 100 + 6);

        let mut writer = TokenWriter::new(&input);
        assert!(writer.copy(far, 18000, 40));
        assert!(writer.copy(mid, 5000, 40));
        assert!(writer.copy(near, 100, 6));
        let out = writer.finish();
        roundtrip(&input, &out);
    }

    #[test]
    fn test_two_byte_match_needs_carried_literals() {
        let input = b"abXab";
        let mut writer = TokenWriter::new(input);
        // The two-byte form only follows a run of 1-3 literals.
        assert!(!writer.copy(0, 1, 2));
        assert!(writer.copy(3, 3, 2));
        let out = writer.finish();
        roundtrip(input, &out);
    }

    #[test]
    fn test_run_form_after_long_literal_run() {
        let mut input: Vec<u8> = (0..2100u32).map(|i| (i % 251) as u8 ^ 0x5A).collect();
        let pos = input.len();
        input.extend_from_within(pos - 2060..pos - 2060 + 3);

        let mut writer = TokenWriter::new(&input);
        assert!(writer.copy(pos, 2060, 3));
        let out = writer.finish();
        // The match is the two bytes before the end marker with a token < 16.
        let token = out[out.len() - 5];
        assert!(token < 16);
        roundtrip(&input, &out);
    }
}
