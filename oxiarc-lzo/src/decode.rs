//! LZO1X block decoder.
//!
//! The decoder is an explicit state machine. Each phase consumes bytes from
//! a [`ByteSource`], appends to the output buffer (which doubles as the
//! back-reference window), and returns the next phase:
//!
//! ```text
//! Start ──> ReadToken ──> (literal run) ──> AfterLiteralRun ──┐
//!   │          │                                              │
//!   │          └────────────> Match <─────────────────────────┘
//!   │                          │  ▲
//!   └──> TrailingLiterals <────┘  │   (carry 1-3)
//!              └──────────────────┘
//!        Match ──> ReadToken (carry 0) | End (zero-distance M4)
//! ```
//!
//! The carry (number of literals following a match) lives in the low two
//! bits of the match's second-to-last byte and is handed to the next phase
//! explicitly.

use crate::format::{
    INITIAL_RUN_BIAS, LITERAL_EXT_BASE, M1_LEN, M1_RUN_LEN, M1_RUN_MIN_OFFSET, M3_EXT_BASE,
    M4_BIAS, M4_EXT_BASE, MAX_CARRIED_LITERALS, MatchClass,
};
use oxiarc_core::bytestream::{ByteReader, SliceReader};
use oxiarc_core::error::{OxiArcError, Result};
use oxiarc_core::traits::ByteSource;
use std::io::Read;

/// Upper bound on output pre-allocation taken from a caller's hint.
const MAX_PREALLOC: usize = 64 << 20;

/// Decompress an LZO1X block held in memory.
///
/// At most `input_len` bytes of `input` are consumed; bytes past that are
/// never looked at. `output_len_hint` only pre-sizes the output buffer and
/// may be zero.
///
/// # Errors
///
/// [`OxiArcError::InputUnderrun`] if the block ends early,
/// [`OxiArcError::LookbehindUnderrun`] if a match points before the start of
/// the output. No partial output is returned.
pub fn decompress(input: &[u8], input_len: usize, output_len_hint: usize) -> Result<Vec<u8>> {
    decompress_from(SliceReader::new(input, input_len), output_len_hint)
}

/// Decompress an LZO1X block read from a stream.
///
/// Reads are batched through an internal buffer, and never extend past
/// `input_len` bytes of `reader`.
pub fn decompress_from_reader<R: Read>(
    reader: R,
    input_len: u64,
    output_len_hint: usize,
) -> Result<Vec<u8>> {
    decompress_from(ByteReader::new(reader, input_len), output_len_hint)
}

/// Decompress an LZO1X block from any byte source.
pub fn decompress_from<S: ByteSource>(source: S, output_len_hint: usize) -> Result<Vec<u8>> {
    BlockDecoder::new(source, output_len_hint).decode()
}

/// Decoder phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// First byte of the block: possibly an inline initial literal run.
    Start,
    /// Loop entry: a literal run token or a match token.
    ReadToken,
    /// After a literal run: a match, where tokens below 16 are the
    /// three-byte short-offset form.
    AfterLiteralRun,
    /// Match dispatch on a token byte.
    Match(u8),
    /// Literals carried by the previous match, followed by a match token.
    TrailingLiterals(usize),
    /// End marker reached.
    End,
}

/// LZO1X block decoder.
struct BlockDecoder<S> {
    source: S,
    output: Vec<u8>,
}

impl<S: ByteSource> BlockDecoder<S> {
    fn new(source: S, output_len_hint: usize) -> Self {
        Self {
            source,
            output: Vec::with_capacity(output_len_hint.min(MAX_PREALLOC)),
        }
    }

    /// Run the state machine to completion.
    fn decode(mut self) -> Result<Vec<u8>> {
        let mut state = State::Start;
        loop {
            state = match state {
                State::Start => self.start()?,
                State::ReadToken => {
                    let token = self.source.read_u8()?;
                    self.token(token)?
                }
                State::AfterLiteralRun => self.after_literal_run()?,
                State::Match(token) => self.dispatch(token)?,
                State::TrailingLiterals(count) => self.trailing_literals(count)?,
                State::End => return Ok(self.output),
            };
        }
    }

    fn start(&mut self) -> Result<State> {
        let first = self.source.read_u8()?;
        if usize::from(first) <= INITIAL_RUN_BIAS {
            return self.token(first);
        }

        let count = usize::from(first) - INITIAL_RUN_BIAS;
        if count <= MAX_CARRIED_LITERALS {
            // Short leading runs behave like literals carried by a match.
            return Ok(State::TrailingLiterals(count));
        }
        self.source.append_to(&mut self.output, count)?;
        Ok(State::AfterLiteralRun)
    }

    fn token(&mut self, token: u8) -> Result<State> {
        if token >= 16 {
            return Ok(State::Match(token));
        }

        let len = match token {
            0 => self.read_extension(LITERAL_EXT_BASE)?,
            t => usize::from(t),
        };
        self.source.append_to(&mut self.output, len + 3)?;
        Ok(State::AfterLiteralRun)
    }

    fn after_literal_run(&mut self) -> Result<State> {
        let token = self.source.read_u8()?;
        if token >= 16 {
            return Ok(State::Match(token));
        }

        let low = self.source.read_u8()?;
        let distance = M1_RUN_MIN_OFFSET + usize::from(token >> 2) + (usize::from(low) << 2);
        self.copy_match(distance, M1_RUN_LEN)?;
        Ok(Self::carry(token))
    }

    fn dispatch(&mut self, token: u8) -> Result<State> {
        match MatchClass::of(token) {
            MatchClass::M2 => {
                let low = self.source.read_u8()?;
                let distance = 1 + usize::from((token >> 2) & 7) + (usize::from(low) << 3);
                let len = usize::from(token >> 5) + 1;
                self.copy_match(distance, len)?;
                Ok(Self::carry(token))
            }
            MatchClass::M3 => {
                let len = match token & 31 {
                    0 => self.read_extension(M3_EXT_BASE)?,
                    t => usize::from(t),
                };
                let field = self.source.read_u16_le()?;
                let distance = 1 + usize::from(field >> 2);
                self.copy_match(distance, len + 2)?;
                Ok(Self::carry(field as u8))
            }
            MatchClass::M4 => {
                let high = usize::from(token & 8) << 11;
                let len = match token & 7 {
                    0 => self.read_extension(M4_EXT_BASE)?,
                    t => usize::from(t),
                };
                let field = self.source.read_u16_le()?;
                let distance = high + usize::from(field >> 2);
                if distance == 0 {
                    return Ok(State::End);
                }
                self.copy_match(distance + M4_BIAS, len + 2)?;
                Ok(Self::carry(field as u8))
            }
            MatchClass::M1 => {
                let low = self.source.read_u8()?;
                let distance = 1 + usize::from(token >> 2) + (usize::from(low) << 2);
                self.copy_match(distance, M1_LEN)?;
                Ok(Self::carry(token))
            }
        }
    }

    fn trailing_literals(&mut self, count: usize) -> Result<State> {
        self.source.append_to(&mut self.output, count)?;
        let token = self.source.read_u8()?;
        Ok(State::Match(token))
    }

    /// Phase following a match whose carry byte is `byte`.
    #[inline]
    fn carry(byte: u8) -> State {
        match usize::from(byte & 3) {
            0 => State::ReadToken,
            count => State::TrailingLiterals(count),
        }
    }

    /// Read a zero-run length extension.
    fn read_extension(&mut self, base: usize) -> Result<usize> {
        let mut len = 0usize;
        loop {
            match self.source.read_u8()? {
                0 => len = len.saturating_add(255),
                b => return Ok(len.saturating_add(usize::from(b) + base)),
            }
        }
    }

    /// Append `len` bytes starting `distance` bytes back in the output.
    fn copy_match(&mut self, distance: usize, len: usize) -> Result<()> {
        let available = self.output.len();
        if distance > available {
            return Err(OxiArcError::lookbehind_underrun(distance, available));
        }

        let start = available - distance;
        if distance >= len {
            self.output.extend_from_within(start..start + len);
        } else {
            // Source overlaps the bytes being written: copy forward one byte
            // at a time so freshly written bytes feed the rest of the copy.
            self.output.reserve(len);
            for i in start..start + len {
                let byte = self.output[i];
                self.output.push(byte);
            }
        }
        Ok(())
    }
}
