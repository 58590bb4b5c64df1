//! Error types for OxiArc operations.
//!
//! Decoding an LZO1X block can fail in exactly two structural ways: the
//! compressed input ends before the token stream completes, or a
//! back-reference points before the start of the output. Both are terminal.
//! Live byte sources add I/O failures, and the leveled encoder rejects
//! out-of-range effort levels.

use std::io;
use thiserror::Error;

/// The main error type for OxiArc operations.
#[derive(Debug, Error)]
pub enum OxiArcError {
    /// I/O error from the underlying reader (other than end of input).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The compressed stream ended before the token stream completed.
    #[error("input underrun at offset {offset}")]
    InputUnderrun {
        /// Number of compressed bytes consumed before the stream ran dry.
        offset: u64,
    },

    /// A back-reference pointed before the start of the output buffer.
    #[error("lookbehind underrun: distance {distance} exceeds {available} decoded bytes")]
    LookbehindUnderrun {
        /// Distance of the offending back-reference.
        distance: usize,
        /// Bytes of output available when the reference was resolved.
        available: usize,
    },

    /// Compression level outside the supported range.
    #[error("invalid compression level {level}: expected {min}..={max}")]
    InvalidLevel {
        /// The rejected level.
        level: u8,
        /// Smallest supported level.
        min: u8,
        /// Largest supported level.
        max: u8,
    },
}

/// Result type alias for OxiArc operations.
pub type Result<T> = std::result::Result<T, OxiArcError>;

impl OxiArcError {
    /// Create an input underrun error.
    pub fn input_underrun(offset: u64) -> Self {
        Self::InputUnderrun { offset }
    }

    /// Create a lookbehind underrun error.
    pub fn lookbehind_underrun(distance: usize, available: usize) -> Self {
        Self::LookbehindUnderrun {
            distance,
            available,
        }
    }

    /// Create an invalid level error.
    pub fn invalid_level(level: u8, min: u8, max: u8) -> Self {
        Self::InvalidLevel { level, min, max }
    }

    /// Convert a reader failure, mapping end-of-input to an underrun.
    pub fn from_read(err: io::Error, offset: u64) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::input_underrun(offset)
        } else {
            Self::Io(err)
        }
    }

    /// Whether this error reports a truncated compressed stream.
    pub fn is_input_underrun(&self) -> bool {
        matches!(self, Self::InputUnderrun { .. })
    }

    /// Whether this error reports a back-reference before the output start.
    pub fn is_lookbehind_underrun(&self) -> bool {
        matches!(self, Self::LookbehindUnderrun { .. })
    }
}
