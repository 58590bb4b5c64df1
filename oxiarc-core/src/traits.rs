//! Core traits and parameter types shared by the codecs.

use crate::error::{OxiArcError, Result};

/// A strictly sequential source of compressed bytes.
///
/// Block decoders pull their input through this trait so the same state
/// machine can run over an in-memory slice or a live reader. Implementations
/// must never yield bytes past the declared input length, and report running
/// dry as [`OxiArcError::InputUnderrun`].
pub trait ByteSource {
    /// Read a single byte.
    fn read_u8(&mut self) -> Result<u8>;

    /// Read a little-endian 16-bit value.
    fn read_u16_le(&mut self) -> Result<u16> {
        let lo = self.read_u8()?;
        let hi = self.read_u8()?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// Append exactly `count` bytes to `out`.
    ///
    /// On failure `out` may hold a partial copy; callers treat it as garbage.
    fn append_to(&mut self, out: &mut Vec<u8>, count: usize) -> Result<()>;
}

/// Compression effort level for encoders that support it.
///
/// Unlike a clamped setting, an out-of-range level is rejected: the level is
/// part of the caller's contract, not data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// Smallest supported level value.
    pub const MIN_LEVEL: u8 = 1;
    /// Largest supported level value.
    pub const MAX_LEVEL: u8 = 9;

    /// Fastest compression.
    pub const FAST: Self = Self(1);
    /// Default compression (balanced).
    pub const DEFAULT: Self = Self(6);
    /// Best compression (slowest).
    pub const BEST: Self = Self(9);

    /// Create a compression level, rejecting values outside 1-9.
    pub fn new(level: u8) -> Result<Self> {
        if (Self::MIN_LEVEL..=Self::MAX_LEVEL).contains(&level) {
            Ok(Self(level))
        } else {
            Err(OxiArcError::invalid_level(
                level,
                Self::MIN_LEVEL,
                Self::MAX_LEVEL,
            ))
        }
    }

    /// Get the level value.
    pub fn level(self) -> u8 {
        self.0
    }

    /// Iterate over every supported level, fastest first.
    pub fn all() -> impl Iterator<Item = Self> {
        (Self::MIN_LEVEL..=Self::MAX_LEVEL).map(Self)
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for CompressionLevel {
    type Error = OxiArcError;

    fn try_from(level: u8) -> Result<Self> {
        Self::new(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_level() {
        assert_eq!(CompressionLevel::FAST.level(), 1);
        assert_eq!(CompressionLevel::DEFAULT.level(), 6);
        assert_eq!(CompressionLevel::BEST.level(), 9);
        assert_eq!(CompressionLevel::default(), CompressionLevel::DEFAULT);
    }

    #[test]
    fn test_level_range() {
        assert!(CompressionLevel::new(0).is_err());
        assert!(CompressionLevel::new(10).is_err());
        assert!(CompressionLevel::try_from(5).is_ok());
        assert_eq!(CompressionLevel::all().count(), 9);
    }
}
