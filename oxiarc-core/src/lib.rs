//! # OxiArc Core
//!
//! Core components shared by the OxiArc codecs.
//!
//! - [`bytestream`]: Sequential, length-bounded byte sources for block decoders
//! - [`traits`]: The [`ByteSource`] trait and the checked [`CompressionLevel`]
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L2: Codec                                               │
//! │     LZO1X block decoder, greedy and leveled encoders    │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Byte stream (this crate)                            │
//! │     SliceReader/ByteReader, levels, errors              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxiarc_core::{ByteSource, CompressionLevel, SliceReader};
//!
//! let mut reader = SliceReader::new(b"\x11\x00\x00", 3);
//! assert_eq!(reader.read_u8().unwrap(), 0x11);
//!
//! assert!(CompressionLevel::new(9).is_ok());
//! assert!(CompressionLevel::new(0).is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bytestream;
pub mod error;
pub mod traits;

// Re-exports for convenience
pub use bytestream::{ByteReader, SliceReader};
pub use error::{OxiArcError, Result};
pub use traits::{ByteSource, CompressionLevel};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bytestream::{ByteReader, SliceReader};
    pub use crate::error::{OxiArcError, Result};
    pub use crate::traits::{ByteSource, CompressionLevel};
}
