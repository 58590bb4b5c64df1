//! Pure Rust LZO1X compression implementation.
//!
//! LZO1X is a byte-oriented LZ77 format built for very fast decompression.
//! A compressed block is a sequence of literal runs and back-references
//! terminated by an end marker; it carries no header, checksum, or length,
//! so callers keep the compressed length themselves.
//!
//! # Features
//!
//! - Bounds-checked decoder that never reads past the declared input length
//!   and rejects back-references before the start of the output
//! - Decoding from memory or from any [`std::io::Read`]
//! - Fast greedy encoder
//! - Leveled encoder (1-9) with lazy matching and, at level 9, an optimal
//!   parse
//! - Batch helpers on the rayon thread pool (`parallel` feature)
//!
//! # Example
//!
//! ```
//! use oxiarc_lzo::{compress, compress_leveled, decompress};
//!
//! let data = b"Hello, World! Hello, World! Hello, World!";
//! let compressed = compress(data);
//! let decompressed = decompress(&compressed, compressed.len(), data.len()).unwrap();
//! assert_eq!(decompressed, data);
//!
//! let smaller = compress_leveled(data, 9).unwrap();
//! assert_eq!(decompress(&smaller, smaller.len(), 0).unwrap(), data);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod block;
mod decode;
pub mod format;
mod matchfinder;
mod optimal;
#[cfg(feature = "parallel")]
mod parallel;
mod writer;

pub use block::compress;
pub use decode::{decompress, decompress_from, decompress_from_reader};
pub use optimal::{LevelParams, LeveledEncoder, compress_leveled};

#[cfg(feature = "parallel")]
pub use parallel::{compress_leveled_many, compress_many, decompress_many};

pub use oxiarc_core::error::{OxiArcError, Result};
pub use oxiarc_core::traits::{ByteSource, CompressionLevel};
