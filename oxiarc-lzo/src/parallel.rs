//! Batch compression of independent blocks (requires `parallel` feature).
//!
//! Each block is a self-contained LZO1X stream with its own search state, so
//! blocks are spread over the rayon thread pool with no shared data. Output
//! order matches input order.

use crate::block::compress;
use crate::decode::decompress;
use crate::optimal::LeveledEncoder;
use oxiarc_core::error::Result;
use oxiarc_core::traits::CompressionLevel;
use rayon::prelude::*;

/// Compress every block with the greedy encoder.
pub fn compress_many<B: AsRef<[u8]> + Sync>(blocks: &[B]) -> Vec<Vec<u8>> {
    blocks
        .par_iter()
        .map(|block| compress(block.as_ref()))
        .collect()
}

/// Compress every block at an effort level (1-9).
///
/// The level is checked once, before any block is compressed.
pub fn compress_leveled_many<B: AsRef<[u8]> + Sync>(
    blocks: &[B],
    level: u8,
) -> Result<Vec<Vec<u8>>> {
    let encoder = LeveledEncoder::with_level(CompressionLevel::new(level)?);
    Ok(blocks
        .par_iter()
        .map(|block| encoder.compress(block.as_ref()))
        .collect())
}

/// Decompress every block, each taken whole as its own input.
///
/// Fails if any block is malformed; no partial results are returned.
pub fn decompress_many<B: AsRef<[u8]> + Sync>(
    blocks: &[B],
    output_len_hint: usize,
) -> Result<Vec<Vec<u8>>> {
    blocks
        .par_iter()
        .map(|block| {
            let block = block.as_ref();
            decompress(block, block.len(), output_len_hint)
        })
        .collect()
}
