//! Sequential byte sources for block decoders.
//!
//! Two implementations of [`ByteSource`] are provided:
//!
//! - [`SliceReader`] walks an in-memory buffer with no copying.
//! - [`ByteReader`] wraps any `Read` implementation, refilling an internal
//!   buffer in batches. The reader is limited to the declared input length,
//!   so no byte past the end of the compressed block is ever pulled from the
//!   underlying source, even when more data is available.
//!
//! # Example
//!
//! ```
//! use oxiarc_core::bytestream::{ByteReader, SliceReader};
//! use oxiarc_core::traits::ByteSource;
//! use std::io::Cursor;
//!
//! let mut slice = SliceReader::new(&[0x34, 0x12, 0xFF], 2);
//! assert_eq!(slice.read_u16_le().unwrap(), 0x1234);
//! assert!(slice.read_u8().is_err());
//!
//! let mut reader = ByteReader::new(Cursor::new(vec![1, 2, 3]), 3);
//! let mut out = Vec::new();
//! reader.append_to(&mut out, 3).unwrap();
//! assert_eq!(out, [1, 2, 3]);
//! ```

use crate::error::{OxiArcError, Result};
use crate::traits::ByteSource;
use std::io::{self, Read, Take};

/// Default refill size for [`ByteReader`].
const BUFFER_SIZE: usize = 8 * 1024;

/// A byte source over an in-memory slice.
#[derive(Debug, Clone)]
pub struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    /// Create a reader over at most `limit` bytes of `data`.
    pub fn new(data: &'a [u8], limit: usize) -> Self {
        Self {
            data: &data[..limit.min(data.len())],
            pos: 0,
        }
    }

    /// Bytes left before the limit.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl ByteSource for SliceReader<'_> {
    #[inline]
    fn read_u8(&mut self) -> Result<u8> {
        match self.data.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                Ok(b)
            }
            None => Err(OxiArcError::input_underrun(self.pos as u64)),
        }
    }

    fn append_to(&mut self, out: &mut Vec<u8>, count: usize) -> Result<()> {
        if count > self.remaining() {
            self.pos = self.data.len();
            return Err(OxiArcError::input_underrun(self.pos as u64));
        }
        out.extend_from_slice(&self.data[self.pos..self.pos + count]);
        self.pos += count;
        Ok(())
    }
}

/// A buffered byte source over any `Read`, limited to a fixed length.
#[derive(Debug)]
pub struct ByteReader<R: Read> {
    /// Underlying reader, capped at the declared input length.
    reader: Take<R>,
    /// Refill buffer.
    buffer: Vec<u8>,
    /// Next unread byte in `buffer`.
    start: usize,
    /// End of valid data in `buffer`.
    end: usize,
    /// Total bytes handed out (for error reporting).
    position: u64,
}

impl<R: Read> ByteReader<R> {
    /// Create a reader that yields at most `limit` bytes from `reader`.
    pub fn new(reader: R, limit: u64) -> Self {
        Self::with_capacity(reader, limit, BUFFER_SIZE)
    }

    /// Create a reader with a specific refill buffer size.
    pub fn with_capacity(reader: R, limit: u64, capacity: usize) -> Self {
        let limit_usize = usize::try_from(limit).unwrap_or(usize::MAX);
        let capacity = capacity.min(limit_usize).max(1);
        Self {
            reader: reader.take(limit),
            buffer: vec![0; capacity],
            start: 0,
            end: 0,
            position: 0,
        }
    }

    /// Make sure at least one byte is buffered.
    #[inline]
    fn fill_buffer(&mut self) -> Result<()> {
        if self.start < self.end {
            return Ok(());
        }

        loop {
            match self.reader.read(&mut self.buffer) {
                Ok(0) => return Err(OxiArcError::input_underrun(self.position)),
                Ok(n) => {
                    self.start = 0;
                    self.end = n;
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(OxiArcError::from_read(e, self.position)),
            }
        }
    }
}

impl<R: Read> ByteSource for ByteReader<R> {
    #[inline]
    fn read_u8(&mut self) -> Result<u8> {
        self.fill_buffer()?;
        let b = self.buffer[self.start];
        self.start += 1;
        self.position += 1;
        Ok(b)
    }

    fn append_to(&mut self, out: &mut Vec<u8>, mut count: usize) -> Result<()> {
        while count > 0 {
            self.fill_buffer()?;
            let take = count.min(self.end - self.start);
            out.extend_from_slice(&self.buffer[self.start..self.start + take]);
            self.start += take;
            self.position += take as u64;
            count -= take;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader that hands out one byte per call.
    struct Trickle(Vec<u8>, usize);

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.1 >= self.0.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.0[self.1];
            self.1 += 1;
            Ok(1)
        }
    }

    #[test]
    fn test_slice_reader_limit() {
        let data = [1u8, 2, 3, 4];
        let mut reader = SliceReader::new(&data, 2);
        assert_eq!(reader.read_u8().unwrap(), 1);
        assert_eq!(reader.read_u8().unwrap(), 2);
        let err = reader.read_u8().unwrap_err();
        assert!(matches!(err, OxiArcError::InputUnderrun { offset: 2 }));
    }

    #[test]
    fn test_slice_reader_limit_beyond_data() {
        let data = [9u8];
        let mut reader = SliceReader::new(&data, 100);
        assert_eq!(reader.remaining(), 1);
        let mut out = Vec::new();
        assert!(reader.append_to(&mut out, 2).unwrap_err().is_input_underrun());
    }

    #[test]
    fn test_byte_reader_never_reads_past_limit() {
        let mut cursor = Cursor::new(vec![1u8, 2, 3, 4, 5, 6]);
        {
            let mut reader = ByteReader::new(&mut cursor, 3);
            let mut out = Vec::new();
            reader.append_to(&mut out, 3).unwrap();
            assert_eq!(out, [1, 2, 3]);
            assert!(reader.read_u8().unwrap_err().is_input_underrun());
        }
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn test_byte_reader_refills_across_batches() {
        let data: Vec<u8> = (0..=255).collect();
        let mut reader = ByteReader::with_capacity(Trickle(data.clone(), 0), 256, 16);
        let mut out = Vec::new();
        reader.append_to(&mut out, 200).unwrap();
        assert_eq!(reader.read_u16_le().unwrap(), u16::from_le_bytes([200, 201]));
        reader.append_to(&mut out, 54).unwrap();
        let err = reader.read_u8().unwrap_err();
        assert!(matches!(err, OxiArcError::InputUnderrun { offset: 256 }));
        assert_eq!(&out[..200], &data[..200]);
        assert_eq!(&out[200..], &data[202..]);
    }

    #[test]
    fn test_byte_reader_zero_limit() {
        let mut reader = ByteReader::new(Cursor::new(vec![0u8]), 0);
        let err = reader.read_u8().unwrap_err();
        assert!(matches!(err, OxiArcError::InputUnderrun { offset: 0 }));
    }
}
