//! Bounds-checked byte access
//!
//! Every offset/length pair taken from package data goes through
//! [`checked_range`] exactly once, either via [`PkgSource::read_at`] for file
//! reads or [`bytes_at`] for in-memory buffers.

use pv_core::error::ReadError;
use std::io::{Read, Seek, SeekFrom};
use std::ops::Range;

/// Resolve `offset..offset + len` against an extent of `extent` bytes
///
/// Returns `None` on overflow or if any byte of the range lies past the extent.
pub fn checked_range(offset: u64, len: u64, extent: u64) -> Option<Range<u64>> {
    let end = offset.checked_add(len)?;
    (end <= extent).then_some(offset..end)
}

/// Borrow `len` bytes at `offset` from an in-memory buffer
pub fn bytes_at(buf: &[u8], offset: u64, len: u64) -> Option<&[u8]> {
    let range = checked_range(offset, len, buf.len() as u64)?;
    buf.get(range.start as usize..range.end as usize)
}

/// Random-access package source with a known length
///
/// Reads are absolute; no read depends on where the previous one left the
/// underlying cursor.
pub struct PkgSource<R> {
    inner: R,
    len: u64,
}

impl<R: Read + Seek> PkgSource<R> {
    /// Wrap a reader, measuring its length
    pub fn new(mut inner: R) -> Result<Self, ReadError> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self { inner, len })
    }

    /// Total length of the source in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the source holds no bytes at all
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read exactly `len` bytes at absolute `offset`
    pub fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>, ReadError> {
        let range = checked_range(offset, len as u64, self.len).ok_or(ReadError::OutOfBounds {
            offset,
            len: len as u64,
            extent: self.len,
        })?;

        self.inner.seek(SeekFrom::Start(range.start))?;
        let mut buf = vec![0u8; len];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read a fixed-size array at absolute `offset`
    pub fn read_array_at<const N: usize>(&mut self, offset: u64) -> Result<[u8; N], ReadError> {
        let bytes = self.read_at(offset, N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&bytes);
        Ok(out)
    }

    /// Read the first `max` bytes, or the whole source if it is shorter
    pub fn read_prefix(&mut self, max: u64) -> Result<Vec<u8>, ReadError> {
        let len = max.min(self.len);
        self.read_at(0, len as usize)
    }
}
