//! Offset-tracking byte reader and the borsh-backed writer used by the field codec.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::{CodecError, Result};

/// Reads a borrowed buffer front to back, tracking the absolute offset so no
/// caller recomputes positions by hand.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Start reading at `offset`. An offset past the end leaves nothing to read.
    pub fn at(bytes: &'a [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    /// Fail with `MalformedBuffer` unless `needed` bytes remain. A position
    /// past the end fails for every `needed`, zero included.
    pub fn ensure(&self, needed: usize) -> Result<()> {
        let available = self.remaining();
        if self.offset > self.bytes.len() || available < needed {
            return Err(CodecError::MalformedBuffer {
                offset: self.offset,
                needed,
                available,
            });
        }
        Ok(())
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let chunk = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(chunk)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    /// Read a borsh value that occupies exactly `len` bytes.
    pub fn read<T: BorshDeserialize>(&mut self, len: usize) -> Result<T> {
        let chunk = self.take(len)?;
        T::try_from_slice(chunk).map_err(|err| CodecError::Serialization(err.to_string()))
    }
}

/// Append the borsh encoding of `value` (little-endian, u32 length prefix for strings).
pub(crate) fn write<T: BorshSerialize + ?Sized>(out: &mut Vec<u8>, value: &T) -> Result<()> {
    borsh::to_writer(&mut *out, value).map_err(|err| CodecError::Serialization(err.to_string()))
}
