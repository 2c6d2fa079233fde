//! Strict big-endian reader over a borrowed byte slice.

use std::io::{Cursor, ErrorKind};

use byteorder::{BigEndian, ReadBytesExt};

use super::Prefix;
use crate::bitset::BitSet;
use crate::error::{RegionError, RegionResult};

/// Reads region primitives from an in-memory buffer.
///
/// Slices handed out by [`RegionReader::read_frame`] borrow from the same
/// buffer, so nested records never copy their bytes.
#[derive(Debug)]
pub struct RegionReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> RegionReader<'a> {
    /// Creates a reader positioned at the start of `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { cursor: Cursor::new(bytes) }
    }

    /// Current byte offset.
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        usize::try_from(self.cursor.position()).unwrap_or(usize::MAX)
    }

    /// Bytes not yet consumed.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.position())
    }

    /// Returns true once every byte has been consumed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Fails with `TrailingBytes` unless the buffer was consumed exactly.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::TrailingBytes`] when bytes are left over.
    pub fn finish(&self) -> RegionResult<()> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(RegionError::TrailingBytes { remaining }),
        }
    }

    /// Reads an unsigned byte.
    ///
    /// # Errors
    ///
    /// Returns an `UnexpectedEof` I/O error on short input.
    pub fn read_u8(&mut self) -> RegionResult<u8> {
        Ok(self.cursor.read_u8()?)
    }

    /// Reads a boolean stored as one byte (non-zero is true).
    ///
    /// # Errors
    ///
    /// Returns an `UnexpectedEof` I/O error on short input.
    pub fn read_bool(&mut self) -> RegionResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads a big-endian `u16`.
    ///
    /// # Errors
    ///
    /// Returns an `UnexpectedEof` I/O error on short input.
    pub fn read_u16(&mut self) -> RegionResult<u16> {
        Ok(self.cursor.read_u16::<BigEndian>()?)
    }

    /// Reads a big-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns an `UnexpectedEof` I/O error on short input.
    pub fn read_u32(&mut self) -> RegionResult<u32> {
        Ok(self.cursor.read_u32::<BigEndian>()?)
    }

    /// Reads a big-endian `i32`.
    ///
    /// # Errors
    ///
    /// Returns an `UnexpectedEof` I/O error on short input.
    pub fn read_i32(&mut self) -> RegionResult<i32> {
        Ok(self.cursor.read_i32::<BigEndian>()?)
    }

    /// Reads a length prefix of the given width.
    ///
    /// # Errors
    ///
    /// Returns an `UnexpectedEof` I/O error on short input.
    pub fn read_len(&mut self, prefix: Prefix) -> RegionResult<usize> {
        Ok(match prefix {
            Prefix::U8 => usize::from(self.read_u8()?),
            Prefix::U16 => usize::from(self.read_u16()?),
            Prefix::U32 => self.read_u32()? as usize,
        })
    }

    /// Borrows the next `len` bytes and advances past them.
    ///
    /// # Errors
    ///
    /// Returns an `UnexpectedEof` I/O error if fewer than `len` bytes remain.
    pub fn read_slice(&mut self, len: usize) -> RegionResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(eof(len, self.remaining()));
        }
        let start = self.position();
        let bytes: &'a [u8] = *self.cursor.get_ref();
        self.cursor.set_position((start + len) as u64);
        Ok(&bytes[start..start + len])
    }

    /// Reads a byte array behind a length prefix.
    ///
    /// # Errors
    ///
    /// Returns an `UnexpectedEof` I/O error on short input.
    pub fn read_byte_array(&mut self, prefix: Prefix) -> RegionResult<Vec<u8>> {
        let len = self.read_len(prefix)?;
        Ok(self.read_slice(len)?.to_vec())
    }

    /// Reads a string whose prefix counts UTF-16 code units.
    ///
    /// # Errors
    ///
    /// Returns an I/O error on short input and [`RegionError::InvalidString`]
    /// for unpaired surrogates.
    pub fn read_string(&mut self, prefix: Prefix) -> RegionResult<String> {
        let units = self.read_len(prefix)?;
        if units * 2 > self.remaining() {
            return Err(eof(units * 2, self.remaining()));
        }
        let mut buf = vec![0u16; units];
        self.cursor.read_u16_into::<BigEndian>(&mut buf)?;
        String::from_utf16(&buf).map_err(|_| RegionError::InvalidString)
    }

    /// Reads a bit set stored as a length-prefixed byte run.
    ///
    /// # Errors
    ///
    /// Returns an `UnexpectedEof` I/O error on short input.
    pub fn read_bitset(&mut self, prefix: Prefix) -> RegionResult<BitSet> {
        let len = self.read_len(prefix)?;
        Ok(BitSet::from_bytes(self.read_slice(len)?))
    }

    /// Reads a `u32`-framed record and returns a reader over its bytes.
    ///
    /// # Errors
    ///
    /// Returns an `UnexpectedEof` I/O error if the frame runs past the input.
    pub fn read_frame(&mut self) -> RegionResult<RegionReader<'a>> {
        let len = self.read_len(Prefix::U32)?;
        Ok(RegionReader::new(self.read_slice(len)?))
    }

    /// Reads and inflates a compressed block.
    ///
    /// # Errors
    ///
    /// - [`RegionError::NegativeLength`] for a negative length field
    /// - [`RegionError::Decompress`] if the payload is not a valid block
    /// - [`RegionError::LengthMismatch`] if it inflates to the wrong size
    pub fn read_compressed(&mut self) -> RegionResult<Vec<u8>> {
        let compressed_len = self.read_signed_len()?;
        let raw_len = self.read_signed_len()?;
        let payload = self.read_slice(compressed_len)?;

        let raw = lz4_flex::block::decompress(payload, raw_len)
            .map_err(|e| RegionError::Decompress(e.to_string()))?;
        if raw.len() != raw_len {
            return Err(RegionError::LengthMismatch { expected: raw_len, actual: raw.len() });
        }
        Ok(raw)
    }

    /// Steps over a compressed block without inflating it.
    ///
    /// Returns `(compressedLen, rawLen)`.
    ///
    /// # Errors
    ///
    /// Returns an error for negative lengths or a payload past the input.
    pub fn skip_compressed(&mut self) -> RegionResult<(usize, usize)> {
        let compressed_len = self.read_signed_len()?;
        let raw_len = self.read_signed_len()?;
        self.read_slice(compressed_len)?;
        Ok((compressed_len, raw_len))
    }

    fn read_signed_len(&mut self) -> RegionResult<usize> {
        let len = self.read_i32()?;
        usize::try_from(len).map_err(|_| RegionError::NegativeLength(len))
    }
}

fn eof(wanted: usize, available: usize) -> RegionError {
    RegionError::Io(std::io::Error::new(
        ErrorKind::UnexpectedEof,
        format!("needed {wanted} bytes, {available} available"),
    ))
}
