//! Big-endian writer into a growable buffer.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use super::Prefix;
use crate::bitset::BitSet;
use crate::error::{RegionError, RegionResult};

/// Position of a pending `u32` frame length, returned by
/// [`RegionWriter::begin_frame`].
#[derive(Debug)]
#[must_use = "a frame must be closed with end_frame"]
pub struct FrameMark(usize);

/// Writes region primitives into an owned buffer.
#[derive(Debug, Default)]
pub struct RegionWriter {
    buf: Vec<u8>,
}

impl RegionWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity) }
    }

    /// Bytes written so far.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing was written.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Borrows the written bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the writer and returns its buffer.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Writes one byte.
    ///
    /// # Errors
    ///
    /// Infallible for an in-memory buffer; the signature matches the reader.
    pub fn write_u8(&mut self, value: u8) -> RegionResult<()> {
        Ok(self.buf.write_u8(value)?)
    }

    /// Writes a boolean as `0` or `1`.
    ///
    /// # Errors
    ///
    /// Infallible for an in-memory buffer.
    pub fn write_bool(&mut self, value: bool) -> RegionResult<()> {
        self.write_u8(u8::from(value))
    }

    /// Writes a big-endian `u16`.
    ///
    /// # Errors
    ///
    /// Infallible for an in-memory buffer.
    pub fn write_u16(&mut self, value: u16) -> RegionResult<()> {
        Ok(self.buf.write_u16::<BigEndian>(value)?)
    }

    /// Writes a big-endian `u32`.
    ///
    /// # Errors
    ///
    /// Infallible for an in-memory buffer.
    pub fn write_u32(&mut self, value: u32) -> RegionResult<()> {
        Ok(self.buf.write_u32::<BigEndian>(value)?)
    }

    /// Writes a big-endian `i32`.
    ///
    /// # Errors
    ///
    /// Infallible for an in-memory buffer.
    pub fn write_i32(&mut self, value: i32) -> RegionResult<()> {
        Ok(self.buf.write_i32::<BigEndian>(value)?)
    }

    /// Writes raw bytes with no prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a length prefix.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::PrefixOverflow`] if `len` exceeds the prefix.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write_len(&mut self, len: usize, prefix: Prefix) -> RegionResult<()> {
        if len > prefix.max() {
            return Err(RegionError::PrefixOverflow { len, max: prefix.max() });
        }
        // Bounds checked above.
        match prefix {
            Prefix::U8 => self.write_u8(len as u8),
            Prefix::U16 => self.write_u16(len as u16),
            Prefix::U32 => self.write_u32(len as u32),
        }
    }

    /// Writes a byte array behind a length prefix.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::PrefixOverflow`] if the array exceeds the prefix.
    pub fn write_byte_array(&mut self, bytes: &[u8], prefix: Prefix) -> RegionResult<()> {
        self.write_len(bytes.len(), prefix)?;
        self.write_raw(bytes);
        Ok(())
    }

    /// Writes a string as UTF-16 code units behind a unit-count prefix.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::StringTooLong`] if the string has more code
    /// units than the prefix can count.
    pub fn write_string(&mut self, value: &str, prefix: Prefix) -> RegionResult<()> {
        let units: Vec<u16> = value.encode_utf16().collect();
        if units.len() > prefix.max() {
            return Err(RegionError::StringTooLong { units: units.len(), max: prefix.max() });
        }
        self.write_len(units.len(), prefix)?;
        for unit in units {
            self.write_u16(unit)?;
        }
        Ok(())
    }

    /// Writes a bit set as its canonical byte run behind a length prefix.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::PrefixOverflow`] if the run exceeds the prefix.
    pub fn write_bitset(&mut self, set: &BitSet, prefix: Prefix) -> RegionResult<()> {
        self.write_byte_array(set.as_bytes(), prefix)
    }

    /// Reserves a `u32` length slot for a frame that follows.
    ///
    /// # Errors
    ///
    /// Infallible for an in-memory buffer.
    pub fn begin_frame(&mut self) -> RegionResult<FrameMark> {
        let mark = FrameMark(self.buf.len());
        self.write_u32(0)?;
        Ok(mark)
    }

    /// Back-patches the frame length reserved by [`Self::begin_frame`].
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::FrameTooLarge`] past 4 GiB.
    pub fn end_frame(&mut self, mark: FrameMark) -> RegionResult<()> {
        let start = mark.0 + 4;
        let len = self.buf.len() - start;
        let len32 = u32::try_from(len).map_err(|_| RegionError::FrameTooLarge { len })?;
        BigEndian::write_u32(&mut self.buf[mark.0..start], len32);
        Ok(())
    }

    /// Compresses `raw` and writes it as a framed compressed block.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::FrameTooLarge`] if either length exceeds `i32`.
    pub fn write_compressed(&mut self, raw: &[u8]) -> RegionResult<()> {
        let compressed = lz4_flex::block::compress(raw);
        self.write_i32(signed_len(compressed.len())?)?;
        self.write_i32(signed_len(raw.len())?)?;
        self.write_raw(&compressed);
        Ok(())
    }
}

fn signed_len(len: usize) -> RegionResult<i32> {
    i32::try_from(len).map_err(|_| RegionError::FrameTooLarge { len })
}
