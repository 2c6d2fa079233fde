//! # Region Error Types
//!
//! All fatal errors that can occur while reading or writing a region.
//!
//! Recoverable conditions (unknown identifiers, schema drift, a single
//! corrupt chunk) are not errors: the region crate reports them as
//! warnings next to the decoded value.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the region codec.
#[derive(Error, Debug)]
pub enum RegionError {
    /// The region file does not exist or cannot be opened.
    #[error("region file not found: {}", path.display())]
    MissingFile {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// Underlying I/O failure, including a stream that ended early.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// A compressed block inflated to a different size than its header claims.
    #[error("decompressed length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Length stored in the block header.
        expected: usize,
        /// Length actually produced.
        actual: usize,
    },

    /// The compressor rejected the payload.
    #[error("decompression failed: {0}")]
    Decompress(String),

    /// The file was written with a format version this build cannot read.
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    /// A signed length field was negative.
    #[error("negative length field: {0}")]
    NegativeLength(i32),

    /// A string does not fit its length prefix.
    #[error("string of {units} UTF-16 units exceeds prefix limit {max}")]
    StringTooLong {
        /// Number of UTF-16 code units in the string.
        units: usize,
        /// Largest value the prefix can hold.
        max: usize,
    },

    /// A string payload is not valid UTF-16.
    #[error("invalid UTF-16 string payload")]
    InvalidString,

    /// A palette reference points past the end of its palette.
    #[error("{palette} palette index {index} out of range (size {len})")]
    IndexOutOfRange {
        /// Which palette was indexed.
        palette: &'static str,
        /// Offending index.
        index: usize,
        /// Palette size at the time of the lookup.
        len: usize,
    },

    /// A palette has no index left for a new entry.
    #[error("{palette} palette is full ({capacity} entries)")]
    PaletteFull {
        /// Which palette overflowed.
        palette: &'static str,
        /// Number of entries the palette can index.
        capacity: usize,
    },

    /// A cell record carries a different local index than its position in the stream.
    #[error("cell record out of order: expected local index {expected}, found {found}")]
    CellIndexMismatch {
        /// Position being read.
        expected: u16,
        /// Index stored in the record.
        found: u16,
    },

    /// A populated bit lies outside the region grid.
    #[error("chunk index {index} outside region grid of {capacity} chunks")]
    ChunkOutOfBounds {
        /// Offending chunk index.
        index: usize,
        /// Number of chunk slots in the grid.
        capacity: usize,
    },

    /// A length or entry count does not fit its prefix.
    #[error("length {len} exceeds prefix limit {max}")]
    PrefixOverflow {
        /// Value that did not fit.
        len: usize,
        /// Largest value the prefix can hold.
        max: usize,
    },

    /// A cell lies outside the section cube.
    #[error("cell local index {index} outside section of {volume} cells")]
    CellOutOfSection {
        /// Offending local index.
        index: u16,
        /// Number of cells in a section.
        volume: usize,
    },

    /// A frame or compressed block is too large for its length field.
    #[error("frame of {len} bytes exceeds its length field")]
    FrameTooLarge {
        /// Byte length that did not fit.
        len: usize,
    },

    /// A framed record left unread bytes behind.
    #[error("{remaining} trailing bytes after record")]
    TrailingBytes {
        /// Bytes left in the frame.
        remaining: usize,
    },

    /// A light array has neither zero nor the full section length.
    #[error("invalid light array length {len}")]
    InvalidLightArray {
        /// Length found in the stream.
        len: usize,
    },

    /// Invalid configuration or catalog file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RegionError {
    /// Returns true for errors that describe malformed data rather than
    /// a missing file or a failing device.
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        match self {
            Self::MissingFile { .. } | Self::InvalidConfig(_) => false,
            Self::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => true,
        }
    }
}

/// Result type for region operations.
pub type RegionResult<T> = Result<T, RegionError>;
