//! # Binary Stream Primitives
//!
//! Big-endian building blocks shared by every record of the region format.
//!
//! ## Encodings
//!
//! | Primitive | Layout |
//! |---|---|
//! | integers | fixed width, big-endian |
//! | string | length prefix (u8, u16 or u32) counting UTF-16 code units, then the units |
//! | bit set | length prefix (u8, u16 or u32) counting bytes, then the raw bytes |
//! | compressed block | `i32 compressedLen, i32 rawLen, payload` |
//! | frame | `u32 byteLen, bytes` |
//!
//! Reads are strict. Running out of input is an `UnexpectedEof` I/O error,
//! never a silently defaulted value.

mod reader;
mod writer;

pub use reader::RegionReader;
pub use writer::{FrameMark, RegionWriter};

/// Width of a length prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Prefix {
    /// One byte, up to 255.
    U8,
    /// Two bytes, up to 65 535.
    U16,
    /// Four bytes.
    U32,
}

impl Prefix {
    /// Largest value the prefix can carry.
    #[must_use]
    pub const fn max(self) -> usize {
        match self {
            Self::U8 => u8::MAX as usize,
            Self::U16 => u16::MAX as usize,
            Self::U32 => u32::MAX as usize,
        }
    }
}

/// Size of the `compressedLen` and `rawLen` header of a compressed block.
pub const COMPRESSED_HEADER_LEN: usize = 8;
