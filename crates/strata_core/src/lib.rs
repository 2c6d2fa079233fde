//! # Strata Core
//!
//! Binary primitives for the Strata region format.
//!
//! ## Design Principles
//!
//! 1. **Big-endian everywhere** - every multi-byte integer is network order
//! 2. **Strict reads** - short input fails, it never defaults
//! 3. **Self-describing blocks** - strings, bit sets, frames and compressed
//!    blocks all carry their own length
//!
//! This crate knows nothing about palettes or chunks. Those live in
//! `strata_region`, which builds every record out of [`RegionReader`] and
//! [`RegionWriter`] calls.
//!
//! ## Example
//!
//! ```rust
//! use strata_core::{Prefix, RegionReader, RegionWriter};
//!
//! let mut writer = RegionWriter::new();
//! writer.write_string("minecraft:stone", Prefix::U16)?;
//! writer.write_compressed(&[0u8; 2048])?;
//! let bytes = writer.into_inner();
//!
//! let mut reader = RegionReader::new(&bytes);
//! assert_eq!(reader.read_string(Prefix::U16)?, "minecraft:stone");
//! assert_eq!(reader.read_compressed()?.len(), 2048);
//! # Ok::<(), strata_core::RegionError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod bitset;
pub mod error;
pub mod stream;

pub use bitset::BitSet;
pub use error::{RegionError, RegionResult};
pub use stream::{FrameMark, Prefix, RegionReader, RegionWriter, COMPRESSED_HEADER_LEN};
