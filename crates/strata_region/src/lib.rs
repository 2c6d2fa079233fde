//! # Strata Region
//!
//! Palette-indirected storage of voxel regions.
//!
//! A region is a rectangular grid of chunk columns. Instead of repeating a
//! voxel identifier, its property state or a biome name at every cell, each
//! distinct value is given a small integer once, in a region-scoped
//! palette, and cells store only indices.
//!
//! ## Design Principles
//!
//! 1. **Explicit catalogs** - voxel types and biomes resolve through
//!    [`Catalogs`] passed into every call, never a global
//! 2. **Stable indices** - palettes are append-only; an index never moves
//! 3. **Tolerant reads** - unknown ids fall back to a sentinel, changed
//!    property lists are reconciled, and a corrupt chunk is dropped alone
//! 4. **Sparse in memory** - empty sections, chunks and cells are absent
//!
//! ## Example
//!
//! ```rust
//! use strata_region::{Catalogs, CellView, RegionCodec, Registry, VoxelColumn, VoxelType};
//!
//! let registry = Registry::new()
//!     .with_voxel(VoxelType::bare("minecraft:stone"))
//!     .with_biome("minecraft:plains", 1);
//! let codec = RegionCodec::new(Catalogs::from_registry(&registry));
//!
//! let mut column = VoxelColumn::new(16);
//! column.section_mut(4).set_cell(0, 0, 0, CellView::plain("minecraft:stone"));
//! column.section_mut(4).fill_biome(1);
//!
//! let region = codec.sample(1, 1, [(0, &column as &dyn strata_region::ChunkSnapshot)])?;
//! let bytes = codec.encode(&region)?;
//! let decoded = codec.decode(&bytes)?;
//!
//! assert!(decoded.report.is_clean());
//! assert_eq!(decoded.region.cell_at(0, 64, 0).unwrap().identifier, "minecraft:stone");
//! # Ok::<(), strata_region::RegionError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod builder;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod palette;
pub mod position;
pub mod record;
pub mod report;
pub mod snapshot;

pub use builder::RegionBuilder;
pub use catalog::{
    BiomeCatalog, BiomeType, Catalogs, PropertyDef, PropertyMap, Registry, VoxelCatalog, VoxelType,
};
pub use codec::{DecodedRegion, RegionCodec};
pub use config::CodecConfig;
pub use palette::{BiomeEntry, BiomePalette, MaterialEntry, MaterialPalette, SharedPalettes, StatePalette};
pub use position::{chunk_index, chunk_position, CubeShape, RegionExtent, BIOME_CUBE, CELL_CUBE};
pub use record::{
    CellRecord, ChunkRecord, PlacedCell, RegionHeader, RegionRecord, RegionSummary, Sampler,
    SectionRecord,
};
pub use report::{DecodeReport, DecodeWarning};
pub use snapshot::{CellView, ChunkSnapshot, SectionSnapshot, VoxelColumn, VoxelSection};
pub use strata_core::{RegionError, RegionResult};
