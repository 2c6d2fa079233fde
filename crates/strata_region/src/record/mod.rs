//! # Records
//!
//! Immutable value snapshots of a region, from the root down:
//!
//! ```text
//! RegionRecord ── header (extents, populated chunks)
//!              ├─ MaterialPalette, BiomePalette
//!              └─ ChunkRecord per populated chunk
//!                   └─ SectionRecord per populated section
//!                        ├─ light arrays
//!                        ├─ CellRecord per non-empty cell
//!                        └─ biome palette index per sample
//! ```
//!
//! Records are built once, from a snapshot or by decoding, and never
//! patched afterwards. [`Sampler`] carries what building from a snapshot
//! needs: the shared palettes, the catalogs and the codec config.

mod cell;
mod chunk;
mod region;
mod section;

pub use cell::{CellRecord, EMPTY_MATERIAL};
pub use chunk::ChunkRecord;
pub use region::{PlacedCell, RegionHeader, RegionRecord, RegionSummary, FORMAT_VERSION};
pub use section::SectionRecord;

use strata_core::RegionResult;

use crate::catalog::{Catalogs, VoxelType};
use crate::config::CodecConfig;
use crate::palette::SharedPalettes;
use crate::snapshot::CellView;

/// Resolves snapshot values into palette indices.
#[derive(Debug, Clone, Copy)]
pub struct Sampler<'a> {
    palettes: &'a SharedPalettes,
    catalogs: Catalogs<'a>,
    config: &'a CodecConfig,
}

impl<'a> Sampler<'a> {
    /// Creates a sampler over shared palettes.
    #[must_use]
    pub fn new(palettes: &'a SharedPalettes, catalogs: Catalogs<'a>, config: &'a CodecConfig) -> Self {
        Self { palettes, catalogs, config }
    }

    /// True if the view is the empty-cell sentinel.
    #[must_use]
    pub fn is_air(&self, view: &CellView) -> bool {
        view.identifier == self.config.air
    }

    /// `(materialIndex, stateIndex)` of a non-empty cell.
    ///
    /// An identifier the catalog does not know is stored as the fallback
    /// material in its default state.
    ///
    /// # Errors
    ///
    /// Returns [`strata_core::RegionError::PaletteFull`] on overflow.
    pub fn cell(&self, view: &CellView) -> RegionResult<(u32, u16)> {
        match self.catalogs.voxels.voxel_type(&view.identifier) {
            Some(voxel) => self.palettes.cell(voxel, &view.state),
            None => {
                let fallback: VoxelType = self.config.fallback_voxel(self.catalogs);
                tracing::error!(
                    identifier = %view.identifier,
                    fallback = %fallback.identifier,
                    "unknown voxel type in snapshot"
                );
                self.palettes.cell(&fallback, &fallback.default_state())
            }
        }
    }

    /// Biome palette index for a numeric biome id.
    ///
    /// # Errors
    ///
    /// Returns [`strata_core::RegionError::PaletteFull`] on overflow.
    pub fn biome(&self, id: u32) -> RegionResult<u16> {
        match self.catalogs.biomes.biome_by_id(id) {
            Some(biome) => self.palettes.biome(&biome.identifier),
            None => {
                tracing::warn!(id, fallback = %self.config.fallback_biome, "unknown biome id in snapshot");
                self.palettes.biome(&self.config.fallback_biome)
            }
        }
    }
}
