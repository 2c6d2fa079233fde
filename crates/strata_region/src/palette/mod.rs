//! # Palettes
//!
//! Append-only dictionaries that replace repeated values with small
//! integers. Indices are assigned as `len()` at insertion and never move.
//!
//! | Palette | Key | Index width | Scope |
//! |---|---|---|---|
//! | [`StatePalette`] | property map | `u16` | one material |
//! | [`MaterialPalette`] | voxel type identifier | `i32` on the wire | region |
//! | [`BiomePalette`] | biome identifier | `u16` | region |
//!
//! Lookups go through a hash index next to the entry vector, so
//! find-or-add is O(1) while iteration stays in index order.
//!
//! ## Thread Safety
//!
//! The palettes themselves are plain values. When several threads sample
//! sections of one region, they share a [`SharedPalettes`], which holds
//! each palette behind a mutex for the whole find-or-append step.

mod biome;
mod material;
mod state;

pub use biome::{BiomeEntry, BiomePalette, NO_BIOME};
pub use material::{MaterialEntry, MaterialPalette};
pub use state::StatePalette;

use parking_lot::Mutex;
use strata_core::RegionResult;

use crate::catalog::{PropertyMap, VoxelType};

/// Material and biome palettes shared by concurrent samplers.
#[derive(Debug, Default)]
pub struct SharedPalettes {
    materials: Mutex<MaterialPalette>,
    biomes: Mutex<BiomePalette>,
}

impl SharedPalettes {
    /// Creates empty palettes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Find-or-add of one cell, atomic with respect to other samplers.
    ///
    /// # Errors
    ///
    /// Returns [`strata_core::RegionError::PaletteFull`] on overflow.
    pub fn cell(&self, voxel: &VoxelType, state: &PropertyMap) -> RegionResult<(u32, u16)> {
        self.materials.lock().find_or_add_cell(voxel, state)
    }

    /// Find-or-add of one biome, atomic with respect to other samplers.
    ///
    /// # Errors
    ///
    /// Returns [`strata_core::RegionError::PaletteFull`] on overflow.
    pub fn biome(&self, identifier: &str) -> RegionResult<u16> {
        self.biomes.lock().find_or_add(identifier)
    }

    /// Releases the palettes once sampling is done.
    #[must_use]
    pub fn into_inner(self) -> (MaterialPalette, BiomePalette) {
        (self.materials.into_inner(), self.biomes.into_inner())
    }
}
