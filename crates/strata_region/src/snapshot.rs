//! # Snapshot Accessors
//!
//! Read-only views of world data that the encoder samples. A host engine
//! implements [`ChunkSnapshot`] over its own chunk storage; [`VoxelColumn`]
//! and [`VoxelSection`] are plain in-memory implementations for hosts that
//! copy data out first, and for tests.

use std::collections::BTreeMap;

use crate::catalog::PropertyMap;
use crate::position::{BIOME_CUBE, CELL_CUBE};

/// What a snapshot reports for one cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellView {
    /// Voxel type identifier.
    pub identifier: String,
    /// Property state of the voxel.
    pub state: PropertyMap,
    /// Opaque per-cell payload, stored verbatim.
    pub extra: Option<String>,
}

impl CellView {
    /// A cell in its type's given state with no extra payload.
    #[must_use]
    pub fn new(identifier: impl Into<String>, state: PropertyMap) -> Self {
        Self { identifier: identifier.into(), state, extra: None }
    }

    /// A cell with an empty property state.
    #[must_use]
    pub fn plain(identifier: impl Into<String>) -> Self {
        Self::new(identifier, PropertyMap::new())
    }

    /// Attaches an extra payload.
    #[must_use]
    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }
}

/// One 16x16x16 section of a chunk.
pub trait SectionSnapshot {
    /// The cell at local cell coordinates; `None` or the air identifier
    /// means empty. Coordinates outside `0..16` yield `None`.
    fn cell(&self, x: usize, y: usize, z: usize) -> Option<CellView>;

    /// Sky light nibbles (2048 bytes), if any.
    fn sky_light(&self) -> Option<&[u8]>;

    /// Block light nibbles (2048 bytes), if any.
    fn block_light(&self) -> Option<&[u8]>;

    /// Numeric biome id at biome-cube coordinates (`0..4` on each axis);
    /// `None` outside that range.
    fn biome_id(&self, x: usize, y: usize, z: usize) -> Option<u32>;
}

/// One chunk column.
pub trait ChunkSnapshot {
    /// Number of section slots, bottom to top.
    fn section_count(&self) -> usize;

    /// The section in `slot`, or `None` if the host never allocated it.
    fn section(&self, slot: usize) -> Option<&dyn SectionSnapshot>;
}

/// Owned section data.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoxelSection {
    cells: BTreeMap<usize, CellView>,
    sky_light: Option<Vec<u8>>,
    block_light: Option<Vec<u8>>,
    biomes: BTreeMap<usize, u32>,
}

impl VoxelSection {
    /// Creates an empty section.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one cell.
    ///
    /// # Panics
    ///
    /// Panics if a coordinate is not below 16.
    pub fn set_cell(&mut self, x: usize, y: usize, z: usize, cell: CellView) {
        self.cells.insert(cell_index(x, y, z), cell);
    }

    /// Empties one cell.
    ///
    /// # Panics
    ///
    /// Panics if a coordinate is not below 16.
    pub fn clear_cell(&mut self, x: usize, y: usize, z: usize) {
        self.cells.remove(&cell_index(x, y, z));
    }

    /// Sets the biome of one biome-cube sample.
    ///
    /// # Panics
    ///
    /// Panics if a coordinate is not below 4.
    pub fn set_biome(&mut self, x: usize, y: usize, z: usize, id: u32) {
        assert!(BIOME_CUBE.contains(x, y, z), "biome sample ({x}, {y}, {z}) outside section");
        self.biomes.insert(BIOME_CUBE.index(x, y, z), id);
    }

    /// Sets every biome sample to `id`.
    pub fn fill_biome(&mut self, id: u32) {
        for index in 0..BIOME_CUBE.volume() {
            self.biomes.insert(index, id);
        }
    }

    /// Sets the sky light array.
    pub fn set_sky_light(&mut self, light: Vec<u8>) {
        self.sky_light = Some(light);
    }

    /// Sets the block light array.
    pub fn set_block_light(&mut self, light: Vec<u8>) {
        self.block_light = Some(light);
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

impl SectionSnapshot for VoxelSection {
    fn cell(&self, x: usize, y: usize, z: usize) -> Option<CellView> {
        self.cells.get(&CELL_CUBE.checked_index(x, y, z)?).cloned()
    }

    fn sky_light(&self) -> Option<&[u8]> {
        self.sky_light.as_deref()
    }

    fn block_light(&self) -> Option<&[u8]> {
        self.block_light.as_deref()
    }

    fn biome_id(&self, x: usize, y: usize, z: usize) -> Option<u32> {
        self.biomes.get(&BIOME_CUBE.checked_index(x, y, z)?).copied()
    }
}

fn cell_index(x: usize, y: usize, z: usize) -> usize {
    assert!(CELL_CUBE.contains(x, y, z), "cell ({x}, {y}, {z}) outside section");
    CELL_CUBE.index(x, y, z)
}

/// Owned chunk column.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoxelColumn {
    sections: Vec<Option<VoxelSection>>,
}

impl VoxelColumn {
    /// A column with `section_count` unallocated slots.
    #[must_use]
    pub fn new(section_count: usize) -> Self {
        Self { sections: vec![None; section_count] }
    }

    /// The section in `slot`, allocating it on first use.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not below the column's section count.
    pub fn section_mut(&mut self, slot: usize) -> &mut VoxelSection {
        self.sections[slot].get_or_insert_with(VoxelSection::new)
    }
}

impl ChunkSnapshot for VoxelColumn {
    fn section_count(&self) -> usize {
        self.sections.len()
    }

    fn section(&self, slot: usize) -> Option<&dyn SectionSnapshot> {
        self.sections
            .get(slot)
            .and_then(Option::as_ref)
            .map(|s| s as &dyn SectionSnapshot)
    }
}
