//! One 16x16x16 slab of a chunk.

use std::collections::BTreeMap;

use strata_core::{Prefix, RegionError, RegionReader, RegionResult, RegionWriter};

use super::cell::CellRecord;
use super::Sampler;
use crate::palette::{BiomePalette, MaterialPalette, NO_BIOME};
use crate::position::{BIOME_CUBE, CELL_CUBE, LIGHT_LEN};
use crate::snapshot::SectionSnapshot;

/// Light arrays, sparse cells and sparse biome samples of one section.
///
/// Light arrays are either empty (not captured) or exactly 2048 bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectionRecord {
    sky_light: Vec<u8>,
    block_light: Vec<u8>,
    cells: BTreeMap<u16, CellRecord>,
    biomes: BTreeMap<u16, u16>,
}

impl SectionRecord {
    /// Creates a section with the given light arrays and no cells.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidLightArray`] for a length other than 0 or 2048.
    pub fn new(sky_light: Vec<u8>, block_light: Vec<u8>) -> RegionResult<Self> {
        check_light(sky_light.len())?;
        check_light(block_light.len())?;
        Ok(Self { sky_light, block_light, ..Self::default() })
    }

    /// Samples a live section.
    ///
    /// Returns `None` when every cell is empty: such a section is omitted
    /// from its chunk entirely, whatever its light or biomes.
    ///
    /// # Errors
    ///
    /// Fails on a malformed light array or a palette overflow.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_snapshot(
        snapshot: &dyn SectionSnapshot,
        sampler: &Sampler<'_>,
    ) -> RegionResult<Option<Self>> {
        let mut section = Self::new(
            snapshot.sky_light().map(<[u8]>::to_vec).unwrap_or_default(),
            snapshot.block_light().map(<[u8]>::to_vec).unwrap_or_default(),
        )?;

        for (index, x, y, z) in CELL_CUBE.positions() {
            let Some(view) = snapshot.cell(x, y, z) else { continue };
            if sampler.is_air(&view) {
                continue;
            }
            let (material, state) = sampler.cell(&view)?;
            // index < 4096
            let local_index = index as u16;
            section
                .cells
                .insert(local_index, CellRecord { local_index, material, state, extra: view.extra });
        }
        if section.cells.is_empty() {
            return Ok(None);
        }

        for (index, x, y, z) in BIOME_CUBE.positions() {
            if let Some(id) = snapshot.biome_id(x, y, z) {
                section.biomes.insert(index as u16, sampler.biome(id)?);
            }
        }
        Ok(Some(section))
    }

    /// Adds or replaces a cell.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::CellOutOfSection`] if the cell's local index
    /// lies past the section cube.
    pub fn insert_cell(&mut self, cell: CellRecord) -> RegionResult<()> {
        if usize::from(cell.local_index) >= CELL_CUBE.volume() {
            return Err(RegionError::CellOutOfSection {
                index: cell.local_index,
                volume: CELL_CUBE.volume(),
            });
        }
        self.cells.insert(cell.local_index, cell);
        Ok(())
    }

    /// Sets the biome palette index of one biome-cube sample.
    ///
    /// # Panics
    ///
    /// Panics if a coordinate is outside the biome cube. Debug builds also
    /// panic if `biome` is the reserved no-sample index.
    #[allow(clippy::cast_possible_truncation)]
    pub fn set_biome(&mut self, x: usize, y: usize, z: usize, biome: u16) {
        assert!(BIOME_CUBE.contains(x, y, z), "biome sample ({x}, {y}, {z}) outside section");
        debug_assert_ne!(biome, NO_BIOME);
        self.biomes.insert(BIOME_CUBE.index(x, y, z) as u16, biome);
    }

    /// The cell at local cell coordinates, `None` outside the cube.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell(&self, x: usize, y: usize, z: usize) -> Option<&CellRecord> {
        let index = CELL_CUBE.checked_index(x, y, z)?;
        self.cells.get(&(index as u16))
    }

    /// Non-empty cells in local index order.
    pub fn cells(&self) -> impl Iterator<Item = &CellRecord> {
        self.cells.values()
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Biome palette index at biome-cube coordinates, `None` outside the cube.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn biome(&self, x: usize, y: usize, z: usize) -> Option<u16> {
        let index = BIOME_CUBE.checked_index(x, y, z)?;
        self.biomes.get(&(index as u16)).copied()
    }

    /// Biome palette index of the sample covering a cell.
    #[must_use]
    pub fn biome_at_cell(&self, x: usize, y: usize, z: usize) -> Option<u16> {
        let stride = BIOME_CUBE.stride();
        self.biome(x / stride, y / stride, z / stride)
    }

    /// Sky light nibbles, if captured.
    #[must_use]
    pub fn sky_light(&self) -> Option<&[u8]> {
        (!self.sky_light.is_empty()).then_some(self.sky_light.as_slice())
    }

    /// Block light nibbles, if captured.
    #[must_use]
    pub fn block_light(&self) -> Option<&[u8]> {
        (!self.block_light.is_empty()).then_some(self.block_light.as_slice())
    }

    /// Writes light arrays, all 4096 cell positions, then all 64 biome samples.
    ///
    /// # Errors
    ///
    /// Fails if a cell's extra payload is too long.
    #[allow(clippy::cast_possible_truncation)]
    pub fn encode(&self, writer: &mut RegionWriter) -> RegionResult<()> {
        writer.write_byte_array(&self.sky_light, Prefix::U32)?;
        writer.write_byte_array(&self.block_light, Prefix::U32)?;

        for index in 0..CELL_CUBE.volume() as u16 {
            match self.cells.get(&index) {
                Some(cell) => cell.encode(writer)?,
                None => CellRecord::encode_empty(writer, index)?,
            }
        }
        for index in 0..BIOME_CUBE.volume() as u16 {
            writer.write_u16(self.biomes.get(&index).copied().unwrap_or(NO_BIOME))?;
        }
        Ok(())
    }

    /// Reads a section, checking every palette reference.
    ///
    /// # Errors
    ///
    /// Fails on truncated input, out-of-order cells, or a material, state
    /// or biome index outside its palette.
    #[allow(clippy::cast_possible_truncation)]
    pub fn decode(
        reader: &mut RegionReader<'_>,
        materials: &MaterialPalette,
        biomes: &BiomePalette,
    ) -> RegionResult<Self> {
        let sky_light = reader.read_byte_array(Prefix::U32)?;
        let block_light = reader.read_byte_array(Prefix::U32)?;
        let mut section = Self::new(sky_light, block_light)?;

        for index in 0..CELL_CUBE.volume() as u16 {
            if let Some(cell) = CellRecord::decode(reader, index)? {
                materials.resolve(cell.material, cell.state)?;
                section.cells.insert(index, cell);
            }
        }
        for index in 0..BIOME_CUBE.volume() as u16 {
            let biome = reader.read_u16()?;
            if biome != NO_BIOME {
                biomes.get(biome)?;
                section.biomes.insert(index, biome);
            }
        }
        Ok(section)
    }
}

fn check_light(len: usize) -> RegionResult<()> {
    if len == 0 || len == LIGHT_LEN {
        Ok(())
    } else {
        Err(RegionError::InvalidLightArray { len })
    }
}
