//! One chunk column.

use std::collections::BTreeMap;

use strata_core::{BitSet, Prefix, RegionReader, RegionResult, RegionWriter};
use tracing::debug;

use super::section::SectionRecord;
use super::Sampler;
use crate::palette::{BiomePalette, MaterialPalette};
use crate::snapshot::ChunkSnapshot;

/// Populated section slots of a chunk.
///
/// The populated bit set and the section map always hold the same slots,
/// and every stored section has at least one cell.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkRecord {
    populated: BitSet,
    sections: BTreeMap<usize, SectionRecord>,
}

impl ChunkRecord {
    /// Creates a chunk with no sections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples every section slot of a live chunk.
    ///
    /// Returns `None` if no section holds a non-empty cell.
    ///
    /// # Errors
    ///
    /// Propagates section sampling failures.
    pub fn from_snapshot(
        snapshot: &dyn ChunkSnapshot,
        sampler: &Sampler<'_>,
    ) -> RegionResult<Option<Self>> {
        let mut chunk = Self::new();
        for slot in 0..snapshot.section_count() {
            let Some(live) = snapshot.section(slot) else { continue };
            if let Some(section) = SectionRecord::from_snapshot(live, sampler)? {
                chunk.insert_section(slot, section);
            }
        }
        Ok((!chunk.is_empty()).then_some(chunk))
    }

    /// Adds or replaces the section in `slot`.
    ///
    /// A section without cells empties the slot instead; returns whether
    /// the section was stored.
    pub fn insert_section(&mut self, slot: usize, section: SectionRecord) -> bool {
        if section.cell_count() == 0 {
            self.populated.clear(slot);
            self.sections.remove(&slot);
            return false;
        }
        self.populated.set(slot);
        self.sections.insert(slot, section);
        true
    }

    /// Populated slots.
    #[must_use]
    pub fn populated(&self) -> &BitSet {
        &self.populated
    }

    /// The section in `slot`, if populated.
    #[must_use]
    pub fn section(&self, slot: usize) -> Option<&SectionRecord> {
        self.sections.get(&slot)
    }

    /// `(slot, section)` pairs, bottom to top.
    pub fn sections(&self) -> impl Iterator<Item = (usize, &SectionRecord)> {
        self.sections.iter().map(|(&slot, section)| (slot, section))
    }

    /// Number of populated sections.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// True if no section is populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Writes the populated bit set, then each section in slot order.
    ///
    /// # Errors
    ///
    /// Fails if the bit set needs more than 255 bytes or a section fails.
    pub fn encode(&self, writer: &mut RegionWriter) -> RegionResult<()> {
        writer.write_bitset(&self.populated, Prefix::U8)?;
        for section in self.sections.values() {
            section.encode(writer)?;
        }
        Ok(())
    }

    /// Reads one chunk; unpopulated slots stay absent.
    ///
    /// A stored section whose cells are all empty is read past and dropped,
    /// its populated bit cleared.
    ///
    /// # Errors
    ///
    /// Propagates the first section failure.
    pub fn decode(
        reader: &mut RegionReader<'_>,
        materials: &MaterialPalette,
        biomes: &BiomePalette,
    ) -> RegionResult<Self> {
        let stored = reader.read_bitset(Prefix::U8)?;
        let mut chunk = Self::new();
        for slot in stored.iter() {
            let section = SectionRecord::decode(reader, materials, biomes)?;
            if !chunk.insert_section(slot, section) {
                debug!(slot, "dropping stored section without cells");
            }
        }
        Ok(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalogs, Registry, VoxelType};
    use crate::config::CodecConfig;
    use crate::palette::SharedPalettes;
    use crate::snapshot::{CellView, VoxelColumn};

    #[test]
    fn test_sparse_sections_roundtrip() {
        let registry = Registry::new().with_voxel(VoxelType::bare("minecraft:stone"));
        let config = CodecConfig::default();
        let palettes = SharedPalettes::new();
        let sampler = Sampler::new(&palettes, Catalogs::from_registry(&registry), &config);

        let mut column = VoxelColumn::new(24);
        column.section_mut(1).set_cell(0, 0, 0, CellView::plain("minecraft:stone"));
        column.section_mut(5).set_cell(1, 2, 3, CellView::plain("minecraft:air"));
        column.section_mut(17).set_cell(4, 4, 4, CellView::plain("minecraft:stone"));

        let chunk = ChunkRecord::from_snapshot(&column, &sampler).unwrap().unwrap();
        assert_eq!(chunk.populated().iter().collect::<Vec<_>>(), vec![1, 17]);
        assert!(chunk.section(5).is_none(), "all-air section must not be stored");
        assert_eq!(chunk.populated().count(), chunk.section_count());

        let (materials, biomes) = palettes.into_inner();
        let mut writer = RegionWriter::new();
        chunk.encode(&mut writer).unwrap();
        let bytes = writer.into_inner();
        let mut reader = RegionReader::new(&bytes);
        let decoded = ChunkRecord::decode(&mut reader, &materials, &biomes).unwrap();
        assert!(reader.is_empty());
        assert_eq!(decoded, chunk);
    }

    #[test]
    fn test_empty_chunk_is_skipped() {
        let registry = Registry::new();
        let config = CodecConfig::default();
        let palettes = SharedPalettes::new();
        let sampler = Sampler::new(&palettes, Catalogs::from_registry(&registry), &config);

        let mut column = VoxelColumn::new(4);
        column.section_mut(0).fill_biome(1);
        assert!(ChunkRecord::from_snapshot(&column, &sampler).unwrap().is_none());
    }

    #[test]
    fn test_empty_chunk_roundtrip() {
        let chunk = ChunkRecord::new();
        let mut writer = RegionWriter::new();
        chunk.encode(&mut writer).unwrap();
        let bytes = writer.into_inner();
        assert_eq!(bytes, vec![0]);
        let decoded =
            ChunkRecord::decode(&mut RegionReader::new(&bytes), &MaterialPalette::new(), &BiomePalette::new())
                .unwrap();
        assert_eq!(decoded, chunk);
    }

    #[test]
    fn test_insert_empty_section_clears_slot() {
        let mut chunk = ChunkRecord::new();
        let mut section = SectionRecord::default();
        section.insert_cell(crate::record::CellRecord::at(1, 1, 1, 0, 0)).unwrap();

        assert!(chunk.insert_section(3, section));
        assert!(!chunk.insert_section(3, SectionRecord::default()));
        assert!(!chunk.insert_section(4, SectionRecord::default()));
        assert!(chunk.is_empty());
        assert!(chunk.populated().is_empty());
    }

    #[test]
    fn test_decode_drops_section_without_cells() {
        // Hand-written chunk: slot 3 flagged, no light, 4096 empty cells, no biomes.
        let mut writer = RegionWriter::new();
        writer.write_bitset(&[3].into_iter().collect(), Prefix::U8).unwrap();
        SectionRecord::default().encode(&mut writer).unwrap();
        let bytes = writer.into_inner();

        let mut reader = RegionReader::new(&bytes);
        let decoded =
            ChunkRecord::decode(&mut reader, &MaterialPalette::new(), &BiomePalette::new()).unwrap();
        assert!(reader.is_empty());
        assert!(decoded.section(3).is_none());
        assert!(decoded.populated().is_empty());
        assert!(decoded.is_empty());
    }
}
