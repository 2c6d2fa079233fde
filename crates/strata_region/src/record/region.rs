//! # Region Record
//!
//! Root of one region file.
//!
//! ## Layout
//!
//! ```text
//! u8  version
//! u16 xSize, u16 zSize
//! u32 len, populated chunk bits
//! i32 compressedLen, i32 rawLen, lz4 payload:
//!     material palette
//!     biome palette
//!     u32 len, chunk block:
//!         u32 len, chunk bytes     (one frame per populated chunk, ascending)
//! ```
//!
//! Each chunk sits in its own frame, so a chunk that fails to decode is
//! skipped without losing the position of the chunks after it.

use std::collections::BTreeMap;

use strata_core::{BitSet, Prefix, RegionError, RegionReader, RegionResult, RegionWriter};
use tracing::debug;

use super::chunk::ChunkRecord;
use crate::catalog::{Catalogs, PropertyMap};
use crate::config::CodecConfig;
use crate::palette::{BiomePalette, MaterialPalette};
use crate::position::{chunk_index, chunk_position, CELL_CUBE, SECTION_EDGE};
use crate::report::{DecodeReport, DecodeWarning};

/// Format version written in the first byte of every region.
pub const FORMAT_VERSION: u8 = 1;

/// Grid extents and populated chunk slots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionHeader {
    /// Width of the chunk grid.
    pub x_size: u16,
    /// Depth of the chunk grid.
    pub z_size: u16,
    /// Slots that hold a chunk, indexed `z * xSize + x`.
    pub populated: BitSet,
}

impl RegionHeader {
    /// Number of chunk slots in the grid.
    #[must_use]
    pub fn capacity(&self) -> usize {
        usize::from(self.x_size) * usize::from(self.z_size)
    }

    /// Writes version, extents and populated bits.
    ///
    /// # Errors
    ///
    /// Infallible for an in-memory writer.
    pub fn write(&self, writer: &mut RegionWriter) -> RegionResult<()> {
        writer.write_u8(FORMAT_VERSION)?;
        writer.write_u16(self.x_size)?;
        writer.write_u16(self.z_size)?;
        writer.write_bitset(&self.populated, Prefix::U32)
    }

    /// Reads and validates a header.
    ///
    /// # Errors
    ///
    /// - [`RegionError::UnsupportedVersion`] for an unknown version byte
    /// - [`RegionError::ChunkOutOfBounds`] for a populated bit past the grid
    pub fn read(reader: &mut RegionReader<'_>) -> RegionResult<Self> {
        let version = reader.read_u8()?;
        if version != FORMAT_VERSION {
            return Err(RegionError::UnsupportedVersion(version));
        }
        let header = Self {
            x_size: reader.read_u16()?,
            z_size: reader.read_u16()?,
            populated: reader.read_bitset(Prefix::U32)?,
        };
        if header.populated.len() > header.capacity() {
            return Err(RegionError::ChunkOutOfBounds {
                index: header.populated.len() - 1,
                capacity: header.capacity(),
            });
        }
        Ok(header)
    }

    /// Reads the header of a region file and steps over its payload
    /// without inflating it.
    ///
    /// # Errors
    ///
    /// Fails on a malformed header or a truncated payload.
    pub fn peek(bytes: &[u8]) -> RegionResult<RegionSummary> {
        let mut reader = RegionReader::new(bytes);
        let header = Self::read(&mut reader)?;
        let (compressed_len, raw_len) = reader.skip_compressed()?;
        Ok(RegionSummary { header, compressed_len, raw_len })
    }
}

/// Header plus payload sizes, as read by [`RegionHeader::peek`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionSummary {
    /// The region header.
    pub header: RegionHeader,
    /// Payload bytes on disk.
    pub compressed_len: usize,
    /// Payload bytes once inflated.
    pub raw_len: usize,
}

/// A stored cell resolved to region-local block coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedCell<'a> {
    /// Block x, `chunkX * 16 + x`.
    pub x: i32,
    /// Block y, `section * 16 + y`.
    pub y: i32,
    /// Block z, `chunkZ * 16 + z`.
    pub z: i32,
    /// Voxel type identifier.
    pub identifier: &'a str,
    /// Whether the voxel type is plugin-defined.
    pub custom: bool,
    /// Property state.
    pub state: &'a PropertyMap,
    /// Extra payload, if any.
    pub extra: Option<&'a str>,
}

/// A whole region: header, palettes and populated chunks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionRecord {
    header: RegionHeader,
    materials: MaterialPalette,
    biomes: BiomePalette,
    chunks: BTreeMap<usize, ChunkRecord>,
}

impl RegionRecord {
    /// Assembles a region; the populated bits are derived from `chunks`.
    /// Chunks without sections are left out.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::ChunkOutOfBounds`] for a chunk past the grid.
    pub fn new(
        x_size: u16,
        z_size: u16,
        materials: MaterialPalette,
        biomes: BiomePalette,
        mut chunks: BTreeMap<usize, ChunkRecord>,
    ) -> RegionResult<Self> {
        chunks.retain(|_, chunk| !chunk.is_empty());
        let mut header = RegionHeader { x_size, z_size, populated: BitSet::new() };
        for &index in chunks.keys() {
            if index >= header.capacity() {
                return Err(RegionError::ChunkOutOfBounds { index, capacity: header.capacity() });
            }
            header.populated.set(index);
        }
        Ok(Self { header, materials, biomes, chunks })
    }

    /// A region with no chunks.
    #[must_use]
    pub fn empty(x_size: u16, z_size: u16) -> Self {
        Self {
            header: RegionHeader { x_size, z_size, populated: BitSet::new() },
            ..Self::default()
        }
    }

    /// The header.
    #[must_use]
    pub fn header(&self) -> &RegionHeader {
        &self.header
    }

    /// Grid width in chunks.
    #[must_use]
    pub fn x_size(&self) -> u16 {
        self.header.x_size
    }

    /// Grid depth in chunks.
    #[must_use]
    pub fn z_size(&self) -> u16 {
        self.header.z_size
    }

    /// Populated chunk slots.
    #[must_use]
    pub fn populated(&self) -> &BitSet {
        &self.header.populated
    }

    /// The material palette.
    #[must_use]
    pub fn materials(&self) -> &MaterialPalette {
        &self.materials
    }

    /// The biome palette.
    #[must_use]
    pub fn biomes(&self) -> &BiomePalette {
        &self.biomes
    }

    /// `(slot, chunk)` pairs in slot order.
    pub fn chunks(&self) -> impl Iterator<Item = (usize, &ChunkRecord)> {
        self.chunks.iter().map(|(&index, chunk)| (index, chunk))
    }

    /// Number of stored chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// The chunk in slot `index`.
    #[must_use]
    pub fn chunk(&self, index: usize) -> Option<&ChunkRecord> {
        self.chunks.get(&index)
    }

    /// The chunk at grid position `(x, z)`.
    #[must_use]
    pub fn chunk_at(&self, x: usize, z: usize) -> Option<&ChunkRecord> {
        if x >= usize::from(self.header.x_size) || z >= usize::from(self.header.z_size) {
            return None;
        }
        self.chunk(chunk_index(x, z, usize::from(self.header.x_size)))
    }

    /// The stored cell at region-local block coordinates.
    #[must_use]
    pub fn cell_at(&self, x: i32, y: i32, z: i32) -> Option<PlacedCell<'_>> {
        let (chunk, slot, (cx, cy, cz)) = self.locate(x, y, z)?;
        let cell = chunk.section(slot)?.cell(cx, cy, cz)?;
        let (entry, state) = self.materials.resolve(cell.material, cell.state).ok()?;
        Some(PlacedCell {
            x,
            y,
            z,
            identifier: &entry.identifier,
            custom: entry.custom,
            state,
            extra: cell.extra.as_deref(),
        })
    }

    /// The biome identifier sampled at region-local block coordinates.
    #[must_use]
    pub fn biome_at(&self, x: i32, y: i32, z: i32) -> Option<&str> {
        let (chunk, slot, (cx, cy, cz)) = self.locate(x, y, z)?;
        let biome = chunk.section(slot)?.biome_at_cell(cx, cy, cz)?;
        self.biomes.get(biome).ok().map(|entry| entry.identifier.as_str())
    }

    /// Every stored cell of one chunk, with region-local block coordinates.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn placed_cells(&self, index: usize) -> impl Iterator<Item = PlacedCell<'_>> + '_ {
        let (chunk_x, chunk_z) = chunk_position(index, usize::from(self.header.x_size).max(1));
        let edge = SECTION_EDGE as i32;
        self.chunks.get(&index).into_iter().flat_map(move |chunk| {
            chunk.sections().flat_map(move |(slot, section)| {
                section.cells().filter_map(move |cell| {
                    let (cx, cy, cz) = cell.coords();
                    let (entry, state) = self.materials.resolve(cell.material, cell.state).ok()?;
                    Some(PlacedCell {
                        x: chunk_x as i32 * edge + cx as i32,
                        y: slot as i32 * edge + cy as i32,
                        z: chunk_z as i32 * edge + cz as i32,
                        identifier: &entry.identifier,
                        custom: entry.custom,
                        state,
                        extra: cell.extra.as_deref(),
                    })
                })
            })
        })
    }

    #[allow(clippy::cast_sign_loss)]
    fn locate(&self, x: i32, y: i32, z: i32) -> Option<(&ChunkRecord, usize, (usize, usize, usize))> {
        if x < 0 || y < 0 || z < 0 {
            return None;
        }
        let (x, y, z) = (x as usize, y as usize, z as usize);
        let edge = CELL_CUBE.edge();
        let chunk = self.chunk_at(x / edge, z / edge)?;
        Some((chunk, y / edge, (x % edge, y % edge, z % edge)))
    }

    /// Serializes the region.
    ///
    /// # Errors
    ///
    /// Fails if a string, bit set or frame exceeds its length field.
    pub fn encode(&self) -> RegionResult<Vec<u8>> {
        let mut payload = RegionWriter::new();
        self.materials.encode(&mut payload)?;
        self.biomes.encode(&mut payload)?;

        let block = payload.begin_frame()?;
        for chunk in self.chunks.values() {
            let frame = payload.begin_frame()?;
            chunk.encode(&mut payload)?;
            payload.end_frame(frame)?;
        }
        payload.end_frame(block)?;

        let mut writer = RegionWriter::with_capacity(payload.len() / 4 + 64);
        self.header.write(&mut writer)?;
        writer.write_compressed(payload.as_bytes())?;

        debug!(
            x_size = self.header.x_size,
            z_size = self.header.z_size,
            chunks = self.chunks.len(),
            materials = self.materials.len(),
            biomes = self.biomes.len(),
            raw = payload.len(),
            written = writer.len(),
            "encoded region"
        );
        Ok(writer.into_inner())
    }

    /// Reads a region, resolving palettes against the catalogs.
    ///
    /// A chunk that fails to decode is left out, its populated bit cleared,
    /// and a [`DecodeWarning::ChunkSkipped`] recorded.
    ///
    /// # Errors
    ///
    /// Fails if the header, the compressed block or a palette is malformed.
    pub fn decode(
        bytes: &[u8],
        catalogs: Catalogs<'_>,
        config: &CodecConfig,
    ) -> RegionResult<(Self, DecodeReport)> {
        let mut reader = RegionReader::new(bytes);
        let mut header = RegionHeader::read(&mut reader)?;
        let payload = reader.read_compressed()?;
        reader.finish()?;

        let mut report = DecodeReport::new();
        let mut payload_reader = RegionReader::new(&payload);
        let materials = MaterialPalette::decode(&mut payload_reader, catalogs, config, &mut report)?;
        let biomes = BiomePalette::decode(&mut payload_reader, catalogs, config, &mut report)?;
        let mut block = payload_reader.read_frame()?;
        payload_reader.finish()?;

        let slots: Vec<usize> = header.populated.iter().collect();
        let mut chunks = BTreeMap::new();
        let mut stream_intact = true;

        for (position, &slot) in slots.iter().enumerate() {
            let mut frame = match block.read_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    // No frame boundary left to resynchronize on.
                    for &lost in &slots[position..] {
                        header.populated.clear(lost);
                        report.push(DecodeWarning::ChunkSkipped { chunk_index: lost, reason: e.to_string() });
                    }
                    stream_intact = false;
                    break;
                }
            };
            let decoded = ChunkRecord::decode(&mut frame, &materials, &biomes)
                .and_then(|chunk| frame.finish().map(|()| chunk));
            match decoded {
                Ok(chunk) if chunk.is_empty() => {
                    debug!(chunk_index = slot, "dropping stored chunk without cells");
                    header.populated.clear(slot);
                }
                Ok(chunk) => {
                    chunks.insert(slot, chunk);
                }
                Err(e) => {
                    header.populated.clear(slot);
                    report.push(DecodeWarning::ChunkSkipped { chunk_index: slot, reason: e.to_string() });
                }
            }
        }
        if stream_intact {
            block.finish()?;
        }

        debug!(
            x_size = header.x_size,
            z_size = header.z_size,
            chunks = chunks.len(),
            warnings = report.warnings().len(),
            read = bytes.len(),
            raw = payload.len(),
            "decoded region"
        );
        Ok((Self { header, materials, biomes, chunks }, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Registry, VoxelType};
    use crate::record::{CellRecord, SectionRecord};

    fn registry() -> Registry {
        Registry::new()
            .with_voxel(VoxelType::bare("minecraft:stone"))
            .with_biome("minecraft:plains", 1)
    }

    fn stone_chunk(cell: (usize, usize, usize)) -> ChunkRecord {
        let mut section = SectionRecord::default();
        section.insert_cell(CellRecord::at(cell.0, cell.1, cell.2, 0, 0)).unwrap();
        section.set_biome(0, 0, 0, 0);
        let mut chunk = ChunkRecord::new();
        chunk.insert_section(0, section);
        chunk
    }

    fn stone_palettes() -> (MaterialPalette, BiomePalette) {
        let mut materials = MaterialPalette::new();
        materials
            .find_or_add_cell(&VoxelType::bare("minecraft:stone"), &PropertyMap::new())
            .unwrap();
        let mut biomes = BiomePalette::new();
        biomes.find_or_add("minecraft:plains").unwrap();
        (materials, biomes)
    }

    fn decode(bytes: &[u8]) -> RegionResult<(RegionRecord, DecodeReport)> {
        let registry = registry();
        RegionRecord::decode(bytes, Catalogs::from_registry(&registry), &CodecConfig::default())
    }

    #[test]
    fn test_empty_region_roundtrip() {
        let region = RegionRecord::empty(3, 2);
        let bytes = region.encode().unwrap();
        assert_eq!(bytes[0], FORMAT_VERSION);

        let (decoded, report) = decode(&bytes).unwrap();
        assert!(report.is_clean());
        assert_eq!(decoded, region);
        assert_eq!(decoded.chunk_count(), 0);
    }

    #[test]
    fn test_populated_region_roundtrip_and_lookup() {
        let (materials, biomes) = stone_palettes();
        let chunks = [(0, stone_chunk((1, 2, 3))), (3, stone_chunk((15, 15, 15)))]
            .into_iter()
            .collect();
        let region = RegionRecord::new(2, 2, materials, biomes, chunks).unwrap();
        assert_eq!(region.populated().iter().collect::<Vec<_>>(), vec![0, 3]);

        let (decoded, report) = decode(&region.encode().unwrap()).unwrap();
        assert!(report.is_clean());
        assert_eq!(decoded, region);

        assert!(decoded.chunk_at(1, 1).is_some());
        assert!(decoded.chunk_at(1, 0).is_none());
        assert!(decoded.chunk_at(2, 0).is_none());

        let cell = decoded.cell_at(31, 15, 31).unwrap();
        assert_eq!(cell.identifier, "minecraft:stone");
        assert!(decoded.cell_at(30, 15, 31).is_none());
        assert!(decoded.cell_at(-1, 0, 0).is_none());
        assert_eq!(decoded.biome_at(1, 2, 3), Some("minecraft:plains"));

        let placed: Vec<_> = decoded.placed_cells(3).collect();
        assert_eq!(placed.len(), 1);
        assert_eq!((placed[0].x, placed[0].y, placed[0].z), (31, 15, 31));
        assert_eq!(decoded.placed_cells(1).count(), 0);
    }

    #[test]
    fn test_chunk_outside_grid_rejected() {
        let (materials, biomes) = stone_palettes();
        let chunks = [(4, stone_chunk((0, 0, 0)))].into_iter().collect();
        let err = RegionRecord::new(2, 2, materials, biomes, chunks).unwrap_err();
        assert!(matches!(err, RegionError::ChunkOutOfBounds { index: 4, capacity: 4 }));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = RegionRecord::empty(1, 1).encode().unwrap();
        bytes[0] = 9;
        assert!(matches!(decode(&bytes), Err(RegionError::UnsupportedVersion(9))));
    }

    #[test]
    fn test_peek_reads_header_only() {
        let (materials, biomes) = stone_palettes();
        let chunks = [(2, stone_chunk((0, 0, 0)))].into_iter().collect();
        let region = RegionRecord::new(4, 1, materials, biomes, chunks).unwrap();
        let bytes = region.encode().unwrap();

        let summary = RegionHeader::peek(&bytes).unwrap();
        assert_eq!(summary.header, *region.header());
        assert!(summary.raw_len > summary.compressed_len);
    }

    #[test]
    fn test_truncated_chunk_is_isolated() {
        let (materials, biomes) = stone_palettes();
        let good = stone_chunk((4, 4, 4));
        let mut chunk_bytes = RegionWriter::new();
        good.encode(&mut chunk_bytes).unwrap();
        let chunk_bytes = chunk_bytes.into_inner();

        // Hand-assemble a payload whose middle chunk frame is cut in half.
        let mut payload = RegionWriter::new();
        materials.encode(&mut payload).unwrap();
        biomes.encode(&mut payload).unwrap();
        let block = payload.begin_frame().unwrap();
        for bytes in [&chunk_bytes[..], &chunk_bytes[..chunk_bytes.len() / 2], &chunk_bytes[..]] {
            payload.write_byte_array(bytes, Prefix::U32).unwrap();
        }
        payload.end_frame(block).unwrap();

        let header = RegionHeader {
            x_size: 3,
            z_size: 1,
            populated: [0, 1, 2].into_iter().collect(),
        };
        let mut file = RegionWriter::new();
        header.write(&mut file).unwrap();
        file.write_compressed(payload.as_bytes()).unwrap();

        let (region, report) = decode(&file.into_inner()).unwrap();
        assert_eq!(region.populated().iter().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(region.chunk(0), Some(&good));
        assert_eq!(region.chunk(2), Some(&good));
        assert!(region.chunk(1).is_none());
        assert_eq!(report.skipped_chunks().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_cut_chunk_stream_drops_the_tail() {
        let (materials, biomes) = stone_palettes();
        let good = stone_chunk((0, 0, 0));
        let mut payload = RegionWriter::new();
        materials.encode(&mut payload).unwrap();
        biomes.encode(&mut payload).unwrap();
        let block = payload.begin_frame().unwrap();
        let frame = payload.begin_frame().unwrap();
        good.encode(&mut payload).unwrap();
        payload.end_frame(frame).unwrap();
        payload.end_frame(block).unwrap();

        // Bits claim three chunks but the stream only holds one.
        let header = RegionHeader { x_size: 3, z_size: 1, populated: [0, 1, 2].into_iter().collect() };
        let mut file = RegionWriter::new();
        header.write(&mut file).unwrap();
        file.write_compressed(payload.as_bytes()).unwrap();

        let (region, report) = decode(&file.into_inner()).unwrap();
        assert_eq!(region.chunk_count(), 1);
        assert_eq!(region.populated().count(), 1);
        assert_eq!(report.skipped_chunks().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_stored_section_without_cells_is_dropped() {
        let (materials, biomes) = stone_palettes();
        let good = stone_chunk((2, 2, 2));
        let mut payload = RegionWriter::new();
        materials.encode(&mut payload).unwrap();
        biomes.encode(&mut payload).unwrap();
        let block = payload.begin_frame().unwrap();
        let frame = payload.begin_frame().unwrap();
        good.encode(&mut payload).unwrap();
        payload.end_frame(frame).unwrap();
        // Chunk 1 flags section 3, whose 4096 cells are all empty.
        let frame = payload.begin_frame().unwrap();
        payload.write_bitset(&[3].into_iter().collect(), Prefix::U8).unwrap();
        SectionRecord::default().encode(&mut payload).unwrap();
        payload.end_frame(frame).unwrap();
        payload.end_frame(block).unwrap();

        let header = RegionHeader { x_size: 2, z_size: 1, populated: [0, 1].into_iter().collect() };
        let mut file = RegionWriter::new();
        header.write(&mut file).unwrap();
        file.write_compressed(payload.as_bytes()).unwrap();

        let (region, report) = decode(&file.into_inner()).unwrap();
        assert!(report.is_clean());
        assert_eq!(region.populated().iter().collect::<Vec<_>>(), vec![0]);
        assert!(region.chunk(1).is_none());
        assert_eq!(region.chunk_count(), region.populated().count());
    }

    #[test]
    fn test_new_leaves_out_empty_chunks() {
        let (materials, biomes) = stone_palettes();
        let chunks = [(0, stone_chunk((0, 0, 0))), (1, ChunkRecord::new())].into_iter().collect();
        let region = RegionRecord::new(2, 1, materials, biomes, chunks).unwrap();
        assert_eq!(region.populated().iter().collect::<Vec<_>>(), vec![0]);
        assert_eq!(region.chunk_count(), 1);
    }
}
