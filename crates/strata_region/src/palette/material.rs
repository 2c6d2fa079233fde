//! Region-scoped dictionary of voxel types, each owning a state palette.

use std::collections::{BTreeSet, HashMap};

use strata_core::{Prefix, RegionError, RegionReader, RegionResult, RegionWriter};

use super::state::StatePalette;
use crate::catalog::{Catalogs, PropertyMap, VoxelType};
use crate::config::CodecConfig;
use crate::report::{DecodeReport, DecodeWarning};

/// One voxel type referenced by the region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterialEntry {
    /// Palette index, fixed at insertion.
    pub index: u32,
    /// Plugin-defined voxel type.
    pub custom: bool,
    /// Voxel type identifier.
    pub identifier: String,
    /// Number of properties in every state of this material.
    pub property_count: u16,
    /// States this material appears in.
    pub states: StatePalette,
}

impl MaterialEntry {
    fn new(index: u32, voxel: &VoxelType) -> RegionResult<Self> {
        let property_count = u16::try_from(voxel.default_state().len()).map_err(|_| {
            RegionError::PaletteFull { palette: "property", capacity: usize::from(u16::MAX) }
        })?;
        Ok(Self {
            index,
            custom: voxel.custom,
            identifier: voxel.identifier.clone(),
            property_count,
            states: StatePalette::new(),
        })
    }
}

/// Compact index to voxel type, shared by every chunk in the region.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaterialPalette {
    entries: Vec<MaterialEntry>,
    lookup: HashMap<String, u32>,
}

impl MaterialPalette {
    /// Largest number of materials a cell record can reference.
    pub const CAPACITY: usize = i32::MAX as usize;

    /// Creates an empty palette.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `voxel`, appending an entry if absent.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::PaletteFull`] past [`Self::CAPACITY`].
    pub fn find_or_add(&mut self, voxel: &VoxelType) -> RegionResult<u32> {
        if let Some(&index) = self.lookup.get(&voxel.identifier) {
            return Ok(index);
        }
        Ok(self.push(MaterialEntry::new(self.next_index()?, voxel)?))
    }

    /// Resolves a cell to `(materialIndex, stateIndex)`, adding whatever is
    /// missing. The state is normalized against `voxel` first.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::PaletteFull`] if either palette overflows.
    pub fn find_or_add_cell(
        &mut self,
        voxel: &VoxelType,
        state: &PropertyMap,
    ) -> RegionResult<(u32, u16)> {
        let material = self.find_or_add(voxel)?;
        let normalized = voxel.normalize(state);
        let entry = &mut self.entries[material as usize];
        Ok((material, entry.states.find_or_add(&normalized.state)?))
    }

    /// The entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::IndexOutOfRange`] past the end.
    pub fn get(&self, index: u32) -> RegionResult<&MaterialEntry> {
        self.entries.get(index as usize).ok_or(RegionError::IndexOutOfRange {
            palette: "material",
            index: index as usize,
            len: self.entries.len(),
        })
    }

    /// The entry and state a cell refers to.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::IndexOutOfRange`] if either index dangles.
    pub fn resolve(&self, material: u32, state: u16) -> RegionResult<(&MaterialEntry, &PropertyMap)> {
        let entry = self.get(material)?;
        Ok((entry, entry.states.get(state)?))
    }

    /// Number of materials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no material was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = &MaterialEntry> {
        self.entries.iter()
    }

    /// Writes the palette in index order.
    ///
    /// # Errors
    ///
    /// Returns an error if an identifier or property string is too long.
    pub fn encode(&self, writer: &mut RegionWriter) -> RegionResult<()> {
        writer.write_len(self.entries.len(), Prefix::U32)?;
        for entry in &self.entries {
            writer.write_bool(entry.custom)?;
            writer.write_string(&entry.identifier, Prefix::U16)?;
            writer.write_u16(entry.property_count)?;
            entry.states.encode(writer)?;
        }
        Ok(())
    }

    /// Replays a stored palette against the live catalog.
    ///
    /// Unknown identifiers become the fallback material at the same index,
    /// each stored state mapped to the fallback's default state. Known
    /// identifiers whose property list changed are reconciled property by
    /// property and reported as schema drift.
    ///
    /// # Errors
    ///
    /// Returns an error on truncated input or an invalid string.
    pub fn decode(
        reader: &mut RegionReader<'_>,
        catalogs: Catalogs<'_>,
        config: &CodecConfig,
        report: &mut DecodeReport,
    ) -> RegionResult<Self> {
        let size = reader.read_len(Prefix::U32)?;
        let mut palette = Self::new();
        let mut fallback: Option<VoxelType> = None;

        for _ in 0..size {
            let _stored_custom = reader.read_bool()?;
            let identifier = reader.read_string(Prefix::U16)?;
            let property_count = reader.read_u16()?;
            let stored = StatePalette::read_states(reader, property_count)?;
            let index = palette.next_index()?;

            let entry = match catalogs.voxels.voxel_type(&identifier) {
                Some(live) => reconcile(index, live, property_count, stored, report)?,
                None => {
                    report.push(DecodeWarning::UnknownMaterial { index, identifier });
                    let sentinel = fallback.get_or_insert_with(|| config.fallback_voxel(catalogs));
                    let mut entry = MaterialEntry::new(index, sentinel)?;
                    let default_state = sentinel.default_state();
                    for _ in 0..stored.len() {
                        entry.states.push(default_state.clone())?;
                    }
                    entry
                }
            };
            palette.push(entry);
        }
        Ok(palette)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn next_index(&self) -> RegionResult<u32> {
        if self.entries.len() >= Self::CAPACITY {
            return Err(RegionError::PaletteFull { palette: "material", capacity: Self::CAPACITY });
        }
        // Bounded by CAPACITY.
        Ok(self.entries.len() as u32)
    }

    fn push(&mut self, entry: MaterialEntry) -> u32 {
        let index = entry.index;
        self.lookup.entry(entry.identifier.clone()).or_insert(index);
        self.entries.push(entry);
        index
    }
}

fn reconcile(
    index: u32,
    live: &VoxelType,
    stored_count: u16,
    stored: Vec<PropertyMap>,
    report: &mut DecodeReport,
) -> RegionResult<MaterialEntry> {
    let mut entry = MaterialEntry::new(index, live)?;
    let mut dropped = BTreeSet::new();
    let mut defaulted = BTreeSet::new();

    for state in stored {
        let normalized = live.normalize(&state);
        dropped.extend(normalized.dropped);
        defaulted.extend(normalized.defaulted);
        entry.states.push(normalized.state)?;
    }

    if stored_count != entry.property_count || !dropped.is_empty() || !defaulted.is_empty() {
        report.push(DecodeWarning::SchemaDrift {
            material: live.identifier.clone(),
            stored: stored_count,
            live: usize::from(entry.property_count),
            dropped: dropped.into_iter().collect(),
            defaulted: defaulted.into_iter().collect(),
        });
    }
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Registry, VoxelCatalog};

    fn registry() -> Registry {
        Registry::new()
            .with_voxel(VoxelType::bare("minecraft:stone"))
            .with_voxel(VoxelType::bare("minecraft:oak_log").with_property("axis", "y"))
            .with_voxel(VoxelType::bare("acme:crystal").custom())
    }

    fn voxel<'r>(registry: &'r Registry, identifier: &str) -> &'r VoxelType {
        registry.voxel_type(identifier).unwrap()
    }

    fn axis(value: &str) -> PropertyMap {
        [("axis".to_string(), value.to_string())].into_iter().collect()
    }

    fn roundtrip(palette: &MaterialPalette, registry: &Registry) -> (MaterialPalette, DecodeReport) {
        let mut writer = RegionWriter::new();
        palette.encode(&mut writer).unwrap();
        let bytes = writer.into_inner();
        let mut reader = RegionReader::new(&bytes);
        let mut report = DecodeReport::new();
        let decoded = MaterialPalette::decode(
            &mut reader,
            Catalogs::from_registry(registry),
            &CodecConfig::default(),
            &mut report,
        )
        .unwrap();
        assert!(reader.is_empty());
        (decoded, report)
    }

    #[test]
    fn test_find_or_add_stable_index() {
        let registry = registry();
        let stone = voxel(&registry, "minecraft:stone");
        let log = voxel(&registry, "minecraft:oak_log");

        let mut palette = MaterialPalette::new();
        assert_eq!(palette.find_or_add(stone).unwrap(), 0);
        assert_eq!(palette.find_or_add(log).unwrap(), 1);
        assert_eq!(palette.find_or_add(stone).unwrap(), 0);
        assert_eq!(palette.len(), 2);
    }

    #[test]
    fn test_find_or_add_cell_normalizes_state() {
        let registry = registry();
        let log = voxel(&registry, "minecraft:oak_log");
        let mut palette = MaterialPalette::new();

        let (m, s) = palette.find_or_add_cell(log, &PropertyMap::new()).unwrap();
        assert_eq!((m, s), (0, 0));
        let (_, state) = palette.resolve(m, s).unwrap();
        assert_eq!(state, &axis("y"));

        assert_eq!(palette.find_or_add_cell(log, &axis("y")).unwrap(), (0, 0));
        assert_eq!(palette.find_or_add_cell(log, &axis("x")).unwrap(), (0, 1));
    }

    #[test]
    fn test_roundtrip_clean() {
        let registry = registry();
        let mut palette = MaterialPalette::new();
        palette
            .find_or_add_cell(voxel(&registry, "minecraft:oak_log"), &axis("z"))
            .unwrap();
        palette
            .find_or_add(voxel(&registry, "acme:crystal"))
            .unwrap();

        let (decoded, report) = roundtrip(&palette, &registry);
        assert!(report.is_clean());
        assert_eq!(decoded, palette);
        assert!(decoded.get(1).unwrap().custom);
    }

    #[test]
    fn test_unknown_material_uses_fallback_at_same_index() {
        let writer_registry = registry();
        let mut palette = MaterialPalette::new();
        palette
            .find_or_add_cell(voxel(&writer_registry, "minecraft:oak_log"), &axis("x"))
            .unwrap();
        palette
            .find_or_add_cell(voxel(&writer_registry, "minecraft:oak_log"), &axis("z"))
            .unwrap();
        palette
            .find_or_add(voxel(&writer_registry, "minecraft:stone"))
            .unwrap();

        let reader_registry = Registry::new().with_voxel(VoxelType::bare("minecraft:stone"));
        let (decoded, report) = roundtrip(&palette, &reader_registry);

        let entry = decoded.get(0).unwrap();
        assert_eq!(entry.identifier, "minecraft:barrier");
        assert_eq!(entry.states.len(), 2, "state indices must stay addressable");
        assert_eq!(decoded.get(1).unwrap().identifier, "minecraft:stone");
        assert!(matches!(
            report.warnings(),
            [DecodeWarning::UnknownMaterial { index: 0, identifier }] if identifier == "minecraft:oak_log"
        ));
    }

    #[test]
    fn test_schema_drift_defaults_and_drops() {
        let old = Registry::new().with_voxel(
            VoxelType::bare("minecraft:furnace")
                .with_property("facing", "north")
                .with_property("lit", "false"),
        );
        let mut palette = MaterialPalette::new();
        let mut state = PropertyMap::new();
        state.insert("facing".into(), "east".into());
        state.insert("lit".into(), "true".into());
        palette
            .find_or_add_cell(voxel(&old, "minecraft:furnace"), &state)
            .unwrap();

        let new = Registry::new().with_voxel(
            VoxelType::bare("minecraft:furnace")
                .with_property("facing", "north")
                .with_property("powered", "false")
                .with_property("waterlogged", "false"),
        );
        let (decoded, report) = roundtrip(&palette, &new);

        let (_, decoded_state) = decoded.resolve(0, 0).unwrap();
        assert_eq!(decoded_state["facing"], "east");
        assert_eq!(decoded_state["powered"], "false");
        assert_eq!(decoded_state["waterlogged"], "false");
        assert!(!decoded_state.contains_key("lit"));

        match report.warnings() {
            [DecodeWarning::SchemaDrift { stored, live, dropped, defaulted, .. }] => {
                assert_eq!((*stored, *live), (2, 3));
                assert_eq!(dropped, &vec!["lit".to_string()]);
                assert_eq!(defaulted, &vec!["powered".to_string(), "waterlogged".to_string()]);
            }
            other => panic!("expected one drift warning, got {other:?}"),
        }
    }
}
