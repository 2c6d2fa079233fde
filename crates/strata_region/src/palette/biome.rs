//! Region-scoped dictionary of biome identifiers.

use std::collections::HashMap;

use strata_core::{Prefix, RegionError, RegionReader, RegionResult, RegionWriter};

use crate::catalog::Catalogs;
use crate::config::CodecConfig;
use crate::report::{DecodeReport, DecodeWarning};

/// Biome index written for a sample the snapshot did not report.
pub const NO_BIOME: u16 = u16::MAX;

/// One biome referenced by the region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BiomeEntry {
    /// Palette index, fixed at insertion.
    pub index: u16,
    /// Biome identifier.
    pub identifier: String,
}

/// Compact index to biome identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BiomePalette {
    entries: Vec<BiomeEntry>,
    lookup: HashMap<String, u16>,
}

impl BiomePalette {
    /// Largest number of biomes; [`NO_BIOME`] is reserved.
    pub const CAPACITY: usize = NO_BIOME as usize;

    /// Creates an empty palette.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `identifier`, appending it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::PaletteFull`] past [`Self::CAPACITY`].
    pub fn find_or_add(&mut self, identifier: &str) -> RegionResult<u16> {
        if let Some(&index) = self.lookup.get(identifier) {
            return Ok(index);
        }
        self.push(identifier.to_string())
    }

    /// The entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::IndexOutOfRange`] past the end.
    pub fn get(&self, index: u16) -> RegionResult<&BiomeEntry> {
        self.entries.get(usize::from(index)).ok_or(RegionError::IndexOutOfRange {
            palette: "biome",
            index: usize::from(index),
            len: self.entries.len(),
        })
    }

    /// Number of biomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no biome was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = &BiomeEntry> {
        self.entries.iter()
    }

    /// Writes `u16 size` and every identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if an identifier is too long.
    pub fn encode(&self, writer: &mut RegionWriter) -> RegionResult<()> {
        writer.write_len(self.entries.len(), Prefix::U16)?;
        for entry in &self.entries {
            writer.write_string(&entry.identifier, Prefix::U16)?;
        }
        Ok(())
    }

    /// Reads a stored palette; unknown biomes become the fallback biome.
    ///
    /// # Errors
    ///
    /// Returns an error on truncated input, an invalid string, or a size
    /// that collides with [`NO_BIOME`].
    pub fn decode(
        reader: &mut RegionReader<'_>,
        catalogs: Catalogs<'_>,
        config: &CodecConfig,
        report: &mut DecodeReport,
    ) -> RegionResult<Self> {
        let size = reader.read_len(Prefix::U16)?;
        let mut palette = Self::new();
        for _ in 0..size {
            let identifier = reader.read_string(Prefix::U16)?;
            let resolved = if catalogs.biomes.biome(&identifier).is_some() {
                identifier
            } else {
                let index = u16::try_from(palette.len()).unwrap_or(NO_BIOME);
                report.push(DecodeWarning::UnknownBiome { index, identifier });
                config.fallback_biome.clone()
            };
            palette.push(resolved)?;
        }
        Ok(palette)
    }

    fn push(&mut self, identifier: String) -> RegionResult<u16> {
        let index = u16::try_from(self.entries.len())
            .ok()
            .filter(|&i| i != NO_BIOME)
            .ok_or(RegionError::PaletteFull { palette: "biome", capacity: Self::CAPACITY })?;
        self.lookup.entry(identifier.clone()).or_insert(index);
        self.entries.push(BiomeEntry { index, identifier });
        Ok(index)
    }
}
