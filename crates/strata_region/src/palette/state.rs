//! Per-material dictionary of property states.

use std::collections::HashMap;

use strata_core::{Prefix, RegionError, RegionReader, RegionResult, RegionWriter};

use crate::catalog::PropertyMap;

/// Compact index to full property state, local to one material.
///
/// Every state in one palette carries the same property names, so the
/// wire form stores only the count once, on the owning material.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatePalette {
    states: Vec<PropertyMap>,
    lookup: HashMap<PropertyMap, u16>,
}

impl StatePalette {
    /// Largest number of states one palette can hold; the count is written as a `u16`.
    pub const CAPACITY: usize = u16::MAX as usize;

    /// Creates an empty palette.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `state`, appending it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::PaletteFull`] past [`Self::CAPACITY`].
    pub fn find_or_add(&mut self, state: &PropertyMap) -> RegionResult<u16> {
        if let Some(&index) = self.lookup.get(state) {
            return Ok(index);
        }
        self.push(state.clone())
    }

    /// Appends `state` even if an equal one exists.
    ///
    /// Decoding replays stored palettes with this so indices stay where the
    /// file put them; lookups keep resolving to the first equal entry.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::PaletteFull`] past [`Self::CAPACITY`].
    #[allow(clippy::cast_possible_truncation)]
    pub fn push(&mut self, state: PropertyMap) -> RegionResult<u16> {
        if self.states.len() >= Self::CAPACITY {
            return Err(RegionError::PaletteFull { palette: "state", capacity: Self::CAPACITY });
        }
        // Bounded by CAPACITY.
        let index = self.states.len() as u16;
        self.lookup.entry(state.clone()).or_insert(index);
        self.states.push(state);
        Ok(index)
    }

    /// The state at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::IndexOutOfRange`] past the end.
    pub fn get(&self, index: u16) -> RegionResult<&PropertyMap> {
        self.states.get(usize::from(index)).ok_or(RegionError::IndexOutOfRange {
            palette: "state",
            index: usize::from(index),
            len: self.states.len(),
        })
    }

    /// Number of states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// True if no state was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// States in index order.
    pub fn iter(&self) -> impl Iterator<Item = &PropertyMap> {
        self.states.iter()
    }

    /// Writes `u16 size`, then every state's `(key, value)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if a key or value exceeds the `u16` string prefix.
    pub fn encode(&self, writer: &mut RegionWriter) -> RegionResult<()> {
        writer.write_len(self.states.len(), Prefix::U16)?;
        for state in &self.states {
            for (key, value) in state {
                writer.write_string(key, Prefix::U16)?;
                writer.write_string(value, Prefix::U16)?;
            }
        }
        Ok(())
    }

    /// Reads the raw stored states, `property_count` pairs each.
    ///
    /// Reconciling them with the live voxel type is the material palette's job.
    ///
    /// # Errors
    ///
    /// Returns an error on truncated input or an invalid string.
    pub fn read_states(
        reader: &mut RegionReader<'_>,
        property_count: u16,
    ) -> RegionResult<Vec<PropertyMap>> {
        let size = reader.read_len(Prefix::U16)?;
        let mut states = Vec::with_capacity(size);
        for _ in 0..size {
            let mut state = PropertyMap::new();
            for _ in 0..property_count {
                let key = reader.read_string(Prefix::U16)?;
                let value = reader.read_string(Prefix::U16)?;
                state.insert(key, value);
            }
            states.push(state);
        }
        Ok(states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(pairs: &[(&str, &str)]) -> PropertyMap {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn test_find_or_add_is_stable() {
        let mut palette = StatePalette::new();
        let x = state(&[("axis", "x")]);
        let y = state(&[("axis", "y")]);

        assert_eq!(palette.find_or_add(&x).unwrap(), 0);
        assert_eq!(palette.find_or_add(&y).unwrap(), 1);
        assert_eq!(palette.find_or_add(&x).unwrap(), 0);
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.get(1).unwrap(), &y);
    }

    #[test]
    fn test_get_out_of_range() {
        let palette = StatePalette::new();
        assert!(matches!(
            palette.get(0),
            Err(RegionError::IndexOutOfRange { palette: "state", index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_push_keeps_duplicates() {
        let mut palette = StatePalette::new();
        let s = state(&[]);
        assert_eq!(palette.push(s.clone()).unwrap(), 0);
        assert_eq!(palette.push(s.clone()).unwrap(), 1);
        assert_eq!(palette.find_or_add(&s).unwrap(), 0);
        assert_eq!(palette.len(), 2);
    }

    #[test]
    fn test_encode_read_states() {
        let mut palette = StatePalette::new();
        palette.find_or_add(&state(&[("axis", "x"), ("lit", "true")])).unwrap();
        palette.find_or_add(&state(&[("axis", "z"), ("lit", "false")])).unwrap();

        let mut writer = RegionWriter::new();
        palette.encode(&mut writer).unwrap();
        let bytes = writer.into_inner();

        let mut reader = RegionReader::new(&bytes);
        let states = StatePalette::read_states(&mut reader, 2).unwrap();
        assert!(reader.is_empty());
        assert_eq!(states, palette.iter().cloned().collect::<Vec<_>>());
    }

    #[test]
    fn test_full_palette_still_encodes() {
        let mut palette = StatePalette::new();
        for n in 0..StatePalette::CAPACITY {
            palette.find_or_add(&state(&[("n", &n.to_string())])).unwrap();
        }
        let err = palette.find_or_add(&state(&[("n", "overflow")])).unwrap_err();
        assert!(matches!(err, RegionError::PaletteFull { palette: "state", capacity: 65_535 }));
        // An existing state is still found.
        assert_eq!(palette.find_or_add(&state(&[("n", "7")])).unwrap(), 7);

        let mut writer = RegionWriter::new();
        palette.encode(&mut writer).unwrap();
        let bytes = writer.into_inner();
        let states = StatePalette::read_states(&mut RegionReader::new(&bytes), 1).unwrap();
        assert_eq!(states.len(), StatePalette::CAPACITY);
    }
}
