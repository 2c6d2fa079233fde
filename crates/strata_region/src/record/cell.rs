//! One occupied cell.

use strata_core::{Prefix, RegionError, RegionReader, RegionResult, RegionWriter};

use crate::position::CELL_CUBE;

/// Material index written for a cube position with no cell.
pub const EMPTY_MATERIAL: i32 = -1;

/// A non-empty cell of a section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellRecord {
    /// Packed `(x, y, z)` inside the section cube.
    pub local_index: u16,
    /// Index into the region's material palette.
    pub material: u32,
    /// Index into that material's state palette.
    pub state: u16,
    /// Opaque payload stored verbatim.
    pub extra: Option<String>,
}

impl CellRecord {
    /// Creates a cell record at local cell coordinates.
    ///
    /// # Panics
    ///
    /// Debug builds panic if a coordinate is outside the section cube.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn at(x: usize, y: usize, z: usize, material: u32, state: u16) -> Self {
        debug_assert!(x < CELL_CUBE.edge() && y < CELL_CUBE.edge() && z < CELL_CUBE.edge());
        Self { local_index: CELL_CUBE.index(x, y, z) as u16, material, state, extra: None }
    }

    /// Local `(x, y, z)` of the cell.
    #[must_use]
    pub const fn coords(&self) -> (usize, usize, usize) {
        CELL_CUBE.coords(self.local_index as usize)
    }

    /// Writes the record.
    ///
    /// # Errors
    ///
    /// Fails if the material index exceeds `i32` or the payload its prefix.
    pub fn encode(&self, writer: &mut RegionWriter) -> RegionResult<()> {
        let material = i32::try_from(self.material).map_err(|_| RegionError::IndexOutOfRange {
            palette: "material",
            index: self.material as usize,
            len: i32::MAX as usize,
        })?;
        writer.write_u16(self.local_index)?;
        writer.write_i32(material)?;
        writer.write_u16(self.state)?;
        writer.write_bool(self.extra.is_some())?;
        if let Some(extra) = &self.extra {
            writer.write_string(extra, Prefix::U32)?;
        }
        Ok(())
    }

    /// Writes the placeholder for an empty position.
    ///
    /// # Errors
    ///
    /// Infallible for an in-memory writer.
    pub fn encode_empty(writer: &mut RegionWriter, local_index: u16) -> RegionResult<()> {
        writer.write_u16(local_index)?;
        writer.write_i32(EMPTY_MATERIAL)?;
        writer.write_u16(0)?;
        writer.write_bool(false)
    }

    /// Reads the record for position `expected`; `None` for an empty one.
    ///
    /// # Errors
    ///
    /// - [`RegionError::CellIndexMismatch`] if the stored index is not `expected`
    /// - [`RegionError::NegativeLength`] for a negative material other than -1
    pub fn decode(reader: &mut RegionReader<'_>, expected: u16) -> RegionResult<Option<Self>> {
        let local_index = reader.read_u16()?;
        if local_index != expected {
            return Err(RegionError::CellIndexMismatch { expected, found: local_index });
        }
        let material = reader.read_i32()?;
        let state = reader.read_u16()?;
        let extra = if reader.read_bool()? {
            Some(reader.read_string(Prefix::U32)?)
        } else {
            None
        };

        if material == EMPTY_MATERIAL {
            return Ok(None);
        }
        let material =
            u32::try_from(material).map_err(|_| RegionError::NegativeLength(material))?;
        Ok(Some(Self { local_index, material, state, extra }))
    }
}
