//! # Local Position Indexing
//!
//! Cells and biome samples inside a section are addressed by a packed local
//! index, `y << 2b | z << b | x`, where `b` is the bit width of the cube
//! edge. Cells use a 16-wide cube (`b = 4`, indices `0..4096`), biome
//! samples a 4-wide cube (`b = 2`, indices `0..64`, one sample per 4x4x4
//! block of cells).
//!
//! Chunks inside a region are addressed row-major: `z * xSize + x`.

/// Edge length of a section in cells.
pub const SECTION_EDGE: usize = 16;

/// Cells per block-light or sky-light nibble array.
pub const LIGHT_LEN: usize = CELL_CUBE.volume() / 2;

/// A cubic grid addressed by packed local indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CubeShape {
    bits: u32,
}

/// The cell cube of one section.
pub const CELL_CUBE: CubeShape = CubeShape::new(4);

/// The biome sample cube of one section.
pub const BIOME_CUBE: CubeShape = CubeShape::new(2);

impl CubeShape {
    /// A cube whose edge is `1 << bits`.
    #[must_use]
    pub const fn new(bits: u32) -> Self {
        Self { bits }
    }

    /// Edge length.
    #[inline]
    #[must_use]
    pub const fn edge(self) -> usize {
        1 << self.bits
    }

    /// Number of positions.
    #[inline]
    #[must_use]
    pub const fn volume(self) -> usize {
        1 << (3 * self.bits)
    }

    /// Cells covered by one position along each axis, relative to the cell cube.
    #[inline]
    #[must_use]
    pub const fn stride(self) -> usize {
        SECTION_EDGE / self.edge()
    }

    /// Packs `(x, y, z)` into a local index. Coordinates must be below [`Self::edge`].
    #[inline]
    #[must_use]
    pub const fn index(self, x: usize, y: usize, z: usize) -> usize {
        (y << (2 * self.bits)) | (z << self.bits) | x
    }

    /// True if every coordinate is below [`Self::edge`].
    #[inline]
    #[must_use]
    pub const fn contains(self, x: usize, y: usize, z: usize) -> bool {
        x < self.edge() && y < self.edge() && z < self.edge()
    }

    /// Packs `(x, y, z)`, or `None` if a coordinate is outside the cube.
    #[inline]
    #[must_use]
    pub const fn checked_index(self, x: usize, y: usize, z: usize) -> Option<usize> {
        if self.contains(x, y, z) {
            Some(self.index(x, y, z))
        } else {
            None
        }
    }

    /// Unpacks a local index into `(x, y, z)`.
    #[inline]
    #[must_use]
    pub const fn coords(self, index: usize) -> (usize, usize, usize) {
        let mask = self.edge() - 1;
        (index & mask, index >> (2 * self.bits), (index >> self.bits) & mask)
    }

    /// Iterates `(index, x, y, z)` in ascending index order.
    pub fn positions(self) -> impl Iterator<Item = (usize, usize, usize, usize)> {
        (0..self.volume()).map(move |index| {
            let (x, y, z) = self.coords(index);
            (index, x, y, z)
        })
    }
}

/// Row-major chunk index inside a region grid.
#[inline]
#[must_use]
pub const fn chunk_index(x: usize, z: usize, x_size: usize) -> usize {
    z * x_size + x
}

/// Inverse of [`chunk_index`]: `(x, z)` of a chunk slot.
#[inline]
#[must_use]
pub const fn chunk_position(index: usize, x_size: usize) -> (usize, usize) {
    (index % x_size, index / x_size)
}

/// A chunk-aligned rectangle of the world, in chunk coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionExtent {
    /// Lowest chunk x.
    pub origin_x: i32,
    /// Lowest chunk z.
    pub origin_z: i32,
    /// Width in chunks.
    pub x_size: u16,
    /// Depth in chunks.
    pub z_size: u16,
}

impl RegionExtent {
    /// The chunk grid between two block corners.
    ///
    /// Both corners are reduced to their chunk; the chunk holding the larger
    /// corner is excluded, so two corners inside the same chunk span nothing.
    /// Returns `None` if the span does not fit in 16-bit extents.
    #[must_use]
    pub fn spanning(from_block: (i32, i32), to_block: (i32, i32)) -> Option<Self> {
        let edge = SECTION_EDGE as i32;
        let (fx, fz) = (from_block.0.div_euclid(edge), from_block.1.div_euclid(edge));
        let (tx, tz) = (to_block.0.div_euclid(edge), to_block.1.div_euclid(edge));
        Some(Self {
            origin_x: fx.min(tx),
            origin_z: fz.min(tz),
            x_size: u16::try_from(fx.abs_diff(tx)).ok()?,
            z_size: u16::try_from(fz.abs_diff(tz)).ok()?,
        })
    }

    /// Number of chunk slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        usize::from(self.x_size) * usize::from(self.z_size)
    }

    /// World chunk coordinates of a chunk slot.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn world_chunk(&self, index: usize) -> (i32, i32) {
        let (x, z) = chunk_position(index, usize::from(self.x_size).max(1));
        // x < x_size and z <= capacity, both fit i32.
        (self.origin_x + x as i32, self.origin_z + z as i32)
    }
}
