//! # Concurrent Region Builder
//!
//! Samples chunks of one region from several threads at once. All threads
//! share one [`SharedPalettes`], so a voxel type seen first on two threads
//! still gets exactly one palette index.
//!
//! ```rust,ignore
//! let builder = codec.builder(extent.x_size, extent.z_size);
//! std::thread::scope(|s| {
//!     for (index, column) in columns.iter().enumerate() {
//!         let builder = &builder;
//!         s.spawn(move || builder.add_chunk(index, column));
//!     }
//! });
//! let region = builder.finish()?;
//! ```

use std::collections::BTreeMap;

use parking_lot::Mutex;
use strata_core::{RegionError, RegionResult};

use crate::catalog::Catalogs;
use crate::config::CodecConfig;
use crate::palette::SharedPalettes;
use crate::position::chunk_index;
use crate::record::{ChunkRecord, RegionRecord, Sampler};
use crate::snapshot::ChunkSnapshot;

/// Accumulates chunks of one region; safe to share across threads.
#[derive(Debug)]
pub struct RegionBuilder<'a> {
    x_size: u16,
    z_size: u16,
    palettes: SharedPalettes,
    chunks: Mutex<BTreeMap<usize, ChunkRecord>>,
    catalogs: Catalogs<'a>,
    config: &'a CodecConfig,
}

impl<'a> RegionBuilder<'a> {
    /// Creates a builder for an `x_size` by `z_size` chunk grid.
    #[must_use]
    pub fn new(x_size: u16, z_size: u16, catalogs: Catalogs<'a>, config: &'a CodecConfig) -> Self {
        Self {
            x_size,
            z_size,
            palettes: SharedPalettes::new(),
            chunks: Mutex::new(BTreeMap::new()),
            catalogs,
            config,
        }
    }

    /// Number of chunk slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        usize::from(self.x_size) * usize::from(self.z_size)
    }

    /// Samples one chunk into slot `index`.
    ///
    /// Returns `false` if the chunk held no non-empty cell and was skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::ChunkOutOfBounds`] for a slot past the grid,
    /// or a sampling failure.
    pub fn add_chunk(&self, index: usize, snapshot: &dyn ChunkSnapshot) -> RegionResult<bool> {
        if index >= self.capacity() {
            return Err(RegionError::ChunkOutOfBounds { index, capacity: self.capacity() });
        }
        let sampler = Sampler::new(&self.palettes, self.catalogs, self.config);
        let Some(chunk) = ChunkRecord::from_snapshot(snapshot, &sampler)? else {
            tracing::debug!(index, "skipping empty chunk");
            return Ok(false);
        };
        self.chunks.lock().insert(index, chunk);
        Ok(true)
    }

    /// Samples the chunk at grid position `(x, z)`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add_chunk`].
    pub fn add_chunk_at(&self, x: usize, z: usize, snapshot: &dyn ChunkSnapshot) -> RegionResult<bool> {
        if x >= usize::from(self.x_size) || z >= usize::from(self.z_size) {
            return Err(RegionError::ChunkOutOfBounds {
                index: chunk_index(x, z, usize::from(self.x_size)),
                capacity: self.capacity(),
            });
        }
        self.add_chunk(chunk_index(x, z, usize::from(self.x_size)), snapshot)
    }

    /// Freezes the builder into an immutable region.
    ///
    /// # Errors
    ///
    /// Infallible in practice: every slot was bounds-checked on insertion.
    pub fn finish(self) -> RegionResult<RegionRecord> {
        let (materials, biomes) = self.palettes.into_inner();
        RegionRecord::new(self.x_size, self.z_size, materials, biomes, self.chunks.into_inner())
    }
}
