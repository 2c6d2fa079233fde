//! Non-fatal findings of a decode pass.

use std::fmt;

/// A condition the decoder recovered from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeWarning {
    /// A stored voxel type is not in the catalog; the fallback took its place.
    UnknownMaterial {
        /// Material palette index.
        index: u32,
        /// Identifier found in the file.
        identifier: String,
    },
    /// A stored biome is not in the catalog; the fallback took its place.
    UnknownBiome {
        /// Biome palette index.
        index: u16,
        /// Identifier found in the file.
        identifier: String,
    },
    /// A material's property list changed since the file was written.
    SchemaDrift {
        /// Voxel type identifier.
        material: String,
        /// Property count stored in the file.
        stored: u16,
        /// Property count the catalog reports now.
        live: usize,
        /// Stored properties the live type no longer has.
        dropped: Vec<String>,
        /// Live properties that took their default value.
        defaulted: Vec<String>,
    },
    /// A chunk failed to decode and was left out of the region.
    ChunkSkipped {
        /// Chunk slot index.
        chunk_index: usize,
        /// Rendered error.
        reason: String,
    },
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMaterial { index, identifier } => {
                write!(f, "unknown material {identifier} at palette index {index}")
            }
            Self::UnknownBiome { index, identifier } => {
                write!(f, "unknown biome {identifier} at palette index {index}")
            }
            Self::SchemaDrift { material, stored, live, dropped, defaulted } => write!(
                f,
                "schema drift on {material}: {stored} stored properties, {live} live \
                 (dropped {dropped:?}, defaulted {defaulted:?})"
            ),
            Self::ChunkSkipped { chunk_index, reason } => {
                write!(f, "chunk {chunk_index} skipped: {reason}")
            }
        }
    }
}

/// Every warning raised while decoding one region, in encounter order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeReport {
    warnings: Vec<DecodeWarning>,
}

impl DecodeReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records and logs a warning.
    pub fn push(&mut self, warning: DecodeWarning) {
        match &warning {
            DecodeWarning::ChunkSkipped { .. } => tracing::error!("{warning}"),
            _ => tracing::warn!("{warning}"),
        }
        self.warnings.push(warning);
    }

    /// True if nothing was recovered from.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// All warnings.
    #[must_use]
    pub fn warnings(&self) -> &[DecodeWarning] {
        &self.warnings
    }

    /// Slot indices of chunks that were dropped.
    pub fn skipped_chunks(&self) -> impl Iterator<Item = usize> + '_ {
        self.warnings.iter().filter_map(|w| match w {
            DecodeWarning::ChunkSkipped { chunk_index, .. } => Some(*chunk_index),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_collects_in_order() {
        let mut report = DecodeReport::new();
        assert!(report.is_clean());

        report.push(DecodeWarning::UnknownBiome { index: 0, identifier: "a:b".into() });
        report.push(DecodeWarning::ChunkSkipped { chunk_index: 3, reason: "eof".into() });

        assert!(!report.is_clean());
        assert_eq!(report.warnings().len(), 2);
        assert_eq!(report.skipped_chunks().collect::<Vec<_>>(), vec![3]);
        assert_eq!(report.warnings()[1].to_string(), "chunk 3 skipped: eof");
    }
}
