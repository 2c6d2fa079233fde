//! Entry point tying catalogs and config to encode and decode.

use strata_core::RegionResult;

use crate::builder::RegionBuilder;
use crate::catalog::Catalogs;
use crate::config::CodecConfig;
use crate::record::RegionRecord;
use crate::report::DecodeReport;
use crate::snapshot::ChunkSnapshot;

/// A region decoded together with what the decoder had to recover from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedRegion {
    /// The region, minus any skipped chunks.
    pub region: RegionRecord,
    /// Unknown identifiers, schema drift and skipped chunks.
    pub report: DecodeReport,
}

/// Encodes and decodes regions against one set of catalogs.
#[derive(Debug, Clone)]
pub struct RegionCodec<'a> {
    catalogs: Catalogs<'a>,
    config: CodecConfig,
}

impl<'a> RegionCodec<'a> {
    /// Creates a codec with the default config.
    #[must_use]
    pub fn new(catalogs: Catalogs<'a>) -> Self {
        Self::with_config(catalogs, CodecConfig::default())
    }

    /// Creates a codec with an explicit config.
    #[must_use]
    pub fn with_config(catalogs: Catalogs<'a>, config: CodecConfig) -> Self {
        Self { catalogs, config }
    }

    /// The active config.
    #[must_use]
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// A builder for sampling chunks, possibly from several threads.
    #[must_use]
    pub fn builder(&self, x_size: u16, z_size: u16) -> RegionBuilder<'_> {
        RegionBuilder::new(x_size, z_size, self.catalogs, &self.config)
    }

    /// Samples `(slot, chunk)` pairs into a region record on this thread.
    ///
    /// # Errors
    ///
    /// Fails for a slot past the grid or a palette overflow.
    pub fn sample<'s, I>(&self, x_size: u16, z_size: u16, chunks: I) -> RegionResult<RegionRecord>
    where
        I: IntoIterator<Item = (usize, &'s dyn ChunkSnapshot)>,
    {
        let builder = self.builder(x_size, z_size);
        for (index, chunk) in chunks {
            builder.add_chunk(index, chunk)?;
        }
        builder.finish()
    }

    /// Serializes a region.
    ///
    /// # Errors
    ///
    /// See [`RegionRecord::encode`].
    pub fn encode(&self, region: &RegionRecord) -> RegionResult<Vec<u8>> {
        region.encode()
    }

    /// Samples and serializes in one step.
    ///
    /// # Errors
    ///
    /// See [`Self::sample`] and [`RegionRecord::encode`].
    pub fn encode_snapshot<'s, I>(&self, x_size: u16, z_size: u16, chunks: I) -> RegionResult<Vec<u8>>
    where
        I: IntoIterator<Item = (usize, &'s dyn ChunkSnapshot)>,
    {
        self.sample(x_size, z_size, chunks)?.encode()
    }

    /// Reads a region file's bytes.
    ///
    /// # Errors
    ///
    /// See [`RegionRecord::decode`].
    pub fn decode(&self, bytes: &[u8]) -> RegionResult<DecodedRegion> {
        let (region, report) = RegionRecord::decode(bytes, self.catalogs, &self.config)?;
        Ok(DecodedRegion { region, report })
    }
}
