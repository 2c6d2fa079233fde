//! Codec configuration: which identifiers mean "empty" and which stand in
//! for values the catalogs cannot resolve.

use serde::{Deserialize, Serialize};
use strata_core::{RegionError, RegionResult};

use crate::catalog::{Catalogs, VoxelType};

/// Identifier of the empty-cell sentinel.
pub const DEFAULT_AIR: &str = "minecraft:air";

/// Identifier substituted for unknown voxel types.
pub const DEFAULT_FALLBACK_MATERIAL: &str = "minecraft:barrier";

/// Identifier substituted for unknown biomes.
pub const DEFAULT_FALLBACK_BIOME: &str = "minecraft:plains";

/// Settings shared by encode and decode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Cells with this identifier are not stored.
    pub air: String,
    /// Sentinel voxel type for identifiers the catalog does not know.
    pub fallback_material: String,
    /// Sentinel biome for identifiers or ids the catalog does not know.
    pub fallback_biome: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            air: DEFAULT_AIR.to_string(),
            fallback_material: DEFAULT_FALLBACK_MATERIAL.to_string(),
            fallback_biome: DEFAULT_FALLBACK_BIOME.to_string(),
        }
    }
}

impl CodecConfig {
    /// Parses a config from TOML; absent fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidConfig`] on malformed TOML or an empty
    /// identifier.
    pub fn from_toml_str(text: &str) -> RegionResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| RegionError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every identifier is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidConfig`] naming the empty field.
    pub fn validate(&self) -> RegionResult<()> {
        for (field, value) in [
            ("air", &self.air),
            ("fallback_material", &self.fallback_material),
            ("fallback_biome", &self.fallback_biome),
        ] {
            if value.is_empty() {
                return Err(RegionError::InvalidConfig(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }

    /// The sentinel voxel type, as the catalog defines it if it knows it.
    #[must_use]
    pub fn fallback_voxel(&self, catalogs: Catalogs<'_>) -> VoxelType {
        catalogs
            .voxels
            .voxel_type(&self.fallback_material)
            .cloned()
            .unwrap_or_else(|| VoxelType::bare(self.fallback_material.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Registry;

    #[test]
    fn test_defaults() {
        let config = CodecConfig::default();
        assert_eq!(config.air, "minecraft:air");
        assert_eq!(config.fallback_material, "minecraft:barrier");
        assert_eq!(config.fallback_biome, "minecraft:plains");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CodecConfig::from_toml_str(r#"air = "acme:void""#).unwrap();
        assert_eq!(config.air, "acme:void");
        assert_eq!(config.fallback_material, DEFAULT_FALLBACK_MATERIAL);
    }

    #[test]
    fn test_empty_identifier_rejected() {
        let err = CodecConfig::from_toml_str(r#"fallback_biome = """#).unwrap_err();
        assert!(err.to_string().contains("fallback_biome"));
    }

    #[test]
    fn test_fallback_voxel_prefers_catalog() {
        let registry = Registry::new()
            .with_voxel(VoxelType::bare("minecraft:barrier").with_property("waterlogged", "false"));
        let config = CodecConfig::default();

        let known = config.fallback_voxel(Catalogs::from_registry(&registry));
        assert_eq!(known.property_count(), 1);

        let empty = Registry::new();
        let bare = config.fallback_voxel(Catalogs::from_registry(&empty));
        assert_eq!(bare.identifier, "minecraft:barrier");
        assert_eq!(bare.property_count(), 0);
    }
}
