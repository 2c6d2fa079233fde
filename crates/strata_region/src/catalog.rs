//! # Voxel and Biome Catalogs
//!
//! The codec never consults a global registry. Encode and decode receive a
//! [`Catalogs`] bundle of trait objects and resolve identifiers through it,
//! so a test can hand in a three-entry [`Registry`] while a host hands in
//! its live block and biome tables.
//!
//! ## TOML Catalog
//!
//! ```toml
//! [[voxel]]
//! identifier = "minecraft:oak_log"
//! properties = [{ name = "axis", default = "y" }]
//!
//! [[biome]]
//! identifier = "minecraft:plains"
//! id = 1
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_core::{RegionError, RegionResult};

/// Explicit property state of one voxel: property name to value, sorted by name.
pub type PropertyMap = BTreeMap<String, String>;

/// One property a voxel type exposes, with the value used when it is absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDef {
    /// Property name, e.g. `axis`.
    pub name: String,
    /// Value filled in when a stored state lacks the property.
    pub default: String,
}

/// A voxel type as the live catalog currently defines it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoxelType {
    /// Namespaced identifier, e.g. `minecraft:stone`.
    pub identifier: String,
    /// Added by a plugin rather than the base game.
    #[serde(default)]
    pub custom: bool,
    /// Properties in declaration order.
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
}

/// Result of reconciling a stored state against a live voxel type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Normalized {
    /// The state restricted to live properties, missing ones defaulted.
    pub state: PropertyMap,
    /// Stored property names the live type no longer has.
    pub dropped: Vec<String>,
    /// Live property names the stored state lacked.
    pub defaulted: Vec<String>,
}

impl VoxelType {
    /// Creates a voxel type with no properties.
    #[must_use]
    pub fn bare(identifier: impl Into<String>) -> Self {
        Self { identifier: identifier.into(), custom: false, properties: Vec::new() }
    }

    /// Adds a property with its default value.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, default: impl Into<String>) -> Self {
        self.properties.push(PropertyDef { name: name.into(), default: default.into() });
        self
    }

    /// Marks the type as plugin-defined.
    #[must_use]
    pub const fn custom(mut self) -> Self {
        self.custom = true;
        self
    }

    /// Number of properties the type currently exposes.
    #[must_use]
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// The state with every property at its default.
    #[must_use]
    pub fn default_state(&self) -> PropertyMap {
        self.properties
            .iter()
            .map(|p| (p.name.clone(), p.default.clone()))
            .collect()
    }

    /// Reconciles `state` with the current property list.
    ///
    /// Known properties keep their value, unknown ones are dropped and
    /// missing ones take their default.
    #[must_use]
    pub fn normalize(&self, state: &PropertyMap) -> Normalized {
        let mut out = Normalized::default();
        for def in &self.properties {
            match state.get(&def.name) {
                Some(value) => {
                    out.state.insert(def.name.clone(), value.clone());
                }
                None => {
                    out.state.insert(def.name.clone(), def.default.clone());
                    out.defaulted.push(def.name.clone());
                }
            }
        }
        out.dropped = state
            .keys()
            .filter(|key| !self.properties.iter().any(|def| &def.name == *key))
            .cloned()
            .collect();
        out
    }
}

/// A biome as the live catalog defines it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiomeType {
    /// Namespaced identifier, e.g. `minecraft:plains`.
    pub identifier: String,
    /// Numeric id the host engine samples biomes by.
    pub id: u32,
}

/// Resolves voxel types by identifier.
pub trait VoxelCatalog: Send + Sync {
    /// Looks up a voxel type; `None` if the identifier is unknown.
    fn voxel_type(&self, identifier: &str) -> Option<&VoxelType>;
}

/// Resolves biomes by identifier or numeric id.
pub trait BiomeCatalog: Send + Sync {
    /// Looks up a biome by identifier.
    fn biome(&self, identifier: &str) -> Option<&BiomeType>;

    /// Looks up a biome by the numeric id a snapshot reports.
    fn biome_by_id(&self, id: u32) -> Option<&BiomeType>;
}

/// The catalogs one encode or decode pass resolves against.
#[derive(Clone, Copy)]
pub struct Catalogs<'a> {
    /// Voxel type lookup.
    pub voxels: &'a dyn VoxelCatalog,
    /// Biome lookup.
    pub biomes: &'a dyn BiomeCatalog,
}

impl<'a> Catalogs<'a> {
    /// Bundles two catalogs.
    #[must_use]
    pub fn new(voxels: &'a dyn VoxelCatalog, biomes: &'a dyn BiomeCatalog) -> Self {
        Self { voxels, biomes }
    }

    /// Uses one registry for both lookups.
    #[must_use]
    pub fn from_registry(registry: &'a Registry) -> Self {
        Self { voxels: registry, biomes: registry }
    }
}

impl std::fmt::Debug for Catalogs<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalogs").finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    voxel: Vec<VoxelType>,
    #[serde(default)]
    biome: Vec<BiomeType>,
}

/// In-memory catalog of voxel types and biomes.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    voxels: HashMap<String, VoxelType>,
    biomes: Vec<BiomeType>,
    biome_by_name: HashMap<String, usize>,
    biome_by_id: HashMap<u32, usize>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a registry from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidConfig`] on malformed TOML or a
    /// duplicated biome id.
    pub fn from_toml_str(text: &str) -> RegionResult<Self> {
        let file: RegistryFile =
            toml::from_str(text).map_err(|e| RegionError::InvalidConfig(e.to_string()))?;
        let mut registry = Self::new();
        for voxel in file.voxel {
            registry.insert_voxel(voxel);
        }
        for biome in file.biome {
            if registry.biome_by_id.contains_key(&biome.id) {
                return Err(RegionError::InvalidConfig(format!(
                    "biome id {} declared twice",
                    biome.id
                )));
            }
            registry.insert_biome(biome);
        }
        Ok(registry)
    }

    /// Loads a registry from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::MissingFile`] if the file cannot be read and
    /// [`RegionError::InvalidConfig`] if it does not parse.
    pub fn load(path: impl AsRef<Path>) -> RegionResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|_| RegionError::MissingFile { path: path.to_path_buf() })?;
        Self::from_toml_str(&text)
    }

    /// Adds or replaces a voxel type.
    pub fn insert_voxel(&mut self, voxel: VoxelType) {
        self.voxels.insert(voxel.identifier.clone(), voxel);
    }

    /// Adds or replaces a biome.
    pub fn insert_biome(&mut self, biome: BiomeType) {
        let slot = match self.biome_by_name.get(&biome.identifier) {
            Some(&slot) => {
                self.biome_by_id.remove(&self.biomes[slot].id);
                self.biomes[slot] = biome.clone();
                slot
            }
            None => {
                self.biomes.push(biome.clone());
                self.biomes.len() - 1
            }
        };
        self.biome_by_name.insert(biome.identifier, slot);
        self.biome_by_id.insert(biome.id, slot);
    }

    /// Builder form of [`Self::insert_voxel`].
    #[must_use]
    pub fn with_voxel(mut self, voxel: VoxelType) -> Self {
        self.insert_voxel(voxel);
        self
    }

    /// Builder form of [`Self::insert_biome`].
    #[must_use]
    pub fn with_biome(mut self, identifier: impl Into<String>, id: u32) -> Self {
        self.insert_biome(BiomeType { identifier: identifier.into(), id });
        self
    }

    /// Number of voxel types.
    #[must_use]
    pub fn voxel_count(&self) -> usize {
        self.voxels.len()
    }

    /// Number of biomes.
    #[must_use]
    pub fn biome_count(&self) -> usize {
        self.biomes.len()
    }
}

impl VoxelCatalog for Registry {
    fn voxel_type(&self, identifier: &str) -> Option<&VoxelType> {
        self.voxels.get(identifier)
    }
}

impl BiomeCatalog for Registry {
    fn biome(&self, identifier: &str) -> Option<&BiomeType> {
        self.biome_by_name.get(identifier).map(|&slot| &self.biomes[slot])
    }

    fn biome_by_id(&self, id: u32) -> Option<&BiomeType> {
        self.biome_by_id.get(&id).map(|&slot| &self.biomes[slot])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> VoxelType {
        VoxelType::bare("minecraft:oak_log")
            .with_property("axis", "y")
            .with_property("waterlogged", "false")
    }

    #[test]
    fn test_default_state() {
        let state = log().default_state();
        assert_eq!(state.len(), 2);
        assert_eq!(state["axis"], "y");
        assert_eq!(state["waterlogged"], "false");
    }

    #[test]
    fn test_normalize_drops_and_defaults() {
        let mut stored = PropertyMap::new();
        stored.insert("axis".into(), "x".into());
        stored.insert("lit".into(), "true".into());

        let normalized = log().normalize(&stored);
        assert_eq!(normalized.state["axis"], "x");
        assert_eq!(normalized.state["waterlogged"], "false");
        assert!(!normalized.state.contains_key("lit"));
        assert_eq!(normalized.dropped, vec!["lit".to_string()]);
        assert_eq!(normalized.defaulted, vec!["waterlogged".to_string()]);
    }

    #[test]
    fn test_registry_from_toml() {
        let registry = Registry::from_toml_str(
            r#"
            [[voxel]]
            identifier = "minecraft:stone"

            [[voxel]]
            identifier = "minecraft:oak_log"
            properties = [{ name = "axis", default = "y" }]

            [[voxel]]
            identifier = "acme:crystal"
            custom = true

            [[biome]]
            identifier = "minecraft:plains"
            id = 1
            "#,
        )
        .unwrap();

        assert_eq!(registry.voxel_count(), 3);
        assert!(registry.voxel_type("acme:crystal").unwrap().custom);
        assert_eq!(registry.voxel_type("minecraft:oak_log").unwrap().property_count(), 1);
        assert_eq!(registry.biome_by_id(1).unwrap().identifier, "minecraft:plains");
        assert!(registry.biome("minecraft:desert").is_none());
    }

    #[test]
    fn test_duplicate_biome_id_rejected() {
        let result = Registry::from_toml_str(
            r#"
            [[biome]]
            identifier = "a:one"
            id = 3

            [[biome]]
            identifier = "a:two"
            id = 3
            "#,
        );
        assert!(matches!(result, Err(RegionError::InvalidConfig(_))));
    }

    #[test]
    fn test_replacing_biome_updates_id_index() {
        let mut registry = Registry::new().with_biome("minecraft:plains", 1);
        registry.insert_biome(BiomeType { identifier: "minecraft:plains".into(), id: 7 });
        assert!(registry.biome_by_id(1).is_none());
        assert_eq!(registry.biome_by_id(7).unwrap().identifier, "minecraft:plains");
        assert_eq!(registry.biome_count(), 1);
    }
}
