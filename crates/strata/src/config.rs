//! # Strata Configuration
//!
//! One TOML file drives both the store and the codec:
//!
//! ```toml
//! [store]
//! directory = "world/regions"
//! extension = "strata"
//!
//! [codec]
//! air = "minecraft:air"
//! fallback_material = "minecraft:barrier"
//! fallback_biome = "minecraft:plains"
//! ```
//!
//! Every table and field is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strata_core::{RegionError, RegionResult};
use strata_region::CodecConfig;

/// Default directory for region files, relative to the working directory.
pub const DEFAULT_DIRECTORY: &str = "regions";

/// Default region file extension.
pub const DEFAULT_EXTENSION: &str = "strata";

/// Where region files live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one file per region.
    pub directory: PathBuf,
    /// File extension, without the dot.
    pub extension: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl StoreConfig {
    /// A config rooted at `directory` with the default extension.
    #[must_use]
    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into(), ..Self::default() }
    }

    /// Checks the extension is usable in a file name.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidConfig`] for an empty extension or one
    /// containing a dot or a path separator.
    pub fn validate(&self) -> RegionResult<()> {
        if self.extension.is_empty() {
            return Err(RegionError::InvalidConfig("store extension must not be empty".into()));
        }
        if self.extension.contains(['.', '/', '\\']) {
            return Err(RegionError::InvalidConfig(format!(
                "store extension {:?} must be a bare suffix",
                self.extension
            )));
        }
        Ok(())
    }
}

/// Top-level configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrataConfig {
    /// Region store settings.
    pub store: StoreConfig,
    /// Codec settings.
    pub codec: CodecConfig,
}

impl StrataConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidConfig`] on malformed TOML or a value
    /// that fails validation.
    pub fn from_toml_str(text: &str) -> RegionResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| RegionError::InvalidConfig(e.to_string()))?;
        config.store.validate()?;
        config.codec.validate()?;
        Ok(config)
    }

    /// Loads a config file.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::MissingFile`] if the file cannot be read, or
    /// any error of [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> RegionResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|_| RegionError::MissingFile { path: path.to_path_buf() })?;
        Self::from_toml_str(&text)
    }

    /// Serializes the config back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidConfig`] if serialization fails.
    pub fn to_toml_string(&self) -> RegionResult<String> {
        toml::to_string(self).map_err(|e| RegionError::InvalidConfig(e.to_string()))
    }
}
