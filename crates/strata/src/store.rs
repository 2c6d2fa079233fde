//! # Region Store
//!
//! One region per file: `<directory>/<name>.<extension>`.
//!
//! ## Save Protocol
//!
//! ```text
//! encode ──> <name>.<ext>.tmp ──> sync_all ──> rename ──> <name>.<ext>
//!                 │
//!                 └── any failure: tmp removed, previous file untouched
//! ```
//!
//! The store assumes a single writer per file.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use strata_core::{RegionError, RegionResult};
use strata_region::{DecodedRegion, RegionCodec, RegionHeader, RegionRecord, RegionSummary};
use tracing::{debug, info};

use crate::config::StoreConfig;

/// Saves and loads region files under one directory.
#[derive(Debug, Clone)]
pub struct RegionStore {
    config: StoreConfig,
}

impl RegionStore {
    /// Creates a store. The directory is created on first save.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidConfig`] for an unusable extension.
    pub fn new(config: StoreConfig) -> RegionResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Creates a store in `directory` with the default extension.
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`].
    pub fn open(directory: impl Into<PathBuf>) -> RegionResult<Self> {
        Self::new(StoreConfig::in_directory(directory))
    }

    /// The store's directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.config.directory
    }

    /// Path of the file holding region `name`.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.config
            .directory
            .join(format!("{name}.{}", self.config.extension))
    }

    fn tmp_path_for(&self, name: &str) -> PathBuf {
        self.config
            .directory
            .join(format!("{name}.{}.tmp", self.config.extension))
    }

    /// Whether region `name` has been saved.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Encodes `region` and atomically replaces the file for `name`.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Fails on an encode error or any I/O error; in both cases the
    /// previous file, if any, is left as it was.
    pub fn save(&self, name: &str, region: &RegionRecord) -> RegionResult<usize> {
        let bytes = region.encode()?;
        self.save_bytes(name, &bytes)?;
        Ok(bytes.len())
    }

    /// Atomically replaces the file for `name` with `bytes`.
    ///
    /// # Errors
    ///
    /// Fails on any I/O error; the temporary file is removed first.
    pub fn save_bytes(&self, name: &str, bytes: &[u8]) -> RegionResult<()> {
        fs::create_dir_all(&self.config.directory)?;
        let tmp_path = self.tmp_path_for(name);
        let final_path = self.path_for(name);

        if let Err(e) = write_synced(&tmp_path, bytes) {
            // Best effort.
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp_path, &final_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        info!(path = %final_path.display(), bytes = bytes.len(), "saved region");
        Ok(())
    }

    /// Reads the raw bytes of region `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::MissingFile`] if no file exists for `name`.
    pub fn load_bytes(&self, name: &str) -> RegionResult<Vec<u8>> {
        let path = self.path_for(name);
        match fs::read(&path) {
            Ok(bytes) => {
                debug!(path = %path.display(), bytes = bytes.len(), "read region file");
                Ok(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RegionError::MissingFile { path })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Loads and decodes region `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::MissingFile`] if no file exists for `name`,
    /// or any fatal decode error.
    pub fn load(&self, name: &str, codec: &RegionCodec<'_>) -> RegionResult<DecodedRegion> {
        let bytes = self.load_bytes(name)?;
        codec.decode(&bytes)
    }

    /// Reads the header of region `name` without inflating its payload.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::MissingFile`] if no file exists for `name`,
    /// or a format error for a malformed header.
    pub fn read_header(&self, name: &str) -> RegionResult<RegionSummary> {
        RegionHeader::peek(&self.load_bytes(name)?)
    }

    /// Deletes region `name`. Returns `false` if there was nothing to delete.
    ///
    /// # Errors
    ///
    /// Fails on an I/O error other than a missing file.
    pub fn remove(&self, name: &str) -> RegionResult<bool> {
        match fs::remove_file(self.path_for(name)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(bytes)?;
    writer.flush()?;
    let file = writer.into_inner().map_err(std::io::IntoInnerError::into_error)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(tag: &str) -> RegionStore {
        let id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        RegionStore::open(std::env::temp_dir().join(format!("strata_store_{tag}_{id}"))).unwrap()
    }

    #[test]
    fn test_path_layout() {
        let store = RegionStore::open("regions").unwrap();
        assert_eq!(store.path_for("r.0.0"), PathBuf::from("regions/r.0.0.strata"));
        assert_eq!(store.tmp_path_for("r.0.0"), PathBuf::from("regions/r.0.0.strata.tmp"));
    }

    #[test]
    fn test_missing_file() {
        let store = temp_store("missing");
        assert!(!store.exists("nowhere"));
        assert!(matches!(store.load_bytes("nowhere"), Err(RegionError::MissingFile { .. })));
        assert!(matches!(store.read_header("nowhere"), Err(RegionError::MissingFile { .. })));
        assert!(!store.remove("nowhere").unwrap());
    }

    #[test]
    fn test_save_bytes_replaces_and_cleans_up() {
        let store = temp_store("replace");
        store.save_bytes("a", b"first").unwrap();
        store.save_bytes("a", b"second").unwrap();
        assert_eq!(store.load_bytes("a").unwrap(), b"second");
        assert!(!store.tmp_path_for("a").exists());

        assert!(store.remove("a").unwrap());
        assert!(!store.exists("a"));
        let _ = fs::remove_dir_all(store.directory());
    }

    #[test]
    fn test_failed_rename_keeps_previous_file() {
        let store = temp_store("blocked");
        store.save_bytes("a", b"kept").unwrap();
        // A directory squatting on the target path makes the rename fail.
        fs::create_dir_all(store.path_for("b")).unwrap();

        assert!(store.save_bytes("b", b"lost").is_err());
        assert!(!store.tmp_path_for("b").exists());
        assert_eq!(store.load_bytes("a").unwrap(), b"kept");
        let _ = fs::remove_dir_all(store.directory());
    }
}
