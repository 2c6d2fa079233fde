//! # Strata
//!
//! Region files on disk for the Strata voxel format.
//!
//! ## Crates
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  strata         RegionStore, StrataConfig, region_inspect    │
//! ├──────────────────────────────────────────────────────────────┤
//! │  strata_region  catalogs, palettes, records, RegionCodec     │
//! ├──────────────────────────────────────────────────────────────┤
//! │  strata_core    RegionReader / RegionWriter, BitSet, errors  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use strata::{RegionStore, StrataConfig};
//! use strata::region::{Catalogs, RegionCodec, Registry};
//!
//! let config = StrataConfig::load("strata.toml")?;
//! let registry = Registry::load("catalog.toml")?;
//! let codec = RegionCodec::with_config(Catalogs::from_registry(&registry), config.codec);
//! let store = RegionStore::new(config.store)?;
//!
//! let decoded = store.load("r.0.0", &codec)?;
//! for warning in decoded.report.warnings() {
//!     println!("{warning}");
//! }
//! store.save("r.0.0", &decoded.region)?;
//! # Ok::<(), strata::RegionError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod store;

pub use strata_core as core;
pub use strata_region as region;

pub use config::{StoreConfig, StrataConfig};
pub use store::RegionStore;
pub use strata_core::{RegionError, RegionResult};
