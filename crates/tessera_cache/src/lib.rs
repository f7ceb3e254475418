//! Persistent, content-addressed cache of compiled simulator artifacts.
//!
//! A build is identified by a [`CacheKey`]: a structural hash of the circuit
//! paired with a hash of the canonical build configuration and toolchain
//! versions. Each key owns a two-level directory `<circuit>/<config>/` under
//! the cache root holding the emitted sources, the simulator binary, and the
//! [`ArtifactCatalog`] metadata files. Reads are fail-safe: a damaged entry is
//! reported as [`CacheError::Corrupt`] and the caller rebuilds.

#![warn(missing_docs)]

pub mod catalog;
pub mod error;
pub mod key;
pub mod store;

pub use catalog::{port_name_map, ArtifactCatalog, PortNameMap, COMMAND_FILE, PATHS_FILE};
pub use error::CacheError;
pub use key::{CacheKey, CacheKeyBuilder, ToolVersion, CATALOG_FORMAT_VERSION};
pub use store::{CacheEntry, CacheStore, EntrySummary, LINK_NAME};
