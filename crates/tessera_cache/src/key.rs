//! Cache key computation.
//!
//! A [`CacheKey`] pairs a circuit hash with a configuration hash. The circuit
//! hash covers the top-level name, the per-module structural fingerprints
//! sorted by module name, and the compiled annotations that end up in the
//! artifact catalog, so module iteration order never matters but a changed
//! run-command override or path list does. The
//! configuration hash covers the canonical build configuration, the external
//! toolchain versions, and [`CATALOG_FORMAT_VERSION`], so a toolchain upgrade or
//! a metadata format change lands in a fresh directory.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tessera_common::{ContentHash, ContentHasher};
use tessera_config::CanonicalConfig;
use tessera_ir::{CircuitDescriptor, CompiledAnnotations};

use crate::error::CacheError;

/// Version of the on-disk catalog format. Bump on any change to the metadata
/// files so that existing entries stop matching.
pub const CATALOG_FORMAT_VERSION: u32 = 1;

/// Identity of a cached build: `(circuit hash, configuration hash)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey {
    /// Structural hash of the circuit.
    pub circuit_hash: ContentHash,
    /// Hash of the canonical configuration and toolchain versions.
    pub config_hash: ContentHash,
}

impl CacheKey {
    /// Returns the entry directory relative to the cache root.
    ///
    /// The two-level layout bounds the fan-out of any single directory.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.circuit_hash.to_string()).join(self.config_hash.to_string())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.circuit_hash, self.config_hash)
    }
}

impl FromStr for CacheKey {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CacheError::InvalidKey(s.to_string());
        let (circuit, config) = s.split_once('/').ok_or_else(invalid)?;
        Ok(Self {
            circuit_hash: circuit.parse().map_err(|_| invalid())?,
            config_hash: config.parse().map_err(|_| invalid())?,
        })
    }
}

/// Version identifier of one external tool.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToolVersion {
    /// Tool name, e.g. `verilator`.
    pub tool: String,
    /// Version string as reported by the tool.
    pub version: String,
}

impl ToolVersion {
    /// Creates a tool version record.
    pub fn new(tool: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            version: version.into(),
        }
    }
}

/// Computes cache keys for a fixed set of toolchain versions.
#[derive(Debug, Clone, Default)]
pub struct CacheKeyBuilder {
    toolchain: Vec<ToolVersion>,
}

impl CacheKeyBuilder {
    /// Creates a builder. Versions are sorted so probe order does not matter.
    pub fn new(mut toolchain: Vec<ToolVersion>) -> Self {
        toolchain.sort();
        toolchain.dedup();
        Self { toolchain }
    }

    /// Hashes the circuit's name, its module fingerprints sorted by name, and
    /// its compiled annotations.
    ///
    /// Combinational paths are hashed sorted and the command override by its
    /// whitespace-split words. A descriptor without modules yields a valid hash.
    pub fn circuit_hash(
        descriptor: &CircuitDescriptor,
        annotations: &CompiledAnnotations,
    ) -> ContentHash {
        let modules = descriptor.sorted_modules();
        let mut hasher = ContentHasher::new();
        hasher.write_str(&descriptor.name);
        hasher.write_u32(modules.len() as u32);
        for module in modules {
            hasher.write_str(&module.name).write_hash(&module.hash);
        }

        let mut paths: Vec<_> = annotations.comb_paths.iter().collect();
        paths.sort();
        hasher.write_u32(paths.len() as u32);
        for path in paths {
            hasher.write_str(&path.source).write_str(&path.sink);
        }
        let command: Option<Vec<String>> = annotations
            .command_override
            .as_deref()
            .map(|c| c.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|argv| !argv.is_empty());
        write_optional_list(&mut hasher, command.as_deref());
        hasher.finish()
    }

    /// Hashes the canonical configuration together with the toolchain versions
    /// and the catalog format version.
    pub fn config_hash(&self, config: &CanonicalConfig) -> ContentHash {
        let mut hasher = ContentHasher::new();
        hasher.write_u32(CATALOG_FORMAT_VERSION);

        hasher.write_u32(u32::from(config.trace));
        hasher.write_u32(config.coverage.len() as u32);
        for mode in &config.coverage {
            hasher.write_str(mode.flag());
        }
        write_list(&mut hasher, &config.verilator_flags);
        write_list(&mut hasher, &config.cflags);
        write_list(&mut hasher, &config.ldflags);
        write_optional_list(&mut hasher, config.command.as_deref());
        hasher.write_u32(config.command_edits.len() as u32);
        for edit in &config.command_edits {
            hasher.write_str(&edit.from).write_str(&edit.to);
        }

        hasher.write_u32(self.toolchain.len() as u32);
        for tv in &self.toolchain {
            hasher.write_str(&tv.tool).write_str(&tv.version);
        }
        hasher.finish()
    }

    /// Computes the full key for a compiled circuit built with `config`.
    pub fn build(
        &self,
        descriptor: &CircuitDescriptor,
        annotations: &CompiledAnnotations,
        config: &CanonicalConfig,
    ) -> CacheKey {
        CacheKey {
            circuit_hash: Self::circuit_hash(descriptor, annotations),
            config_hash: self.config_hash(config),
        }
    }
}

fn write_list(hasher: &mut ContentHasher, items: &[String]) {
    hasher.write_u32(items.len() as u32);
    for item in items {
        hasher.write_str(item);
    }
}

fn write_optional_list(hasher: &mut ContentHasher, items: Option<&[String]>) {
    match items {
        Some(items) => {
            hasher.write_u32(1);
            write_list(hasher, items);
        }
        None => {
            hasher.write_u32(0);
        }
    }
}
