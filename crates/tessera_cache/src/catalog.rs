//! The artifact catalog handed back to callers of the build pipeline.
//!
//! The persisted part of a catalog is two flat JSON arrays stored in the cache
//! entry: [`PATHS_FILE`] holds `{source, sink}` pairs and [`COMMAND_FILE`] holds
//! the run command argv. The port-name map is never stored; it is derived from
//! the circuit descriptor with the same rule on a hit and on a miss.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tessera_ir::{CircuitDescriptor, CombPath};

use crate::error::CacheError;

/// File name of the combinational-path metadata inside a cache entry.
pub const PATHS_FILE: &str = "comb-paths.json";

/// File name of the run-command metadata inside a cache entry.
pub const COMMAND_FILE: &str = "command.json";

/// Map from a port name to the name the simulator exposes it under.
pub type PortNameMap = BTreeMap<String, String>;

/// Results of a build: everything a simulation driver needs besides the design.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactCatalog {
    /// Backend-visible name of every top-level port.
    pub port_names: PortNameMap,
    /// Combinational paths between top-level signals.
    pub comb_paths: Vec<CombPath>,
    /// The simulator invocation; `command[0]` is the executable.
    pub command: Vec<String>,
}

impl ArtifactCatalog {
    /// Builds a catalog for `descriptor`, deriving its port-name map.
    pub fn new(descriptor: &CircuitDescriptor, comb_paths: Vec<CombPath>, command: Vec<String>) -> Self {
        Self {
            port_names: port_name_map(descriptor),
            comb_paths,
            command,
        }
    }

    /// Writes the combinational-path list as a JSON array.
    pub fn write_paths(&self, path: &Path) -> Result<(), CacheError> {
        write_json(path, &self.comb_paths)
    }

    /// Writes the run command as a JSON array of strings.
    pub fn write_command(&self, path: &Path) -> Result<(), CacheError> {
        write_json(path, &self.command)
    }

    /// Reads a combinational-path list written by [`write_paths`](Self::write_paths).
    pub fn read_paths(path: &Path) -> Result<Vec<CombPath>, CacheError> {
        read_json(path)
    }

    /// Reads a run command written by [`write_command`](Self::write_command).
    pub fn read_command(path: &Path) -> Result<Vec<String>, CacheError> {
        read_json(path)
    }
}

/// Derives the backend-visible port names of a circuit.
///
/// Ports literally named `clock` or `reset` keep their name; every other port
/// `p` of circuit `C` becomes `C.p`.
pub fn port_name_map(descriptor: &CircuitDescriptor) -> PortNameMap {
    descriptor
        .ports
        .iter()
        .map(|port| {
            let visible = match port.name.as_str() {
                "clock" | "reset" => port.name.clone(),
                other => format!("{}.{}", descriptor.name, other),
            };
            (port.name.clone(), visible)
        })
        .collect()
}

/// Serializes `value` and writes it through a temporary sibling that is then
/// renamed over `path`, so a reader sees either the old file or the new one.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CacheError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| CacheError::Serialization {
        reason: e.to_string(),
    })?;
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    std::fs::write(&tmp, json).map_err(|e| CacheError::Io {
        path: tmp.clone(),
        source: e,
    })?;
    std::fs::rename(&tmp, path).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Reads and parses a metadata file; any failure marks the entry corrupt.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CacheError> {
    let content = std::fs::read_to_string(path).map_err(|e| CacheError::Corrupt {
        file: path.to_path_buf(),
        reason: if e.kind() == std::io::ErrorKind::NotFound {
            "file is missing".to_string()
        } else {
            e.to_string()
        },
    })?;
    serde_json::from_str(&content).map_err(|e| CacheError::Corrupt {
        file: path.to_path_buf(),
        reason: e.to_string(),
    })
}
