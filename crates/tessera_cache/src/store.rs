//! On-disk cache entries.
//!
//! Entries live at `<root>/<circuit>/<config>/`. An entry becomes eligible for
//! reuse when [`CacheStore::finalize`] renames the command metadata file into
//! place, which is always the last write. Lookup only tests that the entry
//! directory exists; restore then requires both metadata files to parse.
//!
//! No lock arbitrates two processes building the same key. Metadata files are
//! replaced by rename, so a reader sees complete files or none, but the other
//! artifacts in the directory may interleave.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tessera_ir::CircuitDescriptor;
use tracing::{debug, warn};

use crate::catalog::{ArtifactCatalog, COMMAND_FILE, PATHS_FILE};
use crate::error::CacheError;
use crate::key::CacheKey;

/// Name of the inspection link created in the working directory.
pub const LINK_NAME: &str = "tessera-cache-entry";

/// A handle on the directory of one cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    key: CacheKey,
    dir: PathBuf,
}

impl CacheEntry {
    /// The key this entry belongs to.
    pub fn key(&self) -> CacheKey {
        self.key
    }

    /// The entry directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the combinational-path metadata file.
    pub fn paths_file(&self) -> PathBuf {
        self.dir.join(PATHS_FILE)
    }

    /// Path of the run-command metadata file.
    pub fn command_file(&self) -> PathBuf {
        self.dir.join(COMMAND_FILE)
    }

    /// Returns `true` once [`CacheStore::finalize`] has completed for this entry.
    pub fn is_finalized(&self) -> bool {
        self.paths_file().is_file() && self.command_file().is_file()
    }
}

/// One entry found while scanning the cache root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    /// The entry's key.
    pub key: CacheKey,
    /// The entry directory.
    pub dir: PathBuf,
    /// Whether both metadata files are present.
    pub finalized: bool,
}

/// Manages the cache directory tree.
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Creates a store rooted at `root`. Nothing is created on disk yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry(&self, key: &CacheKey) -> CacheEntry {
        CacheEntry {
            key: *key,
            dir: self.root.join(key.relative_path()),
        }
    }

    /// Returns the entry for `key` if its directory exists.
    ///
    /// Directory existence is the only check made here. File contents are not
    /// re-verified; a damaged entry surfaces later as [`CacheError::Corrupt`]
    /// from [`restore`](Self::restore).
    pub fn lookup(&self, key: &CacheKey) -> Option<CacheEntry> {
        let entry = self.entry(key);
        entry.dir.is_dir().then_some(entry)
    }

    /// Creates the directory tree for `key`. Succeeds if it already exists.
    pub fn create(&self, key: &CacheKey) -> Result<CacheEntry, CacheError> {
        let entry = self.entry(key);
        std::fs::create_dir_all(&entry.dir).map_err(|e| CacheError::Io {
            path: entry.dir.clone(),
            source: e,
        })?;
        debug!(key = %key, dir = %entry.dir.display(), "created cache entry");
        Ok(entry)
    }

    /// Publishes `catalog` into `entry`.
    ///
    /// Must be the last write of a build. The command file is written after
    /// the path file, so its presence marks a complete entry.
    pub fn finalize(&self, entry: &CacheEntry, catalog: &ArtifactCatalog) -> Result<(), CacheError> {
        catalog.write_paths(&entry.paths_file())?;
        catalog.write_command(&entry.command_file())?;
        debug!(key = %entry.key, "finalized cache entry");
        Ok(())
    }

    /// Reads the catalog stored in `entry`, deriving port names from `descriptor`.
    ///
    /// Fails with [`CacheError::Corrupt`] if either metadata file is missing or
    /// does not parse, including when a concurrent writer has not finished.
    pub fn restore(
        &self,
        entry: &CacheEntry,
        descriptor: &CircuitDescriptor,
    ) -> Result<ArtifactCatalog, CacheError> {
        let comb_paths = ArtifactCatalog::read_paths(&entry.paths_file())?;
        let command = ArtifactCatalog::read_command(&entry.command_file())?;
        Ok(ArtifactCatalog::new(descriptor, comb_paths, command))
    }

    /// Points `<work_dir>/`[`LINK_NAME`] at `entry`.
    ///
    /// Any existing link is deleted first and a new one created; this is not
    /// atomic. A real file or directory at the link location is left alone and
    /// reported as an error.
    pub fn link(&self, work_dir: &Path, entry: &CacheEntry) -> Result<PathBuf, CacheError> {
        let link = work_dir.join(LINK_NAME);
        let io_err = |e: std::io::Error| CacheError::Io {
            path: link.clone(),
            source: e,
        };

        std::fs::create_dir_all(work_dir).map_err(|e| CacheError::Io {
            path: work_dir.to_path_buf(),
            source: e,
        })?;
        match std::fs::symlink_metadata(&link) {
            Ok(meta) if meta.file_type().is_symlink() => {
                remove_link(&link).map_err(io_err)?;
            }
            Ok(_) => {
                return Err(io_err(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "not a symbolic link",
                )));
            }
            Err(_) => {}
        }

        let target = std::fs::canonicalize(&entry.dir).map_err(|e| CacheError::Io {
            path: entry.dir.clone(),
            source: e,
        })?;
        make_link(&target, &link).map_err(io_err)?;
        debug!(link = %link.display(), target = %target.display(), "linked cache entry");
        Ok(link)
    }

    /// Lists every `<circuit>/<config>` entry under the root, sorted by key.
    ///
    /// Directories whose names are not hashes are skipped.
    pub fn entries(&self) -> Result<Vec<EntrySummary>, CacheError> {
        let mut found = Vec::new();
        for circuit_dir in read_subdirs(&self.root)? {
            for config_dir in read_subdirs(&circuit_dir)? {
                let (Some(circuit), Some(config)) = (file_name(&circuit_dir), file_name(&config_dir))
                else {
                    continue;
                };
                let Ok(key) = format!("{circuit}/{config}").parse::<CacheKey>() else {
                    continue;
                };
                let entry = self.entry(&key);
                found.push(EntrySummary {
                    key,
                    finalized: entry.is_finalized(),
                    dir: entry.dir,
                });
            }
        }
        found.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(found)
    }

    /// Deletes the entry for `key`. Returns `false` if it did not exist.
    pub fn remove(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let Some(entry) = self.lookup(key) else {
            return Ok(false);
        };
        std::fs::remove_dir_all(&entry.dir).map_err(|e| CacheError::Io {
            path: entry.dir.clone(),
            source: e,
        })?;
        if let Some(parent) = entry.dir.parent() {
            // Drop the circuit directory once its last configuration is gone.
            let _ = std::fs::remove_dir(parent);
        }
        Ok(true)
    }

    /// Removes entries that were never finalized and have not been written to
    /// for at least `min_age`. Returns how many were removed.
    ///
    /// An unfinalized entry may belong to a build still in progress in another
    /// process; removing it makes that build fail when it finalizes. A
    /// `min_age` longer than the slowest build avoids this.
    pub fn prune_incomplete(&self, min_age: Duration) -> Result<usize, CacheError> {
        let now = SystemTime::now();
        let mut removed = 0;
        for summary in self.entries()? {
            if summary.finalized {
                continue;
            }
            let Some(written) = last_write(&summary.dir) else {
                continue;
            };
            let idle = now.duration_since(written).unwrap_or(Duration::ZERO);
            if idle < min_age {
                debug!(key = %summary.key, "keeping recently written incomplete entry");
                continue;
            }
            if self.remove(&summary.key)? {
                warn!(key = %summary.key, "removed incomplete cache entry");
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Removes every entry. Returns how many were removed.
    pub fn clean(&self) -> Result<usize, CacheError> {
        let mut removed = 0;
        for summary in self.entries()? {
            if self.remove(&summary.key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn read_subdirs(dir: &Path) -> Result<Vec<PathBuf>, CacheError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(CacheError::Io {
                path: dir.to_path_buf(),
                source: e,
            })
        }
    };
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CacheError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    Ok(dirs)
}

/// Latest modification time of `dir` and its immediate children.
fn last_write(dir: &Path) -> Option<SystemTime> {
    let mut latest = std::fs::metadata(dir).and_then(|m| m.modified()).ok()?;
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                latest = latest.max(modified);
            }
        }
    }
    Some(latest)
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

#[cfg(unix)]
fn make_link(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_link(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(unix)]
fn remove_link(link: &Path) -> std::io::Result<()> {
    std::fs::remove_file(link)
}

#[cfg(windows)]
fn remove_link(link: &Path) -> std::io::Result<()> {
    std::fs::remove_dir(link)
}
