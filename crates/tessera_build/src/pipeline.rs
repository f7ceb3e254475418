//! The compilation pipeline.
//!
//! A run always starts by elaborating the design. With caching enabled the
//! pipeline then computes the [`CacheKey`] and looks the entry up: a usable
//! entry is restored, while a missing or damaged one is (re)built in place and
//! finalized. With caching disabled the design is built straight into the
//! working directory and no key is computed. Both paths share the same build
//! stage and end with a [`BackendHandle`]; a failure at any stage is returned
//! as a [`BuildError`] and no handle is produced.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tessera_cache::{
    ArtifactCatalog, CacheEntry, CacheError, CacheKey, CacheKeyBuilder, CacheStore, ToolVersion,
};
use tessera_config::{apply_command_edits, BuildConfiguration, CacheConfig, CanonicalConfig};
use tracing::{debug, info, warn};

use crate::collab::{Elaboration, Elaborator, HarnessGenerator, HarnessRequest};
use crate::error::BuildError;
use crate::handle::BackendHandle;
use crate::toolchain::{binary_name, NativeJob, Toolchain};

/// Coverage output file, relative to the simulator's working directory.
pub const COVERAGE_FILE: &str = "coverage.dat";

/// Tool name under which this crate's own version enters the cache key.
pub const BUILDER_TOOL: &str = "tessera";

/// Version of the pipeline. Source layout and compiler arguments may change
/// between releases, so entries are never shared across versions.
pub const BUILDER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Where a run builds and whether it uses the cache.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Working directory. Uncached builds land here; cached runs place the
    /// inspection link here.
    pub work_dir: PathBuf,
    /// Cache settings.
    pub cache: CacheConfig,
}

impl PipelineOptions {
    /// Creates options for `work_dir` with the given cache settings.
    pub fn new(work_dir: impl Into<PathBuf>, cache: CacheConfig) -> Self {
        Self {
            work_dir: work_dir.into(),
            cache,
        }
    }
}

/// How a run obtained its artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Restored from a finalized cache entry.
    CacheHit,
    /// No entry existed; built and published.
    CacheMiss,
    /// An entry existed but was unusable; rebuilt and republished.
    CacheRecovered,
    /// Caching disabled; built into the working directory.
    Uncached,
}

impl BuildOutcome {
    /// Returns `true` if the native toolchain ran.
    pub fn built(self) -> bool {
        !matches!(self, BuildOutcome::CacheHit)
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildOutcome::CacheHit => "cache hit",
            BuildOutcome::CacheMiss => "cache miss",
            BuildOutcome::CacheRecovered => "rebuilt corrupt cache entry",
            BuildOutcome::Uncached => "uncached build",
        };
        f.write_str(s)
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct CompileReport {
    /// The handle for the simulation driver.
    pub handle: BackendHandle,
    /// How the artifacts were obtained.
    pub outcome: BuildOutcome,
    /// Directory holding the artifacts.
    pub build_dir: PathBuf,
    /// The cache key, when caching was enabled.
    pub key: Option<CacheKey>,
}

/// Elaborates, builds and caches simulators.
pub struct CompilationPipeline<E, H, T> {
    elaborator: E,
    harness: H,
    toolchain: T,
}

impl<E, H, T> CompilationPipeline<E, H, T>
where
    E: Elaborator,
    H: HarnessGenerator,
    T: Toolchain,
{
    /// Creates a pipeline from its three collaborators.
    pub fn new(elaborator: E, harness: H, toolchain: T) -> Self {
        Self {
            elaborator,
            harness,
            toolchain,
        }
    }

    /// The elaboration collaborator.
    pub fn elaborator(&self) -> &E {
        &self.elaborator
    }

    /// The harness collaborator.
    pub fn harness(&self) -> &H {
        &self.harness
    }

    /// The native toolchain.
    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    /// Runs the pipeline and returns only the handle.
    pub fn compile(
        &self,
        config: &BuildConfiguration,
        options: &PipelineOptions,
    ) -> Result<BackendHandle, BuildError> {
        self.run(config, options).map(|report| report.handle)
    }

    /// Versions folded into the configuration hash: every external tool plus
    /// the pipeline itself.
    ///
    /// Probes the toolchain.
    pub fn key_versions(&self) -> Vec<ToolVersion> {
        let mut versions = self.toolchain.versions();
        versions.push(ToolVersion::new(BUILDER_TOOL, BUILDER_VERSION));
        versions
    }

    /// Computes the cache key for an elaborated design.
    ///
    /// Probes the toolchain for its versions.
    pub fn cache_key(&self, elaboration: &Elaboration, config: &CanonicalConfig) -> CacheKey {
        CacheKeyBuilder::new(self.key_versions()).build(
            &elaboration.descriptor,
            &elaboration.annotations,
            config,
        )
    }

    /// Runs the pipeline.
    pub fn run(
        &self,
        config: &BuildConfiguration,
        options: &PipelineOptions,
    ) -> Result<CompileReport, BuildError> {
        let elaboration = self
            .elaborator
            .elaborate(config)
            .map_err(BuildError::Elaboration)?;
        let top = plain_file_name(&elaboration.descriptor.name)?.to_string();
        let canonical = config.canonicalize()?;
        debug!(top = %top, modules = elaboration.descriptor.modules.len(), "elaborated");

        if !options.cache.enabled {
            let build_dir = prepare_dir(&options.work_dir)?;
            info!(top = %top, dir = %build_dir.display(), "caching disabled, building");
            let catalog = self.build_into(&build_dir, &elaboration, &canonical)?;
            return Ok(report(&elaboration, catalog, BuildOutcome::Uncached, build_dir, None));
        }

        let store = CacheStore::new(&options.cache.root);
        let key = self.cache_key(&elaboration, &canonical);
        debug!(top = %top, key = %key, "computed cache key");

        let outcome = match store.lookup(&key) {
            Some(entry) => match self.restore(&store, &entry, &elaboration, &canonical) {
                Ok(catalog) => {
                    info!(top = %top, key = %key, "cache hit");
                    self.link(&store, &options.work_dir, &entry);
                    let build_dir = entry.dir().to_path_buf();
                    return Ok(report(
                        &elaboration,
                        catalog,
                        BuildOutcome::CacheHit,
                        build_dir,
                        Some(key),
                    ));
                }
                Err(e) => {
                    warn!(top = %top, key = %key, error = %e, "unusable cache entry, rebuilding");
                    BuildOutcome::CacheRecovered
                }
            },
            None => {
                info!(top = %top, key = %key, "cache miss");
                BuildOutcome::CacheMiss
            }
        };

        let entry = store.create(&key)?;
        let build_dir = prepare_dir(entry.dir())?;
        let catalog = self.build_into(&build_dir, &elaboration, &canonical)?;
        store.finalize(&entry, &catalog)?;
        self.link(&store, &options.work_dir, &entry);
        Ok(report(&elaboration, catalog, outcome, build_dir, Some(key)))
    }

    /// Restores a catalog and checks that the default binary is present.
    fn restore(
        &self,
        store: &CacheStore,
        entry: &CacheEntry,
        elaboration: &Elaboration,
        config: &CanonicalConfig,
    ) -> Result<ArtifactCatalog, CacheError> {
        let catalog = store.restore(entry, &elaboration.descriptor)?;
        if command_override(elaboration, config).is_none() {
            let binary = entry.dir().join(binary_name(&elaboration.descriptor.name));
            if !binary.is_file() {
                return Err(CacheError::Corrupt {
                    file: binary,
                    reason: "simulator binary is missing".to_string(),
                });
            }
        }
        Ok(catalog)
    }

    /// Emits sources into `build_dir`, runs the toolchain, and derives the catalog.
    fn build_into(
        &self,
        build_dir: &Path,
        elaboration: &Elaboration,
        config: &CanonicalConfig,
    ) -> Result<ArtifactCatalog, BuildError> {
        let descriptor = &elaboration.descriptor;
        let top = descriptor.name.as_str();

        let hdl = self
            .elaborator
            .emit_hdl(elaboration)
            .map_err(BuildError::Elaboration)?;
        let hdl_file = build_dir.join(format!("{top}.v"));
        write_file(&hdl_file, &hdl)?;

        let trace_file = format!("{top}.vcd");
        let request = HarnessRequest {
            descriptor,
            trace_file: config.trace.then_some(trace_file.as_str()),
            coverage_file: (!config.coverage.is_empty()).then_some(COVERAGE_FILE),
            config,
        };
        let source = self
            .harness
            .generate(&request)
            .map_err(BuildError::Harness)?;
        let harness_file = build_dir.join(format!("{top}-harness.cpp"));
        write_file(&harness_file, &source.harness)?;
        for support in &source.support_files {
            let name = plain_file_name(&support.name)?;
            write_file(&build_dir.join(name), &support.contents)?;
        }

        let job = NativeJob {
            top,
            build_dir,
            hdl_file: &hdl_file,
            harness_file: &harness_file,
            config,
        };
        self.toolchain.compile(&job)?;
        let binary = self.toolchain.link(&job)?;
        debug!(top, binary = %binary.display(), "built simulator");

        let command = command_override(elaboration, config)
            .unwrap_or_else(|| vec![binary.display().to_string()]);
        let command = apply_command_edits(&command, &config.command_edits);
        Ok(ArtifactCatalog::new(
            descriptor,
            elaboration.annotations.comb_paths.clone(),
            command,
        ))
    }

    fn link(&self, store: &CacheStore, work_dir: &Path, entry: &CacheEntry) {
        if let Err(e) = store.link(work_dir, entry) {
            warn!(error = %e, "could not link cache entry into working directory");
        }
    }
}

/// The run command requested by annotation or configuration, if any.
///
/// An annotation attached during compilation takes precedence.
fn command_override(elaboration: &Elaboration, config: &CanonicalConfig) -> Option<Vec<String>> {
    elaboration
        .annotations
        .command_override
        .as_deref()
        .map(|c| c.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .filter(|argv| !argv.is_empty())
        .or_else(|| config.command.clone())
}

fn report(
    elaboration: &Elaboration,
    catalog: ArtifactCatalog,
    outcome: BuildOutcome,
    build_dir: PathBuf,
    key: Option<CacheKey>,
) -> CompileReport {
    CompileReport {
        handle: BackendHandle::new(Arc::new(elaboration.descriptor.clone()), catalog),
        outcome,
        build_dir,
        key,
    }
}

/// Accepts `name` only if it names a file directly inside a directory.
fn plain_file_name(name: &str) -> Result<&str, BuildError> {
    let mut components = Path::new(name).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(std::path::Component::Normal(_)), None)
    ) && !name.contains(['/', '\\']);
    if plain {
        Ok(name)
    } else {
        Err(BuildError::UnsafeFileName {
            name: name.to_string(),
        })
    }
}

/// Creates `dir` and returns its absolute form.
fn prepare_dir(dir: &Path) -> Result<PathBuf, BuildError> {
    let io_err = |e: std::io::Error| BuildError::Io {
        path: dir.to_path_buf(),
        source: e,
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;
    std::fs::canonicalize(dir).map_err(io_err)
}

fn write_file(path: &Path, contents: &str) -> Result<(), BuildError> {
    let io_err = |e: std::io::Error| BuildError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, contents).map_err(io_err)
}
