//! Design bundles: an elaborated design stored on disk.
//!
//! A bundle directory holds:
//!
//! - `design.json`: the circuit descriptor, its compiled annotations, and the
//!   name of the HDL file emitted for it
//! - the HDL file itself
//! - `harness.cpp`: the simulation harness
//! - `include/` (optional): headers copied next to the harness
//!
//! The harness may contain `@TRACE_FILE@` and `@COVERAGE_FILE@` placeholders,
//! which are replaced by the configured destinations (or by an empty string
//! when the feature is off).
//!
//! The fingerprints in `design.json` only describe the circuit structure, so
//! elaboration adds one fingerprint per input file (HDL, harness, headers),
//! named [`INPUT_PREFIX`]`<file>`. Editing any of them changes the circuit hash.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tessera_build::{
    Elaboration, ElaborationError, Elaborator, HarnessGenerator, HarnessRequest, HarnessSource,
    SupportFile,
};
use tessera_config::BuildConfiguration;
use tessera_ir::{CircuitDescriptor, CompiledAnnotations, ModuleFingerprint};

/// Manifest file inside a bundle.
pub const MANIFEST_FILE: &str = "design.json";

/// Harness file inside a bundle.
pub const HARNESS_FILE: &str = "harness.cpp";

/// Directory of support headers inside a bundle.
pub const INCLUDE_DIR: &str = "include";

/// Name prefix of the fingerprints added for bundle input files.
pub const INPUT_PREFIX: &str = "bundle:";

const TRACE_PLACEHOLDER: &str = "@TRACE_FILE@";
const COVERAGE_PLACEHOLDER: &str = "@COVERAGE_FILE@";

/// Contents of `design.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct BundleManifest {
    /// Structural description of the circuit.
    pub descriptor: CircuitDescriptor,
    /// Annotations attached by the compiler.
    #[serde(default)]
    pub annotations: CompiledAnnotations,
    /// HDL file name, relative to the bundle directory.
    pub hdl: PathBuf,
}

/// Elaborates a design by reading it from a bundle directory.
#[derive(Debug, Clone)]
pub struct BundleElaborator {
    dir: PathBuf,
}

impl BundleElaborator {
    /// Creates an elaborator for the bundle at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Reads and parses the manifest.
    pub fn manifest(&self) -> Result<BundleManifest, ElaborationError> {
        let path = self.dir.join(MANIFEST_FILE);
        let text = read(&path)?;
        serde_json::from_str(&text).map_err(|e| {
            ElaborationError::new(format!("invalid manifest {}: {e}", path.display()))
        })
    }
}

impl Elaborator for BundleElaborator {
    fn elaborate(&self, _config: &BuildConfiguration) -> Result<Elaboration, ElaborationError> {
        let manifest = self.manifest()?;
        let hdl = read(&self.dir.join(&manifest.hdl))?;
        let harness = read(&self.dir.join(HARNESS_FILE))?;

        let mut descriptor = manifest.descriptor;
        let hdl_name = manifest.hdl.display().to_string();
        descriptor.modules.push(input_fingerprint(&hdl_name, &hdl));
        descriptor.modules.push(input_fingerprint(HARNESS_FILE, &harness));
        for support in read_includes(&self.dir)? {
            let name = format!("{INCLUDE_DIR}/{}", support.name);
            descriptor.modules.push(input_fingerprint(&name, &support.contents));
        }

        Ok(Elaboration {
            descriptor,
            annotations: manifest.annotations,
            hdl: Some(hdl),
        })
    }
}

/// Produces harness sources from a bundle directory.
#[derive(Debug, Clone)]
pub struct BundleHarness {
    dir: PathBuf,
}

impl BundleHarness {
    /// Creates a harness generator for the bundle at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl HarnessGenerator for BundleHarness {
    fn generate(&self, request: &HarnessRequest<'_>) -> Result<HarnessSource, ElaborationError> {
        let harness = read(&self.dir.join(HARNESS_FILE))?
            .replace(TRACE_PLACEHOLDER, request.trace_file.unwrap_or_default())
            .replace(COVERAGE_PLACEHOLDER, request.coverage_file.unwrap_or_default());

        Ok(HarnessSource {
            harness,
            support_files: read_includes(&self.dir)?,
        })
    }
}

fn input_fingerprint(name: &str, contents: &str) -> ModuleFingerprint {
    ModuleFingerprint::from_canonical(format!("{INPUT_PREFIX}{name}"), contents)
}

/// Reads the files directly inside the bundle's include directory, sorted by name.
fn read_includes(dir: &Path) -> Result<Vec<SupportFile>, ElaborationError> {
    let include = dir.join(INCLUDE_DIR);
    let mut support_files = Vec::new();
    if !include.is_dir() {
        return Ok(support_files);
    }
    let entries = std::fs::read_dir(&include).map_err(|e| io_error(&include, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_error(&include, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        support_files.push(SupportFile {
            name: entry.file_name().to_string_lossy().into_owned(),
            contents: read(&path)?,
        });
    }
    support_files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(support_files)
}

fn read(path: &Path) -> Result<String, ElaborationError> {
    std::fs::read_to_string(path).map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, e: std::io::Error) -> ElaborationError {
    ElaborationError::new(format!("cannot read {}: {e}", path.display()))
}
