//! Configuration types deserialized from `tessera.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Default cache root, relative to the project directory.
pub const DEFAULT_CACHE_ROOT: &str = ".tessera-cache";

/// The top-level project configuration parsed from `tessera.toml`.
///
/// Every section is optional; an empty file yields a cached, untraced build
/// with the default toolchain executables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectConfig {
    /// Build directives that affect the produced simulator.
    #[serde(default)]
    pub build: BuildConfiguration,
    /// Where and whether build artifacts are cached.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Executables used for the native build.
    #[serde(default)]
    pub toolchain: ToolchainConfig,
}

/// Build directives that determine the produced simulator.
///
/// Everything in here is semantic and is folded into the configuration hash
/// after canonicalization (see [`CanonicalConfig`](crate::CanonicalConfig)).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BuildConfiguration {
    /// Whether the simulator dumps a waveform trace.
    #[serde(default)]
    pub trace: bool,
    /// Coverage instrumentation requested. Treated as a set.
    #[serde(default)]
    pub coverage: Vec<CoverageMode>,
    /// Extra flags passed to the HDL compiler.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub verilator_flags: Vec<String>,
    /// Extra flags passed to the C++ compiler.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub cflags: Vec<String>,
    /// Extra flags passed to the linker.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub ldflags: Vec<String>,
    /// Replaces the default run command, split on whitespace.
    #[serde(default)]
    pub command: Option<String>,
    /// File of `s/from/to/` edits applied to the run command.
    #[serde(default)]
    pub command_edits: Option<PathBuf>,
}

/// Coverage instrumentation kinds understood by the HDL compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageMode {
    /// Line (statement) coverage.
    Line,
    /// Signal toggle coverage.
    Toggle,
    /// User-inserted cover points.
    User,
}

impl CoverageMode {
    /// Returns the HDL compiler flag enabling this mode.
    pub fn flag(self) -> &'static str {
        match self {
            CoverageMode::Line => "--coverage-line",
            CoverageMode::Toggle => "--coverage-toggle",
            CoverageMode::User => "--coverage-user",
        }
    }
}

/// Cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// Whether builds are looked up in and published to the cache.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Root directory of the cache tree.
    #[serde(default = "default_cache_root")]
    pub root: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            root: default_cache_root(),
        }
    }
}

/// Executable names for the two native build steps.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolchainConfig {
    /// The HDL-to-C++ compiler.
    #[serde(default = "default_verilator")]
    pub verilator: String,
    /// The build driver that compiles and links the generated C++.
    #[serde(default = "default_make")]
    pub make: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            verilator: default_verilator(),
            make: default_make(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_cache_root() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_ROOT)
}

fn default_verilator() -> String {
    "verilator".to_string()
}

fn default_make() -> String {
    "make".to_string()
}

/// Deserializes a field that can be either a single string or a list of strings.
///
/// Allows `cflags = "-O1"` as well as `cflags = ["-O1", "-g"]`.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}
