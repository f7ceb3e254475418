//! Canonical form of a [`BuildConfiguration`].
//!
//! Canonicalization removes representational differences that do not change
//! the produced simulator: coverage modes become a sorted set, blank flags are
//! dropped, the command override is whitespace-normalized, and the command-edit
//! file is replaced by its parsed edits so that its location does not matter.

use serde::Serialize;

use crate::edits::{parse_command_edits, CommandEdit};
use crate::error::ConfigError;
use crate::types::{BuildConfiguration, CoverageMode};

/// A build configuration with a stable, hashable serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalConfig {
    /// Whether tracing is compiled in.
    pub trace: bool,
    /// Coverage modes, sorted and deduplicated.
    pub coverage: Vec<CoverageMode>,
    /// HDL compiler flags in their original order.
    pub verilator_flags: Vec<String>,
    /// C++ compiler flags in their original order.
    pub cflags: Vec<String>,
    /// Linker flags in their original order.
    pub ldflags: Vec<String>,
    /// The run-command override as argv, if any.
    pub command: Option<Vec<String>>,
    /// Parsed command edits, in file order.
    pub command_edits: Vec<CommandEdit>,
}

impl BuildConfiguration {
    /// Reduces this configuration to its canonical form.
    ///
    /// Reads and parses the command-edit file if one is configured. Flag order
    /// and repetition are kept because compilers give both meaning.
    pub fn canonicalize(&self) -> Result<CanonicalConfig, ConfigError> {
        let mut coverage = self.coverage.clone();
        coverage.sort();
        coverage.dedup();

        let command = self
            .command
            .as_deref()
            .map(|c| c.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|argv| !argv.is_empty());

        let command_edits = match &self.command_edits {
            Some(path) => {
                let text =
                    std::fs::read_to_string(path).map_err(|e| ConfigError::ReferencedFile {
                        path: path.clone(),
                        source: e,
                    })?;
                parse_command_edits(&text)?
            }
            None => Vec::new(),
        };

        Ok(CanonicalConfig {
            trace: self.trace,
            coverage,
            verilator_flags: normalize_flags(&self.verilator_flags),
            cflags: normalize_flags(&self.cflags),
            ldflags: normalize_flags(&self.ldflags),
            command,
            command_edits,
        })
    }
}

fn normalize_flags(flags: &[String]) -> Vec<String> {
    flags
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}
