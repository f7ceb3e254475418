//! Error types for the build pipeline.

use std::path::PathBuf;

use tessera_cache::CacheError;
use tessera_config::ConfigError;

use crate::collab::ElaborationError;

/// Fatal errors from a pipeline run. No [`BackendHandle`](crate::BackendHandle)
/// is produced when one of these is returned.
///
/// Corrupt cache entries never appear here: they are recovered by rebuilding.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The elaboration collaborator failed. Its message is surfaced unchanged.
    #[error(transparent)]
    Elaboration(ElaborationError),

    /// The harness collaborator failed.
    #[error("harness generation failed: {0}")]
    Harness(ElaborationError),

    /// A native build step exited unsuccessfully. Not retried.
    #[error("{tool} failed with {}: {stderr}", describe_exit(.exit_code))]
    ToolFailed {
        /// The tool that failed.
        tool: String,
        /// The exit code, or `None` if the process was killed by a signal.
        exit_code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// A native build step could not be started.
    #[error("failed to launch {tool}: {source}")]
    ToolLaunch {
        /// The tool that could not be started.
        tool: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A circuit or support-file name would resolve outside the build directory.
    #[error("refusing to write '{name}': not a plain file name")]
    UnsafeFileName {
        /// The rejected name.
        name: String,
    },

    /// Writing a build input failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The build configuration could not be canonicalized.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A cache entry could not be created or published.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_failed_display() {
        let err = BuildError::ToolFailed {
            tool: "make".to_string(),
            exit_code: Some(2),
            stderr: "VTop.cpp:3: error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "make failed with exit code 2: VTop.cpp:3: error"
        );
    }

    #[test]
    fn tool_killed_display() {
        let err = BuildError::ToolFailed {
            tool: "verilator".to_string(),
            exit_code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn elaboration_is_verbatim() {
        let err = BuildError::Elaboration(ElaborationError::new("width mismatch on io.out"));
        assert_eq!(err.to_string(), "width mismatch on io.out");
    }

    #[test]
    fn cache_error_wraps() {
        let err: BuildError = CacheError::InvalidKey("x".to_string()).into();
        assert!(matches!(err, BuildError::Cache(_)));
    }
}
