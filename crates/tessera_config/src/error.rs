//! Error types for configuration loading and validation.

use std::path::PathBuf;

/// Errors that can occur when loading or validating a `tessera.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A file referenced by the configuration could not be read.
    #[error("failed to read {path}: {source}")]
    ReferencedFile {
        /// The referenced path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A line of a command-edit file is not of the form `s/from/to/`.
    #[error("malformed command edit on line {line}: '{text}'")]
    MalformedEdit {
        /// One-based line number.
        line: usize,
        /// The offending line.
        text: String,
    },

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parse_error() {
        let err = ConfigError::ParseError("expected '=' at line 3".to_string());
        assert_eq!(
            format!("{err}"),
            "failed to parse configuration: expected '=' at line 3"
        );
    }

    #[test]
    fn display_validation_error() {
        let err = ConfigError::ValidationError("toolchain.make is empty".to_string());
        assert_eq!(format!("{err}"), "validation error: toolchain.make is empty");
    }

    #[test]
    fn display_malformed_edit() {
        let err = ConfigError::MalformedEdit {
            line: 2,
            text: "s/abc".to_string(),
        };
        assert_eq!(format!("{err}"), "malformed command edit on line 2: 's/abc'");
    }

    #[test]
    fn display_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::IoError(io_err);
        let display = format!("{err}");
        assert!(display.starts_with("failed to read configuration:"));
    }
}
