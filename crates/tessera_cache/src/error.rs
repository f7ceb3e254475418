//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur during cache operations.
///
/// Read-side errors are fail-safe: the pipeline turns them into a rebuild
/// rather than a hard failure. Write-side errors are propagated because a
/// build that cannot be published is not usable.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while writing or managing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A cache entry is missing a required file or the file does not parse.
    #[error("corrupt cache entry: {file}: {reason}")]
    Corrupt {
        /// The missing or unreadable file.
        file: PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// A catalog could not be serialized.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// A string is not a `<circuit>/<config>` cache key.
    #[error("invalid cache key '{0}'")]
    InvalidKey(String),
}

impl CacheError {
    /// Returns `true` for the recoverable corrupt-entry condition.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, CacheError::Corrupt { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = CacheError::Io {
            path: PathBuf::from("/tmp/cache/ab/cd"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("cache I/O error"));
        assert!(msg.contains("/tmp/cache/ab/cd"));
        assert!(!err.is_corrupt());
    }

    #[test]
    fn corrupt_display() {
        let err = CacheError::Corrupt {
            file: PathBuf::from("command.json"),
            reason: "file is missing".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("corrupt cache entry"));
        assert!(msg.contains("command.json"));
        assert!(err.is_corrupt());
    }

    #[test]
    fn serialization_error_display() {
        let err = CacheError::Serialization {
            reason: "key must be a string".to_string(),
        };
        assert!(err.to_string().contains("key must be a string"));
    }

    #[test]
    fn invalid_key_display() {
        let err = CacheError::InvalidKey("nope".to_string());
        assert_eq!(err.to_string(), "invalid cache key 'nope'");
    }
}
