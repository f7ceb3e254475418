//! Parsing, validation and canonicalization of `tessera.toml` build settings.
//!
//! This crate reads the project configuration file into a strongly-typed
//! [`ProjectConfig`] and reduces its [`BuildConfiguration`] to a
//! [`CanonicalConfig`] whose serialized form is stable across semantically
//! equal configurations.

#![warn(missing_docs)]

pub mod canonical;
pub mod edits;
pub mod error;
pub mod loader;
pub mod types;

pub use canonical::CanonicalConfig;
pub use edits::{apply_command_edits, parse_command_edits, CommandEdit};
pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use types::*;
