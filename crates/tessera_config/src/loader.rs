//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;

/// Name of the configuration file within a project directory.
pub const CONFIG_FILE: &str = "tessera.toml";

/// Loads and validates a `tessera.toml` configuration from a project directory.
///
/// A missing file yields the default configuration. Relative paths in the
/// file (cache root, command-edit file) are resolved against `project_dir`.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let mut config = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        load_config_from_str(&content)?
    } else {
        ProjectConfig::default()
    };

    if config.cache.root.is_relative() {
        config.cache.root = project_dir.join(&config.cache.root);
    }
    if let Some(edits) = config.build.command_edits.as_mut() {
        if edits.is_relative() {
            *edits = project_dir.join(&*edits);
        }
    }
    Ok(config)
}

/// Parses and validates a `tessera.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies. Paths are left as written.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configuration values are usable.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.toolchain.verilator.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "toolchain.verilator is empty".to_string(),
        ));
    }
    if config.toolchain.make.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "toolchain.make is empty".to_string(),
        ));
    }
    if config.cache.root.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError("cache.root is empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CoverageMode;
    use std::path::PathBuf;

    #[test]
    fn parse_full_config() {
        let toml = r#"
[build]
trace = true
coverage = ["line", "user"]
verilator_flags = ["-Wno-fatal"]
cflags = ["-O1"]
ldflags = "-lm"
command = "./VTop +verbose"
command_edits = "edits.txt"

[cache]
enabled = false
root = "/var/cache/tessera"

[toolchain]
verilator = "/opt/verilator/bin/verilator"
make = "gmake"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert!(config.build.trace);
        assert_eq!(
            config.build.coverage,
            vec![CoverageMode::Line, CoverageMode::User]
        );
        assert_eq!(config.build.verilator_flags, vec!["-Wno-fatal"]);
        assert_eq!(config.build.ldflags, vec!["-lm"]);
        assert_eq!(config.build.command.as_deref(), Some("./VTop +verbose"));
        assert_eq!(config.build.command_edits, Some(PathBuf::from("edits.txt")));
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.root, PathBuf::from("/var/cache/tessera"));
        assert_eq!(config.toolchain.make, "gmake");
    }

    #[test]
    fn invalid_toml_errors() {
        let toml = "this is not valid toml {{{}}}";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn empty_executable_rejected() {
        let toml = r#"
[toolchain]
make = " "
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn empty_cache_root_rejected() {
        let toml = r#"
[cache]
root = ""
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.root, dir.path().join(".tessera-cache"));
    }

    #[test]
    fn relative_paths_resolved_against_project() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[build]\ncommand_edits = \"edits.txt\"\n[cache]\nroot = \"cache\"\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.cache.root, dir.path().join("cache"));
        assert_eq!(
            config.build.command_edits,
            Some(dir.path().join("edits.txt"))
        );
    }
}
