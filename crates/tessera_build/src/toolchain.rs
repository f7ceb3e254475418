//! The native build toolchain.
//!
//! Building a simulator takes two blocking subprocess calls: the HDL compiler
//! translates HDL and harness into C++ plus a makefile, then the build driver
//! compiles and links that into an executable. Neither call is retried and no
//! timeout is applied.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tessera_cache::ToolVersion;
use tessera_config::{CanonicalConfig, ToolchainConfig};
use tracing::{debug, warn};

use crate::error::BuildError;

/// Version reported when a tool cannot be probed.
const UNKNOWN_VERSION: &str = "unavailable";

/// Everything a toolchain needs to build one simulator.
#[derive(Debug, Clone, Copy)]
pub struct NativeJob<'a> {
    /// Top-level circuit name.
    pub top: &'a str,
    /// Absolute directory holding the sources; the executable is produced here.
    pub build_dir: &'a Path,
    /// The emitted HDL file.
    pub hdl_file: &'a Path,
    /// The generated harness file.
    pub harness_file: &'a Path,
    /// The canonical build configuration.
    pub config: &'a CanonicalConfig,
}

impl NativeJob<'_> {
    /// Directory for the intermediate C++ and objects.
    pub fn object_dir(&self) -> PathBuf {
        self.build_dir.join("obj_dir")
    }

    /// Name of the produced executable.
    pub fn binary_name(&self) -> String {
        binary_name(self.top)
    }

    /// Path of the produced executable.
    pub fn binary_path(&self) -> PathBuf {
        self.build_dir.join(self.binary_name())
    }
}

/// Returns the executable name produced for circuit `top`.
pub fn binary_name(top: &str) -> String {
    format!("V{top}")
}

/// A native toolchain that can compile and link a simulator.
pub trait Toolchain {
    /// Version identifiers of every external tool, folded into the cache key.
    fn versions(&self) -> Vec<ToolVersion>;

    /// Translates HDL and harness into a native intermediate.
    fn compile(&self, job: &NativeJob<'_>) -> Result<(), BuildError>;

    /// Builds the intermediate into an executable and returns its path.
    fn link(&self, job: &NativeJob<'_>) -> Result<PathBuf, BuildError>;
}

/// Verilator followed by make.
#[derive(Debug, Clone, Default)]
pub struct VerilatorToolchain {
    config: ToolchainConfig,
}

impl VerilatorToolchain {
    /// Creates a toolchain using the configured executables.
    pub fn new(config: ToolchainConfig) -> Self {
        Self { config }
    }

    /// Arguments for the HDL compiler step.
    pub fn compile_args(&self, job: &NativeJob<'_>) -> Vec<String> {
        let config = job.config;
        let mut args = vec![
            "--cc".to_string(),
            "--exe".to_string(),
            "-Mdir".to_string(),
            job.object_dir().display().to_string(),
            "--top-module".to_string(),
            job.top.to_string(),
            "-o".to_string(),
            job.binary_path().display().to_string(),
        ];
        if config.trace {
            args.push("--trace".to_string());
        }
        args.extend(config.coverage.iter().map(|mode| mode.flag().to_string()));
        args.extend(config.verilator_flags.iter().cloned());

        // Support headers are written next to the harness.
        args.push("-CFLAGS".to_string());
        args.push(format!("-I{}", job.build_dir.display()));
        for flag in &config.cflags {
            args.push("-CFLAGS".to_string());
            args.push(flag.clone());
        }
        for flag in &config.ldflags {
            args.push("-LDFLAGS".to_string());
            args.push(flag.clone());
        }

        args.push(job.hdl_file.display().to_string());
        args.push(job.harness_file.display().to_string());
        args
    }

    /// Arguments for the build driver step.
    pub fn link_args(&self, job: &NativeJob<'_>) -> Vec<String> {
        vec![
            "-C".to_string(),
            job.object_dir().display().to_string(),
            "-f".to_string(),
            format!("{}.mk", job.binary_name()),
        ]
    }
}

impl Toolchain for VerilatorToolchain {
    fn versions(&self) -> Vec<ToolVersion> {
        vec![
            probe_version("verilator", &self.config.verilator),
            probe_version("make", &self.config.make),
        ]
    }

    fn compile(&self, job: &NativeJob<'_>) -> Result<(), BuildError> {
        run_tool(
            "verilator",
            &self.config.verilator,
            &self.compile_args(job),
            job.build_dir,
        )?;
        Ok(())
    }

    fn link(&self, job: &NativeJob<'_>) -> Result<PathBuf, BuildError> {
        run_tool("make", &self.config.make, &self.link_args(job), job.build_dir)?;
        Ok(job.binary_path())
    }
}

/// Runs `program` to completion in `cwd`, capturing its output.
///
/// A non-zero exit becomes [`BuildError::ToolFailed`] carrying the captured
/// standard error; a launch failure becomes [`BuildError::ToolLaunch`].
pub fn run_tool(tool: &str, program: &str, args: &[String], cwd: &Path) -> Result<Output, BuildError> {
    debug!(tool, program, ?args, cwd = %cwd.display(), "running build step");
    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .output()
        .map_err(|e| BuildError::ToolLaunch {
            tool: tool.to_string(),
            source: e,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        warn!(tool, status = %output.status, "build step failed");
        return Err(BuildError::ToolFailed {
            tool: tool.to_string(),
            exit_code: output.status.code(),
            stderr,
        });
    }
    Ok(output)
}

/// Runs `<program> --version` and keeps the first line of its output.
fn probe_version(tool: &str, program: &str) -> ToolVersion {
    let version = Command::new(program)
        .arg("--version")
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| {
            String::from_utf8_lossy(&out.stdout)
                .lines()
                .next()
                .map(|line| line.trim().to_string())
        })
        .filter(|line| !line.is_empty());

    match version {
        Some(version) => ToolVersion::new(tool, version),
        None => {
            warn!(tool, program, "could not determine tool version");
            ToolVersion::new(tool, UNKNOWN_VERSION)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_config::{BuildConfiguration, CoverageMode};

    fn job<'a>(dir: &'a Path, config: &'a CanonicalConfig) -> NativeJob<'a> {
        NativeJob {
            top: "Adder",
            build_dir: dir,
            hdl_file: Path::new("/build/Adder.v"),
            harness_file: Path::new("/build/Adder-harness.cpp"),
            config,
        }
    }

    #[test]
    fn compile_args_reflect_configuration() {
        let config = BuildConfiguration {
            trace: true,
            coverage: vec![CoverageMode::Toggle, CoverageMode::Line],
            verilator_flags: vec!["-Wno-fatal".to_string()],
            cflags: vec!["-O1".to_string()],
            ldflags: vec!["-lm".to_string()],
            ..Default::default()
        }
        .canonicalize()
        .unwrap();
        let toolchain = VerilatorToolchain::default();
        let args = toolchain.compile_args(&job(Path::new("/build"), &config));

        assert!(args.contains(&"--trace".to_string()));
        let line = args.iter().position(|a| a == "--coverage-line").unwrap();
        let toggle = args.iter().position(|a| a == "--coverage-toggle").unwrap();
        assert!(line < toggle);
        assert!(args.contains(&"-Wno-fatal".to_string()));
        assert!(args.windows(2).any(|w| w == ["-CFLAGS", "-O1"]));
        assert!(args.windows(2).any(|w| w == ["-LDFLAGS", "-lm"]));
        assert!(args.windows(2).any(|w| w == ["--top-module", "Adder"]));
        assert_eq!(args.last().map(String::as_str), Some("/build/Adder-harness.cpp"));
    }

    #[test]
    fn untraced_build_has_no_trace_flag() {
        let config = BuildConfiguration::default().canonicalize().unwrap();
        let args = VerilatorToolchain::default().compile_args(&job(Path::new("/build"), &config));
        assert!(!args.contains(&"--trace".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--coverage")));
    }

    #[test]
    fn link_args_use_generated_makefile() {
        let config = BuildConfiguration::default().canonicalize().unwrap();
        let args = VerilatorToolchain::default().link_args(&job(Path::new("/build"), &config));
        assert_eq!(args, vec!["-C", "/build/obj_dir", "-f", "VAdder.mk"]);
    }

    #[cfg(unix)]
    #[test]
    fn run_tool_reports_exit_code_and_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let args = vec!["-c".to_string(), "echo boom >&2; exit 3".to_string()];
        let err = run_tool("verilator", "sh", &args, dir.path()).unwrap_err();
        match err {
            BuildError::ToolFailed {
                tool,
                exit_code,
                stderr,
            } => {
                assert_eq!(tool, "verilator");
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr.trim(), "boom");
            }
            other => panic!("expected ToolFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn run_tool_success_captures_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let args = vec!["-c".to_string(), "echo ok".to_string()];
        let out = run_tool("make", "sh", &args, dir.path()).unwrap();
        assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "ok");
    }

    #[test]
    fn missing_program_is_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_tool("verilator", "/nonexistent/verilator", &[], dir.path()).unwrap_err();
        assert!(matches!(err, BuildError::ToolLaunch { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn failing_toolchain_step_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfiguration::default().canonicalize().unwrap();
        let toolchain = VerilatorToolchain::new(ToolchainConfig {
            verilator: "true".to_string(),
            make: "false".to_string(),
        });
        let job = job(dir.path(), &config);
        toolchain.compile(&job).unwrap();
        let err = toolchain.link(&job).unwrap_err();
        assert!(matches!(
            err,
            BuildError::ToolFailed { ref tool, exit_code: Some(1), .. } if tool == "make"
        ));
    }

    #[test]
    fn unprobeable_tool_reports_unavailable() {
        let v = probe_version("verilator", "/nonexistent/verilator");
        assert_eq!(v, ToolVersion::new("verilator", UNKNOWN_VERSION));
    }
}
