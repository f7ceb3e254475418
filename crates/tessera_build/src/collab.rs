//! Interfaces to the collaborators the pipeline drives but does not implement.
//!
//! The elaborator turns a design generator into a [`CircuitDescriptor`],
//! compiled annotations and HDL text. The harness generator produces the C++
//! bridge that exposes the simulator's signals to a step/poke/peek protocol.

use tessera_config::{BuildConfiguration, CanonicalConfig};
use tessera_ir::{CircuitDescriptor, CompiledAnnotations};

/// Failure reported by an external collaborator, carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ElaborationError {
    /// The collaborator's message.
    pub message: String,
}

impl ElaborationError {
    /// Creates an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for ElaborationError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

/// Output of elaborating a design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Elaboration {
    /// Structural description of the circuit.
    pub descriptor: CircuitDescriptor,
    /// Annotations attached by the compiler.
    pub annotations: CompiledAnnotations,
    /// HDL text, if elaboration already emitted it.
    pub hdl: Option<String>,
}

/// Turns a design generator into an elaborated circuit.
///
/// Any `Fn(&BuildConfiguration) -> Result<Elaboration, ElaborationError>` is an
/// elaborator, so a design generator closure can be passed directly.
pub trait Elaborator {
    /// Elaborates the design under `config`.
    fn elaborate(&self, config: &BuildConfiguration) -> Result<Elaboration, ElaborationError>;

    /// Returns the HDL text for an elaboration. Only called when building.
    fn emit_hdl(&self, elaboration: &Elaboration) -> Result<String, ElaborationError> {
        elaboration.hdl.clone().ok_or_else(|| {
            ElaborationError::new(format!(
                "elaboration of {} produced no HDL",
                elaboration.descriptor.name
            ))
        })
    }
}

impl<F> Elaborator for F
where
    F: Fn(&BuildConfiguration) -> Result<Elaboration, ElaborationError>,
{
    fn elaborate(&self, config: &BuildConfiguration) -> Result<Elaboration, ElaborationError> {
        self(config)
    }
}

/// Inputs to harness generation.
#[derive(Debug, Clone, Copy)]
pub struct HarnessRequest<'a> {
    /// The circuit to wrap.
    pub descriptor: &'a CircuitDescriptor,
    /// Waveform destination relative to the simulator's working directory,
    /// present only when tracing is enabled.
    pub trace_file: Option<&'a str>,
    /// Coverage destination relative to the simulator's working directory,
    /// present only when coverage is requested.
    pub coverage_file: Option<&'a str>,
    /// The canonical build configuration.
    pub config: &'a CanonicalConfig,
}

/// An extra file the harness needs next to it, typically a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportFile {
    /// File name relative to the build directory.
    pub name: String,
    /// File contents.
    pub contents: String,
}

/// Generated harness sources.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HarnessSource {
    /// The harness translation unit.
    pub harness: String,
    /// Headers and other files copied into the build directory.
    pub support_files: Vec<SupportFile>,
}

/// Produces the C++ harness for a circuit.
pub trait HarnessGenerator {
    /// Generates harness sources for `request`.
    fn generate(&self, request: &HarnessRequest<'_>) -> Result<HarnessSource, ElaborationError>;
}
