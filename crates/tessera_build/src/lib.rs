//! Compilation of elaborated circuits into native simulators, with caching.
//!
//! The [`CompilationPipeline`] elaborates a design through an [`Elaborator`],
//! computes its cache key, and either restores a previously built artifact set
//! or emits HDL and harness sources and drives the native [`Toolchain`] to
//! produce a simulator. Either way the caller receives a [`BackendHandle`].

#![warn(missing_docs)]

pub mod collab;
pub mod error;
pub mod handle;
pub mod pipeline;
pub mod toolchain;

pub use collab::{
    Elaboration, ElaborationError, Elaborator, HarnessGenerator, HarnessRequest, HarnessSource,
    SupportFile,
};
pub use error::BuildError;
pub use handle::BackendHandle;
pub use pipeline::{
    BuildOutcome, CompilationPipeline, CompileReport, PipelineOptions, BUILDER_TOOL,
    BUILDER_VERSION, COVERAGE_FILE,
};
pub use toolchain::{binary_name, run_tool, NativeJob, Toolchain, VerilatorToolchain};
