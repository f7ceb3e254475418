//! Structural description of an elaborated circuit.
//!
//! This crate defines [`CircuitDescriptor`], the typed [`Port`] list, and the
//! [`CompiledAnnotations`] produced by the elaboration collaborator. These are
//! the only views of a design the build pipeline ever sees: they are created
//! once per invocation and consumed read-only afterwards.

#![warn(missing_docs)]

pub mod annotation;
pub mod descriptor;
pub mod port;

pub use annotation::{CombPath, CompiledAnnotations};
pub use descriptor::{CircuitDescriptor, ModuleFingerprint};
pub use port::{Port, PortCategory};
