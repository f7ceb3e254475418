//! Annotations produced by compiling a circuit.

use serde::{Deserialize, Serialize};

/// A non-clocked dependency edge between two top-level signals.
///
/// Simulators use these edges to decide settling order after a poke.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CombPath {
    /// The driving signal.
    pub source: String,
    /// The driven signal.
    pub sink: String,
}

impl CombPath {
    /// Creates a combinational path edge.
    pub fn new(source: impl Into<String>, sink: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            sink: sink.into(),
        }
    }
}

/// The annotation set emitted alongside a compiled circuit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledAnnotations {
    /// Combinational paths extracted by the compiler.
    #[serde(default)]
    pub comb_paths: Vec<CombPath>,
    /// A run-command override attached during compilation, as a shell-like
    /// whitespace-separated string.
    #[serde(default)]
    pub command_override: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        let a = CompiledAnnotations::default();
        assert!(a.comb_paths.is_empty());
        assert!(a.command_override.is_none());
    }

    #[test]
    fn comb_path_json_shape() {
        let p = CombPath::new("Adder.a", "Adder.sum");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"source":"Adder.a","sink":"Adder.sum"}"#);
    }
}
