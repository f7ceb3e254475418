//! Port records for a circuit's top-level interface.
//!
//! Ports are produced once by elaboration as an explicit list of
//! `{name, category}` records rather than discovered by reflection.

use serde::{Deserialize, Serialize};

/// The role of a top-level port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortCategory {
    /// The implicit clock input.
    Clock,
    /// The implicit reset input.
    Reset,
    /// A data input.
    Input,
    /// A data output.
    Output,
}

/// A port in the top-level interface of a circuit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Port {
    /// The port name as written in the design.
    pub name: String,
    /// The role of the port.
    pub category: PortCategory,
}

impl Port {
    /// Creates a port record.
    pub fn new(name: impl Into<String>, category: PortCategory) -> Self {
        Self {
            name: name.into(),
            category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_construction() {
        let p = Port::new("sum", PortCategory::Output);
        assert_eq!(p.name, "sum");
        assert_eq!(p.category, PortCategory::Output);
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&PortCategory::Clock).unwrap();
        assert_eq!(json, "\"clock\"");
    }

    #[test]
    fn port_serde_roundtrip() {
        let p = Port::new("reset", PortCategory::Reset);
        let json = serde_json::to_string(&p).unwrap();
        let restored: Port = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, p);
    }
}
