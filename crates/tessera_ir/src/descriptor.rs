//! The structural descriptor of an elaborated circuit.
//!
//! A [`CircuitDescriptor`] names the top-level circuit, lists its ports, and
//! carries one structural fingerprint per module. Fingerprints are computed by
//! the elaboration collaborator over a canonical rendering of each module, so
//! the descriptor is independent of elaboration order.

use serde::{Deserialize, Serialize};
use tessera_common::ContentHash;

use crate::port::Port;

/// Structural fingerprint of a single module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleFingerprint {
    /// The module name, unique within the design.
    pub name: String,
    /// Hash over the module's canonical ports, signals and statements.
    pub hash: ContentHash,
}

impl ModuleFingerprint {
    /// Fingerprints a module from its canonical textual rendering.
    pub fn from_canonical(name: impl Into<String>, canonical: &str) -> Self {
        Self {
            name: name.into(),
            hash: ContentHash::from_bytes(canonical.as_bytes()),
        }
    }
}

/// Immutable structural description of an elaborated circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitDescriptor {
    /// The top-level circuit name.
    pub name: String,
    /// Ports of the top-level module, in declaration order.
    #[serde(default)]
    pub ports: Vec<Port>,
    /// One fingerprint per module, in elaboration order.
    #[serde(default)]
    pub modules: Vec<ModuleFingerprint>,
}

impl CircuitDescriptor {
    /// Creates a descriptor.
    pub fn new(name: impl Into<String>, ports: Vec<Port>, modules: Vec<ModuleFingerprint>) -> Self {
        Self {
            name: name.into(),
            ports,
            modules,
        }
    }

    /// Returns the module fingerprints sorted by module name.
    ///
    /// Ties on name are broken by hash so the order is total.
    pub fn sorted_modules(&self) -> Vec<&ModuleFingerprint> {
        let mut modules: Vec<&ModuleFingerprint> = self.modules.iter().collect();
        modules.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.hash.cmp(&b.hash)));
        modules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortCategory;

    fn adder() -> CircuitDescriptor {
        CircuitDescriptor::new(
            "Adder",
            vec![
                Port::new("clock", PortCategory::Clock),
                Port::new("reset", PortCategory::Reset),
                Port::new("a", PortCategory::Input),
                Port::new("b", PortCategory::Input),
                Port::new("sum", PortCategory::Output),
            ],
            vec![
                ModuleFingerprint::from_canonical("Adder", "sum = a + b"),
                ModuleFingerprint::from_canonical("FullAdder", "s = x ^ y ^ c"),
            ],
        )
    }

    #[test]
    fn sorted_modules_orders_by_name() {
        let mut d = adder();
        d.modules.reverse();
        let names: Vec<&str> = d.sorted_modules().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Adder", "FullAdder"]);
    }

    #[test]
    fn fingerprint_depends_on_structure() {
        let a = ModuleFingerprint::from_canonical("M", "x = 1");
        let b = ModuleFingerprint::from_canonical("M", "x = 2");
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn descriptor_serde_roundtrip() {
        let d = adder();
        let json = serde_json::to_string(&d).unwrap();
        let back: CircuitDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let d: CircuitDescriptor = serde_json::from_str(r#"{"name": "Empty"}"#).unwrap();
        assert!(d.ports.is_empty());
        assert!(d.modules.is_empty());
    }
}
