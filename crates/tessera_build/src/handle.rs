//! The handle returned to simulation drivers.

use std::sync::Arc;

use tessera_cache::{ArtifactCatalog, PortNameMap};
use tessera_ir::{CircuitDescriptor, CombPath};

/// A compiled simulator: the design plus the artifacts needed to drive it.
///
/// Read-only after construction. Two handles for the same circuit and
/// configuration compare equal whether they came from a build or the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendHandle {
    design: Arc<CircuitDescriptor>,
    catalog: ArtifactCatalog,
}

impl BackendHandle {
    /// Bundles a design with its artifact catalog.
    pub fn new(design: Arc<CircuitDescriptor>, catalog: ArtifactCatalog) -> Self {
        Self { design, catalog }
    }

    /// The compiled design.
    pub fn design(&self) -> &CircuitDescriptor {
        &self.design
    }

    /// The full artifact catalog.
    pub fn catalog(&self) -> &ArtifactCatalog {
        &self.catalog
    }

    /// Backend-visible names of all top-level ports.
    pub fn port_names(&self) -> &PortNameMap {
        &self.catalog.port_names
    }

    /// Backend-visible name of one port.
    pub fn port_name(&self, port: &str) -> Option<&str> {
        self.catalog.port_names.get(port).map(String::as_str)
    }

    /// Combinational paths between top-level signals.
    pub fn comb_paths(&self) -> &[CombPath] {
        &self.catalog.comb_paths
    }

    /// The simulator invocation; the first element is the executable.
    pub fn command(&self) -> &[String] {
        &self.catalog.command
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_ir::{Port, PortCategory};

    #[test]
    fn accessors_expose_catalog() {
        let design = CircuitDescriptor::new(
            "Top",
            vec![
                Port::new("clock", PortCategory::Clock),
                Port::new("io_in", PortCategory::Input),
            ],
            Vec::new(),
        );
        let catalog = ArtifactCatalog::new(
            &design,
            vec![CombPath::new("Top.io_in", "Top.io_out")],
            vec!["./VTop".to_string()],
        );
        let handle = BackendHandle::new(Arc::new(design), catalog);

        assert_eq!(handle.design().name, "Top");
        assert_eq!(handle.port_name("clock"), Some("clock"));
        assert_eq!(handle.port_name("io_in"), Some("Top.io_in"));
        assert_eq!(handle.port_name("missing"), None);
        assert_eq!(handle.comb_paths().len(), 1);
        assert_eq!(handle.command(), ["./VTop".to_string()]);
    }
}
