//! `tessera key`: print the cache key of a design bundle without building it.

use std::error::Error;
use std::path::Path;

use tessera_build::{CompilationPipeline, Elaborator, VerilatorToolchain};
use tessera_cache::CacheKey;
use tessera_config::CanonicalConfig;

use crate::bundle::{BundleElaborator, BundleHarness};
use crate::KeyArgs;

/// Runs the `tessera key` command.
pub fn run(args: &KeyArgs) -> Result<i32, Box<dyn Error>> {
    let (key, canonical) = compute(&args.bundle)?;
    if args.show_config {
        println!("{}", serde_json::to_string_pretty(&canonical)?);
    }
    println!("{key}");
    Ok(0)
}

/// Elaborates the bundle and computes its key under the bundle's configuration.
pub fn compute(bundle: &Path) -> Result<(CacheKey, CanonicalConfig), Box<dyn Error>> {
    let config = tessera_config::load_config(bundle)?;
    let pipeline = CompilationPipeline::new(
        BundleElaborator::new(bundle),
        BundleHarness::new(bundle),
        VerilatorToolchain::new(config.toolchain.clone()),
    );
    let elaboration = pipeline.elaborator().elaborate(&config.build)?;
    let canonical = config.build.canonicalize()?;
    let key = pipeline.cache_key(&elaboration, &canonical);
    Ok((key, canonical))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOOLCHAIN: &str = "[toolchain]\nverilator = \"/nonexistent/verilator\"\nmake = \"/nonexistent/make\"\n";

    fn bundle(dir: &Path, config: &str) {
        std::fs::write(
            dir.join("design.json"),
            r#"{"descriptor": {"name": "Top", "modules": [
                {"name": "Top", "hash": "ffeeddccbbaa99887766554433221100"}
            ]}, "hdl": "Top.v"}"#,
        )
        .unwrap();
        std::fs::write(dir.join("Top.v"), "module Top; endmodule").unwrap();
        std::fs::write(dir.join("harness.cpp"), "int main() {}").unwrap();
        std::fs::write(dir.join("tessera.toml"), format!("{TOOLCHAIN}{config}")).unwrap();
    }

    #[test]
    fn key_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        bundle(dir.path(), "");
        let (a, _) = compute(dir.path()).unwrap();
        let (b, _) = compute(dir.path()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn editing_bundle_sources_changes_circuit_hash() {
        let dir = tempfile::tempdir().unwrap();
        bundle(dir.path(), "");
        let (original, _) = compute(dir.path()).unwrap();

        std::fs::write(dir.path().join("harness.cpp"), "int main() { return 2; }").unwrap();
        let (harness_edit, _) = compute(dir.path()).unwrap();
        assert_ne!(original.circuit_hash, harness_edit.circuit_hash);
        assert_eq!(original.config_hash, harness_edit.config_hash);

        std::fs::write(dir.path().join("Top.v"), "module Top(input a); endmodule").unwrap();
        let (hdl_edit, _) = compute(dir.path()).unwrap();
        assert_ne!(harness_edit, hdl_edit);
    }

    #[test]
    fn key_matches_pipeline_derivation() {
        use tessera_build::{Toolchain, BUILDER_TOOL, BUILDER_VERSION};
        use tessera_cache::{CacheKeyBuilder, ToolVersion};

        let dir = tempfile::tempdir().unwrap();
        bundle(dir.path(), "");
        let (key, canonical) = compute(dir.path()).unwrap();

        let config = tessera_config::load_config(dir.path()).unwrap();
        let elaboration = BundleElaborator::new(dir.path())
            .elaborate(&config.build)
            .unwrap();
        let mut versions = VerilatorToolchain::new(config.toolchain.clone()).versions();
        let tools_only = CacheKeyBuilder::new(versions.clone()).build(
            &elaboration.descriptor,
            &elaboration.annotations,
            &canonical,
        );
        versions.push(ToolVersion::new(BUILDER_TOOL, BUILDER_VERSION));
        let expected = CacheKeyBuilder::new(versions).build(
            &elaboration.descriptor,
            &elaboration.annotations,
            &canonical,
        );
        assert_eq!(key, expected);
        assert_ne!(key.config_hash, tools_only.config_hash);
    }

    #[test]
    fn build_settings_change_only_config_hash() {
        let plain = tempfile::tempdir().unwrap();
        bundle(plain.path(), "");
        let traced = tempfile::tempdir().unwrap();
        bundle(traced.path(), "[build]\ntrace = true\n");

        let (a, _) = compute(plain.path()).unwrap();
        let (b, canonical) = compute(traced.path()).unwrap();
        assert!(canonical.trace);
        assert_eq!(a.circuit_hash, b.circuit_hash);
        assert_ne!(a.config_hash, b.config_hash);
    }

    #[test]
    fn cache_location_does_not_change_key() {
        let a_dir = tempfile::tempdir().unwrap();
        bundle(a_dir.path(), "[cache]\nroot = \"/tmp/one\"\n");
        let b_dir = tempfile::tempdir().unwrap();
        bundle(b_dir.path(), "[cache]\nroot = \"/tmp/two\"\nenabled = false\n");
        assert_eq!(compute(a_dir.path()).unwrap().0, compute(b_dir.path()).unwrap().0);
    }
}
