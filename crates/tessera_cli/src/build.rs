//! `tessera build`: compile a design bundle into a simulator.

use std::error::Error;
use std::path::PathBuf;

use tessera_build::{CompilationPipeline, PipelineOptions, VerilatorToolchain};
use tracing::debug;

use crate::bundle::{BundleElaborator, BundleHarness};
use crate::{BuildArgs, GlobalArgs};

/// Working directory used when `--work-dir` is not given, relative to the bundle.
pub const DEFAULT_WORK_DIR: &str = "build";

/// Runs the `tessera build` command.
///
/// Prints the outcome to stderr and the run command to stdout.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let config = tessera_config::load_config(&args.bundle)?;
    let mut cache = config.cache.clone();
    if args.no_cache {
        cache.enabled = false;
    }
    let work_dir = work_dir(args);
    debug!(bundle = %args.bundle.display(), work_dir = %work_dir.display(), "building bundle");

    let pipeline = CompilationPipeline::new(
        BundleElaborator::new(&args.bundle),
        BundleHarness::new(&args.bundle),
        VerilatorToolchain::new(config.toolchain.clone()),
    );
    let report = pipeline.run(&config.build, &PipelineOptions::new(work_dir, cache))?;

    if !global.quiet {
        eprintln!(
            "    Finished {} ({}) in {}",
            report.handle.design().name,
            report.outcome,
            report.build_dir.display()
        );
        if let Some(key) = report.key {
            eprintln!("         Key {key}");
        }
    }
    println!("{}", report.handle.command().join(" "));
    Ok(0)
}

fn work_dir(args: &BuildArgs) -> PathBuf {
    args.work_dir
        .clone()
        .unwrap_or_else(|| args.bundle.join(DEFAULT_WORK_DIR))
}
