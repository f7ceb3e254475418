//! Tessera CLI: compile design bundles into cached native simulators.
//!
//! Provides `tessera build` to run the compilation pipeline, `tessera key` to
//! print a bundle's cache key without building, and `tessera cache` to list and
//! maintain cache entries.

#![warn(missing_docs)]

mod build;
mod bundle;
mod cache;
mod key;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use tessera_cache::CacheKey;
use tracing_subscriber::EnvFilter;

/// Tessera: cached compilation of circuits into native simulators.
#[derive(Parser, Debug)]
#[command(name = "tessera", version, about = "Tessera simulator build cache")]
pub struct Cli {
    /// Suppress all output except errors and results.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a design bundle into a simulator.
    Build(BuildArgs),
    /// Print the cache key of a design bundle.
    Key(KeyArgs),
    /// Inspect or maintain the cache.
    Cache(CacheArgs),
}

/// Arguments for the `tessera build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Bundle directory containing `design.json` and `harness.cpp`.
    pub bundle: PathBuf,

    /// Working directory (default: `<bundle>/build`).
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Build without consulting or populating the cache.
    #[arg(long)]
    pub no_cache: bool,
}

/// Arguments for the `tessera key` subcommand.
#[derive(Parser, Debug)]
pub struct KeyArgs {
    /// Bundle directory containing `design.json`.
    pub bundle: PathBuf,

    /// Also print the canonical build configuration as JSON.
    #[arg(long)]
    pub show_config: bool,
}

/// Arguments for the `tessera cache` subcommand.
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Project directory whose `tessera.toml` names the cache root.
    #[arg(long, default_value = ".")]
    pub project: PathBuf,

    /// Cache root, overriding the project configuration.
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// The cache operation.
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache maintenance operations.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CacheAction {
    /// List entries and whether they are complete.
    List,
    /// Remove one entry.
    Remove {
        /// Entry key as `<circuit-hash>/<config-hash>`.
        key: CacheKey,
    },
    /// Remove entries that were never finalized.
    ///
    /// An unfinalized entry may be a build still running in another process.
    /// Entries written to within `--min-age` seconds are kept so such builds
    /// are not broken.
    Prune {
        /// Minimum seconds since an entry was last written before it is removed.
        #[arg(long, default_value_t = DEFAULT_PRUNE_AGE_SECS)]
        min_age: u64,
    },
    /// Remove every entry.
    Clean,
}

/// Default for `tessera cache prune --min-age`.
pub const DEFAULT_PRUNE_AGE_SECS: u64 = 3600;

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let global = GlobalArgs { quiet: cli.quiet };
    let result = match cli.command {
        Command::Build(ref args) => build::run(args, &global),
        Command::Key(ref args) => key::run(args),
        Command::Cache(ref args) => cache::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the log subscriber. `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet { "error" } else { level_for(verbose) };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
