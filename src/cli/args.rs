//! CLI argument definitions
//!
//! The driver takes no required arguments. Unknown flags are rejected by
//! clap with exit code 2 before any phase runs.

use clap::Parser;
use std::path::PathBuf;

use crate::config::CliArgs;

/// parsec-ci - continuous-integration driver for parsec-tool
#[derive(Parser, Debug)]
#[command(name = "parsec-ci")]
#[command(about = "Build, lint, smoke-test and functionally test parsec-tool against a running Parsec service")]
#[command(long_about = r#"
Runs the CI phases in a fixed order, stopping at the first failure:

  build            cargo build; cargo build --features spiffe-auth
  static-analysis  cargo fmt --all -- --check; cargo clippy --all-targets (each skipped if unavailable)
  cli-smoke        <parsec-tool> --help
  functional-suite tests/parsec-cli-tests.sh -d

Every command sees PARSEC_SERVICE_ENDPOINT=unix:/tmp/parsec.sock and RUST_LOG=error.
The exit status is that of the first failing command, or 0 if all passed.

CONFIGURATION:
  Precedence: CLI flags > PARSEC_TOOL env > config file > defaults
  The config file is --config, or the nearest .parsec-ci.toml above the workspace.
  Set PARSEC_CI_LOG to change the driver's own log filter.
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory the CI commands run in (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Print the planned commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the formatter and linter phase
    #[arg(long)]
    pub skip_static_checks: bool,

    /// Enable debug logging for the driver
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    #[must_use]
    pub fn config_args(&self) -> CliArgs {
        CliArgs {
            config_path: self.config.clone(),
            workspace: self.workspace.clone(),
        }
    }
}
