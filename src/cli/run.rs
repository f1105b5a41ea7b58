//! CLI entry point
//!
//! Owns everything the binary does: argument parsing, logging setup,
//! configuration, the run itself, and all error output. `main.rs` only maps
//! the returned [`ExitCode`] to the process exit status.

use clap::Parser;
use std::io;
use tracing::{debug, info};

use super::args::Cli;
use crate::config::CiConfig;
use crate::environment::CiEnvironment;
use crate::error::CiError;
use crate::exit_codes::ExitCode;
use crate::logging;
use crate::phase::{PlanOptions, plan};
use crate::pipeline::{Pipeline, write_plan};
use parsec_ci_runner::NativeRunner;

/// Main CLI execution function.
///
/// Returns `Ok(())` when every phase that ran succeeded, otherwise the exit
/// code the process should terminate with. Tool output has already been
/// relayed by the pipeline; this only adds a single `error:` line.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = logging::init_tracing(cli.verbose) {
        eprintln!("warning: failed to initialize logging: {e}");
    }

    execute(&cli).map_err(|err| {
        eprintln!("error: {err}");
        err.to_exit_code()
    })
}

fn execute(cli: &Cli) -> Result<(), CiError> {
    let config = CiConfig::discover(&cli.config_args())?;
    for (key, source) in &config.source_attribution {
        debug!(%key, %source, "Resolved configuration value");
    }

    // Fixed before anything is spawned, shared read-only by every step.
    let env = CiEnvironment::from_config(&config);
    for (key, value) in env.iter() {
        info!(%key, %value, "CI environment");
    }

    let phases = plan(
        &config,
        &env,
        PlanOptions {
            skip_static_checks: cli.skip_static_checks,
        },
    );

    if cli.dry_run {
        write_plan(&phases, &mut io::stdout().lock())?;
        return Ok(());
    }

    let mut pipeline = Pipeline::new(NativeRunner::new(), io::stdout(), io::stderr());
    pipeline.run(&phases)?;
    Ok(())
}
