//! Structured logging for the driver
//!
//! Driver logs go to stderr so that stdout carries only relayed tool output.
//! The filter is read from `PARSEC_CI_LOG`; `RUST_LOG` is left alone because
//! the driver sets it for the tools it runs.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the driver's own log filter.
pub const LOG_FILTER_VAR: &str = "PARSEC_CI_LOG";

/// Default filter directive when `PARSEC_CI_LOG` is unset or invalid.
#[must_use]
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "parsec_ci=debug,parsec_ci_runner=debug,warn"
    } else {
        "parsec_ci=info,warn"
    }
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_env(LOG_FILTER_VAR)
        .or_else(|_| EnvFilter::try_new(default_directive(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_line_number(false)
                .with_file(false)
                .compact(),
        )
        .try_init()?;

    Ok(())
}
