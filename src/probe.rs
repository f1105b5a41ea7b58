//! Availability probing for optional tools
//!
//! Some CI hosts ship cargo without `rustfmt` or `clippy`. Before running an
//! optional analyzer the pipeline invokes its help output; a zero exit means
//! the tool is usable, anything else means it is absent and the step is
//! skipped.

use parsec_ci_runner::{CommandSpec, ProcessRunner};
use std::fmt;
use tracing::debug;

/// Result of an availability probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Available,
    Unavailable { reason: String },
}

impl Capability {
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => f.write_str("available"),
            Self::Unavailable { reason } => write!(f, "unavailable ({reason})"),
        }
    }
}

/// A named capability check run before an optional step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    /// Tool being probed, e.g. `rustfmt`
    pub tool: String,
    /// Help invocation whose exit status decides availability
    pub command: CommandSpec,
}

impl Probe {
    #[must_use]
    pub fn new(tool: impl Into<String>, command: CommandSpec) -> Self {
        Self {
            tool: tool.into(),
            command,
        }
    }

    /// Run the probe. Output is discarded; only the exit status matters.
    ///
    /// A probe never fails the run: a spawn error is reported as
    /// [`Capability::Unavailable`] like any other non-zero exit.
    pub fn detect<R: ProcessRunner>(&self, runner: &R) -> Capability {
        let capability = match runner.run(&self.command) {
            Ok(output) if output.success() => Capability::Available,
            Ok(output) => Capability::Unavailable {
                reason: match output.exit_code {
                    Some(code) => format!("`{}` exited with status {code}", self.command),
                    None => format!("`{}` was terminated by a signal", self.command),
                },
            },
            Err(err) => Capability::Unavailable {
                reason: err.to_string(),
            },
        };

        debug!(tool = %self.tool, capability = %capability, "Probed tool availability");
        capability
    }
}
