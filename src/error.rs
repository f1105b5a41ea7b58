//! Error types for the CI driver.
//!
//! Only two outcomes of a run are errors: a required step failing (fatal,
//! propagated at once) and invalid configuration (rejected before any phase
//! runs). An optional analyzer that is missing is not an error; see
//! [`crate::probe::Capability`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::exit_codes::ExitCode;
use crate::phase::PhaseId;
use crate::pipeline::PipelineState;
use parsec_ci_runner::RunnerError;

#[derive(Error, Debug)]
pub enum CiError {
    /// A required step ran and exited unsuccessfully.
    #[error("{phase} phase failed: '{step}' exited with {}", describe_exit(.exit_code))]
    StepFailed {
        phase: PhaseId,
        step: String,
        exit_code: Option<i32>,
    },

    /// A required step could not be spawned at all.
    #[error("{phase} phase failed: '{step}' could not be run: {source}")]
    Runner {
        phase: PhaseId,
        step: String,
        #[source]
        source: RunnerError,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to relay tool output: {0}")]
    Output(#[from] io::Error),

    #[error("invalid pipeline transition from {from} to {to}")]
    InvalidTransition {
        from: PipelineState,
        to: PipelineState,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl CiError {
    /// Map the error to the driver's exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::StepFailed { exit_code, .. } => ExitCode::from_child(*exit_code),
            Self::Config(_) => ExitCode::CLI_ARGS,
            Self::Runner { .. } | Self::Output(_) | Self::InvalidTransition { .. } => {
                ExitCode::INTERNAL
            }
        }
    }

    /// Phase in which the run failed, if the failure came from a step.
    #[must_use]
    pub fn phase(&self) -> Option<PhaseId> {
        match self {
            Self::StepFailed { phase, .. } | Self::Runner { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}
