//! Error types for the runner crate

use thiserror::Error;

/// Failures that prevent a child process from producing an exit status.
///
/// A child that runs and exits non-zero is NOT an error at this layer; that
/// is reported through [`crate::ProcessOutput::exit_code`].
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("failed to spawn '{program}': {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("failed to wait for '{program}': {reason}")]
    WaitFailed { program: String, reason: String },
}

impl RunnerError {
    /// Name of the program the error refers to.
    #[must_use]
    pub fn program(&self) -> &str {
        match self {
            Self::SpawnFailed { program, .. } | Self::WaitFailed { program, .. } => program,
        }
    }
}
