//! Exit code handling for parsec-ci.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | - | Every phase that ran succeeded |
//! | 1 | `INTERNAL` | Internal failure, unspawnable tool, or child killed by a signal |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | n | - | Exit code of the first failing child, propagated unchanged |

/// Process exit code for the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Internal failure or a child that exited without a code
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid flags or configuration
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Exit code to use when a child process fails.
    ///
    /// A non-zero child code is propagated as-is. A missing code (signal) or a
    /// child reporting 0 while still being treated as failed maps to `INTERNAL`,
    /// so a failing run never exits 0.
    #[must_use]
    pub const fn from_child(code: Option<i32>) -> ExitCode {
        match code {
            Some(0) | None => Self::INTERNAL,
            Some(n) => ExitCode(n),
        }
    }

    /// Get the numeric value for `std::process::exit()`.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}
