//! Process execution for the parsec-ci driver
//!
//! # Security Model
//!
//! All process execution goes through [`CommandSpec`] to ensure argv-style invocation.
//! Arguments are passed as discrete elements rather than shell strings, so nothing
//! the driver runs is ever re-parsed by `sh -c`.
//!
//! # Threading
//!
//! Execution is synchronous. [`ProcessRunner::run`] blocks the calling thread
//! until the child exits; there is no timeout.

pub mod command_spec;
pub mod error;
pub mod native;
pub mod process;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use command_spec::CommandSpec;
pub use error::RunnerError;
pub use native::NativeRunner;
pub use process::{ProcessOutput, ProcessRunner};
