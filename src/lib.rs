//! parsec-ci - continuous-integration driver for parsec-tool
//!
//! Runs four phases in a fixed order against a running Parsec service and
//! stops at the first failure:
//!
//! 1. **Build**: `cargo build`, then `cargo build --features spiffe-auth`
//! 2. **Static analysis**: `cargo fmt` and `cargo clippy` in strict mode,
//!    each skipped when its availability probe fails
//! 3. **CLI smoke test**: `parsec-tool --help`
//! 4. **Functional suite**: `tests/parsec-cli-tests.sh -d`
//!
//! # Example
//!
//! ```rust
//! use parsec_ci::config::CiConfig;
//! use parsec_ci::environment::CiEnvironment;
//! use parsec_ci::phase::{PlanOptions, plan};
//! use parsec_ci::pipeline::Pipeline;
//! use parsec_ci_runner::test_support::ScriptedRunner;
//!
//! let config = CiConfig::default();
//! let env = CiEnvironment::from_config(&config);
//! let phases = plan(&config, &env, PlanOptions::default());
//!
//! let runner = ScriptedRunner::new();
//! let mut pipeline = Pipeline::new(&runner, Vec::<u8>::new(), Vec::<u8>::new());
//! let summary = pipeline.run(&phases).unwrap();
//! assert_eq!(summary.passed(), 6);
//! ```

pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod phase;
pub mod pipeline;
pub mod probe;

pub use error::{CiError, ConfigError};
pub use exit_codes::ExitCode;
pub use parsec_ci_runner::{CommandSpec, NativeRunner, ProcessOutput, ProcessRunner, RunnerError};
pub use phase::{Phase, PhaseId, Step};
pub use pipeline::{Pipeline, PipelineState, RunSummary};
