//! Phase runner
//!
//! Executes a planned list of [`Phase`]s strictly in order on the calling
//! thread. Every step that runs has its captured stdout relayed to `out` and
//! its stderr relayed to `diag`, exactly once, as soon as the child exits.
//! The first failing required step moves the pipeline to
//! [`PipelineState::Failed`] and is returned as the error; nothing after it
//! is spawned.

use parsec_ci_runner::{ProcessOutput, ProcessRunner};
use std::fmt;
use std::io::{self, Write};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn};

use crate::error::CiError;
use crate::phase::{Phase, PhaseId, Step};
use crate::probe::Capability;

/// Position of a run in the linear phase chain.
///
/// `Init → Build → StaticAnalysis → CliSmoke → FunctionalSuite → Done`, with
/// `Failed` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    Build,
    StaticAnalysis,
    CliSmoke,
    FunctionalSuite,
    Done,
    Failed,
}

impl PipelineState {
    /// Position in the success chain; `None` for `Failed`.
    const fn ordinal(self) -> Option<u8> {
        match self {
            Self::Init => Some(0),
            Self::Build => Some(1),
            Self::StaticAnalysis => Some(2),
            Self::CliSmoke => Some(3),
            Self::FunctionalSuite => Some(4),
            Self::Done => Some(5),
            Self::Failed => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Move to `to`, rejecting anything other than the next state in the
    /// chain or `Failed` from a non-terminal state.
    pub fn advance(self, to: PipelineState) -> Result<PipelineState, CiError> {
        let allowed = match (self.ordinal(), to.ordinal()) {
            (Some(_), None) => !self.is_terminal(),
            (Some(from), Some(next)) => next == from + 1,
            (None, _) => false,
        };

        if allowed {
            Ok(to)
        } else {
            Err(CiError::InvalidTransition { from: self, to })
        }
    }
}

impl From<PhaseId> for PipelineState {
    fn from(id: PhaseId) -> Self {
        match id {
            PhaseId::Build => Self::Build,
            PhaseId::StaticAnalysis => Self::StaticAnalysis,
            PhaseId::CliSmoke => Self::CliSmoke,
            PhaseId::FunctionalSuite => Self::FunctionalSuite,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Build => "build",
            Self::StaticAnalysis => "static-analysis",
            Self::CliSmoke => "cli-smoke",
            Self::FunctionalSuite => "functional-suite",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Passed,
    /// Probe reported the tool unavailable; the step was not run
    Skipped { reason: String },
    /// An optional step exited unsuccessfully and the run continued
    FailedOptional { exit_code: Option<i32> },
}

/// Record of one step, kept for the end-of-run log line. Holds no output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub phase: PhaseId,
    pub step: String,
    pub status: StepStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub outcomes: Vec<StepOutcome>,
}

impl RunSummary {
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(|s| matches!(s, StepStatus::Passed))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, StepStatus::Skipped { .. }))
    }

    fn count(&self, pred: impl Fn(&StepStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Sequential phase runner.
///
/// `out` receives each step's stdout, `diag` its stderr. The binary wires
/// these to the process's stdout and stderr; tests use `Vec<u8>`.
pub struct Pipeline<R, O, D> {
    runner: R,
    out: O,
    diag: D,
    state: PipelineState,
}

impl<R, O, D> Pipeline<R, O, D>
where
    R: ProcessRunner,
    O: Write,
    D: Write,
{
    pub fn new(runner: R, out: O, diag: D) -> Self {
        Self {
            runner,
            out,
            diag,
            state: PipelineState::Init,
        }
    }

    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Consume the pipeline, returning the output writers.
    pub fn into_writers(self) -> (O, D) {
        (self.out, self.diag)
    }

    /// Run every phase in order.
    ///
    /// Phases must be given in [`PhaseId::ALL`] order; a plan that skips or
    /// reorders a phase fails with [`CiError::InvalidTransition`] before the
    /// offending phase spawns anything. A plan that stops short of the
    /// functional suite fails the same way after its last phase. Either way
    /// the pipeline ends in [`PipelineState::Failed`].
    pub fn run(&mut self, phases: &[Phase]) -> Result<RunSummary, CiError> {
        let started = Instant::now();
        let mut summary = RunSummary::default();

        for phase in phases {
            let result = match self.state.advance(phase.id.into()) {
                Ok(next) => {
                    self.state = next;
                    self.run_phase(phase, &mut summary)
                }
                Err(err) => Err(err),
            };

            if let Err(err) = result {
                return Err(self.fail(Some(phase.id), err));
            }
        }

        match self.state.advance(PipelineState::Done) {
            Ok(next) => self.state = next,
            Err(err) => return Err(self.fail(None, err)),
        }
        info!(
            passed = summary.passed(),
            skipped = summary.skipped(),
            duration_ms = millis(started.elapsed()),
            "CI run completed"
        );
        Ok(summary)
    }

    fn fail(&mut self, phase: Option<PhaseId>, err: CiError) -> CiError {
        self.state = PipelineState::Failed;
        match phase {
            Some(phase) => error!(%phase, error = %err, "CI run failed"),
            None => error!(error = %err, "CI run failed"),
        }
        err
    }

    fn run_phase(&mut self, phase: &Phase, summary: &mut RunSummary) -> Result<(), CiError> {
        let span = info_span!("phase", phase = %phase.id);
        let _guard = span.enter();

        if phase.steps.is_empty() {
            info!("No steps planned, phase passes trivially");
            return Ok(());
        }

        for step in &phase.steps {
            let status = self.run_step(phase.id, step)?;
            summary.outcomes.push(StepOutcome {
                phase: phase.id,
                step: step.name.clone(),
                status,
            });
        }
        Ok(())
    }

    fn run_step(&mut self, phase: PhaseId, step: &Step) -> Result<StepStatus, CiError> {
        if let Some(probe) = &step.probe {
            if let Capability::Unavailable { reason } = probe.detect(&self.runner) {
                info!(step = %step.name, tool = %probe.tool, %reason, "Tool unavailable, skipping step");
                return Ok(StepStatus::Skipped { reason });
            }
        }

        info!(step = %step.name, command = %step.command, "Running step");
        let started = Instant::now();
        let output = self
            .runner
            .run(&step.command)
            .map_err(|source| {
                debug!(step = %step.name, program = source.program(), "Step could not be spawned");
                CiError::Runner {
                    phase,
                    step: step.name.clone(),
                    source,
                }
            })?;
        let duration_ms = millis(started.elapsed());

        self.relay(&output)?;

        if output.success() {
            debug!(step = %step.name, duration_ms, "Step passed");
            return Ok(StepStatus::Passed);
        }

        if !step.required {
            warn!(step = %step.name, exit_code = ?output.exit_code, duration_ms, "Optional step failed, continuing");
            return Ok(StepStatus::FailedOptional {
                exit_code: output.exit_code,
            });
        }

        Err(CiError::StepFailed {
            phase,
            step: step.name.clone(),
            exit_code: output.exit_code,
        })
    }

    fn relay(&mut self, output: &ProcessOutput) -> io::Result<()> {
        write_block(&mut self.out, &output.stdout)?;
        write_block(&mut self.diag, &output.stderr)
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Write `bytes` verbatim, terminating with a newline if missing.
fn write_block<W: Write>(w: &mut W, bytes: &[u8]) -> io::Result<()> {
    if bytes.is_empty() {
        return Ok(());
    }
    w.write_all(bytes)?;
    if !bytes.ends_with(b"\n") {
        w.write_all(b"\n")?;
    }
    w.flush()
}

/// Render the plan for `--dry-run` without spawning anything.
pub fn write_plan<W: Write>(phases: &[Phase], out: &mut W) -> io::Result<()> {
    for phase in phases {
        writeln!(out, "[{}]", phase.id)?;
        if phase.steps.is_empty() {
            writeln!(out, "  (no steps)")?;
        }
        for step in &phase.steps {
            if let Some(probe) = &step.probe {
                writeln!(out, "  {} (if {} available: {})", step.name, probe.tool, probe.command)?;
            } else {
                writeln!(out, "  {}", step.name)?;
            }
            writeln!(out, "    $ {}", step.command)?;
        }
    }
    Ok(())
}
