//! Build orchestration and pipeline management
//!
//! A build is one forward pass: plan, compile the library, then for each link
//! unit compile its own sources and link it. Nothing is cached between runs.
//!
//! A compiler or linker exiting non-zero does not abort the build. The failure is
//! recorded and the pipeline keeps going (a unit whose compile failed is still
//! linked, and its link will usually fail too). With `fail_fast` no new step is
//! issued after the first failure.

use crate::assembler::{BuildPlan, Phase};
use crate::configuration::BuildConfiguration;
use crate::error::{BuildError, BuildResult};
use crate::output::{OutputMode, Reporter, LIBRARY_TARGET};
use crate::planner::CompileStep;
use crate::toolchain::{StepStatus, ToolchainInvoker};
use rayon::prelude::*;
use serde::{Serialize, Serializer};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Result of one attempted (or deliberately skipped) step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub phase: Phase,
    /// `lib` for library compiles, the unit name otherwise
    pub target: String,
    /// Source compiled, or executable linked
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: StepStatus,
    /// Why the step was skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StepOutcome {
    fn new(phase: Phase, target: &str, path: &Path, status: StepStatus) -> Self {
        Self {
            phase,
            target: target.to_string(),
            path: path.to_path_buf(),
            status,
            reason: None,
        }
    }
}

/// Build statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildStats {
    /// Compile steps that succeeded
    pub compiled: usize,
    /// Compile steps that failed
    pub compile_failures: usize,
    /// Executables linked
    pub linked: usize,
    /// Link steps that failed
    pub link_failures: usize,
    /// Steps skipped because their inputs were unusable
    pub skipped: usize,
    /// Total build time
    #[serde(serialize_with = "as_secs")]
    pub total_time: Duration,
    /// Time spent compiling
    #[serde(serialize_with = "as_secs")]
    pub compilation_time: Duration,
    /// Time spent linking
    #[serde(serialize_with = "as_secs")]
    pub linking_time: Duration,
}

impl BuildStats {
    fn record(&mut self, outcome: &StepOutcome) {
        match (outcome.phase, outcome.status) {
            (_, StepStatus::Skipped) => self.skipped += 1,
            (Phase::Compile, StepStatus::Succeeded) => self.compiled += 1,
            (Phase::Compile, StepStatus::Failed { .. }) => self.compile_failures += 1,
            (Phase::Link, StepStatus::Succeeded) => self.linked += 1,
            (Phase::Link, StepStatus::Failed { .. }) => self.link_failures += 1,
        }
    }

    /// Number of steps that did not succeed
    pub fn failures(&self) -> usize {
        self.compile_failures + self.link_failures + self.skipped
    }
}

fn as_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Everything that happened during one build
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    /// Profile the build ran with
    pub profile: String,
    /// Every step, in the order it was issued
    pub outcomes: Vec<StepOutcome>,
    pub stats: BuildStats,
    /// Set when `fail_fast` stopped the build early
    pub halted: bool,
}

impl BuildReport {
    /// Whether every step succeeded and nothing was cut short
    pub fn succeeded(&self) -> bool {
        !self.halted && self.outcomes.iter().all(|o| o.status.success())
    }

    /// Steps that did not succeed
    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.outcomes.iter().filter(|o| !o.status.success())
    }

    /// Executables that were linked successfully
    pub fn executables(&self) -> impl Iterator<Item = &Path> {
        self.outcomes
            .iter()
            .filter(|o| o.phase == Phase::Link && o.status.success())
            .map(|o| o.path.as_path())
    }

    fn push(&mut self, outcome: StepOutcome) {
        self.stats.record(&outcome);
        self.outcomes.push(outcome);
    }
}

/// Main builder for orchestrating builds
pub struct Builder<'a> {
    config: &'a BuildConfiguration,
    reporter: Reporter,
}

impl<'a> Builder<'a> {
    /// Create a builder for a resolved configuration
    pub fn new(config: &'a BuildConfiguration) -> Self {
        Self {
            config,
            reporter: Reporter::default(),
        }
    }

    /// Set output mode
    pub fn with_output(mut self, mode: OutputMode) -> Self {
        self.reporter = Reporter::new(mode);
        self
    }

    /// Discover sources and plan the build without running anything
    pub fn plan(&self) -> BuildResult<BuildPlan> {
        BuildPlan::create(self.config)
    }

    /// Plan and execute the build
    ///
    /// Discovery errors abort before any compile is issued.
    pub fn build(&self, invoker: &dyn ToolchainInvoker) -> BuildResult<BuildReport> {
        let plan = self.plan()?;
        self.execute(&plan, invoker)
    }

    /// Execute an existing plan
    pub fn execute(
        &self,
        plan: &BuildPlan,
        invoker: &dyn ToolchainInvoker,
    ) -> BuildResult<BuildReport> {
        let build_start = Instant::now();
        let build_dir = self.config.absolute_build_dir();
        fs::create_dir_all(&build_dir).map_err(|e| BuildError::io(&build_dir, e))?;

        let mut report = BuildReport {
            profile: self.config.profile.clone(),
            outcomes: Vec::new(),
            stats: BuildStats::default(),
            halted: false,
        };
        let halt = AtomicBool::new(false);

        let compile_start = Instant::now();
        for outcome in self.compile_batch(LIBRARY_TARGET, &plan.library, invoker, &halt)? {
            report.push(outcome);
        }
        report.stats.compilation_time += compile_start.elapsed();

        for unit in &plan.units {
            if halt.load(Ordering::SeqCst) {
                break;
            }

            let compile_start = Instant::now();
            for outcome in self.compile_batch(&unit.name, &unit.steps, invoker, &halt)? {
                report.push(outcome);
            }
            report.stats.compilation_time += compile_start.elapsed();

            if halt.load(Ordering::SeqCst) {
                break;
            }

            if let Err(reason) = unit.validate() {
                self.reporter.invalid_unit(&reason);
                let mut outcome =
                    StepOutcome::new(Phase::Link, &unit.name, &unit.output, StepStatus::Skipped);
                outcome.reason = Some(reason);
                report.push(outcome);
                if self.config.fail_fast {
                    halt.store(true, Ordering::SeqCst);
                }
                continue;
            }

            let link_start = Instant::now();
            let invocation = self.config.toolchain.link_invocation(unit);
            self.reporter.link(unit, &invocation);
            let status = invoker.link(unit, &invocation)?;
            report.stats.linking_time += link_start.elapsed();

            if !status.success() {
                self.reporter.failed("link", &unit.output, status);
                if self.config.fail_fast {
                    halt.store(true, Ordering::SeqCst);
                }
            }
            report.push(StepOutcome::new(Phase::Link, &unit.name, &unit.output, status));
        }

        report.halted = halt.load(Ordering::SeqCst);
        report.stats.total_time = build_start.elapsed();
        Ok(report)
    }

    /// Remove the build directory; returns whether there was anything to remove
    pub fn clean(&self) -> BuildResult<bool> {
        let build_dir = self.config.absolute_build_dir();
        if !build_dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&build_dir).map_err(|e| BuildError::io(&build_dir, e))?;
        Ok(true)
    }

    /// Compile independent steps, in parallel when configured
    ///
    /// Outcomes keep the order of `steps`. Steps not issued because of a halt
    /// are left out.
    fn compile_batch(
        &self,
        target: &str,
        steps: &[CompileStep],
        invoker: &dyn ToolchainInvoker,
        halt: &AtomicBool,
    ) -> BuildResult<Vec<StepOutcome>> {
        let run = |step: &CompileStep| self.compile_one(target, step, invoker, halt);

        let outcomes: Vec<Option<StepOutcome>> = if self.config.parallel {
            steps.par_iter().map(run).collect::<BuildResult<_>>()?
        } else {
            steps.iter().map(run).collect::<BuildResult<_>>()?
        };

        Ok(outcomes.into_iter().flatten().collect())
    }

    fn compile_one(
        &self,
        target: &str,
        step: &CompileStep,
        invoker: &dyn ToolchainInvoker,
        halt: &AtomicBool,
    ) -> BuildResult<Option<StepOutcome>> {
        if halt.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let invocation = self
            .config
            .toolchain
            .compile_invocation(step, &self.config.include_dirs);
        self.reporter.compile(target, step, &invocation);
        let status = invoker.compile(&step.source, &invocation)?;

        if !status.success() {
            self.reporter.failed("compile", &step.source.path, status);
            if self.config.fail_fast {
                halt.store(true, Ordering::SeqCst);
            }
        }

        Ok(Some(StepOutcome::new(
            Phase::Compile,
            target,
            &step.source.path,
            status,
        )))
    }
}
