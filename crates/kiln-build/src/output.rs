//! Build progress output
//!
//! Progress goes to stdout, one line per step. Failures always go to stderr,
//! whatever the mode, so they survive `--quiet` and `--json`.

use crate::planner::CompileStep;
use crate::targets::LinkUnit;
use crate::toolchain::{Invocation, StepStatus};
use std::path::Path;

/// Label used for library compile steps
pub const LIBRARY_TARGET: &str = "lib";

/// How much the builder prints while it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One progress line per step
    #[default]
    Normal,
    /// Progress lines plus the rendered command of each step
    Verbose,
    /// Failures only
    Quiet,
    /// Failures only; the caller prints a JSON report at the end
    Json,
}

impl OutputMode {
    pub fn shows_progress(&self) -> bool {
        matches!(self, Self::Normal | Self::Verbose)
    }

    pub fn shows_commands(&self) -> bool {
        matches!(self, Self::Verbose)
    }
}

/// Progress line for a compile step
pub fn compile_line(target: &str, source: &Path) -> String {
    if target == LIBRARY_TARGET {
        format!("[lib] {}", source.display())
    } else {
        format!("[bin] {}:{}", target, source.display())
    }
}

/// Progress line for a link step
pub fn link_line(unit: &str) -> String {
    format!("[bin] ==> {}:link", unit)
}

/// Writes progress for one build according to an [`OutputMode`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    mode: OutputMode,
}

impl Reporter {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn compile(&self, target: &str, step: &CompileStep, invocation: &Invocation) {
        if self.mode.shows_progress() {
            println!("{}", compile_line(target, &step.source.path));
        }
        if self.mode.shows_commands() {
            println!("{}", invocation);
        }
    }

    pub fn link(&self, unit: &LinkUnit, invocation: &Invocation) {
        if self.mode.shows_progress() {
            println!("{}", link_line(&unit.name));
        }
        if self.mode.shows_commands() {
            println!("{}", invocation);
        }
    }

    /// Report a step that did not succeed
    pub fn failed(&self, what: &str, path: &Path, status: StepStatus) {
        match status {
            StepStatus::Succeeded => {}
            StepStatus::Failed { code: Some(code) } => {
                eprintln!("error: {} of {} failed (exit code {})", what, path.display(), code)
            }
            StepStatus::Failed { code: None } => {
                eprintln!("error: {} of {} was terminated", what, path.display())
            }
            StepStatus::Skipped => eprintln!("warning: {} of {} skipped", what, path.display()),
        }
    }

    /// Report a link unit that cannot be linked at all
    pub fn invalid_unit(&self, reason: &str) {
        eprintln!("warning: {}", reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_lines() {
        assert_eq!(compile_line("lib", Path::new("lib/a.cc")), "[lib] lib/a.cc");
        assert_eq!(compile_line("y", Path::new("bin/y/z.cc")), "[bin] y:bin/y/z.cc");
        assert_eq!(link_line("x"), "[bin] ==> x:link");
    }

    #[test]
    fn test_mode_visibility() {
        assert!(OutputMode::Normal.shows_progress());
        assert!(!OutputMode::Normal.shows_commands());
        assert!(OutputMode::Verbose.shows_commands());
        assert!(!OutputMode::Quiet.shows_progress());
        assert!(!OutputMode::Json.shows_progress());
    }
}
