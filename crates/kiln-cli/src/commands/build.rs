//! Build command - compile and link every binary of a kiln project

use super::{load_configuration, ProjectArgs};
use anyhow::{Context, Result};
use colored::*;
use kiln_build::{BuildReport, Builder, OutputMode, ProcessInvoker};

/// Build command arguments
#[derive(Debug, Default)]
pub struct BuildArgs {
    pub project: ProjectArgs,
    /// Stop at the first failing step
    pub fail_fast: bool,
    /// Compile independent sources in parallel
    pub parallel: bool,
    /// Number of parallel compile jobs (implies parallel)
    pub jobs: Option<usize>,
    /// Verbose output
    pub verbose: bool,
    /// Quiet output (errors only)
    pub quiet: bool,
    /// JSON output
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
}

/// Run the build command
pub fn run(args: BuildArgs) -> Result<()> {
    let mut config = load_configuration(&args.project)?;
    if args.fail_fast {
        config.fail_fast = true;
    }
    if args.parallel || args.jobs.is_some() {
        config.parallel = true;
    }
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("Failed to configure parallel jobs")?;
    }

    let output_mode = determine_output_mode(&args);
    // Keep stdout for the report alone; tool output goes to stderr
    let invoker = ProcessInvoker::new(&config.project_root).with_stdout_to_stderr(args.json);
    let report = Builder::new(&config)
        .with_output(output_mode)
        .build(&invoker)
        .context("Build failed")?;

    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "success": report.succeeded(),
                "project": config.project_name,
                "profile": report.profile,
                "halted": report.halted,
                "stats": report.stats,
                "executables": report.executables().collect::<Vec<_>>(),
                "steps": report.outcomes,
            })
        );
    } else if !args.quiet {
        if args.no_color {
            colored::control::set_override(false);
        }
        print_summary(&config.project_name, &report);
        if args.no_color {
            colored::control::unset_override();
        }
    }

    if !report.succeeded() {
        anyhow::bail!(
            "{} step(s) failed{}",
            report.stats.failures(),
            if report.halted { " (stopped early)" } else { "" }
        );
    }
    Ok(())
}

/// Determine output mode from arguments
fn determine_output_mode(args: &BuildArgs) -> OutputMode {
    if args.json {
        OutputMode::Json
    } else if args.quiet {
        OutputMode::Quiet
    } else if args.verbose {
        OutputMode::Verbose
    } else {
        OutputMode::Normal
    }
}

fn print_summary(project: &str, report: &BuildReport) {
    let stats = &report.stats;
    let status = if report.succeeded() {
        "SUCCEEDED".green().bold()
    } else {
        "FAILED".red().bold()
    };

    println!("{}", "─".repeat(50));
    println!(
        "Build {} | {} [{}] in {:.2}s",
        status,
        project.bold(),
        report.profile,
        stats.total_time.as_secs_f64()
    );
    println!(
        "  Compiled: {} ok, {} failed",
        stats.compiled.to_string().green(),
        colour_failures(stats.compile_failures)
    );
    println!(
        "  Linked:   {} ok, {} failed, {} skipped",
        stats.linked.to_string().green(),
        colour_failures(stats.link_failures),
        colour_failures(stats.skipped)
    );
    for executable in report.executables() {
        println!("  {} {}", "->".bold(), executable.display());
    }
}

fn colour_failures(count: usize) -> ColoredString {
    if count > 0 {
        count.to_string().red().bold()
    } else {
        count.to_string().normal()
    }
}
