use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

mod commands;
mod config;

use commands::ProjectArgs;

/// Kiln native build driver.
///
/// Compiles every C and C++ source under the library roots, then links one
/// executable per entry of the binary root: a source file, or a directory of
/// sources.
///
/// EXAMPLES:
///     kiln build                    Build with the dev profile
///     kiln build --release          Build without debug info or sanitizer
///     kiln plan                     Show compile and link commands
///     kiln sources                  Show discovered sources
///     kiln clean                    Remove the build directory
///
/// ENVIRONMENT VARIABLES:
///     KILN_COMPILER     Compiler driver, overrides kiln.toml
///     KILN_SANITIZER    Sanitizer ("none" disables)
///     KILN_BUILD_DIR    Build directory
///     KILN_PROFILE      Default profile
///     KILN_JSON         Set to '1' for JSON output by default
///     NO_COLOR          Set to disable colored output
#[derive(Parser)]
#[command(name = "kiln")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Project selection shared by all project commands
#[derive(Args, Debug, Clone, Default)]
struct ProjectOpts {
    /// Project directory (kiln.toml is searched upward from here)
    #[arg(long, short = 'C', value_name = "DIR")]
    dir: Option<PathBuf>,
    /// Build profile (dev, release, or one declared in kiln.toml)
    #[arg(long, short = 'p')]
    profile: Option<String>,
    /// Use the release profile (shorthand for --profile=release)
    #[arg(long)]
    release: bool,
}

impl ProjectOpts {
    fn into_args(self, cli_config: &config::Config) -> ProjectArgs {
        ProjectArgs {
            project_dir: self.dir,
            profile: self.profile,
            release: self.release,
            default_profile: cli_config.default_profile.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and link every binary
    ///
    /// A failing compile or link does not stop the build unless --fail-fast
    /// is given. The exit status is non-zero if any step failed.
    ///
    /// EXAMPLES:
    ///     kiln build                    Build with the dev profile
    ///     kiln build -v                 Echo every command
    ///     kiln build --jobs 8           Compile up to 8 sources at once
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        project: ProjectOpts,
        /// Stop at the first failing step
        #[arg(long)]
        fail_fast: bool,
        /// Compile independent sources in parallel
        #[arg(long)]
        parallel: bool,
        /// Number of parallel compile jobs (implies --parallel)
        #[arg(long, short = 'j')]
        jobs: Option<usize>,
        /// Verbose output (echo every command)
        #[arg(long, short = 'v')]
        verbose: bool,
        /// Quiet output (errors only)
        #[arg(long, short = 'q')]
        quiet: bool,
        /// JSON output
        #[arg(long)]
        json: bool,
    },

    /// Print the compile and link commands without running them
    Plan {
        #[command(flatten)]
        project: ProjectOpts,
        /// JSON output
        #[arg(long)]
        json: bool,
    },

    /// List discovered library sources and binaries
    Sources {
        #[command(flatten)]
        project: ProjectOpts,
        /// JSON output
        #[arg(long)]
        json: bool,
    },

    /// Remove the build directory
    Clean {
        #[command(flatten)]
        project: ProjectOpts,
        /// Print nothing
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cli_config = config::Config::from_env();

    match cli.command {
        Commands::Build {
            project,
            fail_fast,
            parallel,
            jobs,
            verbose,
            quiet,
            json,
        } => {
            let args = commands::build::BuildArgs {
                project: project.into_args(&cli_config),
                fail_fast,
                parallel,
                jobs,
                verbose,
                quiet,
                // Command-line flag overrides environment variable
                json: json || cli_config.default_json,
                no_color: cli_config.no_color,
            };
            commands::build::run(args)?;
        }
        Commands::Plan { project, json } => {
            commands::plan::run(
                &project.into_args(&cli_config),
                json || cli_config.default_json,
            )?;
        }
        Commands::Sources { project, json } => {
            commands::sources::run(
                &project.into_args(&cli_config),
                json || cli_config.default_json,
            )?;
        }
        Commands::Clean { project, quiet } => {
            commands::clean::run(&project.into_args(&cli_config), quiet)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_flags() {
        let cli = Cli::parse_from([
            "kiln", "build", "--release", "--fail-fast", "-j", "4", "-C", "demo",
        ]);
        match cli.command {
            Commands::Build {
                project,
                fail_fast,
                jobs,
                ..
            } => {
                assert!(project.release);
                assert!(fail_fast);
                assert_eq!(jobs, Some(4));
                assert_eq!(project.dir, Some(PathBuf::from("demo")));
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_alias_b_for_build() {
        let cli = Cli::parse_from(["kiln", "b"]);
        assert!(matches!(cli.command, Commands::Build { .. }));
    }

    #[test]
    fn test_plan_profile() {
        let cli = Cli::parse_from(["kiln", "plan", "--profile", "asan", "--json"]);
        match cli.command {
            Commands::Plan { project, json } => {
                assert_eq!(project.profile.as_deref(), Some("asan"));
                assert!(json);
            }
            _ => panic!("Expected Plan command"),
        }
    }

    #[test]
    fn test_completions_bash() {
        let cli = Cli::parse_from(["kiln", "completions", "bash"]);
        match cli.command {
            Commands::Completions { shell } => assert_eq!(shell, Shell::Bash),
            _ => panic!("Expected Completions command"),
        }
    }
}
