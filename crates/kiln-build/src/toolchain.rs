//! Toolchain command lines and subprocess execution
//!
//! Flag sets are data on [`ToolchainSettings`]; the two command-line dialects only
//! differ in how that data is spelled. [`ToolchainInvoker`] is the process
//! boundary: the build pipeline never spawns anything itself.

use crate::discovery::SourceFile;
use crate::error::{BuildError, BuildResult};
use crate::language::Language;
use crate::planner::CompileStep;
use crate::targets::LinkUnit;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Command-line dialect of the compiler driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    /// gcc / clang style (`-c`, `-o`, `-I`)
    Gnu,
    /// cl.exe style (`/c`, `/Fo`, `/I`)
    Msvc,
}

impl Flavor {
    /// Parse a configured flavor name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "gnu" => Some(Self::Gnu),
            "msvc" => Some(Self::Msvc),
            _ => None,
        }
    }

    /// Flavor native to the host
    pub fn host() -> Self {
        if cfg!(windows) {
            Self::Msvc
        } else {
            Self::Gnu
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gnu => "gnu",
            Self::Msvc => "msvc",
        }
    }

    /// Object file extension, without the dot
    pub fn object_extension(&self) -> &'static str {
        match self {
            Self::Gnu => "o",
            Self::Msvc => "obj",
        }
    }

    /// Suffix appended to executable names
    pub fn executable_suffix(&self) -> &'static str {
        match self {
            Self::Gnu => "",
            Self::Msvc => ".exe",
        }
    }

    /// Default compiler driver for this flavor
    pub fn default_compiler(&self) -> &'static str {
        match self {
            Self::Gnu => "c++",
            Self::Msvc => "cl.exe",
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A fully rendered program invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$ {}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Compiler and linker settings shared by every step of a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainSettings {
    pub flavor: Flavor,
    /// Driver used for both compiling and linking
    pub compiler: String,
    /// Language standard for C++ sources
    pub std: Option<String>,
    /// Language standard for C sources
    pub c_std: Option<String>,
    pub debug_info: bool,
    pub exceptions: bool,
    pub optimize: bool,
    /// Sanitizer name (`address`), when enabled
    pub sanitizer: Option<String>,
    /// Runtime library excluded at link time (msvc only)
    pub no_default_lib: Option<String>,
    /// Extra compile flags
    pub cflags: Vec<String>,
    /// External libraries in link order
    pub libraries: Vec<String>,
}

impl ToolchainSettings {
    /// Defaults for a flavor: C++20, debug info and exceptions on, no sanitizer
    pub fn for_flavor(flavor: Flavor) -> Self {
        Self {
            flavor,
            compiler: flavor.default_compiler().to_string(),
            std: Some("c++20".to_string()),
            c_std: None,
            debug_info: true,
            exceptions: true,
            optimize: false,
            sanitizer: None,
            no_default_lib: match flavor {
                Flavor::Msvc => Some("MSVCRT".to_string()),
                Flavor::Gnu => None,
            },
            cflags: Vec::new(),
            libraries: Vec::new(),
        }
    }

    pub fn with_compiler(mut self, compiler: impl Into<String>) -> Self {
        self.compiler = compiler.into();
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: Option<String>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn with_libraries(mut self, libraries: Vec<String>) -> Self {
        self.libraries = libraries;
        self
    }

    fn std_for(&self, language: Language) -> Option<&str> {
        match language {
            Language::Cxx => self.std.as_deref(),
            Language::C => self.c_std.as_deref(),
        }
    }

    /// Render the compiler invocation for one step
    pub fn compile_invocation(&self, step: &CompileStep, include_dirs: &[PathBuf]) -> Invocation {
        let includes = include_dirs.iter().chain(step.extra_includes.iter());
        let source = &step.source;
        let mut inv = Invocation::new(&self.compiler);

        match self.flavor {
            Flavor::Gnu => {
                inv.arg("-c");
                if let Some(std) = self.std_for(source.language) {
                    inv.arg(format!("-std={}", std));
                }
                if self.debug_info {
                    inv.arg("-g");
                }
                if self.exceptions && source.language == Language::Cxx {
                    inv.arg("-fexceptions");
                }
                if self.optimize {
                    inv.arg("-O2");
                }
                if let Some(sanitizer) = &self.sanitizer {
                    inv.arg(format!("-fsanitize={}", sanitizer));
                }
                inv.args(self.cflags.iter().cloned());
                inv.args(includes.map(|dir| format!("-I{}", display(dir))));
                inv.arg(display(&source.path));
                inv.arg("-o").arg(display(&step.object));
            }
            Flavor::Msvc => {
                inv.arg(format!("/Fo{}", display(&step.object)));
                inv.arg("/c");
                if let Some(std) = self.std_for(source.language) {
                    inv.arg(format!("/std:{}", std));
                }
                if self.debug_info {
                    inv.arg("/Z7");
                }
                if self.exceptions && source.language == Language::Cxx {
                    inv.arg("/EHsc");
                }
                if self.optimize {
                    inv.arg("/O2");
                }
                inv.args(self.cflags.iter().cloned());
                inv.args(includes.map(|dir| format!("/I{}", display(dir))));
                inv.arg(display(&source.path));
            }
        }

        inv
    }

    /// Render the linker invocation for one unit
    ///
    /// Objects and libraries are passed in exactly the order given; linkers
    /// resolve symbols left to right.
    pub fn link_invocation(&self, unit: &LinkUnit) -> Invocation {
        let mut inv = Invocation::new(&self.compiler);

        match self.flavor {
            Flavor::Gnu => {
                inv.arg("-o").arg(display(&unit.output));
                if let Some(std) = &self.std {
                    inv.arg(format!("-std={}", std));
                }
                if self.debug_info {
                    inv.arg("-g");
                }
                if self.exceptions {
                    inv.arg("-fexceptions");
                }
                if let Some(sanitizer) = &self.sanitizer {
                    inv.arg(format!("-fsanitize={}", sanitizer));
                }
                inv.args(unit.objects.iter().map(|o| display(o)));
                inv.args(unit.libraries.iter().cloned());
            }
            Flavor::Msvc => {
                inv.arg(format!("/Fe{}", display(&unit.output)));
                if let Some(std) = &self.std {
                    inv.arg(format!("/std:{}", std));
                }
                if let Some(sanitizer) = &self.sanitizer {
                    inv.arg(format!("/fsanitize={}", sanitizer));
                }
                if self.debug_info {
                    inv.arg("/Z7");
                }
                if self.exceptions {
                    inv.arg("/EHsc");
                }
                inv.args(unit.objects.iter().map(|o| display(o)));
                inv.arg("/link");
                if let Some(lib) = &self.no_default_lib {
                    inv.arg(format!("/NODEFAULTLIB:{}", lib));
                }
                inv.args(unit.libraries.iter().cloned());
            }
        }

        inv
    }
}

impl Default for ToolchainSettings {
    fn default() -> Self {
        Self::for_flavor(Flavor::host())
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Completion status of one toolchain invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StepStatus {
    Succeeded,
    /// Exited non-zero (`None` when killed by a signal)
    Failed { code: Option<i32> },
    /// Not attempted because its inputs were unusable
    Skipped,
}

impl StepStatus {
    pub fn success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Process boundary for compiling and linking
pub trait ToolchainInvoker: Sync {
    /// Compile one source into its object
    fn compile(&self, source: &SourceFile, invocation: &Invocation) -> BuildResult<StepStatus>;

    /// Link one unit into its executable
    fn link(&self, unit: &LinkUnit, invocation: &Invocation) -> BuildResult<StepStatus>;
}

/// Runs invocations as child processes of this one
///
/// Children inherit stderr, so compiler and linker diagnostics reach the user
/// unmodified. Their stdout is inherited too, unless it is redirected to stderr
/// to keep this process's stdout free for a machine-readable report.
pub struct ProcessInvoker {
    working_dir: PathBuf,
    stdout_to_stderr: bool,
}

impl ProcessInvoker {
    /// Run every command from `working_dir` (the project root)
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            stdout_to_stderr: false,
        }
    }

    /// Forward the children's stdout to stderr
    pub fn with_stdout_to_stderr(mut self, redirect: bool) -> Self {
        self.stdout_to_stderr = redirect;
        self
    }

    fn run(&self, invocation: &Invocation) -> BuildResult<StepStatus> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit());

        let status = if self.stdout_to_stderr {
            let output = command
                .stdout(Stdio::piped())
                .output()
                .map_err(|e| BuildError::spawn(&invocation.program, e))?;
            io::stderr().write_all(&output.stdout)?;
            output.status
        } else {
            command
                .status()
                .map_err(|e| BuildError::spawn(&invocation.program, e))?
        };

        if status.success() {
            Ok(StepStatus::Succeeded)
        } else {
            Ok(StepStatus::Failed {
                code: status.code(),
            })
        }
    }
}

impl ToolchainInvoker for ProcessInvoker {
    fn compile(&self, _source: &SourceFile, invocation: &Invocation) -> BuildResult<StepStatus> {
        self.run(invocation)
    }

    fn link(&self, _unit: &LinkUnit, invocation: &Invocation) -> BuildResult<StepStatus> {
        self.run(invocation)
    }
}
