//! External process execution.
//!
//! Every tool invocation is described by an [`Invocation`] and executed by a
//! [`ProcessRunner`]. Runs are blocking, capture both output streams, and are
//! never retried or timed out here.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::DriverError;

/// A fully resolved external command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
    cwd: PathBuf,
}

impl Invocation {
    /// Starts an invocation of `program` with working directory `cwd`.
    pub fn new(program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The program to run.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The arguments, excluding the program.
    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    /// The working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Short program name used in messages.
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).current_dir(&self.cwd);
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` if the process was killed by a signal.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ProcessOutput {
    /// Returns `true` if the process exited with status 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Converts a non-zero exit into [`DriverError::ToolFailed`].
    pub fn check(self, invocation: &Invocation) -> Result<Self, DriverError> {
        if self.success() {
            Ok(self)
        } else {
            Err(DriverError::ToolFailed {
                tool: invocation.tool_name(),
                code: self.code,
                stderr: self.stderr,
            })
        }
    }
}

/// Executes external commands.
///
/// `Sync` so that one runner can serve a pool of lowering workers.
pub trait ProcessRunner: Sync {
    /// Runs `invocation` to completion.
    ///
    /// Returns `Err` only if the process could not be started; a non-zero
    /// exit is reported through [`ProcessOutput::code`].
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, DriverError>;
}

/// Runs commands as real child processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, DriverError> {
        let output = invocation
            .to_command()
            .output()
            .map_err(|e| DriverError::Spawn {
                program: invocation.program.clone(),
                source: e,
            })?;
        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Resolves a bare program name through `PATH`.
///
/// Names containing a path separator are returned unchanged, as are names not
/// found on `PATH` (spawning them will then report the problem).
pub fn resolve_program(name: &str) -> PathBuf {
    let candidate = Path::new(name);
    if candidate.components().count() != 1 || candidate.is_absolute() {
        return candidate.to_path_buf();
    }
    let Some(paths) = std::env::var_os("PATH") else {
        return candidate.to_path_buf();
    };
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
        .unwrap_or_else(|| candidate.to_path_buf())
}
