//! Subprocess execution utilities.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Builder for subprocess execution.
///
/// Commands are always an explicit program plus argument vector; nothing is
/// ever routed through a shell.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Short tool name used in error messages (`/usr/bin/ibtool` -> `ibtool`).
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// Build the Command.
    pub(crate) fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Run to completion with inherited stdio and return the exit code.
    ///
    /// `None` means the process was terminated by a signal.
    pub fn status(&self) -> io::Result<Option<i32>> {
        let status = self.build_command().stdin(Stdio::null()).status()?;
        Ok(status.code())
    }

    /// Display the command for error messages.
    ///
    /// Lossy: non-UTF-8 bytes are replaced here only, never in the argv
    /// handed to the process.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }
}

/// Something that can run an external tool to completion.
///
/// The stub cache and the resource converters never spawn processes
/// directly; they go through a runner so tests can record invocations
/// instead of executing them.
pub trait ToolRunner: Send + Sync {
    /// Run the command and return its exit code (`None` if killed by a signal).
    fn run(&self, cmd: &ProcessBuilder) -> io::Result<Option<i32>>;
}

/// Runner that spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, cmd: &ProcessBuilder) -> io::Result<Option<i32>> {
        tracing::debug!("Running: {}", cmd.display_command());
        cmd.status()
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find a C compiler.
pub fn find_c_compiler() -> Option<PathBuf> {
    // Check CC environment variable first
    if let Ok(cc) = std::env::var("CC") {
        if let Some(path) = find_executable(&cc) {
            return Some(path);
        }
    }

    for compiler in &["cc", "clang", "gcc"] {
        if let Some(path) = find_executable(compiler) {
            return Some(path);
        }
    }

    None
}
