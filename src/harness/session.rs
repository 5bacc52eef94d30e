//! Launching and driving an application under test.

use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Stdio};
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::harness::errors::HarnessError;
use crate::harness::protocol::{import_request, ImportOutcome};
use crate::util::process::ProcessBuilder;

/// Default response / shutdown budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How long to wait for an exit code once the app has closed its output.
const REAP_GRACE: Duration = Duration::from_secs(1);

/// What to do with the app's standard error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StderrPolicy {
    /// Interleave stderr lines with stdout responses
    Merge,
    /// Throw stderr away
    Discard,
    /// Pass stderr through to our own stderr
    #[default]
    Inherit,
}

impl FromStr for StderrPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "merge" => Ok(StderrPolicy::Merge),
            "discard" => Ok(StderrPolicy::Discard),
            "inherit" => Ok(StderrPolicy::Inherit),
            _ => Err(format!(
                "invalid stderr policy '{}'; expected 'merge', 'discard', or 'inherit'",
                s
            )),
        }
    }
}

/// Lifecycle of a launched app.
///
/// An app that has not been started yet is an [`AppHarness`]; launching it
/// yields a session in `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessState {
    Running,
    /// At least one response line was received
    Responded,
    /// A deadline expired and the app was killed
    TimedOut,
    /// The app has exited and been reaped
    Terminated,
}

/// Launch configuration for an application under test.
#[derive(Debug, Clone)]
pub struct AppHarness {
    command: ProcessBuilder,
    stderr: StderrPolicy,
    timeout: Duration,
}

impl AppHarness {
    pub fn new(executable: impl AsRef<Path>) -> Self {
        AppHarness {
            command: ProcessBuilder::new(executable),
            stderr: StderrPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Add an argument passed to the app.
    pub fn arg(mut self, arg: impl AsRef<std::ffi::OsStr>) -> Self {
        self.command = self.command.arg(arg);
        self
    }

    pub fn stderr(mut self, policy: StderrPolicy) -> Self {
        self.stderr = policy;
        self
    }

    /// Budget used by [`HarnessSession::import_module`].
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn executable(&self) -> &Path {
        self.command.get_program()
    }

    /// Start the app with piped stdin/stdout.
    pub fn launch(&self) -> Result<HarnessSession, HarnessError> {
        let mut cmd = self.command.build_command();
        cmd.stdin(Stdio::piped()).stdout(Stdio::piped());
        cmd.stderr(match self.stderr {
            StderrPolicy::Merge => Stdio::piped(),
            StderrPolicy::Discard => Stdio::null(),
            StderrPolicy::Inherit => Stdio::inherit(),
        });

        tracing::debug!("Launching {}", self.command.display_command());

        let mut child = cmd.spawn().map_err(|source| HarnessError::Spawn {
            path: self.executable().to_path_buf(),
            source,
        })?;

        let (tx, rx) = mpsc::channel();
        let readers = start_readers(&mut child, tx);
        reap_on_error(&mut child, readers)?;

        Ok(HarnessSession {
            stdin: child.stdin.take(),
            child,
            lines: rx,
            state: HarnessState::Running,
            exit_code: None,
            timeout: self.timeout,
            executable: self.executable().to_path_buf(),
        })
    }
}

/// One reader thread per captured stream, all feeding `tx`.
///
/// Only the reader threads keep senders, so the channel disconnects once
/// every captured stream hits EOF.
fn start_readers(child: &mut Child, tx: Sender<String>) -> Result<(), HarnessError> {
    if let Some(stdout) = child.stdout.take() {
        spawn_reader("stdout", stdout, tx.clone())?;
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_reader("stderr", stderr, tx)?;
    }
    Ok(())
}

/// Kill and reap `child` if `result` is an error, so a half-started
/// session never leaves the app running.
fn reap_on_error<T>(child: &mut Child, result: Result<T, HarnessError>) -> Result<T, HarnessError> {
    if result.is_err() {
        let _ = child.kill();
        let _ = child.wait();
    }
    result
}

/// Forward each line of `stream` into `tx` until EOF.
fn spawn_reader<R>(label: &str, stream: R, tx: Sender<String>) -> Result<(), HarnessError>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name(format!("harness-{}", label))
        .spawn(move || {
            let mut reader = BufReader::new(stream);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&buf);
                        let line = line.trim_end_matches(['\n', '\r']).to_string();
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                }
            }
        })?;
    Ok(())
}

/// A running application and its command/response channels.
///
/// Dropping a session that is still running kills the app.
#[derive(Debug)]
pub struct HarnessSession {
    child: Child,
    stdin: Option<ChildStdin>,
    lines: Receiver<String>,
    state: HarnessState,
    exit_code: Option<i32>,
    timeout: Duration,
    executable: PathBuf,
}

impl HarnessSession {
    pub fn state(&self) -> HarnessState {
        self.state
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Exit code, once the app has terminated normally.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Whether the process is still alive.
    pub fn is_running(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.mark_exited(status.code());
                false
            }
            Ok(None) => true,
            Err(_) => false,
        }
    }

    /// Write one command line to the app and flush it.
    pub fn send_command(&mut self, line: &str) -> Result<(), HarnessError> {
        let stdin = self.stdin.as_mut().ok_or(HarnessError::NotRunning)?;
        if self.state == HarnessState::Terminated || self.state == HarnessState::TimedOut {
            return Err(HarnessError::NotRunning);
        }

        tracing::debug!("-> {}", line);
        stdin.write_all(line.as_bytes())?;
        if !line.ends_with('\n') {
            stdin.write_all(b"\n")?;
        }
        stdin.flush()?;
        Ok(())
    }

    /// Wait up to `timeout` for the next output line.
    ///
    /// On timeout the app is killed and reaped before the error is returned.
    pub fn read_response(&mut self, timeout: Duration) -> Result<String, HarnessError> {
        match self.lines.recv_timeout(timeout) {
            Ok(line) => {
                tracing::debug!("<- {}", line);
                if self.state == HarnessState::Running {
                    self.state = HarnessState::Responded;
                }
                Ok(line)
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    "No response from {} within {:.1}s, killing it",
                    self.executable.display(),
                    timeout.as_secs_f64()
                );
                let exit_code = self.kill();
                self.state = HarnessState::TimedOut;
                Err(HarnessError::Timeout {
                    after: timeout,
                    exit_code,
                })
            }
            Err(RecvTimeoutError::Disconnected) => {
                let exit_code = match self.child.wait_timeout(REAP_GRACE)? {
                    Some(status) => {
                        self.mark_exited(status.code());
                        status.code()
                    }
                    None => None,
                };
                Err(HarnessError::OutputClosed { exit_code })
            }
        }
    }

    /// Send an import request and classify the reply.
    pub fn import_module(&mut self, name: &str) -> Result<ImportOutcome, HarnessError> {
        let request = import_request(name)?;
        self.send_command(&request)?;
        let line = self.read_response(self.timeout)?;
        ImportOutcome::parse(name, &line)
    }

    /// Close the command channel, signalling end of input.
    pub fn close_input(&mut self) {
        self.stdin.take();
    }

    /// Wait up to `timeout` for the app to exit and return its exit code.
    ///
    /// A signal death is reported as -1. If the deadline passes the app is
    /// killed and `Timeout` is returned.
    pub fn wait(&mut self, timeout: Duration) -> Result<i32, HarnessError> {
        if let Some(code) = self.exit_code {
            return Ok(code);
        }

        match self.child.wait_timeout(timeout)? {
            Some(status) => {
                let code = status.code().unwrap_or(-1);
                self.mark_exited(Some(code));
                Ok(code)
            }
            None => {
                let exit_code = self.kill();
                self.state = HarnessState::TimedOut;
                Err(HarnessError::Timeout {
                    after: timeout,
                    exit_code,
                })
            }
        }
    }

    /// Close input and wait for a clean exit.
    pub fn shutdown(mut self, timeout: Duration) -> Result<i32, HarnessError> {
        self.close_input();
        self.wait(timeout)
    }

    /// Forcefully terminate the app and reap it.
    fn kill(&mut self) -> Option<i32> {
        self.stdin.take();
        let _ = self.child.kill();
        let code = self.child.wait().ok().and_then(|s| s.code());
        self.state = HarnessState::Terminated;
        code
    }

    fn mark_exited(&mut self, code: Option<i32>) {
        self.exit_code = Some(code.unwrap_or(-1));
        if self.state != HarnessState::TimedOut {
            self.state = HarnessState::Terminated;
        }
    }
}

impl Drop for HarnessSession {
    fn drop(&mut self) {
        if self.state == HarnessState::Terminated || self.state == HarnessState::TimedOut {
            return;
        }
        // Best effort: never leave the app running behind a failed test
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}
