//! Black-box verification of a built application.
//!
//! ## Checks Performed
//!
//! 1. Start: launch the app, close its stdin and expect exit code 0 within
//!    the timeout
//! 2. One import probe per `--present` module, expecting the module name back
//! 3. One import probe per `--missing` module, expecting `* import failed`
//!
//! Probes share one running app. If a probe kills it (timeout, protocol
//! violation) the next probe starts a fresh one.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::harness::{
    AppHarness, HarnessError, HarnessSession, ImportOutcome, StderrPolicy, DEFAULT_TIMEOUT,
};

/// Options for [`verify_app`].
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    /// `.app` bundle or executable
    pub app: PathBuf,

    /// Modules that must import
    pub present: Vec<String>,

    /// Modules that must fail to import
    pub missing: Vec<String>,

    /// Deadline for each response and for shutdown
    pub timeout: Duration,

    pub stderr: StderrPolicy,
}

impl VerifyOptions {
    pub fn for_app(app: impl Into<PathBuf>) -> Self {
        VerifyOptions {
            app: app.into(),
            present: Vec::new(),
            missing: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            stderr: StderrPolicy::Discard,
        }
    }
}

/// Result of one check.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyCheck {
    pub name: String,
    pub passed: bool,
    pub message: String,

    /// How long the check took (in milliseconds for JSON)
    #[serde(serialize_with = "serialize_duration_ms")]
    pub duration: Duration,
}

fn serialize_duration_ms<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

impl VerifyCheck {
    fn pass(name: impl Into<String>, message: impl Into<String>, duration: Duration) -> Self {
        VerifyCheck {
            name: name.into(),
            passed: true,
            message: message.into(),
            duration,
        }
    }

    fn fail(name: impl Into<String>, message: impl Into<String>, duration: Duration) -> Self {
        VerifyCheck {
            name: name.into(),
            passed: false,
            message: message.into(),
            duration,
        }
    }
}

/// Complete verification result.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyResult {
    /// Executable that was run
    pub executable: PathBuf,

    pub checks: Vec<VerifyCheck>,

    #[serde(serialize_with = "serialize_duration_ms")]
    pub total_duration: Duration,

    /// Whether every check passed
    pub passed: bool,
}

impl VerifyResult {
    fn new(executable: PathBuf) -> Self {
        VerifyResult {
            executable,
            checks: Vec::new(),
            total_duration: Duration::ZERO,
            passed: true,
        }
    }

    fn add_check(&mut self, check: VerifyCheck) {
        if !check.passed {
            self.passed = false;
        }
        self.checks.push(check);
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }
}

/// Executable inside an app bundle: `Foo.app` -> `Foo.app/Contents/MacOS/Foo`.
///
/// Anything that is not a `.app` directory is taken to be the executable.
pub fn resolve_executable(app: &Path) -> Result<PathBuf> {
    if app.is_dir() {
        let is_bundle = app.extension().is_some_and(|e| e == "app");
        let stem = app.file_stem().filter(|_| is_bundle).with_context(|| {
            format!("{} is a directory but not an .app bundle", app.display())
        })?;

        let executable = app.join("Contents").join("MacOS").join(stem);
        if !executable.is_file() {
            bail!(
                "bundle executable not found: {}\n\
                 \n\
                 Expected Contents/MacOS/{} inside the bundle.",
                executable.display(),
                stem.to_string_lossy()
            );
        }
        return Ok(executable);
    }

    if !app.is_file() {
        bail!("app not found: {}", app.display());
    }
    Ok(app.to_path_buf())
}

/// Run every check against the app.
pub fn verify_app(options: &VerifyOptions) -> Result<VerifyResult> {
    let start = Instant::now();
    let executable = resolve_executable(&options.app)?;
    let harness = AppHarness::new(&executable)
        .stderr(options.stderr)
        .timeout(options.timeout);

    let mut result = VerifyResult::new(executable);

    result.add_check(check_clean_start(&harness, options.timeout)?);

    let probes = options
        .present
        .iter()
        .map(|m| (m.as_str(), true))
        .chain(options.missing.iter().map(|m| (m.as_str(), false)));

    let mut session: Option<HarnessSession> = None;
    for (module, expect_present) in probes {
        let probe_start = Instant::now();
        let name = if expect_present {
            format!("import {}", module)
        } else {
            format!("missing {}", module)
        };

        let mut running = match session.take() {
            Some(s) => s,
            None => launch(&harness)?,
        };

        let outcome = running.import_module(module);
        // A dead or out-of-sync app is dropped (and killed); the next probe
        // starts a fresh one
        let reusable = match &outcome {
            Ok(_) => true,
            Err(e) => matches!(e, HarnessError::InvalidModuleName { .. }),
        };
        let check = match outcome {
            Ok(ImportOutcome::Imported) if expect_present => {
                VerifyCheck::pass(name, "imported", probe_start.elapsed())
            }
            Ok(ImportOutcome::Imported) => VerifyCheck::fail(
                name,
                "module imported but was expected to be missing",
                probe_start.elapsed(),
            ),
            Ok(ImportOutcome::Failed(line)) if expect_present => {
                VerifyCheck::fail(name, line, probe_start.elapsed())
            }
            Ok(ImportOutcome::Failed(line)) => VerifyCheck::pass(name, line, probe_start.elapsed()),
            Err(e) => VerifyCheck::fail(name, e.to_string(), probe_start.elapsed()),
        };
        if reusable {
            session = Some(running);
        }
        result.add_check(check);
    }

    if let Some(s) = session {
        let shutdown_start = Instant::now();
        let failure = match s.shutdown(options.timeout) {
            Ok(0) => None,
            Ok(code) => Some(format!("exit code {}", code)),
            Err(e) => Some(e.to_string()),
        };
        if let Some(message) = failure {
            result.add_check(VerifyCheck::fail(
                "Shutdown",
                message,
                shutdown_start.elapsed(),
            ));
        }
    }

    result.total_duration = start.elapsed();
    Ok(result)
}

fn launch(harness: &AppHarness) -> Result<HarnessSession> {
    harness
        .launch()
        .with_context(|| format!("failed to start {}", harness.executable().display()))
}

/// Close stdin right away and expect a clean exit.
fn check_clean_start(harness: &AppHarness, timeout: Duration) -> Result<VerifyCheck> {
    let start = Instant::now();
    let session = launch(harness)?;

    let check = match session.shutdown(timeout) {
        Ok(0) => VerifyCheck::pass("Start", "exited cleanly", start.elapsed()),
        Ok(code) => VerifyCheck::fail("Start", format!("exit code {}", code), start.elapsed()),
        Err(e) => VerifyCheck::fail("Start", e.to_string(), start.elapsed()),
    };
    Ok(check)
}

/// Format a verification result for display (human-readable).
pub fn format_result(result: &VerifyResult, verbose: bool) -> String {
    let mut output = String::new();

    writeln!(output, "Verify: {}", result.executable.display()).unwrap();
    writeln!(output, "{}", "=".repeat(50)).unwrap();
    writeln!(output).unwrap();

    for check in &result.checks {
        let status = if check.passed { "[OK]" } else { "[FAIL]" };
        writeln!(output, "  {} {} ({:.2?})", status, check.name, check.duration).unwrap();

        if verbose || !check.passed {
            writeln!(output, "      {}", check.message).unwrap();
        }
    }

    writeln!(output).unwrap();

    let status = if result.passed { "PASSED" } else { "FAILED" };
    writeln!(
        output,
        "Result: {} ({}/{} checks passed)",
        status,
        result.passed_count(),
        result.checks.len()
    )
    .unwrap();
    writeln!(output, "Total time: {:.2?}", result.total_duration).unwrap();

    output
}

/// Format a verification result as JSON.
pub fn format_result_json(result: &VerifyResult) -> String {
    serde_json::to_string_pretty(result)
        .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize result: {}"}}"#, e))
}
