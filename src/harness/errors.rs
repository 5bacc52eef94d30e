//! Harness error types.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Error while driving an application under test.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Nothing arrived in time; the app has been killed.
    #[error("no response from the app within {:.1}s (app killed)", after.as_secs_f64())]
    Timeout {
        after: Duration,
        /// Exit code collected after the kill, if any
        exit_code: Option<i32>,
    },

    #[error("unexpected response to import of `{expected}`: {got:?}")]
    ProtocolViolation { expected: String, got: String },

    #[error("app closed its output (exit code {exit_code:?})")]
    OutputClosed { exit_code: Option<i32> },

    #[error("invalid module name {name:?}")]
    InvalidModuleName { name: String },

    #[error("app is not running")]
    NotRunning,

    #[error("failed to launch {}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("i/o error talking to the app")]
    Io(#[from] io::Error),
}

impl HarnessError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, HarnessError::Timeout { .. })
    }
}
