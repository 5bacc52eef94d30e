//! Test utilities and mocks for macbundle unit tests.
//!
//! This module provides a recording tool runner, so stub builds and resource
//! conversions can be checked without spawning compilers, plus shell-script
//! fixtures that stand in for a built application.
//!
//! # Example
//!
//! ```rust,ignore
//! use macbundle::test_support::MockToolRunner;
//!
//! #[test]
//! fn test_example() {
//!     let runner = MockToolRunner::new();
//!     runner.exit_with("ibtool", 3);
//!
//!     // Hand `&runner` to a registry or stub cache...
//!     assert_eq!(runner.calls().len(), 1);
//! }
//! ```

pub mod fixtures;

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Mutex;

use crate::util::process::{ProcessBuilder, ToolRunner};

pub use fixtures::*;

/// Scripted result for one tool.
#[derive(Debug, Clone, Copy)]
enum MockOutcome {
    Exit(i32),
    Signal,
}

/// Mock tool runner for testing command execution.
///
/// Every command is recorded; tools exit 0 unless told otherwise. Tools are
/// matched by file name, so `/usr/bin/strip` and `strip` are the same tool.
#[derive(Debug, Default)]
pub struct MockToolRunner {
    outcomes: Mutex<HashMap<String, MockOutcome>>,
    unspawnable: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl MockToolRunner {
    /// Create a new mock runner where every tool succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `tool` exit with `code`.
    pub fn exit_with(&self, tool: &str, code: i32) -> &Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert(tool.to_string(), MockOutcome::Exit(code));
        self
    }

    /// Make `tool` die from a signal.
    pub fn kill_by_signal(&self, tool: &str) -> &Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert(tool.to_string(), MockOutcome::Signal);
        self
    }

    /// Make spawning `tool` fail as if it were not installed.
    pub fn not_installed(&self, tool: &str) -> &Self {
        self.unspawnable.lock().unwrap().insert(tool.to_string());
        self
    }

    /// Get all commands that were run.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Commands that ran a given tool.
    pub fn calls_to(&self, tool: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| {
                let program = c.split_whitespace().next().unwrap_or("");
                program == tool || program.ends_with(&format!("/{}", tool))
            })
            .collect()
    }

    /// Clear all recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl ToolRunner for MockToolRunner {
    fn run(&self, cmd: &ProcessBuilder) -> io::Result<Option<i32>> {
        let tool = cmd.tool_name();
        self.calls.lock().unwrap().push(cmd.display_command());

        if self.unspawnable.lock().unwrap().contains(&tool) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", tool),
            ));
        }

        Ok(match self.outcomes.lock().unwrap().get(&tool) {
            Some(MockOutcome::Exit(code)) => Some(*code),
            Some(MockOutcome::Signal) => None,
            None => Some(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_runner_records_and_scripts() {
        let runner = MockToolRunner::new();
        runner.exit_with("ibtool", 2);

        let ok = ProcessBuilder::new("/usr/bin/ditto").args(["a", "b"]);
        let bad = ProcessBuilder::new("ibtool").arg("--compile");

        assert_eq!(runner.run(&ok).unwrap(), Some(0));
        assert_eq!(runner.run(&bad).unwrap(), Some(2));
        assert_eq!(runner.calls().len(), 2);
        assert_eq!(runner.calls_to("ditto"), vec!["/usr/bin/ditto a b".to_string()]);

        runner.clear_calls();
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_mock_runner_spawn_failure() {
        let runner = MockToolRunner::new();
        runner.not_installed("cc");
        assert!(runner.run(&ProcessBuilder::new("cc")).is_err());
    }
}
