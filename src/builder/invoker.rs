//! Uniform execution of external build tools.

use crate::builder::errors::BuildError;
use crate::util::process::{ProcessBuilder, ToolRunner};

/// Runs one external tool and turns a non-zero exit into a [`BuildError`].
///
/// Output is not captured; the tool writes straight to the caller's
/// terminal. There are no retries.
pub struct ToolInvoker<'a> {
    runner: &'a dyn ToolRunner,
}

impl<'a> ToolInvoker<'a> {
    pub fn new(runner: &'a dyn ToolRunner) -> Self {
        ToolInvoker { runner }
    }

    /// Spawn `cmd`, wait for it, and check the exit status.
    pub fn invoke(&self, cmd: &ProcessBuilder) -> Result<(), BuildError> {
        let tool = cmd.tool_name();
        tracing::debug!("Invoking {}", cmd.display_command());

        let code = self
            .runner
            .run(cmd)
            .map_err(|source| BuildError::ToolSpawn {
                tool: tool.clone(),
                source,
            })?;

        match code {
            Some(0) => Ok(()),
            Some(exit_code) => Err(BuildError::ExternalToolFailure { tool, exit_code }),
            None => Err(BuildError::ExternalToolFailure { tool, exit_code: -1 }),
        }
    }
}
