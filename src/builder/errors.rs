//! Build error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error while building a launcher stub or converting a resource.
#[derive(Debug, Error)]
pub enum BuildError {
    /// An external tool ran but exited non-zero (or was killed by a signal,
    /// reported as exit code -1).
    #[error("{tool} failed, code {exit_code}")]
    ExternalToolFailure { tool: String, exit_code: i32 },

    /// An external tool could not be started at all.
    #[error("failed to run `{tool}`")]
    ToolSpawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("no converter registered for suffix `{suffix}`")]
    UnsupportedConversion { suffix: String },

    #[error("stub source does not exist: {}", path.display())]
    MissingSource { path: PathBuf },

    #[error("stub variant `{name}` is registered twice")]
    DuplicateVariant { name: String },

    #[error("i/o error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    /// Exit code of the failing tool, if this is a tool failure.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            BuildError::ExternalToolFailure { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}
