//! Interface resource converters (`.xib` and `.nib`).

use std::path::{Path, PathBuf};

use crate::builder::converters::{ConversionRequest, Transform};
use crate::builder::errors::BuildError;
use crate::builder::invoker::ToolInvoker;
use crate::util::config::ToolSettings;
use crate::util::process::{ProcessBuilder, ToolRunner};

/// Extension of compiled interface resources.
pub const NIB_EXTENSION: &str = "nib";

/// Locations of the external resource tools.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub ibtool: PathBuf,
    pub ditto: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        ToolPaths {
            ibtool: PathBuf::from("ibtool"),
            ditto: PathBuf::from("ditto"),
        }
    }
}

impl ToolPaths {
    /// Configured paths, falling back to the tool names on PATH.
    pub fn from_settings(settings: &ToolSettings) -> Self {
        let defaults = ToolPaths::default();
        ToolPaths {
            ibtool: settings.ibtool.clone().unwrap_or(defaults.ibtool),
            ditto: settings.ditto.clone().unwrap_or(defaults.ditto),
        }
    }
}

/// Compiles `.xib` interface definitions with `ibtool --compile`.
#[derive(Debug, Clone)]
pub struct XibCompiler {
    ibtool: PathBuf,
}

impl XibCompiler {
    pub fn new(ibtool: impl Into<PathBuf>) -> Self {
        XibCompiler {
            ibtool: ibtool.into(),
        }
    }
}

impl Transform for XibCompiler {
    fn describe(&self) -> String {
        format!("compile with {}", self.ibtool.display())
    }

    fn output_path(&self, destination: &Path) -> PathBuf {
        destination.with_extension(NIB_EXTENSION)
    }

    fn transform(
        &self,
        request: &ConversionRequest<'_>,
        runner: &dyn ToolRunner,
    ) -> Result<PathBuf, BuildError> {
        let destination = self.output_path(request.destination);
        if request.dry_run {
            return Ok(destination);
        }

        let cmd = ProcessBuilder::new(&self.ibtool)
            .arg("--compile")
            .arg(&destination)
            .arg(request.source);
        ToolInvoker::new(runner).invoke(&cmd)?;

        Ok(destination)
    }
}

/// Copies already-compiled `.nib` resources verbatim with `ditto`.
///
/// Nibs are not recompiled so that class-builder tooling which reads the
/// original nib keeps working.
#[derive(Debug, Clone)]
pub struct NibPassthrough {
    ditto: PathBuf,
}

impl NibPassthrough {
    pub fn new(ditto: impl Into<PathBuf>) -> Self {
        NibPassthrough {
            ditto: ditto.into(),
        }
    }
}

impl Transform for NibPassthrough {
    fn describe(&self) -> String {
        format!("copy with {}", self.ditto.display())
    }

    fn output_path(&self, destination: &Path) -> PathBuf {
        destination.with_extension(NIB_EXTENSION)
    }

    fn transform(
        &self,
        request: &ConversionRequest<'_>,
        runner: &dyn ToolRunner,
    ) -> Result<PathBuf, BuildError> {
        let destination = self.output_path(request.destination);
        if request.dry_run {
            return Ok(destination);
        }

        let cmd = ProcessBuilder::new(&self.ditto)
            .arg(request.source)
            .arg(&destination);
        ToolInvoker::new(runner).invoke(&cmd)?;

        Ok(destination)
    }
}
