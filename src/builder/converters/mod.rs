//! Resource converters.
//!
//! A converter turns one source resource (for example an interface
//! definition) into the form that goes into the bundle. Converters are keyed
//! by file suffix in a [`ConverterRegistry`] that is populated once at
//! start-up.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use macbundle::builder::converters::{ConverterRegistry, ToolPaths};
//! use macbundle::util::process::SystemRunner;
//!
//! let registry = ConverterRegistry::with_defaults(&ToolPaths::default(), Arc::new(SystemRunner));
//! let written = registry.convert("xib", "MainMenu.xib".as_ref(), "out/MainMenu.xib".as_ref(), false)?;
//! assert_eq!(written, std::path::Path::new("out/MainMenu.nib"));
//! ```

pub mod nib;
pub mod registry;

use std::path::{Path, PathBuf};

use crate::builder::errors::BuildError;
use crate::util::process::ToolRunner;

pub use nib::{NibPassthrough, ToolPaths, XibCompiler};
pub use registry::ConverterRegistry;

/// One conversion to perform.
#[derive(Debug, Clone, Copy)]
pub struct ConversionRequest<'a> {
    pub source: &'a Path,
    /// Requested destination; converters rewrite its extension
    pub destination: &'a Path,
    /// Plan only: no filesystem changes, no processes
    pub dry_run: bool,
}

/// A suffix-specific resource transform.
pub trait Transform: Send + Sync {
    /// Short description for listings (e.g. "compile with ibtool").
    fn describe(&self) -> String;

    /// Path that converting to `destination` will write.
    fn output_path(&self, destination: &Path) -> PathBuf {
        destination.to_path_buf()
    }

    /// Perform the conversion and return the path actually written (or that
    /// would be written, in a dry run).
    fn transform(
        &self,
        request: &ConversionRequest<'_>,
        runner: &dyn ToolRunner,
    ) -> Result<PathBuf, BuildError>;
}

/// Strip a leading dot so `.xib` and `xib` name the same suffix.
pub fn normalize_suffix(suffix: &str) -> &str {
    suffix.strip_prefix('.').unwrap_or(suffix)
}

/// Suffix of a path as used for registry lookups.
pub fn suffix_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}
