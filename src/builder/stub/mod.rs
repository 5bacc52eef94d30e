//! Launcher stub cache.
//!
//! A stub is the small native executable placed in `Contents/MacOS` of a
//! bundle. One binary is compiled per architecture variant and kept in a
//! prebuilt directory; it is only recompiled when missing or older than its
//! C source.
//!
//! Compiles go to a temporary file next to the artifact and are renamed into
//! place only after both the compiler and the stripper exit 0, so a failed
//! build never leaves a half-written stub behind.

pub mod flags;
pub mod variant;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::builder::errors::BuildError;
use crate::builder::invoker::ToolInvoker;
use crate::builder::toolchain::HostToolchain;
use crate::util::fs::{ensure_dir, is_stale};
use crate::util::process::{ProcessBuilder, ToolRunner};

pub use flags::{sanitize_cflags, BuildFlags};
pub use variant::{
    variant_name, ArchVariant, HostInfo, SystemRuntimeOverride, VariantOverride,
    CANONICAL_VARIANT,
};

/// Outcome of [`StubCache::build_variants`].
#[derive(Debug, Clone)]
pub struct StubReport {
    /// Path of the canonical stub
    pub path: PathBuf,
    /// Variants that were compiled in this run
    pub rebuilt: Vec<String>,
    /// Variants that were selected but already up to date
    pub fresh: Vec<String>,
}

/// Compiles and caches one launcher binary per architecture variant.
pub struct StubCache {
    source: PathBuf,
    prebuilt_dir: PathBuf,
    variants: Vec<ArchVariant>,
    toolchain: HostToolchain,
    variant_override: Option<Box<dyn VariantOverride>>,
    runner: Arc<dyn ToolRunner>,
}

impl StubCache {
    /// Create a cache with only the canonical `main` variant registered.
    pub fn new(
        source: impl Into<PathBuf>,
        prebuilt_dir: impl Into<PathBuf>,
        toolchain: HostToolchain,
        runner: Arc<dyn ToolRunner>,
    ) -> Self {
        StubCache {
            source: source.into(),
            prebuilt_dir: prebuilt_dir.into(),
            variants: vec![ArchVariant::new(CANONICAL_VARIANT)],
            toolchain,
            variant_override: None,
            runner,
        }
    }

    /// Replace the registered variants. Names must be unique.
    pub fn with_variants(mut self, variants: Vec<ArchVariant>) -> Result<Self, BuildError> {
        let mut seen = HashSet::new();
        for v in &variants {
            if !seen.insert(v.name.as_str()) {
                return Err(BuildError::DuplicateVariant {
                    name: v.name.clone(),
                });
            }
        }
        self.variants = variants;
        Ok(self)
    }

    /// Install a hook that may replace the detected architecture.
    pub fn with_override(mut self, hook: impl VariantOverride + 'static) -> Self {
        self.variant_override = Some(Box::new(hook));
        self
    }

    pub fn variants(&self) -> &[ArchVariant] {
        &self.variants
    }

    pub fn prebuilt_dir(&self) -> &Path {
        &self.prebuilt_dir
    }

    /// Variant name matching the host, after applying the override hook.
    pub fn detected_variant(&self) -> String {
        let host = &self.toolchain.host;
        let arch = self
            .variant_override
            .as_ref()
            .and_then(|o| o.override_arch(host))
            .unwrap_or_else(|| host.arch().to_string());
        variant_name(&arch)
    }

    /// On-disk location of a variant's artifact.
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.prebuilt_dir.join(name)
    }

    /// Path of the canonical stub.
    pub fn canonical_path(&self) -> PathBuf {
        self.artifact_path(CANONICAL_VARIANT)
    }

    /// Whether a variant's artifact is missing or older than the source.
    pub fn needs_build(&self, variant: &ArchVariant) -> Result<bool, BuildError> {
        let artifact = self.artifact_path(&variant.name);
        is_stale(&artifact, &self.source).map_err(|e| BuildError::io(&self.source, e))
    }

    /// Make sure the selected stubs exist and are current.
    ///
    /// `requested` replaces the detected host variant name. With `build_all`
    /// every registered variant is considered. Returns the canonical stub
    /// path whatever was rebuilt.
    pub fn ensure_build(
        &self,
        requested: Option<&str>,
        build_all: bool,
    ) -> Result<PathBuf, BuildError> {
        self.build_variants(requested, build_all).map(|r| r.path)
    }

    /// Like [`ensure_build`](Self::ensure_build), reporting what happened.
    pub fn build_variants(
        &self,
        requested: Option<&str>,
        build_all: bool,
    ) -> Result<StubReport, BuildError> {
        if !self.source.is_file() {
            return Err(BuildError::MissingSource {
                path: self.source.clone(),
            });
        }
        ensure_dir(&self.prebuilt_dir).map_err(|e| BuildError::io(&self.prebuilt_dir, e))?;

        let selected = match requested {
            Some(name) => name.to_string(),
            None => self.detected_variant(),
        };

        if !build_all && !self.variants.iter().any(|v| v.name == selected) {
            tracing::debug!("No registered stub variant named `{}`", selected);
        }

        let mut report = StubReport {
            path: self.canonical_path(),
            rebuilt: Vec::new(),
            fresh: Vec::new(),
        };

        for variant in &self.variants {
            if !(build_all || variant.name == selected || variant.is_canonical()) {
                continue;
            }

            if self.needs_build(variant)? {
                self.compile(variant)?;
                report.rebuilt.push(variant.name.clone());
            } else {
                tracing::debug!("Stub `{}` is up to date", variant.name);
                report.fresh.push(variant.name.clone());
            }
        }

        Ok(report)
    }

    /// Compile and strip one variant, then move it into place.
    fn compile(&self, variant: &ArchVariant) -> Result<(), BuildError> {
        let dest = self.artifact_path(&variant.name);
        tracing::info!("Compiling stub `{}`", variant.name);

        let tmp = tempfile::Builder::new()
            .prefix(&format!(".{}-", variant.name))
            .tempfile_in(&self.prebuilt_dir)
            .map_err(|e| BuildError::io(&self.prebuilt_dir, e))?
            .into_temp_path();

        let tc = &self.toolchain;
        let arch_flags = variant.arch_flags.as_deref().unwrap_or(&tc.arch_flags);
        let flags = BuildFlags::from_base(&tc.base_cflags).for_arch(arch_flags);

        let invoker = ToolInvoker::new(self.runner.as_ref());

        let compile = ProcessBuilder::new(&tc.cc)
            .arg("-o")
            .arg(&*tmp)
            .arg(&self.source)
            .args(flags.tokens());
        invoker.invoke(&compile)?;

        let strip = ProcessBuilder::new(&tc.strip).arg("-Sx").arg(&*tmp);
        invoker.invoke(&strip)?;

        // The temp file starts out 0600; the stub must be runnable by anyone
        make_executable(&tmp).map_err(|e| BuildError::io(&*tmp, e))?;

        tmp.persist(&dest)
            .map_err(|e| BuildError::io(&dest, e.error))?;

        Ok(())
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
