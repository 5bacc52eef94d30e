//! Building the launcher stub from project configuration.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::builder::stub::{ArchVariant, StubCache, StubReport, SystemRuntimeOverride};
use crate::builder::toolchain::{split_flags, HostToolchain};
use crate::util::config::{Config, VariantSettings};
use crate::util::process::{SystemRunner, ToolRunner};
use crate::util::GlobalContext;

/// Options for [`ensure_stub`].
#[derive(Debug, Clone, Default)]
pub struct StubOptions {
    /// Build every registered variant
    pub all: bool,
    /// Build this variant instead of the detected one
    pub variant: Option<String>,
}

/// Build the stub cache described by `config`.
pub fn stub_cache(
    ctx: &GlobalContext,
    config: &Config,
    runner: Arc<dyn ToolRunner>,
) -> Result<StubCache> {
    let toolchain = HostToolchain::detect(&config.toolchain, &config.stub.runtime)?;

    let source = config
        .stub
        .source
        .as_deref()
        .map(|p| ctx.resolve(p))
        .unwrap_or_else(|| ctx.default_stub_source());
    let prebuilt_dir = config
        .stub
        .prebuilt_dir
        .as_deref()
        .map(|p| ctx.resolve(p))
        .unwrap_or_else(|| ctx.default_prebuilt_dir());

    let mut cache = StubCache::new(source, prebuilt_dir, toolchain, runner)
        .with_override(SystemRuntimeOverride::legacy());

    if !config.stub.variants.is_empty() {
        let variants = config.stub.variants.iter().map(to_variant).collect();
        cache = cache
            .with_variants(variants)
            .context("invalid [[stub.variants]] configuration")?;
    }

    Ok(cache)
}

fn to_variant(settings: &VariantSettings) -> ArchVariant {
    let variant = ArchVariant::new(&settings.name);
    if settings.arch_flags.is_empty() {
        variant
    } else {
        let flags = settings.arch_flags.iter().flat_map(|f| split_flags(f)).collect();
        variant.with_arch_flags(flags)
    }
}

/// Make sure the launcher stub is built and current.
pub fn ensure_stub(ctx: &GlobalContext, opts: &StubOptions) -> Result<StubReport> {
    let config = ctx.load_config();
    ensure_stub_with(ctx, &config, opts, Arc::new(SystemRunner))
}

/// [`ensure_stub`] with an explicit configuration and tool runner.
pub fn ensure_stub_with(
    ctx: &GlobalContext,
    config: &Config,
    opts: &StubOptions,
    runner: Arc<dyn ToolRunner>,
) -> Result<StubReport> {
    let cache = stub_cache(ctx, config, runner)?;
    let report = cache
        .build_variants(opts.variant.as_deref(), opts.all)
        .context("failed to build launcher stub")?;

    if report.rebuilt.is_empty() {
        tracing::debug!("All selected stubs up to date");
    }
    Ok(report)
}

/// Canonical stub path for a project, without building anything.
pub fn canonical_stub_path(ctx: &GlobalContext, config: &Config) -> PathBuf {
    config
        .stub
        .prebuilt_dir
        .as_deref()
        .map(|p| ctx.resolve(p))
        .unwrap_or_else(|| ctx.default_prebuilt_dir())
        .join(crate::builder::stub::CANONICAL_VARIANT)
}
