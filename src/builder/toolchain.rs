//! Host toolchain used to compile launcher stubs.
//!
//! Detection priority for each setting:
//! 1. Config file (`[toolchain]` in `.macbundle/config.toml` or `~/.macbundle/config.toml`)
//! 2. Environment variables (CC, CFLAGS, ARCHFLAGS)
//! 3. Auto-detection (searching PATH, host architecture)

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::builder::stub::variant::{host_arch, HostInfo};
use crate::util::config::{RuntimeSettings, ToolchainSettings};
use crate::util::process::{find_c_compiler, find_executable};

/// Compiler, stripper and base flags of the build host.
#[derive(Debug, Clone)]
pub struct HostToolchain {
    /// Path to the C compiler
    pub cc: PathBuf,
    /// Path to the symbol stripper
    pub strip: PathBuf,
    /// Host base CFLAGS, unsanitized
    pub base_cflags: String,
    /// Default architecture flags for stubs
    pub arch_flags: Vec<String>,
    /// Host description
    pub host: HostInfo,
}

impl HostToolchain {
    /// Detect the toolchain from config, environment and PATH.
    pub fn detect(settings: &ToolchainSettings, runtime: &RuntimeSettings) -> Result<Self> {
        let cc = match settings.cc.clone() {
            Some(cc) => cc,
            None => match find_c_compiler() {
                Some(cc) => cc,
                None => bail!(
                    "no C compiler found\n\
                     \n\
                     Set the CC environment variable or `toolchain.cc` in .macbundle/config.toml,\n\
                     or install a compiler."
                ),
            },
        };

        let strip = settings
            .strip
            .clone()
            .or_else(|| find_executable("strip"))
            .unwrap_or_else(|| PathBuf::from("strip"));

        let base_cflags = settings
            .cflags
            .clone()
            .or_else(|| std::env::var("CFLAGS").ok())
            .unwrap_or_default();

        let arch_flags = settings
            .archflags
            .clone()
            .or_else(|| std::env::var("ARCHFLAGS").ok())
            .map(|s| split_flags(&s))
            .unwrap_or_else(default_arch_flags);

        let platform = settings
            .platform
            .clone()
            .map(HostInfo::new)
            .unwrap_or_else(HostInfo::detect);
        let host = platform.with_runtime(runtime.prefix.clone(), runtime.parsed_version());

        tracing::debug!(
            "Using toolchain: cc={}, strip={}, platform={}",
            cc.display(),
            strip.display(),
            host.platform
        );

        Ok(HostToolchain {
            cc,
            strip,
            base_cflags,
            arch_flags,
            host,
        })
    }
}

/// Split a flag string into tokens.
pub fn split_flags(flags: &str) -> Vec<String> {
    flags.split_whitespace().map(str::to_string).collect()
}

/// `-arch <host>` on macOS; nothing elsewhere, where `-arch` is not understood.
fn default_arch_flags() -> Vec<String> {
    if cfg!(target_os = "macos") {
        vec!["-arch".to_string(), host_arch().to_string()]
    } else {
        Vec::new()
    }
}
