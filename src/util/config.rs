//! Configuration file support for macbundle.
//!
//! Two configuration file locations are read:
//! - Global: `~/.macbundle/config.toml` - User-wide defaults
//! - Project: `.macbundle/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// macbundle configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host compiler settings
    pub toolchain: ToolchainSettings,

    /// Launcher stub settings
    pub stub: StubSettings,

    /// External resource tools
    pub tools: ToolSettings,

    /// App harness settings
    pub harness: HarnessSettings,
}

/// Host toolchain overrides.
///
/// Anything left unset falls back to the environment (`CC`, `CFLAGS`,
/// `ARCHFLAGS`) and then to auto-detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// Path to the C compiler (e.g., /usr/bin/clang)
    pub cc: Option<PathBuf>,

    /// Path to the symbol stripper
    pub strip: Option<PathBuf>,

    /// Base compiler flags, as a single shell-style string
    pub cflags: Option<String>,

    /// Architecture flags appended to every stub compile (e.g. "-arch arm64")
    pub archflags: Option<String>,

    /// Host platform string (e.g. "macosx-10.9-x86_64")
    pub platform: Option<String>,
}

/// Launcher stub settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StubSettings {
    /// C source of the launcher (relative to the project root)
    pub source: Option<PathBuf>,

    /// Directory holding the compiled stubs
    pub prebuilt_dir: Option<PathBuf>,

    /// Variants to prebuild; empty means just the canonical `main`
    pub variants: Vec<VariantSettings>,

    /// Host runtime used by the legacy variant override
    pub runtime: RuntimeSettings,
}

/// One configured stub variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantSettings {
    /// Variant name (e.g. "main-fat")
    pub name: String,

    /// Architecture flags for this variant; empty uses the toolchain's
    #[serde(default)]
    pub arch_flags: Vec<String>,
}

/// Description of the host interpreter runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Install prefix of the runtime
    pub prefix: Option<PathBuf>,

    /// "major.minor" version of the runtime
    pub version: Option<String>,
}

impl RuntimeSettings {
    /// Parse the configured version into `(major, minor)`.
    pub fn parsed_version(&self) -> Option<(u32, u32)> {
        let version = self.version.as_deref()?;
        let mut parts = version.trim().split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        Some((major, minor))
    }
}

/// External resource tool paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Interface compiler (default: `ibtool`)
    pub ibtool: Option<PathBuf>,

    /// Copy tool (default: `ditto`)
    pub ditto: Option<PathBuf>,
}

/// App harness settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessSettings {
    /// Seconds to wait for a response or for the app to exit
    pub timeout_secs: Option<u64>,

    /// What to do with the app's stderr ("merge", "discard", "inherit")
    pub stderr: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        let tc = other.toolchain;
        if tc.cc.is_some() {
            self.toolchain.cc = tc.cc;
        }
        if tc.strip.is_some() {
            self.toolchain.strip = tc.strip;
        }
        if tc.cflags.is_some() {
            self.toolchain.cflags = tc.cflags;
        }
        if tc.archflags.is_some() {
            self.toolchain.archflags = tc.archflags;
        }
        if tc.platform.is_some() {
            self.toolchain.platform = tc.platform;
        }

        let stub = other.stub;
        if stub.source.is_some() {
            self.stub.source = stub.source;
        }
        if stub.prebuilt_dir.is_some() {
            self.stub.prebuilt_dir = stub.prebuilt_dir;
        }
        // Variant lists replace rather than append
        if !stub.variants.is_empty() {
            self.stub.variants = stub.variants;
        }
        if stub.runtime.prefix.is_some() {
            self.stub.runtime.prefix = stub.runtime.prefix;
        }
        if stub.runtime.version.is_some() {
            self.stub.runtime.version = stub.runtime.version;
        }

        if other.tools.ibtool.is_some() {
            self.tools.ibtool = other.tools.ibtool;
        }
        if other.tools.ditto.is_some() {
            self.tools.ditto = other.tools.ditto;
        }

        if other.harness.timeout_secs.is_some() {
            self.harness.timeout_secs = other.harness.timeout_secs;
        }
        if other.harness.stderr.is_some() {
            self.harness.stderr = other.harness.stderr;
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.macbundle/config.toml)
/// 2. Global config (~/.macbundle/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global macbundle config directory (~/.macbundle).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".macbundle"))
}
