//! Stub architecture variants and host detection.

use std::path::PathBuf;

/// Name of the canonical stub, the one handed back to bundle assembly.
pub const CANONICAL_VARIANT: &str = "main";

/// One architecture flavour of the launcher stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchVariant {
    /// Variant name, also the artifact file name (e.g. "main-fat")
    pub name: String,
    /// Architecture flags for this variant; `None` uses the toolchain's
    pub arch_flags: Option<Vec<String>>,
}

impl ArchVariant {
    pub fn new(name: impl Into<String>) -> Self {
        ArchVariant {
            name: name.into(),
            arch_flags: None,
        }
    }

    pub fn with_arch_flags(mut self, flags: Vec<String>) -> Self {
        self.arch_flags = Some(flags);
        self
    }

    /// The variant named `main-<arch>`.
    pub fn for_arch(arch: &str) -> Self {
        ArchVariant::new(variant_name(arch))
    }

    pub fn is_canonical(&self) -> bool {
        self.name == CANONICAL_VARIANT
    }
}

/// `main-<arch>`
pub fn variant_name(arch: &str) -> String {
    format!("{}-{}", CANONICAL_VARIANT, arch)
}

/// What is known about the host the stub is built on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    /// Platform string; its last `-`-separated segment is the architecture
    /// (e.g. "macosx-10.9-x86_64")
    pub platform: String,
    /// Install prefix of the host interpreter runtime, if known
    pub runtime_prefix: Option<PathBuf>,
    /// `(major, minor)` of the host interpreter runtime, if known
    pub runtime_version: Option<(u32, u32)>,
}

impl HostInfo {
    pub fn new(platform: impl Into<String>) -> Self {
        HostInfo {
            platform: platform.into(),
            runtime_prefix: None,
            runtime_version: None,
        }
    }

    pub fn with_runtime(mut self, prefix: Option<PathBuf>, version: Option<(u32, u32)>) -> Self {
        self.runtime_prefix = prefix;
        self.runtime_version = version;
        self
    }

    /// Platform string of the machine we are running on.
    pub fn detect() -> Self {
        HostInfo::new(host_platform())
    }

    /// Architecture segment of the platform string.
    pub fn arch(&self) -> &str {
        self.platform.rsplit('-').next().unwrap_or(&self.platform)
    }
}

/// Map Rust's architecture names onto the ones the Apple toolchain uses.
pub fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "aarch64" => "arm64",
        "x86" => "i386",
        "powerpc" => "ppc",
        "powerpc64" => "ppc64",
        other => other,
    }
}

fn host_platform() -> String {
    let os = match std::env::consts::OS {
        "macos" => "macosx",
        other => other,
    };
    format!("{}-{}", os, host_arch())
}

/// Hook that may force a different architecture name for the stub.
///
/// Returning `Some(arch)` replaces the architecture detected from the
/// platform string.
pub trait VariantOverride: Send + Sync {
    fn override_arch(&self, host: &HostInfo) -> Option<String>;
}

impl<F> VariantOverride for F
where
    F: Fn(&HostInfo) -> Option<String> + Send + Sync,
{
    fn override_arch(&self, host: &HostInfo) -> Option<String> {
        self(host)
    }
}

/// Forces `arch` when the host runtime lives under `prefix` and has exactly
/// `version`.
///
/// The system interpreter shipped on old macOS releases was a universal
/// build, so its stub had to be universal too.
#[derive(Debug, Clone)]
pub struct SystemRuntimeOverride {
    pub prefix: PathBuf,
    pub version: (u32, u32),
    pub arch: String,
}

impl SystemRuntimeOverride {
    /// `/System` runtime 2.5 -> `fat`.
    pub fn legacy() -> Self {
        SystemRuntimeOverride {
            prefix: PathBuf::from("/System"),
            version: (2, 5),
            arch: "fat".to_string(),
        }
    }
}

impl VariantOverride for SystemRuntimeOverride {
    fn override_arch(&self, host: &HostInfo) -> Option<String> {
        let prefix = host.runtime_prefix.as_ref()?;
        if prefix.starts_with(&self.prefix) && host.runtime_version == Some(self.version) {
            Some(self.arch.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arch_from_platform() {
        assert_eq!(HostInfo::new("macosx-10.9-x86_64").arch(), "x86_64");
        assert_eq!(HostInfo::new("macosx-11.0-arm64").arch(), "arm64");
        assert_eq!(HostInfo::new("universal").arch(), "universal");
    }

    #[test]
    fn test_variant_naming() {
        assert_eq!(ArchVariant::for_arch("i386").name, "main-i386");
        assert!(ArchVariant::new("main").is_canonical());
        assert!(!ArchVariant::new("main-fat").is_canonical());
    }

    #[test]
    fn test_legacy_override_matches_system_runtime() {
        let host = HostInfo::new("macosx-10.5-i386").with_runtime(
            Some(PathBuf::from(
                "/System/Library/Frameworks/Python.framework/Versions/2.5",
            )),
            Some((2, 5)),
        );
        assert_eq!(
            SystemRuntimeOverride::legacy().override_arch(&host),
            Some("fat".to_string())
        );
    }

    #[test]
    fn test_legacy_override_ignores_other_runtimes() {
        let other_version = HostInfo::new("macosx-10.6-i386")
            .with_runtime(Some(PathBuf::from("/System/Library")), Some((2, 6)));
        assert_eq!(SystemRuntimeOverride::legacy().override_arch(&other_version), None);

        let user_install = HostInfo::new("macosx-10.5-i386")
            .with_runtime(Some(PathBuf::from("/usr/local")), Some((2, 5)));
        assert_eq!(SystemRuntimeOverride::legacy().override_arch(&user_install), None);

        let unknown = HostInfo::new("macosx-10.5-i386");
        assert_eq!(SystemRuntimeOverride::legacy().override_arch(&unknown), None);
    }

    #[test]
    fn test_closure_override() {
        let always_fat = |_: &HostInfo| Some("fat".to_string());
        assert_eq!(
            always_fat.override_arch(&HostInfo::new("linux-x86_64")),
            Some("fat".to_string())
        );
    }
}
