//! Global context for macbundle operations.
//!
//! Provides centralized access to configuration and paths.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{global_config_dir, load_config, Config};

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory (the project root)
    cwd: PathBuf,

    /// Home directory for global macbundle data (~/.macbundle/)
    home: PathBuf,
}

impl GlobalContext {
    /// Create a new GlobalContext rooted at the current directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let home = global_config_dir().unwrap_or_else(|| PathBuf::from(".macbundle"));
        GlobalContext { cwd, home }
    }

    /// Override the global home directory (used by tests).
    pub fn with_home(mut self, home: PathBuf) -> Self {
        self.home = home;
        self
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Get the project-local macbundle directory.
    pub fn project_dir(&self) -> PathBuf {
        self.cwd.join(".macbundle")
    }

    /// Get the project configuration file path.
    pub fn project_config_path(&self) -> PathBuf {
        self.project_dir().join("config.toml")
    }

    /// Default location of compiled launcher stubs.
    pub fn default_prebuilt_dir(&self) -> PathBuf {
        self.project_dir().join("prebuilt")
    }

    /// Default launcher source file.
    pub fn default_stub_source(&self) -> PathBuf {
        self.cwd.join("src").join("main.c")
    }

    /// Resolve a configured path against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Load merged global + project configuration.
    pub fn load_config(&self) -> Config {
        load_config(&self.config_path(), &self.project_config_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths() {
        let ctx = GlobalContext::with_cwd(PathBuf::from("/work/app"))
            .with_home(PathBuf::from("/home/u/.macbundle"));

        assert_eq!(ctx.config_path(), PathBuf::from("/home/u/.macbundle/config.toml"));
        assert_eq!(
            ctx.project_config_path(),
            PathBuf::from("/work/app/.macbundle/config.toml")
        );
        assert_eq!(
            ctx.default_prebuilt_dir(),
            PathBuf::from("/work/app/.macbundle/prebuilt")
        );
        assert_eq!(ctx.resolve(Path::new("src/x.c")), PathBuf::from("/work/app/src/x.c"));
        assert_eq!(ctx.resolve(Path::new("/abs/x.c")), PathBuf::from("/abs/x.c"));
    }

    #[test]
    fn test_load_project_config() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf())
            .with_home(tmp.path().join("home"));

        std::fs::create_dir_all(ctx.project_dir()).unwrap();
        std::fs::write(ctx.project_config_path(), "[tools]\nibtool = \"/opt/ibtool\"\n").unwrap();

        let config = ctx.load_config();
        assert_eq!(config.tools.ibtool, Some(PathBuf::from("/opt/ibtool")));
    }
}
