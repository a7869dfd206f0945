use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::completion::Shell;
use crate::platform::Platform;
use crate::runtime::Runtime;

/// Name of the installed executable.
pub const BINARY_NAME: &str = "aphelion";

/// Where an install places files, relative to a prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallLayout {
    prefix: PathBuf,
}

impl InstallLayout {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// `--prefix`, then `APHELION_PREFIX`, then `~/.local`.
    pub fn resolve<R: Runtime>(runtime: &R, prefix: Option<PathBuf>) -> Result<Self> {
        if let Some(prefix) = prefix {
            return Ok(Self::new(prefix));
        }
        if let Ok(prefix) = runtime.env_var("APHELION_PREFIX") {
            if !prefix.is_empty() {
                return Ok(Self::new(prefix));
            }
        }
        let home = runtime
            .home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(Self::new(home.join(".local")))
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.prefix.join("bin")
    }

    pub fn binary_path(&self) -> PathBuf {
        self.bin_dir().join(BINARY_NAME)
    }

    /// Hidden download target next to the binary, so the final move stays
    /// on one filesystem.
    pub fn staging_path(&self, platform: Platform) -> PathBuf {
        self.bin_dir()
            .join(format!(".{}.download", platform.asset_name()))
    }

    pub fn completion_path(&self, shell: Shell) -> PathBuf {
        self.prefix
            .join(shell.completion_dir())
            .join(shell.file_name(BINARY_NAME))
    }
}
