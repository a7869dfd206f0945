use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;
use std::path::PathBuf;

use crate::{
    completion::{Shell, install_completion},
    download::download_verified,
    http::HttpClient,
    platform::Platform,
    release::ReleaseArtifact,
    runtime::Runtime,
    verify::self_test,
};

pub mod config;
mod layout;

pub use config::{Config, ConfigOptions};
pub use layout::{BINARY_NAME, InstallLayout};

#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Do not generate shell completions.
    pub skip_completions: bool,
    /// Run `aphelion version` after installing.
    pub verify: bool,
}

/// What an install put on disk.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct InstallReport {
    pub artifact: ReleaseArtifact,
    pub binary: PathBuf,
    pub completions: Vec<PathBuf>,
    pub verified: bool,
}

/// Resolve, download, verify and install the release described by `options`.
#[tracing::instrument(skip(runtime, config_options, options))]
pub async fn install<R: Runtime>(
    runtime: R,
    config_options: ConfigOptions,
    options: InstallOptions,
) -> Result<InstallReport> {
    let config = Config::new(runtime, config_options)?;
    run(config, &options).await
}

pub async fn run<R: Runtime>(config: Config<R>, options: &InstallOptions) -> Result<InstallReport> {
    // Both checks happen before anything touches the network or the disk
    let platform = Platform::from_host(&config.host)?;
    let artifact = config.table.resolve(platform)?;

    let installer = Installer::new(config.runtime, config.http, config.layout);
    installer.install(&artifact, options).await
}

pub struct Installer<R: Runtime> {
    pub runtime: R,
    pub http_client: HttpClient,
    pub layout: InstallLayout,
}

impl<R: Runtime> Installer<R> {
    pub fn new(runtime: R, http_client: HttpClient, layout: InstallLayout) -> Self {
        Self {
            runtime,
            http_client,
            layout,
        }
    }

    #[tracing::instrument(skip(self, artifact, options), fields(platform = %artifact.platform))]
    pub async fn install(
        &self,
        artifact: &ReleaseArtifact,
        options: &InstallOptions,
    ) -> Result<InstallReport> {
        println!("   resolving aphelion {} for {}", artifact.version, artifact.platform);

        let bin_dir = self.layout.bin_dir();
        if !self.runtime.exists(&bin_dir) {
            self.runtime.create_dir_all(&bin_dir)?;
        }

        let staging = self.layout.staging_path(artifact.platform);
        println!(" downloading {}", artifact.url);
        download_verified(&self.runtime, artifact, &staging, &self.http_client).await?;

        let binary = self.place_binary(&staging)?;
        println!("   installed {}", binary.display());

        let mut completions = Vec::new();
        if options.skip_completions {
            debug!("Skipping shell completions");
        } else {
            for shell in Shell::ALL {
                let dest = self.layout.completion_path(shell);
                let written = install_completion(&self.runtime, &binary, shell, &dest).await?;
                println!("  completion {} -> {}", shell, written.display());
                completions.push(written);
            }
        }

        let verified = if options.verify {
            self_test(&self.runtime, &binary, &artifact.version).await?;
            println!("    verified aphelion {}", artifact.version);
            true
        } else {
            false
        };

        info!("Installed aphelion {} to {:?}", artifact.version, binary);

        Ok(InstallReport {
            artifact: artifact.clone(),
            binary,
            completions,
            verified,
        })
    }

    /// Moves a verified download into place and makes it executable.
    fn place_binary(&self, staging: &std::path::Path) -> Result<PathBuf> {
        let binary = self.layout.binary_path();
        self.runtime
            .rename(staging, &binary)
            .with_context(|| format!("Failed to install binary to {:?}", binary))?;
        self.runtime.set_permissions(&binary, 0o755)?;
        Ok(binary)
    }
}
