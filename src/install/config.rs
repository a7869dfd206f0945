use anyhow::Result;
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::path::PathBuf;

use super::layout::InstallLayout;
use crate::http::HttpClient;
use crate::platform::{DefaultPlatformDetector, HostPlatform, PlatformDetector};
use crate::release::ReleaseTable;
use crate::runtime::Runtime;

/// User-supplied settings, usually straight from the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub prefix: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
    pub release_version: Option<String>,
    pub download_url: Option<String>,
    pub os: Option<String>,
    pub arch: Option<String>,
}

pub struct Config<R: Runtime> {
    pub runtime: R,
    pub http: HttpClient,
    pub table: ReleaseTable,
    pub host: HostPlatform,
    pub layout: InstallLayout,
}

impl<R: Runtime> Config<R> {
    pub fn new(runtime: R, options: ConfigOptions) -> Result<Self> {
        Self::with_detector(runtime, options, &DefaultPlatformDetector)
    }

    pub fn with_detector(
        runtime: R,
        options: ConfigOptions,
        detector: &dyn PlatformDetector,
    ) -> Result<Self> {
        let table = load_table(&runtime, &options)?;
        let host = detector.detect().with_overrides(options.os, options.arch);
        let layout = InstallLayout::resolve(&runtime, options.prefix)?;
        let http = HttpClient::new(build_client(&runtime)?);

        debug!(
            "Config: version {} for {}/{} into {:?}",
            table.version,
            host.os,
            host.arch,
            layout.prefix()
        );

        Ok(Self {
            runtime,
            http,
            table,
            host,
            layout,
        })
    }
}

/// The built-in table, or a manifest, with command-line overrides applied.
pub fn load_table<R: Runtime>(runtime: &R, options: &ConfigOptions) -> Result<ReleaseTable> {
    let mut table = match &options.manifest {
        Some(path) => ReleaseTable::load(runtime, path)?,
        None => ReleaseTable::builtin(),
    };
    if let Some(version) = &options.release_version {
        table = table.with_version(version)?;
    }
    if let Some(base) = &options.download_url {
        table = table.with_download_base(base);
    }
    Ok(table)
}

fn build_client<R: Runtime>(runtime: &R) -> Result<Client> {
    let mut headers = HeaderMap::new();
    if let Ok(token) = runtime.env_var("GITHUB_TOKEN") {
        if !token.is_empty() {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using GITHUB_TOKEN for authentication");
        }
    }

    let client = Client::builder()
        .user_agent(concat!("aphelion-install/", env!("APHELION_INSTALL_VERSION")))
        .default_headers(headers)
        .build()?;
    Ok(client)
}
