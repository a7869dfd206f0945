use crate::error::InstallError;
use crate::http::HttpClient;
use crate::release::{ReleaseArtifact, Sha256Digest};
use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::Path;

/// Downloads a file from a URL to a staging path with retry support.
#[tracing::instrument(skip(runtime, staging_path, http_client))]
pub async fn download_file<R: Runtime>(
    runtime: &R,
    url: &str,
    staging_path: &Path,
    http_client: &HttpClient,
) -> Result<u64> {
    info!("Downloading {}...", url);

    let staging_path = staging_path.to_path_buf();
    let bytes = http_client
        .download_file(url, || {
            runtime
                .create_file(&staging_path)
                .with_context(|| format!("Failed to create staging file at {:?}", staging_path))
        })
        .await?;

    info!("Download complete ({} bytes).", bytes);
    Ok(bytes)
}

/// SHA-256 of a file read through the runtime.
pub fn sha256_file<R: Runtime>(runtime: &R, path: &Path) -> Result<Sha256Digest> {
    let mut reader = runtime.open(path)?;
    Sha256Digest::of_reader(&mut reader)
        .with_context(|| format!("Failed to hash downloaded file {:?}", path))
}

/// Downloads `artifact` to `staging_path` and checks it against the expected
/// checksum.
///
/// On any failure the staging file is removed, so a mismatched or partial
/// download never survives this call.
#[tracing::instrument(skip(runtime, artifact, staging_path, http_client), fields(url = %artifact.url))]
pub async fn download_verified<R: Runtime>(
    runtime: &R,
    artifact: &ReleaseArtifact,
    staging_path: &Path,
    http_client: &HttpClient,
) -> Result<()> {
    let result = fetch_and_check(runtime, artifact, staging_path, http_client).await;
    if result.is_err() && runtime.exists(staging_path) {
        debug!("Removing staged download {:?}", staging_path);
        if let Err(e) = runtime.remove_file(staging_path) {
            warn!("Failed to remove staged download {:?}: {}", staging_path, e);
        }
    }
    result
}

async fn fetch_and_check<R: Runtime>(
    runtime: &R,
    artifact: &ReleaseArtifact,
    staging_path: &Path,
    http_client: &HttpClient,
) -> Result<()> {
    download_file(runtime, &artifact.url, staging_path, http_client).await?;

    let actual = sha256_file(runtime, staging_path)?;
    if actual != artifact.expected_hash {
        return Err(InstallError::IntegrityMismatch {
            url: artifact.url.clone(),
            expected: artifact.expected_hash.to_string(),
            actual: actual.to_string(),
        }
        .into());
    }

    debug!("Checksum verified: {}", actual);
    Ok(())
}
