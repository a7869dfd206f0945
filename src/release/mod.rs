//! Release table and artifact resolution
//!
//! A release is published as four pre-built binaries, one per [`Platform`].
//! Resolution picks the URL and expected checksum for a single platform and
//! has no side effects.

mod hash;
mod table;

use serde::Serialize;

use crate::error::InstallError;
use crate::platform::Platform;

pub use hash::{Checksum, Sha256Digest};
use table::normalize_version;

pub use table::{
    Checksums, DEFAULT_DESCRIPTION, DEFAULT_DOWNLOAD_BASE, DEFAULT_HOMEPAGE, ReleaseTable,
};

/// The artifact to download for one platform of one release.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ReleaseArtifact {
    pub version: String,
    pub platform: Platform,
    pub url: String,
    pub expected_hash: Sha256Digest,
}

/// Resolve the artifact for a raw `(os, arch)` pair at `version`.
///
/// The version replaces the table's own version; the checksums are taken from
/// the table as-is.
pub fn resolve(
    table: &ReleaseTable,
    version: &str,
    os: &str,
    arch: &str,
) -> Result<ReleaseArtifact, InstallError> {
    let platform = Platform::from_names(os, arch)?;

    let mut table = table.clone();
    table.version = normalize_version(version)?;
    resolve_platform(&table, platform)
}

pub(crate) fn resolve_platform(
    table: &ReleaseTable,
    platform: Platform,
) -> Result<ReleaseArtifact, InstallError> {
    let checksum = table.checksum(platform);
    let expected_hash = checksum
        .digest()
        .cloned()
        .ok_or_else(|| InstallError::UnresolvedPlaceholder {
            platform,
            value: checksum.as_str().to_string(),
        })?;

    Ok(ReleaseArtifact {
        version: table.version.clone(),
        platform,
        url: table.url_for(platform),
        expected_hash,
    })
}
