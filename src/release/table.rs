use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::hash::Checksum;
use super::{ReleaseArtifact, resolve_platform};
use crate::error::InstallError;
use crate::platform::Platform;
use crate::runtime::Runtime;

pub const DEFAULT_DOWNLOAD_BASE: &str =
    "https://github.com/Exmplr-AI/aphelion-cli/releases/download";
pub const DEFAULT_HOMEPAGE: &str = "https://github.com/Exmplr-AI/aphelion-cli";
pub const DEFAULT_DESCRIPTION: &str = "Command-line interface for the Aphelion Gateway platform";

/// One checksum per supported platform. Every platform has a slot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Checksums {
    #[serde(rename = "darwin-arm64")]
    pub darwin_arm64: Checksum,
    #[serde(rename = "darwin-amd64")]
    pub darwin_amd64: Checksum,
    #[serde(rename = "linux-arm64")]
    pub linux_arm64: Checksum,
    #[serde(rename = "linux-amd64")]
    pub linux_amd64: Checksum,
}

impl Checksums {
    pub fn get(&self, platform: Platform) -> &Checksum {
        match platform {
            Platform::DarwinArm64 => &self.darwin_arm64,
            Platform::DarwinAmd64 => &self.darwin_amd64,
            Platform::LinuxArm64 => &self.linux_arm64,
            Platform::LinuxAmd64 => &self.linux_amd64,
        }
    }
}

/// The release table: a version plus one artifact checksum per platform.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReleaseTable {
    pub version: String,
    #[serde(default = "default_download_base")]
    pub download_base: String,
    #[serde(default = "default_homepage")]
    pub homepage: String,
    #[serde(default = "default_description")]
    pub description: String,
    pub checksums: Checksums,
}

fn default_download_base() -> String {
    DEFAULT_DOWNLOAD_BASE.to_string()
}

fn default_homepage() -> String {
    DEFAULT_HOMEPAGE.to_string()
}

fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_string()
}

impl ReleaseTable {
    /// Table as shipped before the release workflow fills in checksums.
    pub fn builtin() -> Self {
        Self {
            version: "1.0.0".to_string(),
            download_base: default_download_base(),
            homepage: default_homepage(),
            description: default_description(),
            checksums: Checksums {
                darwin_arm64: Checksum::placeholder("REPLACE_WITH_ARM64_SHA256"),
                darwin_amd64: Checksum::placeholder("REPLACE_WITH_AMD64_SHA256"),
                linux_arm64: Checksum::placeholder("REPLACE_WITH_LINUX_ARM64_SHA256"),
                linux_amd64: Checksum::placeholder("REPLACE_WITH_LINUX_AMD64_SHA256"),
            },
        }
    }

    /// Load a JSON manifest.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime.read_to_string(path)?;
        let table: ReleaseTable = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse release manifest {:?}", path))?;
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            anyhow::bail!("Release manifest has an empty version");
        }
        if self.download_base.trim().is_empty() {
            anyhow::bail!("Release manifest has an empty download_base");
        }
        Ok(())
    }

    pub fn with_version(mut self, version: &str) -> Result<Self> {
        self.version = normalize_version(version)?;
        Ok(self)
    }

    pub fn with_download_base(mut self, base: &str) -> Self {
        self.download_base = base.trim_end_matches('/').to_string();
        self
    }

    /// Download URL for `platform` at this table's version.
    pub fn url_for(&self, platform: Platform) -> String {
        format!(
            "{}/v{}/{}",
            self.download_base.trim_end_matches('/'),
            self.version,
            platform.asset_name()
        )
    }

    pub fn checksum(&self, platform: Platform) -> &Checksum {
        self.checksums.get(platform)
    }

    /// Platforms whose checksum has not been published yet.
    pub fn placeholders(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.checksum(*p).is_placeholder())
            .collect()
    }

    pub fn resolve(&self, platform: Platform) -> Result<ReleaseArtifact, InstallError> {
        resolve_platform(self, platform)
    }
}

/// Trims `version` and drops a leading `v`; nothing may be left empty.
pub(crate) fn normalize_version(version: &str) -> Result<String, InstallError> {
    let trimmed = version.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    if bare.is_empty() {
        return Err(InstallError::InvalidVersion {
            version: version.to_string(),
        });
    }
    Ok(bare.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    const DIGEST: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    fn manifest_json() -> String {
        format!(
            r#"{{
                "version": "2.1.0",
                "checksums": {{
                    "darwin-arm64": "{d}",
                    "darwin-amd64": "{d}",
                    "linux-arm64": "REPLACE_WITH_LINUX_ARM64_SHA256",
                    "linux-amd64": "{d}"
                }}
            }}"#,
            d = DIGEST
        )
    }

    #[test]
    fn test_builtin_table_is_all_placeholders() {
        let table = ReleaseTable::builtin();
        assert_eq!(table.version, "1.0.0");
        assert_eq!(table.placeholders(), Platform::ALL.to_vec());
    }

    #[test]
    fn test_load_manifest_with_defaults() {
        let path = PathBuf::from("/etc/aphelion/release.json");
        let mut runtime = MockRuntime::new();
        let json = manifest_json();
        runtime
            .expect_read_to_string()
            .with(eq(path.clone()))
            .returning(move |_| Ok(json.clone()));

        let table = ReleaseTable::load(&runtime, &path).unwrap();

        assert_eq!(table.version, "2.1.0");
        assert_eq!(table.download_base, DEFAULT_DOWNLOAD_BASE);
        assert_eq!(table.homepage, DEFAULT_HOMEPAGE);
        assert_eq!(table.placeholders(), vec![Platform::LinuxArm64]);
        assert_eq!(table.checksum(Platform::DarwinArm64).as_str(), DIGEST);
    }

    #[test]
    fn test_load_manifest_missing_platform_fails() {
        let path = PathBuf::from("release.json");
        let mut runtime = MockRuntime::new();
        runtime.expect_read_to_string().returning(|_| {
            Ok(format!(
                r#"{{"version": "1.0.0", "checksums": {{"darwin-arm64": "{}"}}}}"#,
                DIGEST
            ))
        });

        let err = ReleaseTable::load(&runtime, &path).unwrap_err();
        assert!(format!("{:#}", err).contains("missing field"));
    }

    #[test]
    fn test_load_manifest_malformed_digest_fails() {
        let path = PathBuf::from("release.json");
        let mut runtime = MockRuntime::new();
        let json = manifest_json().replacen(DIGEST, &DIGEST[..63], 1);
        runtime
            .expect_read_to_string()
            .returning(move |_| Ok(json.clone()));

        let err = ReleaseTable::load(&runtime, &path).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("Invalid SHA256 digest"), "{}", msg);
        assert!(!msg.contains("placeholder"));
    }

    #[test]
    fn test_load_manifest_empty_version_fails() {
        let path = PathBuf::from("release.json");
        let mut runtime = MockRuntime::new();
        let json = manifest_json().replace("2.1.0", " ");
        runtime
            .expect_read_to_string()
            .returning(move |_| Ok(json.clone()));

        let err = ReleaseTable::load(&runtime, &path).unwrap_err();
        assert!(err.to_string().contains("empty version"));
    }

    #[test]
    fn test_with_version_strips_prefix() {
        let table = ReleaseTable::builtin().with_version("v1.2.3").unwrap();
        assert_eq!(table.version, "1.2.3");
        assert!(ReleaseTable::builtin().with_version("  ").is_err());
        assert!(ReleaseTable::builtin().with_version("v").is_err());
    }

    #[test]
    fn test_url_for_uses_naming_convention() {
        let table = ReleaseTable::builtin().with_download_base("http://127.0.0.1:1234/dl/");
        assert_eq!(
            table.url_for(Platform::LinuxAmd64),
            "http://127.0.0.1:1234/dl/v1.0.0/aphelion-linux-amd64"
        );
        assert_eq!(
            ReleaseTable::builtin().url_for(Platform::DarwinArm64),
            "https://github.com/Exmplr-AI/aphelion-cli/releases/download/v1.0.0/aphelion-darwin-arm64"
        );
    }
}
