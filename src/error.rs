//! Failures that abort an install or verification run.
//!
//! These travel inside `anyhow::Error` like the rest of the crate's errors;
//! callers that need to branch on the kind use `downcast_ref::<InstallError>()`.

use std::path::PathBuf;
use thiserror::Error;

use crate::completion::Shell;
use crate::platform::Platform;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Invalid release version {version:?}: expected something like 1.2.0 or v1.2.0")]
    InvalidVersion { version: String },

    #[error("Unsupported platform: {os}/{arch}. Supported: darwin and linux on arm64 or amd64")]
    UnsupportedPlatform { os: String, arch: String },

    #[error(
        "Checksum for {platform} is an unresolved placeholder ({value}). The release table has not been published yet"
    )]
    UnresolvedPlaceholder { platform: Platform, value: String },

    #[error("Integrity check failed for {url}: expected sha256 {expected}, got {actual}")]
    IntegrityMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("Failed to generate {shell} completion with {binary:?}: {reason}")]
    CompletionGenerationFailure {
        shell: Shell,
        binary: PathBuf,
        reason: String,
    },

    #[error("Version check failed for {binary:?}: expected output containing {expected:?}, got {output:?}")]
    VersionMismatch {
        binary: PathBuf,
        expected: String,
        output: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, Os};

    #[test]
    fn test_invalid_version_display() {
        let err = InstallError::InvalidVersion {
            version: "v".into(),
        };
        assert!(err.to_string().contains("Invalid release version \"v\""));
    }

    #[test]
    fn test_unsupported_platform_display() {
        let err = InstallError::UnsupportedPlatform {
            os: "windows".into(),
            arch: "x86_64".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("windows/x86_64"));
        assert!(msg.contains("Supported"));
    }

    #[test]
    fn test_placeholder_display_names_platform() {
        let err = InstallError::UnresolvedPlaceholder {
            platform: Platform::new(Os::Linux, Arch::Arm64),
            value: "REPLACE_WITH_LINUX_ARM64_SHA256".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("linux-arm64"));
        assert!(msg.contains("REPLACE_WITH_LINUX_ARM64_SHA256"));
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = InstallError::IntegrityMismatch {
            url: "https://example.com/a".into(),
            expected: "aa".into(),
            actual: "bb".into(),
        }
        .into();

        assert!(matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::IntegrityMismatch { .. })
        ));
    }
}
