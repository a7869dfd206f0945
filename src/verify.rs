//! Post-install self-test.

use anyhow::Result;
use log::{debug, info};
use std::path::Path;

use crate::error::InstallError;
use crate::runtime::Runtime;

/// Runs `<binary> version` and checks that the output mentions `version`.
///
/// Returns the captured output on success.
#[tracing::instrument(skip(runtime))]
pub async fn self_test<R: Runtime>(runtime: &R, binary: &Path, version: &str) -> Result<String> {
    let output = runtime
        .run_command(binary, &["version".to_string()])
        .await?;
    let stdout = output.stdout_text();
    debug!("{:?} version output: {:?}", binary, stdout);

    if !output.success {
        return Err(InstallError::VersionMismatch {
            binary: binary.to_path_buf(),
            expected: version.to_string(),
            output: output.failure_reason(),
        }
        .into());
    }

    if !stdout.contains(version) {
        return Err(InstallError::VersionMismatch {
            binary: binary.to_path_buf(),
            expected: version.to_string(),
            output: stdout.trim().to_string(),
        }
        .into());
    }

    info!("{:?} reports version {}", binary, version);
    Ok(stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{CommandOutput, MockRuntime};

    const VERSION_OUTPUT: &str =
        "Aphelion CLI\nVersion: 1.0.0\nCommit: abc123\nBuilt: 2024-01-01\nBuilt by: goreleaser\n";

    #[tokio::test]
    async fn test_self_test_passes() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run_command()
            .withf(|program, args| {
                program == Path::new("/prefix/bin/aphelion") && args == ["version".to_string()]
            })
            .returning(|_, _| Ok(CommandOutput::ok(VERSION_OUTPUT)));

        let output = self_test(&runtime, Path::new("/prefix/bin/aphelion"), "1.0.0")
            .await
            .unwrap();
        assert!(output.contains("Version: 1.0.0"));
    }

    #[tokio::test]
    async fn test_self_test_version_mismatch() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run_command()
            .returning(|_, _| Ok(CommandOutput::ok("Aphelion CLI\nVersion: 0.9.0\n")));

        let err = self_test(&runtime, Path::new("aphelion"), "1.0.0")
            .await
            .unwrap_err();

        match err.downcast_ref::<InstallError>() {
            Some(InstallError::VersionMismatch {
                expected, output, ..
            }) => {
                assert_eq!(expected, "1.0.0");
                assert!(output.contains("0.9.0"));
            }
            other => panic!("Expected VersionMismatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_self_test_non_zero_exit() {
        // Even if the version string shows up, a failing exit is a failed test
        let mut runtime = MockRuntime::new();
        runtime.expect_run_command().returning(|_, _| {
            Ok(CommandOutput {
                success: false,
                code: Some(1),
                stdout: "Version: 1.0.0\n".into(),
                stderr: "config missing".into(),
            })
        });

        let err = self_test(&runtime, Path::new("aphelion"), "1.0.0")
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::VersionMismatch { .. })
        ));
    }
}
