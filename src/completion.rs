//! Shell completion scripts generated by the installed binary.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::InstallError;
use crate::runtime::Runtime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

impl Shell {
    pub const ALL: [Shell; 3] = [Shell::Bash, Shell::Zsh, Shell::Fish];

    pub fn as_str(&self) -> &'static str {
        match self {
            Shell::Bash => "bash",
            Shell::Zsh => "zsh",
            Shell::Fish => "fish",
        }
    }

    /// Directory under the install prefix where this shell looks for completions.
    pub fn completion_dir(&self) -> &'static str {
        match self {
            Shell::Bash => "etc/bash_completion.d",
            Shell::Zsh => "share/zsh/site-functions",
            Shell::Fish => "share/fish/vendor_completions.d",
        }
    }

    /// File name for a command's completion script.
    pub fn file_name(&self, command: &str) -> String {
        match self {
            Shell::Bash => command.to_string(),
            Shell::Zsh => format!("_{}", command),
            Shell::Fish => format!("{}.fish", command),
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs `<binary> completion <shell>` and returns its stdout bytes.
///
/// Empty output is returned as-is; only spawn failures and non-zero exits are
/// errors.
#[tracing::instrument(skip(runtime))]
pub async fn generate<R: Runtime>(runtime: &R, binary: &Path, shell: Shell) -> Result<Vec<u8>> {
    let args = vec!["completion".to_string(), shell.as_str().to_string()];
    let output = runtime
        .run_command(binary, &args)
        .await
        .map_err(|e| InstallError::CompletionGenerationFailure {
            shell,
            binary: binary.to_path_buf(),
            reason: format!("{:#}", e),
        })?;

    if !output.success {
        return Err(InstallError::CompletionGenerationFailure {
            shell,
            binary: binary.to_path_buf(),
            reason: output.failure_reason(),
        }
        .into());
    }

    Ok(output.stdout)
}

/// Generates the completion script for `shell` and writes it verbatim to `dest`.
#[tracing::instrument(skip(runtime))]
pub async fn install_completion<R: Runtime>(
    runtime: &R,
    binary: &Path,
    shell: Shell,
    dest: &Path,
) -> Result<PathBuf> {
    let script = generate(runtime, binary, shell).await?;

    if script.trim_ascii().is_empty() {
        warn!(
            "{} completion output from {:?} is empty; writing it anyway",
            shell, binary
        );
    }

    if let Some(parent) = dest.parent() {
        if !runtime.exists(parent) {
            runtime.create_dir_all(parent)?;
        }
    }

    runtime
        .write(dest, &script)
        .with_context(|| format!("Failed to write {} completion to {:?}", shell, dest))?;

    debug!("Wrote {} completion to {:?}", shell, dest);
    Ok(dest.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{CommandOutput, MockRuntime};
    use mockall::predicate::{always, eq};

    #[test]
    fn test_file_names() {
        assert_eq!(Shell::Bash.file_name("aphelion"), "aphelion");
        assert_eq!(Shell::Zsh.file_name("aphelion"), "_aphelion");
        assert_eq!(Shell::Fish.file_name("aphelion"), "aphelion.fish");
    }

    #[test]
    fn test_completion_dirs() {
        assert_eq!(Shell::Bash.completion_dir(), "etc/bash_completion.d");
        assert_eq!(Shell::Zsh.completion_dir(), "share/zsh/site-functions");
        assert_eq!(
            Shell::Fish.completion_dir(),
            "share/fish/vendor_completions.d"
        );
    }

    #[tokio::test]
    async fn test_generate_passes_shell_argument() {
        let binary = PathBuf::from("/opt/aphelion/bin/aphelion");
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run_command()
            .withf(|program, args| {
                program == Path::new("/opt/aphelion/bin/aphelion")
                    && args == ["completion".to_string(), "zsh".to_string()]
            })
            .returning(|_, _| Ok(CommandOutput::ok("#compdef aphelion\n")));

        let script = generate(&runtime, &binary, Shell::Zsh).await.unwrap();
        assert_eq!(script, b"#compdef aphelion\n");
    }

    #[tokio::test]
    async fn test_generate_non_zero_exit_fails() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run_command()
            .returning(|_, _| Ok(CommandOutput::failed(1, "unknown shell")));

        let err = generate(&runtime, Path::new("aphelion"), Shell::Fish)
            .await
            .unwrap_err();

        match err.downcast_ref::<InstallError>() {
            Some(InstallError::CompletionGenerationFailure { shell, reason, .. }) => {
                assert_eq!(*shell, Shell::Fish);
                assert!(reason.contains("unknown shell"));
            }
            other => panic!("Expected CompletionGenerationFailure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_spawn_failure() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_run_command()
            .returning(|_, _| Err(anyhow::anyhow!("No such file or directory")));

        let err = generate(&runtime, Path::new("aphelion"), Shell::Bash)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::CompletionGenerationFailure { .. })
        ));
    }

    #[tokio::test]
    async fn test_install_completion_writes_verbatim() {
        let dest = PathBuf::from("/prefix/etc/bash_completion.d/aphelion");
        let script = "# bash completion for aphelion\ncomplete -F _aphelion aphelion\n";

        let mut runtime = MockRuntime::new();
        runtime
            .expect_run_command()
            .returning(move |_, _| Ok(CommandOutput::ok(script)));
        runtime
            .expect_exists()
            .with(eq(PathBuf::from("/prefix/etc/bash_completion.d")))
            .returning(|_| false);
        runtime
            .expect_create_dir_all()
            .with(eq(PathBuf::from("/prefix/etc/bash_completion.d")))
            .returning(|_| Ok(()));
        runtime
            .expect_write()
            .with(eq(dest.clone()), eq(script.as_bytes().to_vec()))
            .times(1)
            .returning(|_, _| Ok(()));

        let written = install_completion(&runtime, Path::new("aphelion"), Shell::Bash, &dest)
            .await
            .unwrap();

        assert_eq!(written, dest);
    }

    #[tokio::test]
    async fn test_install_completion_keeps_non_utf8_bytes() {
        let dest = PathBuf::from("/prefix/share/zsh/site-functions/_aphelion");
        let script = vec![b'#', b' ', 0xff, 0xfe, b'\n'];

        let mut runtime = MockRuntime::new();
        let output = script.clone();
        runtime
            .expect_run_command()
            .returning(move |_, _| Ok(CommandOutput::ok(output.clone())));
        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_write()
            .with(eq(dest.clone()), eq(script))
            .times(1)
            .returning(|_, _| Ok(()));

        install_completion(&runtime, Path::new("aphelion"), Shell::Zsh, &dest)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_install_completion_empty_output_still_written() {
        let dest = PathBuf::from("/prefix/share/fish/vendor_completions.d/aphelion.fish");

        let mut runtime = MockRuntime::new();
        runtime
            .expect_run_command()
            .returning(|_, _| Ok(CommandOutput::ok("")));
        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_write()
            .with(eq(dest.clone()), always())
            .times(1)
            .returning(|_, contents| {
                assert!(contents.is_empty());
                Ok(())
            });

        let result =
            install_completion(&runtime, Path::new("aphelion"), Shell::Fish, &dest).await;

        assert!(result.is_ok());
    }
}
