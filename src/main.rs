use anyhow::Result;
use aphelion_install::install::{Config, ConfigOptions, InstallOptions};
use aphelion_install::platform::Platform;
use aphelion_install::runtime::RealRuntime;
use aphelion_install::{formula, verify};
use clap::Parser;
use std::path::PathBuf;

/// aphelion-install - installer for the Aphelion CLI
///
/// Picks the release binary for this machine, checks its SHA-256 against the
/// release table, installs it and registers bash, zsh and fish completions.
///
/// If the GITHUB_TOKEN environment variable is set, it will be used for authentication.
///
/// Examples:
///   aphelion-install install --verify
///   aphelion-install resolve --os linux --arch aarch64
#[derive(Parser, Debug)]
#[command(author, version = env!("APHELION_INSTALL_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Install prefix (binary goes to PREFIX/bin; defaults to ~/.local)
    #[arg(
        long = "prefix",
        short = 'p',
        env = "APHELION_PREFIX",
        value_name = "PATH",
        global = true
    )]
    pub prefix: Option<PathBuf>,

    /// Release manifest (JSON) to use instead of the built-in table
    #[arg(
        long = "manifest",
        short = 'm',
        env = "APHELION_MANIFEST",
        value_name = "PATH",
        global = true
    )]
    pub manifest: Option<PathBuf>,

    /// Release version to install (defaults to the table's version)
    #[arg(long = "release-version", value_name = "VERSION", global = true)]
    pub release_version: Option<String>,

    /// Base URL for release downloads
    #[arg(long = "download-url", value_name = "URL", global = true)]
    pub download_url: Option<String>,

    /// Operating system to resolve for (defaults to this machine)
    #[arg(long = "os", value_name = "OS", global = true)]
    pub os: Option<String>,

    /// CPU architecture to resolve for (defaults to this machine)
    #[arg(long = "arch", value_name = "ARCH", global = true)]
    pub arch: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print the download URL and checksum for this platform
    Resolve(ResolveArgs),

    /// Download, verify and install the Aphelion CLI
    Install(InstallArgs),

    /// Check that the installed binary reports the expected version
    Verify(VerifyArgs),

    /// Print the Homebrew formula for the release table
    Formula,

    /// List the release table
    Platforms,
}

#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    /// Print the artifact as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    /// Run `aphelion version` after installing
    #[arg(long)]
    pub verify: bool,

    /// Do not install shell completions
    #[arg(long)]
    pub skip_completions: bool,
}

#[derive(clap::Args, Debug)]
pub struct VerifyArgs {
    /// Binary to check (defaults to PREFIX/bin/aphelion)
    #[arg(long, value_name = "PATH")]
    pub binary: Option<PathBuf>,
}

impl Cli {
    fn config_options(&self) -> ConfigOptions {
        ConfigOptions {
            prefix: self.prefix.clone(),
            manifest: self.manifest.clone(),
            release_version: self.release_version.clone(),
            download_url: self.download_url.clone(),
            os: self.os.clone(),
            arch: self.arch.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let options = cli.config_options();

    match cli.command {
        Commands::Install(args) => {
            aphelion_install::install::install(
                RealRuntime,
                options,
                InstallOptions {
                    skip_completions: args.skip_completions,
                    verify: args.verify,
                },
            )
            .await?;
        }
        Commands::Resolve(args) => {
            let config = Config::new(RealRuntime, options)?;
            let platform = Platform::from_host(&config.host)?;
            let artifact = config.table.resolve(platform)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&artifact)?);
            } else {
                println!("{}", artifact.url);
                println!("sha256 {}", artifact.expected_hash);
            }
        }
        Commands::Verify(args) => {
            let config = Config::new(RealRuntime, options)?;
            let binary = args
                .binary
                .unwrap_or_else(|| config.layout.binary_path());
            verify::self_test(&config.runtime, &binary, &config.table.version).await?;
            println!("{} reports version {}", binary.display(), config.table.version);
        }
        Commands::Formula => {
            let config = Config::new(RealRuntime, options)?;
            print!("{}", formula::render(&config.table));
        }
        Commands::Platforms => {
            let config = Config::new(RealRuntime, options)?;
            let host = Platform::from_host(&config.host).ok();
            for platform in Platform::ALL {
                let marker = if Some(platform) == host { "*" } else { " " };
                let checksum = config.table.checksum(platform);
                let status = if checksum.is_placeholder() {
                    "unpublished".to_string()
                } else {
                    checksum.to_string()
                };
                println!(
                    "{} {:<13} {}  {}",
                    marker,
                    platform.to_string(),
                    config.table.url_for(platform),
                    status
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_install_parsing() {
        let cli = Cli::try_parse_from(["aphelion-install", "install", "--verify"]).unwrap();
        match cli.command {
            Commands::Install(args) => {
                assert!(args.verify);
                assert!(!args.skip_completions);
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "aphelion-install",
            "resolve",
            "--os",
            "linux",
            "--arch",
            "aarch64",
            "--release-version",
            "1.2.0",
            "--prefix",
            "/tmp/prefix",
        ])
        .unwrap();

        let options = cli.config_options();
        assert_eq!(options.os.as_deref(), Some("linux"));
        assert_eq!(options.arch.as_deref(), Some("aarch64"));
        assert_eq!(options.release_version.as_deref(), Some("1.2.0"));
        assert_eq!(options.prefix, Some(PathBuf::from("/tmp/prefix")));
    }

    #[test]
    fn test_cli_global_flags_before_subcommand() {
        let cli = Cli::try_parse_from([
            "aphelion-install",
            "--manifest",
            "release.json",
            "formula",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Formula));
        assert_eq!(cli.manifest, Some(PathBuf::from("release.json")));
    }

    #[test]
    fn test_cli_verify_binary_parsing() {
        let cli =
            Cli::try_parse_from(["aphelion-install", "verify", "--binary", "/usr/bin/aphelion"])
                .unwrap();
        match cli.command {
            Commands::Verify(args) => {
                assert_eq!(args.binary, Some(PathBuf::from("/usr/bin/aphelion")));
            }
            _ => panic!("Expected Verify command"),
        }
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["aphelion-install"]).is_err());
    }
}
