//! Platform detection and classification
//!
//! The release table only carries four artifacts, so every host is reduced to
//! one of four [`Platform`] tags or rejected. Detection itself reports raw
//! strings ([`HostPlatform`]); classification is where unsupported hosts are
//! turned into an explicit error.

mod detection;

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::InstallError;

pub use detection::{DefaultPlatformDetector, HostPlatform, PlatformDetector};

/// Operating systems that have a release artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Darwin,
    Linux,
}

impl Os {
    /// Name used in release asset file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Darwin => "darwin",
            Os::Linux => "linux",
        }
    }
}

impl FromStr for Os {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "darwin" | "macos" | "osx" => Ok(Os::Darwin),
            "linux" => Ok(Os::Linux),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architecture bucket.
///
/// Only ARM and "everything else" are distinguished: any non-ARM value lands
/// in `Amd64`, so 32-bit x86 or RISC-V hosts will be handed the amd64 build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    Arm64,
    Amd64,
}

impl Arch {
    pub fn classify(raw: &str) -> Self {
        let raw = raw.trim().to_ascii_lowercase();
        if raw.starts_with("arm") || raw.starts_with("aarch") {
            Arch::Arm64
        } else {
            Arch::Amd64
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Arm64 => "arm64",
            Arch::Amd64 => "amd64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the four supported platform tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    DarwinArm64,
    DarwinAmd64,
    LinuxArm64,
    LinuxAmd64,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::DarwinArm64,
        Platform::DarwinAmd64,
        Platform::LinuxArm64,
        Platform::LinuxAmd64,
    ];

    pub fn new(os: Os, arch: Arch) -> Self {
        match (os, arch) {
            (Os::Darwin, Arch::Arm64) => Platform::DarwinArm64,
            (Os::Darwin, Arch::Amd64) => Platform::DarwinAmd64,
            (Os::Linux, Arch::Arm64) => Platform::LinuxArm64,
            (Os::Linux, Arch::Amd64) => Platform::LinuxAmd64,
        }
    }

    /// Classify raw OS and architecture names.
    ///
    /// Fails with [`InstallError::UnsupportedPlatform`] when the OS has no
    /// artifact. Architecture never fails, see [`Arch::classify`].
    pub fn from_names(os: &str, arch: &str) -> Result<Self, InstallError> {
        let parsed = os
            .parse::<Os>()
            .map_err(|_| InstallError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            })?;
        Ok(Platform::new(parsed, Arch::classify(arch)))
    }

    pub fn from_host(host: &HostPlatform) -> Result<Self, InstallError> {
        Self::from_names(&host.os, &host.arch)
    }

    pub fn os(&self) -> Os {
        match self {
            Platform::DarwinArm64 | Platform::DarwinAmd64 => Os::Darwin,
            Platform::LinuxArm64 | Platform::LinuxAmd64 => Os::Linux,
        }
    }

    pub fn arch(&self) -> Arch {
        match self {
            Platform::DarwinArm64 | Platform::LinuxArm64 => Arch::Arm64,
            Platform::DarwinAmd64 | Platform::LinuxAmd64 => Arch::Amd64,
        }
    }

    /// Release asset file name, e.g. `aphelion-darwin-arm64`.
    pub fn asset_name(&self) -> String {
        format!("aphelion-{}", self)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os(), self.arch())
    }
}

impl Serialize for Platform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
