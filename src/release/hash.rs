use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use std::io::Read;

/// A validated SHA256 digest (64 lowercase hex characters)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Create a new Sha256Digest, validating the input
    ///
    /// Accepts strings with or without "sha256:" prefix.
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        let hex = s.strip_prefix("sha256:").unwrap_or(&s);

        if hex.len() != 64 {
            anyhow::bail!(
                "Invalid SHA256 digest: expected 64 hex characters, got {} in '{s}'",
                hex.len(),
            );
        }

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            anyhow::bail!("Invalid SHA256 digest: contains non-hex characters in '{s}'");
        }

        Ok(Self(hex.to_lowercase()))
    }

    /// Digest of an in-memory buffer.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    /// Digest of everything readable from `reader`.
    pub fn of_reader(reader: &mut dyn Read) -> Result<Self> {
        let mut hasher = Sha256::new();
        std::io::copy(reader, &mut hasher).context("Failed to read content for hashing")?;
        Ok(Self(hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A checksum slot in the release table.
///
/// Slots are filled in by the release workflow. Until then they hold a
/// `REPLACE_WITH_*` marker, which is kept verbatim so the table can still be
/// rendered as a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Checksum {
    Digest(Sha256Digest),
    Placeholder(String),
}

/// Marker prefix of a checksum the release workflow has not filled in yet.
pub const PLACEHOLDER_PREFIX: &str = "REPLACE_WITH_";

impl Checksum {
    /// Parses a digest or a `REPLACE_WITH_*` marker. Anything else is an error,
    /// so a mistyped digest is not mistaken for an unpublished one.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.starts_with(PLACEHOLDER_PREFIX) {
            return Ok(Checksum::Placeholder(s.to_string()));
        }
        Ok(Checksum::Digest(Sha256Digest::new(s)?))
    }

    pub fn placeholder(marker: &str) -> Self {
        Checksum::Placeholder(marker.to_string())
    }

    pub fn digest(&self) -> Option<&Sha256Digest> {
        match self {
            Checksum::Digest(d) => Some(d),
            Checksum::Placeholder(_) => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Checksum::Placeholder(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Checksum::Digest(d) => d.as_str(),
            Checksum::Placeholder(p) => p,
        }
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Checksum::parse(&s).map_err(|e| serde::de::Error::custom(format!("{:#}", e)))
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
