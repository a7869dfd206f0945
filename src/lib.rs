pub mod completion;
pub mod download;
pub mod error;
pub mod formula;
pub mod http;
pub mod install;
pub mod platform;
pub mod release;
pub mod runtime;
pub mod verify;

pub use error::InstallError;
pub use release::{ReleaseArtifact, ReleaseTable, resolve};
