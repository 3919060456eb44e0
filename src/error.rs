//! Error taxonomy for the acquisition and installation pipeline.
//!
//! Every core operation returns [`NymError`]; the command layer turns it into a
//! single descriptive line and a nonzero exit.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = NymError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum NymError {
    #[error("Could not determine the home directory")]
    HomeDirectoryUnavailable,

    #[error("Network request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("Malformed response from {url}: {source}")]
    Format {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to save download to {}: {message}", path.display())]
    Download { path: PathBuf, message: String },

    #[error("Downloaded file {} is empty", .0.display())]
    EmptyArtifact(PathBuf),

    #[error("Downloaded file {} is not a valid zip archive", .0.display())]
    InvalidFormat(PathBuf),

    #[error("Unsupported archive format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Failed to extract {}: {message}", archive.display())]
    Extraction { archive: PathBuf, message: String },

    #[error(
        "Version v{} is not available. Recent versions: {}",
        .version,
        .recent.join(", ")
    )]
    VersionNotAvailable {
        version: String,
        recent: Vec<String>,
    },

    #[error("Invalid version {0:?}: expected a release number such as 20.11.0")]
    InvalidVersion(String),

    #[error("Version v{0} is not installed")]
    VersionNotInstalled(String),

    #[error("Failed to remove existing link {}: {message}", link.display())]
    LinkReplacement { link: PathBuf, message: String },

    #[error(
        "Creating {} requires elevated privileges. Run the shell as administrator or enable Developer Mode",
        .0.display()
    )]
    InsufficientPrivilege(PathBuf),

    #[error("Failed to create link {}: {message}", link.display())]
    Link { link: PathBuf, message: String },

    #[error("{context}: {message}")]
    Io { context: String, message: String },
}

impl NymError {
    pub(crate) fn download(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        NymError::Download {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn extraction(archive: impl Into<PathBuf>, err: anyhow::Error) -> Self {
        NymError::Extraction {
            archive: archive.into(),
            message: format!("{:#}", err),
        }
    }

    pub(crate) fn io(context: impl Into<String>, err: anyhow::Error) -> Self {
        NymError::Io {
            context: context.into(),
            message: format!("{:#}", err),
        }
    }
}
