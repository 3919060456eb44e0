//! On-disk layout of the install root.
//!
//! ```text
//! <root>/
//!   versions/
//!     v18.17.1/
//!     v20.11.0/
//!   current -> versions/v20.11.0
//! ```

use log::debug;
use std::path::{Path, PathBuf};

use crate::error::{NymError, Result};
use crate::runtime::Runtime;

/// Install root used when neither `--root` nor `NYM_ROOT` is given.
pub const DEFAULT_ROOT: &str = "~/.nym";

/// Prefix carried by every directory under `versions/`.
pub const VERSION_DIR_PREFIX: char = 'v';

/// Replace a leading `~` with the home directory.
///
/// Only `~` on its own or followed by a path separator is expanded; anything else is
/// returned unchanged without consulting the runtime.
pub fn expand_home<R: Runtime>(runtime: &R, path: &Path) -> Result<PathBuf> {
    let Some(raw) = path.to_str() else {
        return Ok(path.to_path_buf());
    };

    let rest = if raw == "~" {
        ""
    } else if let Some(rest) = raw
        .strip_prefix("~/")
        .or_else(|| raw.strip_prefix("~\\"))
    {
        rest
    } else {
        return Ok(path.to_path_buf());
    };

    let home = runtime
        .home_dir()
        .ok_or(NymError::HomeDirectoryUnavailable)?;
    Ok(if rest.is_empty() { home } else { home.join(rest) })
}

/// Strip one leading `v` from a user-supplied version string.
pub fn normalize_version(version: &str) -> String {
    let version = version.trim();
    version
        .strip_prefix(VERSION_DIR_PREFIX)
        .unwrap_or(version)
        .to_string()
}

/// Reject versions that cannot name a single directory under `versions/`.
///
/// Versions are otherwise opaque. Empty strings, path separators, a leading `.` and
/// `..` anywhere are refused.
pub fn validate_version(version: &str) -> Result<()> {
    let unsafe_name = version.is_empty()
        || version.starts_with('.')
        || version.contains("..")
        || version.contains(['/', '\\']);
    if unsafe_name {
        return Err(NymError::InvalidVersion(version.to_string()));
    }
    Ok(())
}

/// Resolved locations under one install root.
#[derive(Debug, Clone, PartialEq)]
pub struct NymPaths {
    root: PathBuf,
}

impl NymPaths {
    /// Use `root` as-is. Callers that accept `~` should go through [`NymPaths::resolve`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the install root from an optional override, falling back to [`DEFAULT_ROOT`].
    #[tracing::instrument(skip(runtime))]
    pub fn resolve<R: Runtime>(runtime: &R, root: Option<PathBuf>) -> Result<Self> {
        let root = root.unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT));
        let root = expand_home(runtime, &root)?;
        debug!("Using install root: {}", root.display());
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn current_link(&self) -> PathBuf {
        self.root.join("current")
    }

    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.versions_dir()
            .join(format!("{}{}", VERSION_DIR_PREFIX, version))
    }

    /// Directory that goes on `PATH`. Windows distributions keep `node.exe` at the top level.
    pub fn bin_dir(&self) -> PathBuf {
        if cfg!(windows) {
            self.current_link()
        } else {
            self.current_link().join("bin")
        }
    }

    /// Installed versions, newest first by string comparison.
    ///
    /// A missing `versions/` directory means nothing is installed yet.
    #[tracing::instrument(skip(self, runtime))]
    pub fn list_installed<R: Runtime>(&self, runtime: &R) -> Result<Vec<String>> {
        let versions_dir = self.versions_dir();
        if !runtime.exists(&versions_dir) {
            return Ok(Vec::new());
        }

        let entries = runtime.read_dir(&versions_dir).map_err(|e| {
            NymError::io(format!("Failed to list {}", versions_dir.display()), e)
        })?;

        let mut versions: Vec<String> = entries
            .iter()
            .filter(|path| runtime.is_dir(path))
            .filter_map(|path| path.file_name()?.to_str())
            .filter_map(|name| name.strip_prefix(VERSION_DIR_PREFIX))
            .filter(|version| !version.is_empty())
            .map(str::to_string)
            .collect();

        versions.sort_by(|a, b| b.cmp(a));
        Ok(versions)
    }

    /// Version the `current` link points at, if any.
    #[tracing::instrument(skip(self, runtime))]
    pub fn current_version<R: Runtime>(&self, runtime: &R) -> Option<String> {
        let link = self.current_link();
        if !runtime.is_symlink(&link) {
            return None;
        }

        let target = runtime.read_link(&link).ok()?;
        let name = target.file_name()?.to_str()?;
        Some(name.strip_prefix(VERSION_DIR_PREFIX).unwrap_or(name).to_string())
    }
}
