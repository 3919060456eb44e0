//! Archive extraction with single root-directory stripping.
//!
//! Release archives wrap their content in one top-level directory
//! (`node-v18.17.1-linux-x64/`). Extraction runs in two structurally separate passes:
//! the first learns that root prefix, the second re-reads the archive and writes every
//! entry with the prefix removed.
//!
//! When no root prefix can be detected, entries are written at their original relative
//! paths. When a prefix is detected, entries outside it are skipped with a warning, and
//! an archive that yields nothing under its prefix is an error.

mod tar_gz;
mod zip;

use anyhow::{Result, anyhow, bail};
use log::warn;
use std::path::{Component, Path, PathBuf};

use crate::runtime::Runtime;

pub use tar_gz::TarGzExtractor;
pub use zip::ZipExtractor;

/// Counts reported by a successful extraction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractSummary {
    pub extracted: usize,
    pub skipped: usize,
}

/// Trait for format-specific archive extractors
pub trait ArchiveExtractor: Send + Sync {
    /// Check if this extractor can handle the given archive format
    fn can_handle(&self, archive_path: &Path) -> bool;

    /// First pass: the archive's single top-level directory, if one can be detected.
    fn detect_root<R: Runtime>(&self, runtime: &R, archive_path: &Path) -> Result<Option<String>>;

    /// Second pass: write every entry under `extract_to`, with `root` stripped.
    fn extract_entries<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
        root: Option<&str>,
    ) -> Result<ExtractSummary>;

    /// Detect the root prefix, then extract with it stripped.
    fn extract<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<ExtractSummary> {
        let root = self.detect_root(runtime, archive_path)?;
        match &root {
            Some(root) => log::debug!("Archive root directory: {}", root),
            None => warn!(
                "No root directory detected in {}, extracting entries as-is",
                archive_path.display()
            ),
        }

        let summary = self.extract_entries(runtime, archive_path, extract_to, root.as_deref())?;

        if summary.extracted == 0 {
            return Err(match root {
                Some(root) => anyhow!("Archive has no entries under its root directory {}", root),
                None => anyhow!("Archive appears to be empty."),
            });
        }
        Ok(summary)
    }
}

/// Dispatcher that selects the appropriate extractor based on archive format.
pub struct ArchiveExtractorImpl {
    tar_gz: TarGzExtractor,
    zip: ZipExtractor,
}

impl Default for ArchiveExtractorImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveExtractorImpl {
    pub fn new() -> Self {
        Self {
            tar_gz: TarGzExtractor,
            zip: ZipExtractor,
        }
    }

    pub fn can_handle(&self, archive_path: &Path) -> bool {
        self.tar_gz.can_handle(archive_path) || self.zip.can_handle(archive_path)
    }

    #[tracing::instrument(skip(self, runtime))]
    pub fn extract<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<ExtractSummary> {
        if self.tar_gz.can_handle(archive_path) {
            return self.tar_gz.extract(runtime, archive_path, extract_to);
        }
        if self.zip.can_handle(archive_path) {
            return self.zip.extract(runtime, archive_path, extract_to);
        }
        bail!("Unsupported archive format: {}", archive_path.display())
    }
}

/// Where an archive entry goes once the root prefix is taken into account.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Placement {
    /// The root directory entry itself.
    Root,
    /// Entry outside the detected root directory.
    Outside,
    /// Absolute path or `..` component.
    Unsafe,
    /// Relative destination under the extraction directory.
    Target(PathBuf),
}

/// Map an entry name to its destination relative to the extraction directory.
pub(crate) fn place_entry(name: &str, root: Option<&str>) -> Placement {
    let name = name.replace('\\', "/");
    let name = name.strip_prefix("./").unwrap_or(&name).trim_end_matches('/');

    let relative = match root {
        Some(root) if name == root => return Placement::Root,
        Some(root) => match name
            .strip_prefix(root)
            .and_then(|rest| rest.strip_prefix('/'))
        {
            Some(rest) => rest,
            None => return Placement::Outside,
        },
        None => name,
    };

    if relative.is_empty() {
        return Placement::Root;
    }

    let mut path = PathBuf::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Placement::Unsafe;
            }
        }
    }

    if path.as_os_str().is_empty() {
        Placement::Root
    } else {
        Placement::Target(path)
    }
}

/// Root prefix implied by a first entry name: its leading segment, if the name has more
/// than one segment or is marked as a directory.
pub(crate) fn root_from_first_entry(name: &str, is_dir: bool) -> Option<String> {
    let name = name.replace('\\', "/");
    let name = name.strip_prefix("./").unwrap_or(&name);
    let trimmed = name.trim_end_matches('/');

    let (first, has_more) = match trimmed.split_once('/') {
        Some((first, _)) => (first, true),
        None => (trimmed, false),
    };

    if first.is_empty() || first == ".." || !(has_more || is_dir) {
        return None;
    }
    Some(first.to_string())
}

/// Log entries that are not extracted and bump the skip counter.
pub(crate) fn note_skipped(name: &str, placement: &Placement, summary: &mut ExtractSummary) {
    match placement {
        Placement::Root => {}
        Placement::Outside => {
            warn!("Skipping {}: outside the archive root directory", name);
            summary.skipped += 1;
        }
        Placement::Unsafe => {
            warn!("Skipping {}: path escapes the extraction directory", name);
            summary.skipped += 1;
        }
        Placement::Target(_) => {}
    }
}

/// Permission bits only; archive modes may carry file-type bits.
pub(crate) fn permission_bits(mode: u32) -> u32 {
    mode & 0o7777
}

/// Create a regular file at `dest` from `reader`, applying `mode` when present.
pub(crate) fn write_file<R: Runtime>(
    runtime: &R,
    dest: &Path,
    reader: &mut dyn std::io::Read,
    mode: Option<u32>,
) -> Result<()> {
    use anyhow::Context;

    if let Some(parent) = dest.parent() {
        runtime.create_dir_all(parent)?;
    }
    if runtime.is_symlink(dest) {
        runtime.remove_symlink(dest)?;
    }

    {
        let mut file = runtime.create_file(dest)?;
        std::io::copy(reader, &mut file)
            .with_context(|| format!("Failed to extract file {:?}", dest))?;
        std::io::Write::flush(&mut file)
            .with_context(|| format!("Failed to extract file {:?}", dest))?;
    }

    if let Some(mode) = mode {
        runtime.set_permissions(dest, permission_bits(mode))?;
    }
    Ok(())
}
