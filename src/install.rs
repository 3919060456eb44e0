//! Archive installer: extracts a fetched archive into its version directory.
//!
//! Extraction goes into a staging directory next to the version directory and is moved
//! into place only once every entry has been written, so a failed extraction does not
//! leave a half-populated `versions/v<version>`.

use anyhow::Context;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::archive::ArchiveExtractorImpl;
use crate::error::{NymError, Result};
use crate::paths::{NymPaths, VERSION_DIR_PREFIX, validate_version};
use crate::runtime::Runtime;

/// Prefix of the temporary directories the fetcher downloads into.
pub const DOWNLOAD_DIR_PREFIX: &str = "nym-download-";

pub struct Installer<'a, R: Runtime> {
    runtime: &'a R,
    paths: &'a NymPaths,
    extractor: ArchiveExtractorImpl,
}

impl<'a, R: Runtime> Installer<'a, R> {
    pub fn new(runtime: &'a R, paths: &'a NymPaths) -> Self {
        Self {
            runtime,
            paths,
            extractor: ArchiveExtractorImpl::new(),
        }
    }

    fn staging_dir(&self, version: &str) -> PathBuf {
        self.paths
            .versions_dir()
            .join(format!(".{}{}.partial", VERSION_DIR_PREFIX, version))
    }

    /// Extract `archive_path` into the directory for `version` and delete the archive.
    ///
    /// An existing version directory is reused; entries with the same name are replaced.
    #[tracing::instrument(skip(self))]
    pub fn install(&self, version: &str, archive_path: &Path) -> Result<PathBuf> {
        validate_version(version)?;
        let target = self.paths.version_dir(version);
        let created_target = !self.runtime.exists(&target);

        self.runtime.create_dir_all(&target).map_err(|e| {
            NymError::io(format!("Failed to create {}", target.display()), e)
        })?;

        if !self.extractor.can_handle(archive_path) {
            self.discard_target(&target, created_target);
            return Err(NymError::UnsupportedFormat(archive_path.to_path_buf()));
        }

        let staging = self.staging_dir(version);
        if let Err(e) = self.extract_and_move(archive_path, &staging, &target) {
            self.discard(&staging);
            self.discard_target(&target, created_target);
            return Err(NymError::extraction(archive_path, e));
        }

        info!("Installed v{} into {}", version, target.display());
        self.remove_archive(archive_path);
        Ok(target)
    }

    fn extract_and_move(
        &self,
        archive_path: &Path,
        staging: &Path,
        target: &Path,
    ) -> anyhow::Result<()> {
        if self.runtime.exists_no_follow(staging) {
            debug!("Removing stale staging directory {:?}", staging);
            self.runtime.remove_dir_all(staging)?;
        }

        self.extractor.extract(self.runtime, archive_path, staging)?;

        for item in self
            .runtime
            .read_dir(staging)
            .context("Failed to read staging directory")?
        {
            let Some(name) = item.file_name() else {
                continue;
            };
            let dest = target.join(name);
            if self.runtime.exists_no_follow(&dest) {
                debug!("Replacing existing {:?}", dest);
                if self.runtime.is_dir(&dest) && !self.runtime.is_symlink(&dest) {
                    self.runtime.remove_dir_all(&dest)?;
                } else {
                    self.runtime.remove_file(&dest)?;
                }
            }
            self.runtime
                .rename(&item, &dest)
                .with_context(|| format!("Failed to move {:?} into place", dest))?;
        }

        self.runtime.remove_dir_all(staging)?;
        Ok(())
    }

    fn discard(&self, path: &Path) {
        if self.runtime.exists_no_follow(path)
            && let Err(e) = self.runtime.remove_dir_all(path)
        {
            warn!("Failed to remove {:?}: {:#}", path, e);
        }
    }

    /// Remove a version directory this call created, as long as nothing landed in it.
    fn discard_target(&self, target: &Path, created_target: bool) {
        if !created_target {
            return;
        }
        let is_empty = self
            .runtime
            .read_dir(target)
            .map(|entries| entries.is_empty())
            .unwrap_or(false);
        if is_empty && let Err(e) = self.runtime.remove_dir(target) {
            warn!("Failed to remove {:?}: {:#}", target, e);
        }
    }

    /// Best-effort removal of the downloaded archive and its temporary directory.
    fn remove_archive(&self, archive_path: &Path) {
        if let Err(e) = self.runtime.remove_file(archive_path) {
            warn!("Failed to remove downloaded archive {:?}: {:#}", archive_path, e);
            return;
        }

        let Some(parent) = archive_path.parent() else {
            return;
        };
        let is_download_dir = parent
            .file_name()
            .map(|n| n.to_string_lossy().starts_with(DOWNLOAD_DIR_PREFIX))
            .unwrap_or(false);
        if is_download_dir && let Err(e) = self.runtime.remove_dir(parent) {
            debug!("Leaving download directory {:?}: {:#}", parent, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::test_archives::{Entry, create_tar_gz, create_zip};
    use crate::runtime::RealRuntime;
    use std::fs;
    use tempfile::tempdir;

    fn pkg_entries() -> Vec<Entry<'static>> {
        vec![
            Entry::Dir("pkg/"),
            Entry::Dir("pkg/bin/"),
            Entry::File("pkg/bin/x", "x contents", 0o755),
            Entry::Dir("pkg/lib/"),
            Entry::File("pkg/lib/y", "y contents", 0o644),
        ]
    }

    /// Every file below `dir`, relative and with `/` separators.
    fn list_files(dir: &Path) -> Vec<String> {
        fn walk(base: &Path, dir: &Path, out: &mut Vec<String>) {
            for entry in fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    walk(base, &path, out);
                } else {
                    let rel = path.strip_prefix(base).unwrap();
                    out.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        let mut out = Vec::new();
        walk(dir, dir, &mut out);
        out.sort();
        out
    }

    #[test]
    fn test_install_tar_gz_round_trip() {
        let root = tempdir().unwrap();
        let downloads = tempdir().unwrap();
        let archive = downloads.path().join("node-v18.17.1-linux-x64.tar.gz");
        create_tar_gz(&archive, &pkg_entries()).unwrap();

        let paths = NymPaths::new(root.path());
        let target = Installer::new(&RealRuntime, &paths)
            .install("18.17.1", &archive)
            .unwrap();

        assert_eq!(target, paths.version_dir("18.17.1"));
        assert_eq!(list_files(&target), vec!["bin/x", "lib/y"]);
        assert_eq!(fs::read_to_string(target.join("bin/x")).unwrap(), "x contents");
        assert_eq!(fs::read_to_string(target.join("lib/y")).unwrap(), "y contents");
        assert!(!target.join("pkg").exists());
        assert!(!archive.exists(), "archive should be deleted after install");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(target.join("bin/x")).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn test_install_zip_round_trip() {
        let root = tempdir().unwrap();
        let downloads = tempdir().unwrap();
        let archive = downloads.path().join("node-v18.17.1-win-x64.zip");
        create_zip(&archive, &pkg_entries()).unwrap();

        let paths = NymPaths::new(root.path());
        let target = Installer::new(&RealRuntime, &paths)
            .install("18.17.1", &archive)
            .unwrap();

        assert_eq!(list_files(&target), vec!["bin/x", "lib/y"]);
        assert_eq!(fs::read_to_string(target.join("lib/y")).unwrap(), "y contents");
        assert!(!target.join("pkg").exists());
        assert!(!archive.exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(target.join("lib/y")).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o644);
        }
    }

    #[test]
    fn test_install_without_common_root_keeps_layout() {
        let root = tempdir().unwrap();
        let downloads = tempdir().unwrap();
        let archive = downloads.path().join("flat.tar.gz");
        create_tar_gz(
            &archive,
            &[Entry::File("a.txt", "a", 0o644), Entry::File("dir/b.txt", "b", 0o644)],
        )
        .unwrap();

        let paths = NymPaths::new(root.path());
        let target = Installer::new(&RealRuntime, &paths)
            .install("1.0.0", &archive)
            .unwrap();

        assert_eq!(list_files(&target), vec!["a.txt", "dir/b.txt"]);
    }

    #[test]
    fn test_install_unsupported_format() {
        let root = tempdir().unwrap();
        let downloads = tempdir().unwrap();
        let archive = downloads.path().join("node-v18.17.1-linux-x64.tar.xz");
        fs::write(&archive, "xz data").unwrap();

        let paths = NymPaths::new(root.path());
        let err = Installer::new(&RealRuntime, &paths)
            .install("18.17.1", &archive)
            .unwrap_err();

        assert!(matches!(err, NymError::UnsupportedFormat(_)));
        assert!(!paths.version_dir("18.17.1").exists());
        assert!(archive.exists());
    }

    #[test]
    fn test_install_tgz_suffix_is_unsupported() {
        let root = tempdir().unwrap();
        let downloads = tempdir().unwrap();
        let archive = downloads.path().join("node.tgz");
        create_tar_gz(&archive, &pkg_entries()).unwrap();

        let paths = NymPaths::new(root.path());
        let err = Installer::new(&RealRuntime, &paths)
            .install("1.0.0", &archive)
            .unwrap_err();

        assert!(matches!(err, NymError::UnsupportedFormat(_)), "{:?}", err);
        assert!(!paths.version_dir("1.0.0").exists());
    }

    #[test]
    fn test_install_rejects_version_with_separator() {
        let root = tempdir().unwrap();
        let downloads = tempdir().unwrap();
        let archive = downloads.path().join("node.tar.gz");
        create_tar_gz(&archive, &pkg_entries()).unwrap();

        let paths = NymPaths::new(root.path());
        let err = Installer::new(&RealRuntime, &paths)
            .install("1.0.0/../../escape", &archive)
            .unwrap_err();

        assert!(matches!(err, NymError::InvalidVersion(_)), "{:?}", err);
        assert!(!root.path().join("escape").exists());
        assert!(!paths.versions_dir().exists());
        assert!(archive.exists());
    }

    #[test]
    fn test_failed_extraction_leaves_no_version_dir() {
        let root = tempdir().unwrap();
        let downloads = tempdir().unwrap();
        let archive = downloads.path().join("broken.tar.gz");
        fs::write(&archive, "not gzip at all").unwrap();

        let paths = NymPaths::new(root.path());
        let installer = Installer::new(&RealRuntime, &paths);
        let err = installer.install("18.17.1", &archive).unwrap_err();

        assert!(matches!(err, NymError::Extraction { .. }));
        assert!(!paths.version_dir("18.17.1").exists());
        assert!(!installer.staging_dir("18.17.1").exists());
        // The archive is only removed after a successful install
        assert!(archive.exists());
        assert!(paths.list_installed(&RealRuntime).unwrap().is_empty());
    }

    #[test]
    fn test_reinstall_replaces_existing_entries() {
        let root = tempdir().unwrap();
        let paths = NymPaths::new(root.path());
        let target = paths.version_dir("18.17.1");
        fs::create_dir_all(target.join("bin")).unwrap();
        fs::write(target.join("bin/x"), "old").unwrap();
        fs::write(target.join("extra.txt"), "kept").unwrap();

        let downloads = tempdir().unwrap();
        let archive = downloads.path().join("node.tar.gz");
        create_tar_gz(&archive, &pkg_entries()).unwrap();

        Installer::new(&RealRuntime, &paths)
            .install("18.17.1", &archive)
            .unwrap();

        assert_eq!(fs::read_to_string(target.join("bin/x")).unwrap(), "x contents");
        assert_eq!(fs::read_to_string(target.join("extra.txt")).unwrap(), "kept");
    }

    #[test]
    fn test_failed_reinstall_keeps_existing_version_dir() {
        let root = tempdir().unwrap();
        let paths = NymPaths::new(root.path());
        let target = paths.version_dir("18.17.1");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("node"), "existing").unwrap();

        let downloads = tempdir().unwrap();
        let archive = downloads.path().join("node.zip");
        fs::write(&archive, "PK but truncated").unwrap();

        let err = Installer::new(&RealRuntime, &paths)
            .install("18.17.1", &archive)
            .unwrap_err();

        assert!(matches!(err, NymError::Extraction { .. }));
        assert_eq!(fs::read_to_string(target.join("node")).unwrap(), "existing");
    }

    #[test]
    fn test_install_removes_download_dir() {
        let root = tempdir().unwrap();
        let downloads = tempdir().unwrap();
        let download_dir = downloads.path().join("nym-download-abc123");
        fs::create_dir(&download_dir).unwrap();
        let archive = download_dir.join("node.tar.gz");
        create_tar_gz(&archive, &pkg_entries()).unwrap();

        let paths = NymPaths::new(root.path());
        Installer::new(&RealRuntime, &paths)
            .install("18.17.1", &archive)
            .unwrap();

        assert!(!download_dir.exists());
    }

    #[test]
    fn test_staging_dir_is_not_listed_as_version() {
        let root = tempdir().unwrap();
        let paths = NymPaths::new(root.path());
        let installer = Installer::new(&RealRuntime, &paths);
        fs::create_dir_all(installer.staging_dir("18.17.1")).unwrap();

        assert!(paths.list_installed(&RealRuntime).unwrap().is_empty());
    }
}
