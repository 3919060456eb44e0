use anyhow::{Context, Result};
use log::debug;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

use super::{
    ArchiveExtractor, ExtractSummary, Placement, note_skipped, permission_bits, place_entry,
    root_from_first_entry, write_file,
};
use crate::runtime::Runtime;

/// Extractor for .zip archives
pub struct ZipExtractor;

impl ZipExtractor {
    fn open_archive<R: Runtime>(
        runtime: &R,
        archive_path: &Path,
    ) -> Result<ZipArchive<Cursor<Vec<u8>>>> {
        let mut reader = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;

        // zip needs Read + Seek; Runtime::open only gives Read
        let mut buffer = Vec::new();
        reader
            .read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read archive {:?}", archive_path))?;

        ZipArchive::new(Cursor::new(buffer)).context("Failed to parse ZIP archive")
    }
}

impl ArchiveExtractor for ZipExtractor {
    fn can_handle(&self, archive_path: &Path) -> bool {
        let name = archive_path.to_string_lossy().to_lowercase();
        name.ends_with(".zip")
    }

    /// The first central-directory entry's leading segment, whether or not that entry is
    /// itself a directory.
    #[tracing::instrument(skip(self, runtime))]
    fn detect_root<R: Runtime>(&self, runtime: &R, archive_path: &Path) -> Result<Option<String>> {
        let mut archive = Self::open_archive(runtime, archive_path)?;
        if archive.is_empty() {
            return Ok(None);
        }

        let first = archive
            .by_index_raw(0)
            .context("Failed to read ZIP entry 0")?;
        Ok(root_from_first_entry(first.name(), first.is_dir()))
    }

    #[tracing::instrument(skip(self, runtime))]
    fn extract_entries<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
        root: Option<&str>,
    ) -> Result<ExtractSummary> {
        debug!("Extracting zip archive to {:?}...", extract_to);
        runtime.create_dir_all(extract_to)?;

        let mut archive = Self::open_archive(runtime, archive_path)?;
        let mut summary = ExtractSummary::default();

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .with_context(|| format!("Failed to read ZIP entry {}", i))?;
            let name = entry.name().to_string();

            let relative = match place_entry(&name, root) {
                Placement::Target(relative) => relative,
                other => {
                    note_skipped(&name, &other, &mut summary);
                    continue;
                }
            };
            let dest = extract_to.join(&relative);

            if entry.is_dir() {
                runtime.create_dir_all(&dest)?;
                // Keep the owner able to write into the directory
                #[cfg(unix)]
                if let Some(mode) = entry.unix_mode() {
                    runtime.set_permissions(&dest, permission_bits(mode) | 0o700)?;
                }
            } else {
                let mode = entry.unix_mode();
                write_file(runtime, &dest, &mut entry, mode)?;
            }
            summary.extracted += 1;
        }

        debug!(
            "Extracted {} entries, skipped {}",
            summary.extracted, summary.skipped
        );
        Ok(summary)
    }
}
