use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use log::{debug, warn};
use std::path::{Component, Path};
use tar::{Archive, EntryType};

use super::{
    ArchiveExtractor, ExtractSummary, Placement, note_skipped, place_entry, root_from_first_entry,
    write_file,
};
use crate::runtime::Runtime;

/// Extractor for .tar.gz archives
pub struct TarGzExtractor;

impl TarGzExtractor {
    fn open_archive<R: Runtime>(
        runtime: &R,
        archive_path: &Path,
    ) -> Result<Archive<GzDecoder<Box<dyn std::io::Read + Send>>>> {
        let file = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;
        Ok(Archive::new(GzDecoder::new(file)))
    }
}

impl ArchiveExtractor for TarGzExtractor {
    fn can_handle(&self, archive_path: &Path) -> bool {
        let name = archive_path.to_string_lossy().to_lowercase();
        name.ends_with(".tar.gz")
    }

    #[tracing::instrument(skip(self, runtime))]
    fn detect_root<R: Runtime>(&self, runtime: &R, archive_path: &Path) -> Result<Option<String>> {
        let mut archive = Self::open_archive(runtime, archive_path)?;
        let entries = archive
            .entries()
            .context("Failed to read tar.gz archive")?;

        for entry in entries {
            let entry = entry.context("Failed to read archive entry")?;
            let entry_type = entry.header().entry_type();
            if matches!(entry_type, EntryType::XGlobalHeader | EntryType::XHeader) {
                continue;
            }
            if !entry_type.is_dir() {
                return Ok(None);
            }
            let path = entry.path().context("Invalid entry path")?;
            return Ok(root_from_first_entry(&path.to_string_lossy(), true));
        }
        Ok(None)
    }

    #[tracing::instrument(skip(self, runtime))]
    fn extract_entries<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
        root: Option<&str>,
    ) -> Result<ExtractSummary> {
        debug!("Extracting tar.gz archive to {:?}...", extract_to);
        runtime.create_dir_all(extract_to)?;

        let mut archive = Self::open_archive(runtime, archive_path)?;
        let mut summary = ExtractSummary::default();

        for entry in archive
            .entries()
            .context("Failed to read tar.gz archive")?
        {
            let mut entry = entry.context("Failed to read archive entry")?;
            let name = entry
                .path()
                .context("Invalid entry path")?
                .to_string_lossy()
                .into_owned();

            let relative = match place_entry(&name, root) {
                Placement::Target(relative) => relative,
                other => {
                    note_skipped(&name, &other, &mut summary);
                    continue;
                }
            };
            let dest = extract_to.join(&relative);

            let entry_type = entry.header().entry_type();
            match entry_type {
                t if t.is_dir() => {
                    runtime.create_dir_all(&dest)?;
                }
                t if t.is_file() => {
                    let mode = entry.header().mode().ok();
                    write_file(runtime, &dest, &mut entry, mode)?;
                }
                t if t.is_symlink() => {
                    let Some(target) = entry.link_name().context("Invalid link target")? else {
                        warn!("Skipping {}: symlink without target", name);
                        summary.skipped += 1;
                        continue;
                    };
                    if !link_stays_inside(&relative, &target) {
                        warn!("Skipping {}: link target {:?} escapes the extraction directory", name, target);
                        summary.skipped += 1;
                        continue;
                    }
                    if let Some(parent) = dest.parent() {
                        runtime.create_dir_all(parent)?;
                    }
                    if runtime.exists_no_follow(&dest) {
                        runtime.remove_file(&dest)?;
                    }
                    runtime.symlink(&target, &dest)?;
                }
                other => {
                    debug!("Skipping {} with unsupported entry type {:?}", name, other);
                    summary.skipped += 1;
                    continue;
                }
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

/// A relative link at `link` (relative to the extraction root) pointing at `target` must
/// resolve lexically inside the extraction root.
fn link_stays_inside(link: &Path, target: &Path) -> bool {
    let mut depth = link.components().count().saturating_sub(1) as isize;
    for component in target.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}
