use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::{paths::NymPaths, runtime::Runtime};

/// List installed versions, newest first, marking the current one
#[tracing::instrument(skip(runtime, install_root))]
pub fn list<R: Runtime>(runtime: R, install_root: Option<PathBuf>) -> Result<()> {
    let paths = NymPaths::resolve(&runtime, install_root)?;
    debug!("Listing versions from {:?}", paths.versions_dir());

    let versions = paths.list_installed(&runtime)?;
    if versions.is_empty() {
        println!("No versions installed.");
        return Ok(());
    }

    let current = paths.current_version(&runtime);
    println!("Installed versions:");
    for line in format_installed(&versions, current.as_deref()) {
        println!("{}", line);
    }
    Ok(())
}

pub(crate) fn format_installed(versions: &[String], current: Option<&str>) -> Vec<String> {
    versions
        .iter()
        .map(|v| {
            if Some(v.as_str()) == current {
                format!("=> v{} (current)", v)
            } else {
                format!("   v{}", v)
            }
        })
        .collect()
}
