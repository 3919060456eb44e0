//! Version switcher: repoints the `current` link at an installed version.
//!
//! The old link is removed before the new one is created, with no locking and no
//! rename-based swap. Two concurrent switches race and the last one wins.

use log::{debug, info};
use std::path::PathBuf;

use crate::error::{NymError, Result};
use crate::paths::{NymPaths, validate_version};
use crate::runtime::Runtime;

/// Windows `ERROR_PRIVILEGE_NOT_HELD`, returned when creating a symlink without
/// administrator rights or Developer Mode.
const ERROR_PRIVILEGE_NOT_HELD: i32 = 1314;

/// Point `current` at the installed `version` and return the link target.
#[tracing::instrument(skip(runtime, paths))]
pub fn switch_version<R: Runtime>(runtime: &R, paths: &NymPaths, version: &str) -> Result<PathBuf> {
    validate_version(version)?;
    let target = paths.version_dir(version);
    if !runtime.is_dir(&target) {
        return Err(NymError::VersionNotInstalled(version.to_string()));
    }

    let link = paths.current_link();
    if runtime.exists_no_follow(&link) {
        debug!("Removing existing link {:?}", link);
        runtime
            .remove_symlink(&link)
            .map_err(|e| NymError::LinkReplacement {
                link: link.clone(),
                message: format!("{:#}", e),
            })?;
    }

    runtime.symlink(&target, &link).map_err(|e| {
        if is_privilege_error(&e) && !runtime.is_privileged() {
            NymError::InsufficientPrivilege(link.clone())
        } else {
            NymError::Link {
                link: link.clone(),
                message: format!("{:#}", e),
            }
        }
    })?;

    info!("Linked {:?} -> {:?}", link, target);
    Ok(target)
}

/// Only Windows gates symlink creation on privilege. Elsewhere a permission error
/// means the install root is not writable.
fn is_privilege_error(error: &anyhow::Error) -> bool {
    cfg!(windows) && is_privilege_io_error(error)
}

fn is_privilege_io_error(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<std::io::Error>()
        .map(|e| {
            e.kind() == std::io::ErrorKind::PermissionDenied
                || e.raw_os_error() == Some(ERROR_PRIVILEGE_NOT_HELD)
        })
        .unwrap_or(false)
}
