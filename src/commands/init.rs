use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};

use crate::{
    error::NymError,
    paths::NymPaths,
    platform::{OsFamily, Platform},
    runtime::Runtime,
};

/// Marker line written above the `PATH` export.
const PROFILE_MARKER: &str = "# nym";

/// Create the directory layout and put `current/bin` on `PATH`
#[tracing::instrument(skip(runtime, install_root))]
pub fn init<R: Runtime>(runtime: R, install_root: Option<PathBuf>) -> Result<()> {
    let paths = NymPaths::resolve(&runtime, install_root)?;
    run(&runtime, &paths, Platform::detect().os_family())
}

pub(crate) fn run<R: Runtime>(runtime: &R, paths: &NymPaths, family: OsFamily) -> Result<()> {
    let versions_dir = paths.versions_dir();
    runtime
        .create_dir_all(&versions_dir)
        .with_context(|| format!("Failed to create {}", versions_dir.display()))?;
    println!("Created {}", versions_dir.display());

    let bin_dir = paths.bin_dir();
    if family == OsFamily::Windows {
        if register_user_path(runtime, &bin_dir)? {
            println!("Added {} to your user PATH", bin_dir.display());
            println!("Restart the terminal to pick it up.");
        } else {
            println!("{} is already on your user PATH", bin_dir.display());
        }
        return Ok(());
    }

    let home = runtime
        .home_dir()
        .ok_or(NymError::HomeDirectoryUnavailable)?;
    let profile = shell_profile(runtime, &home, family);

    if register_path(runtime, &profile, &bin_dir)? {
        println!("Added {} to PATH in {}", bin_dir.display(), profile.display());
        println!("Restart the terminal or run: source {}", profile.display());
    } else {
        println!("{} already puts {} on PATH", profile.display(), bin_dir.display());
    }
    Ok(())
}

/// `~/.zshrc` for zsh users, otherwise the bash profile the platform reads at login.
fn shell_profile<R: Runtime>(runtime: &R, home: &Path, family: OsFamily) -> PathBuf {
    let uses_zsh = runtime
        .env_var("SHELL")
        .map(|shell| shell.ends_with("zsh"))
        .unwrap_or(false);

    if uses_zsh {
        home.join(".zshrc")
    } else if family == OsFamily::Darwin {
        home.join(".bash_profile")
    } else {
        home.join(".bashrc")
    }
}

/// Append the export block unless the profile already mentions `bin_dir`.
/// Returns whether the profile was changed.
fn register_path<R: Runtime>(runtime: &R, profile: &Path, bin_dir: &Path) -> Result<bool> {
    let mut contents = if runtime.exists(profile) {
        runtime.read_to_string(profile)?
    } else {
        String::new()
    };

    let bin = bin_dir.display().to_string();
    if contents.contains(&bin) {
        debug!("{:?} already references {}", profile, bin);
        return Ok(false);
    }

    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    contents.push_str(&format!("\n{}\nexport PATH=\"{}:$PATH\"\n", PROFILE_MARKER, bin));
    runtime
        .write(profile, contents.as_bytes())
        .with_context(|| format!("Failed to update {}", profile.display()))?;
    Ok(true)
}

/// Append `bin_dir` to the persisted per-user `PATH` unless an entry already matches,
/// ignoring case. Returns whether the value was changed.
fn register_user_path<R: Runtime>(runtime: &R, bin_dir: &Path) -> Result<bool> {
    let current = runtime.user_path_var()?.unwrap_or_default();
    let bin = bin_dir.display().to_string();

    if current
        .split(';')
        .any(|entry| entry.trim_end_matches('\\').eq_ignore_ascii_case(&bin))
    {
        debug!("User PATH already contains {}", bin);
        return Ok(false);
    }

    let updated = match current.trim_end_matches(';') {
        "" => bin,
        existing => format!("{};{}", existing, bin),
    };
    runtime
        .set_user_path_var(&updated)
        .context("Failed to update the user PATH")?;
    Ok(true)
}
