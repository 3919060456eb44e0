//! Environment and system information operations.

use anyhow::Result;
#[cfg(windows)]
use anyhow::Context;
#[cfg(not(windows))]
use anyhow::bail;
use std::env;
use std::path::PathBuf;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn env_var_impl(&self, key: &str) -> Result<String, env::VarError> {
        env::var(key)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn home_dir_impl(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn is_privileged_impl(&self) -> bool {
        #[cfg(unix)]
        return nix::unistd::geteuid().as_raw() == 0;

        #[cfg(windows)]
        return is_elevated::is_elevated();

        #[cfg(not(any(unix, windows)))]
        return false;
    }

    #[cfg(windows)]
    #[tracing::instrument(skip(self))]
    pub(crate) fn user_path_var_impl(&self) -> Result<Option<String>> {
        let env = user_environment_key(winreg::enums::KEY_READ)?;
        match env.get_value::<String, _>("Path") {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context("Failed to read PATH from HKCU\\Environment"),
        }
    }

    #[cfg(windows)]
    #[tracing::instrument(skip(self))]
    pub(crate) fn set_user_path_var_impl(&self, value: &str) -> Result<()> {
        let env = user_environment_key(winreg::enums::KEY_WRITE)?;
        env.set_value("Path", &value.to_string())
            .context("Failed to update PATH in HKCU\\Environment")
    }

    #[cfg(not(windows))]
    pub(crate) fn user_path_var_impl(&self) -> Result<Option<String>> {
        bail!("The per-user PATH registry value only exists on Windows")
    }

    #[cfg(not(windows))]
    pub(crate) fn set_user_path_var_impl(&self, _value: &str) -> Result<()> {
        bail!("The per-user PATH registry value only exists on Windows")
    }
}

#[cfg(windows)]
fn user_environment_key(flags: u32) -> Result<winreg::RegKey> {
    winreg::RegKey::predef(winreg::enums::HKEY_CURRENT_USER)
        .open_subkey_with_flags("Environment", flags)
        .context("Failed to open HKCU\\Environment registry key")
}
