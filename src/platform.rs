/// Host operating system and CPU architecture, as reported by the Rust target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

/// Operating system families the distribution ships archives for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    Darwin,
    Linux,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Detect the current platform
    pub fn detect() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Anything that is not Windows or macOS is treated as Linux.
    pub fn os_family(&self) -> OsFamily {
        match self.os.as_str() {
            "windows" => OsFamily::Windows,
            "macos" | "darwin" => OsFamily::Darwin,
            _ => OsFamily::Linux,
        }
    }

    /// OS segment of the release file name.
    pub fn dist_os(&self) -> &'static str {
        match self.os_family() {
            OsFamily::Windows => "win",
            OsFamily::Darwin => "darwin",
            OsFamily::Linux => "linux",
        }
    }

    /// Architecture segment of the release file name. Unknown architectures pass through.
    pub fn dist_arch(&self) -> &str {
        match self.arch.as_str() {
            "x86_64" | "amd64" => "x64",
            "aarch64" | "arm64" => "arm64",
            "x86" | "i686" | "i386" => "x86",
            other => other,
        }
    }

    /// Archive extension for this platform, without the leading dot.
    pub fn archive_ext(&self) -> &'static str {
        match self.os_family() {
            OsFamily::Windows => "zip",
            OsFamily::Darwin | OsFamily::Linux => "tar.gz",
        }
    }
}
