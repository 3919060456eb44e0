use anyhow::Result;
use std::path::PathBuf;

use crate::{paths::NymPaths, runtime::Runtime};

/// Print the version `current` points at
#[tracing::instrument(skip(runtime, install_root))]
pub fn current<R: Runtime>(runtime: R, install_root: Option<PathBuf>) -> Result<()> {
    let paths = NymPaths::resolve(&runtime, install_root)?;
    match paths.current_version(&runtime) {
        Some(version) => println!("v{}", version),
        None => println!("No version in use. Run 'nym use <version>' first."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;

    #[test]
    fn test_current_without_link() {
        let mut runtime = MockRuntime::new();
        runtime.expect_is_symlink().returning(|_| false);

        assert!(current(runtime, Some(PathBuf::from("/opt/nym"))).is_ok());
    }
}
