use anyhow::Result;
use std::path::PathBuf;

use crate::{
    paths::{NymPaths, normalize_version, validate_version},
    runtime::Runtime,
    switch::switch_version,
};

/// Point `current` at an installed version
#[tracing::instrument(skip(runtime, install_root))]
pub fn use_version<R: Runtime>(
    runtime: R,
    version: &str,
    install_root: Option<PathBuf>,
) -> Result<()> {
    let paths = NymPaths::resolve(&runtime, install_root)?;
    let version = normalize_version(version);
    validate_version(&version)?;

    switch_version(&runtime, &paths, &version)?;
    println!("Now using v{}", version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NymError;
    use crate::runtime::{MockRuntime, RealRuntime};
    use crate::test_utils::{test_home, test_root};
    use mockall::predicate::eq;
    use std::fs;
    use tempfile::tempdir;

    #[cfg_attr(
        nym_skip_cross_windows_tests,
        ignore = "cross windows tests disabled; set NYM_RUN_CROSS_WINDOWS_TESTS=1 to enable"
    )]
    #[test]
    fn test_use_accepts_v_prefix() {
        let root = tempdir().unwrap();
        let version_dir = root.path().join("versions").join("v18.17.1");
        fs::create_dir_all(&version_dir).unwrap();

        use_version(RealRuntime, "v18.17.1", Some(root.path().to_path_buf())).unwrap();

        assert_eq!(fs::read_link(root.path().join("current")).unwrap(), version_dir);
    }

    #[test]
    fn test_use_rejects_path_traversal() {
        let root = tempdir().unwrap();
        fs::create_dir_all(root.path().join("versions")).unwrap();
        fs::create_dir_all(root.path().join("outside")).unwrap();

        let err = use_version(RealRuntime, "../outside", Some(root.path().to_path_buf()))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<NymError>(),
            Some(NymError::InvalidVersion(v)) if v == "../outside"
        ));
        assert!(!root.path().join("current").exists());
    }

    #[test]
    fn test_use_missing_version_under_default_root() {
        let mut runtime = MockRuntime::new();
        runtime.expect_home_dir().returning(|| Some(test_home()));
        runtime
            .expect_is_dir()
            .with(eq(test_root().join("versions").join("v20.0.0")))
            .returning(|_| false);

        let err = use_version(runtime, "20.0.0", None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NymError>(),
            Some(NymError::VersionNotInstalled(v)) if v == "20.0.0"
        ));
    }
}
