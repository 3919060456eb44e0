use anyhow::Result;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::{catalog::Catalog, runtime::Runtime};

use super::config::Config;

/// List versions offered by the catalog, marking installed ones
#[tracing::instrument(skip(runtime, install_root, mirror))]
pub async fn ls_remote<R: Runtime>(
    runtime: R,
    limit: Option<usize>,
    install_root: Option<PathBuf>,
    mirror: Option<String>,
) -> Result<()> {
    let config = Config::new(runtime, install_root, mirror)?;
    for line in run(&config, limit).await? {
        println!("{}", line);
    }
    Ok(())
}

pub(crate) async fn run<R: Runtime, C: Catalog>(
    config: &Config<R, C>,
    limit: Option<usize>,
) -> Result<Vec<String>> {
    let available = config.catalog.list_available_versions().await?;
    let installed: HashSet<String> = config
        .paths
        .list_installed(&config.runtime)?
        .into_iter()
        .collect();

    Ok(available
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|v| {
            if installed.contains(&v) {
                format!("v{} (installed)", v)
            } else {
                format!("v{}", v)
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MockCatalog;
    use crate::download::Fetcher;
    use crate::http::HttpClient;
    use crate::paths::NymPaths;
    use crate::platform::Platform;
    use crate::runtime::RealRuntime;
    use reqwest::Client;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_ls_remote_limits_and_marks_installed() {
        let root = tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("versions").join("v20.10.0")).unwrap();

        let mut catalog = MockCatalog::new();
        catalog.expect_list_available_versions().returning(|| {
            Ok(vec!["21.0.0".into(), "20.10.0".into(), "20.9.0".into()])
        });

        let config = Config {
            runtime: RealRuntime,
            catalog,
            fetcher: Fetcher::new(HttpClient::new(Client::new())),
            paths: NymPaths::new(root.path()),
            platform: Platform::detect(),
        };

        assert_eq!(
            run(&config, Some(2)).await.unwrap(),
            vec!["v21.0.0", "v20.10.0 (installed)"]
        );
        assert_eq!(run(&config, None).await.unwrap().len(), 3);
    }
}
