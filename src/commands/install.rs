use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::path::PathBuf;

use crate::{
    catalog::Catalog,
    download::progress_channel,
    error::NymError,
    install::Installer,
    paths::{normalize_version, validate_version},
    runtime::Runtime,
};

use super::config::Config;

/// How many catalog versions to suggest when the requested one does not exist.
const RECENT_VERSIONS_HINT: usize = 5;

/// Download and install one version from the catalog
#[tracing::instrument(skip(runtime, install_root, mirror))]
pub async fn install<R: Runtime>(
    runtime: R,
    version: &str,
    install_root: Option<PathBuf>,
    mirror: Option<String>,
) -> Result<()> {
    let config = Config::new(runtime, install_root, mirror)?;
    run(&config, version).await.map(|_| ())
}

#[tracing::instrument(skip(config))]
pub(crate) async fn run<R: Runtime, C: Catalog>(
    config: &Config<R, C>,
    version: &str,
) -> Result<PathBuf> {
    let version = normalize_version(version);
    validate_version(&version)?;
    println!("Installing v{}...", version);

    let available = config.catalog.list_available_versions().await?;
    if !available.iter().any(|v| *v == version) {
        let recent = available.into_iter().take(RECENT_VERSIONS_HINT).collect();
        return Err(NymError::VersionNotAvailable { version, recent }.into());
    }

    let (progress, mut receiver) = progress_channel();
    let bar = progress_bar();
    let observer = {
        let bar = bar.clone();
        tokio::spawn(async move {
            while let Some(percent) = receiver.recv().await {
                bar.set_position(u64::from(percent));
            }
        })
    };

    let downloaded = config
        .fetcher
        .download(
            &config.runtime,
            &config.catalog,
            &version,
            &config.platform,
            &progress,
        )
        .await;
    drop(progress);
    if let Err(e) = observer.await {
        debug!("Progress observer stopped: {}", e);
    }

    let archive_path = match downloaded {
        Ok(path) => {
            bar.finish_and_clear();
            path
        }
        Err(e) => {
            bar.abandon();
            return Err(e.into());
        }
    };
    debug!("Downloaded to {:?}", archive_path);

    let installer = Installer::new(&config.runtime, &config.paths);
    let target = installer.install(&version, &archive_path)?;

    println!("Installed v{} to {}", version, target.display());
    println!("Run 'nym use {}' to switch to this version", version);
    Ok(target)
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    if let Ok(style) =
        ProgressStyle::default_bar().template("Downloading [{bar:40.cyan/blue}] {pos:>3}%")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}
