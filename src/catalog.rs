//! Remote version catalog: what can be installed and where to fetch it.

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use crate::error::Result;
use crate::http::HttpClient;
use crate::paths::normalize_version;
use crate::platform::Platform;

/// Distribution site used when no mirror is configured.
pub const DEFAULT_MIRROR: &str = "https://nodejs.org/dist";

/// Name prefix of every release artifact.
pub const DIST_NAME: &str = "node";

#[derive(Debug, Deserialize)]
struct VersionDescriptor {
    version: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Versions offered by the catalog, normalized, in server order (newest first).
    async fn list_available_versions(&self) -> Result<Vec<String>>;

    /// Download URL for `version` on `platform`.
    fn resolve_download_url(&self, version: &str, platform: &Platform) -> String;
}

/// Catalog backed by a distribution mirror's `index.json`.
pub struct RemoteCatalog {
    http_client: HttpClient,
    mirror: String,
}

impl RemoteCatalog {
    pub fn new(http_client: HttpClient, mirror: Option<String>) -> Self {
        let mirror = mirror
            .unwrap_or_else(|| DEFAULT_MIRROR.to_string())
            .trim_end_matches('/')
            .to_string();
        Self {
            http_client,
            mirror,
        }
    }

    pub fn mirror(&self) -> &str {
        &self.mirror
    }

    fn index_url(&self) -> String {
        format!("{}/index.json", self.mirror)
    }
}

#[async_trait]
impl Catalog for RemoteCatalog {
    #[tracing::instrument(skip(self))]
    async fn list_available_versions(&self) -> Result<Vec<String>> {
        let url = self.index_url();
        let descriptors: Vec<VersionDescriptor> = self.http_client.get_json(&url).await?;
        debug!("Catalog lists {} versions", descriptors.len());

        Ok(descriptors
            .into_iter()
            .map(|d| normalize_version(&d.version))
            .collect())
    }

    fn resolve_download_url(&self, version: &str, platform: &Platform) -> String {
        resolve_download_url(&self.mirror, version, platform)
    }
}

/// Pure URL construction: `<mirror>/v<version>/node-v<version>-<os>-<arch>.<ext>`.
pub fn resolve_download_url(mirror: &str, version: &str, platform: &Platform) -> String {
    let version = normalize_version(version);
    format!(
        "{mirror}/v{version}/{DIST_NAME}-v{version}-{os}-{arch}.{ext}",
        mirror = mirror.trim_end_matches('/'),
        os = platform.dist_os(),
        arch = platform.dist_arch(),
        ext = platform.archive_ext(),
    )
}
