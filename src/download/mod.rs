//! Archive fetcher: streams a release artifact into a fresh temporary directory.

mod progress;

pub use progress::ProgressTracker;

use futures_util::StreamExt;
use log::{debug, info, warn};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::catalog::Catalog;
use crate::error::{NymError, Result};
use crate::http::{HttpClient, network_error};
use crate::platform::Platform;
use crate::runtime::Runtime;

/// Bytes buffered before each write and progress update.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Capacity of the progress hand-off channel.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 16;

/// First two bytes of a zip local file header (`PK`).
const ZIP_SIGNATURE: [u8; 2] = [0x50, 0x4B];

/// Sending half of the progress channel. The caller creates and closes it.
pub type ProgressSender = mpsc::Sender<u8>;

pub fn progress_channel() -> (ProgressSender, mpsc::Receiver<u8>) {
    mpsc::channel(PROGRESS_CHANNEL_CAPACITY)
}

pub struct Fetcher {
    http_client: HttpClient,
    chunk_size: usize,
}

impl Fetcher {
    pub fn new(http_client: HttpClient) -> Self {
        Self {
            http_client,
            chunk_size: CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Download `version` for `platform` into a new temporary directory and return the
    /// path of the validated artifact.
    #[tracing::instrument(skip(self, runtime, catalog, progress))]
    pub async fn download<R: Runtime, C: Catalog>(
        &self,
        runtime: &R,
        catalog: &C,
        version: &str,
        platform: &Platform,
        progress: &ProgressSender,
    ) -> Result<PathBuf> {
        let url = catalog.resolve_download_url(version, platform);
        info!("Download URL: {}", url);

        let temp_dir = tempfile::Builder::new()
            .prefix("nym-download-")
            .tempdir()
            .map_err(|e| NymError::download(std::env::temp_dir(), e))?
            .keep();

        let file_path = temp_dir.join(file_name_from_url(&url));
        let fetched = match self.download_url(runtime, &url, &file_path, progress).await {
            Ok(_) => validate_artifact(runtime, &file_path),
            Err(e) => Err(e),
        };
        if let Err(e) = fetched {
            if let Err(cleanup) = runtime.remove_dir_all(&temp_dir) {
                warn!("Failed to remove {:?}: {:#}", temp_dir, cleanup);
            }
            return Err(e);
        }

        Ok(file_path)
    }

    /// Stream `url` into `file_path`, emitting percentages on `progress` when the
    /// response declares its length.
    #[tracing::instrument(skip(self, runtime, progress))]
    pub async fn download_url<R: Runtime>(
        &self,
        runtime: &R,
        url: &str,
        file_path: &Path,
        progress: &ProgressSender,
    ) -> Result<u64> {
        let mut writer = runtime
            .create_file(file_path)
            .map_err(|e| NymError::download(file_path, format!("{:#}", e)))?;

        let response = self.http_client.get(url).await?;
        let mut tracker = ProgressTracker::new(response.content_length());
        debug!("Content length: {:?}", response.content_length());

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::with_capacity(self.chunk_size);

        while let Some(item) = stream.next().await {
            let bytes = item.map_err(|e| network_error(url, &e))?;
            let mut rest = &bytes[..];
            while !rest.is_empty() {
                let take = (self.chunk_size - buffer.len()).min(rest.len());
                buffer.extend_from_slice(&rest[..take]);
                rest = &rest[take..];

                if buffer.len() == self.chunk_size {
                    write_chunk(&mut writer, &mut buffer, &mut tracker, file_path, progress)
                        .await?;
                }
            }
        }
        if !buffer.is_empty() {
            write_chunk(&mut writer, &mut buffer, &mut tracker, file_path, progress).await?;
        }

        writer
            .flush()
            .map_err(|e| NymError::download(file_path, e))?;

        debug!(
            "Downloaded {:.2} MB",
            tracker.downloaded() as f64 / (1024.0 * 1024.0)
        );
        Ok(tracker.downloaded())
    }
}

async fn write_chunk(
    writer: &mut Box<dyn Write + Send>,
    buffer: &mut Vec<u8>,
    tracker: &mut ProgressTracker,
    file_path: &Path,
    progress: &ProgressSender,
) -> Result<()> {
    writer
        .write_all(buffer)
        .map_err(|e| NymError::download(file_path, e))?;

    if let Some(percent) = tracker.advance(buffer.len() as u64) {
        // A closed receiver only means nobody is rendering progress
        let _ = progress.send(percent).await;
    }
    buffer.clear();
    Ok(())
}

/// Final path segment of `url`, ignoring any query string.
pub fn file_name_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "download".to_string(),
    }
}

/// Reject empty files, and `.zip` files that do not start with a zip signature.
/// tar.gz artifacts are only checked during extraction.
#[tracing::instrument(skip(runtime))]
pub fn validate_artifact<R: Runtime>(runtime: &R, path: &Path) -> Result<()> {
    let len = runtime
        .file_len(path)
        .map_err(|e| NymError::download(path, format!("{:#}", e)))?;
    if len == 0 {
        return Err(NymError::EmptyArtifact(path.to_path_buf()));
    }

    let is_zip = path
        .to_string_lossy()
        .to_lowercase()
        .ends_with(".zip");
    if is_zip {
        let mut reader = runtime
            .open(path)
            .map_err(|e| NymError::download(path, format!("{:#}", e)))?;
        let mut header = [0u8; 2];
        if reader.read_exact(&mut header).is_err() || header != ZIP_SIGNATURE {
            return Err(NymError::InvalidFormat(path.to_path_buf()));
        }
    }

    Ok(())
}
