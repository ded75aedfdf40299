//! Resource retriever
//!
//! Streams a resolved resource into the download directory. The body is
//! written to `<destination>.part` and renamed into place only once the whole
//! body has arrived, so the destination path either holds a complete file or
//! does not exist. The part file is removed on every failure path, including
//! the transfer future being dropped by an interrupt.
//!
//! Only stalls time out: waiting for the response headers and every gap
//! between body chunks is bounded by the idle window, the total transfer
//! time is not.

mod filename;

pub use filename::{destination_file_name, sanitize_filename};

use crate::crawler::{describe_error, Pacer};
use crate::pipeline::{ResolvedResource, Stage};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncWriteExt, BufWriter};
use url::Url;

/// Why a transfer did not produce a file
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Unsupported resource scheme '{scheme}' for {url}")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Network error for {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Transfer of {url} stalled for {idle:?}")]
    TimedOut { url: String, idle: Duration },

    #[error("Empty response body from {url}")]
    Empty { url: String },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of one retrieval
#[derive(Debug)]
pub enum RetrievalOutcome {
    /// The destination file already existed; nothing was transferred
    AlreadyPresent(PathBuf),

    /// The resource was transferred completely
    Downloaded { path: PathBuf, bytes: u64 },

    /// The transfer failed and no file was left behind
    Failed(TransferError),
}

/// Part file that deletes itself unless the transfer completed
struct PartFile {
    path: PathBuf,
    keep: bool,
}

impl PartFile {
    fn new(destination: &Path) -> Self {
        let mut name = destination.as_os_str().to_owned();
        name.push(".part");
        Self {
            path: PathBuf::from(name),
            keep: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn persist(mut self) {
        self.keep = true;
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if !self.keep && self.path.exists() {
            tracing::debug!("Removing partial file {}", self.path.display());
            if let Err(e) = std::fs::remove_file(&self.path) {
                tracing::warn!("Failed to remove partial file {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Stores resolved resources in a download directory
pub struct ResourceRetriever {
    client: Client,
    pacer: Arc<Pacer>,
    download_dir: PathBuf,
    idle_timeout: Duration,
    fallback_name: String,
    progress_bar: bool,
}

impl ResourceRetriever {
    /// Creates a retriever
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client carrying the fixed header set
    /// * `pacer` - Pacer shared with the page fetcher
    /// * `download_dir` - Destination directory, created on first download
    /// * `idle_timeout` - Longest wait for the headers or for the next body chunk
    pub fn new(
        client: Client,
        pacer: Arc<Pacer>,
        download_dir: impl Into<PathBuf>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            client,
            pacer,
            download_dir: download_dir.into(),
            idle_timeout,
            fallback_name: "Unknown".to_string(),
            progress_bar: false,
        }
    }

    /// Name used when a display name sanitizes to nothing
    pub fn with_fallback_name(mut self, name: impl Into<String>) -> Self {
        self.fallback_name = name.into();
        self
    }

    /// Draw a byte progress bar for each transfer
    pub fn with_progress_bar(mut self, enabled: bool) -> Self {
        self.progress_bar = enabled;
        self
    }

    /// Destination path for a resource
    pub fn destination_for(&self, resource: &ResolvedResource) -> PathBuf {
        self.download_dir.join(destination_file_name(
            &resource.display_name,
            &resource.resource_url,
            &self.fallback_name,
        ))
    }

    /// Retrieves a resource unless its destination file already exists
    ///
    /// An existing destination is trusted as-is; its content is not compared
    /// with the remote resource.
    pub async fn retrieve(&self, resource: &ResolvedResource) -> RetrievalOutcome {
        let destination = self.destination_for(resource);
        let url = &resource.resource_url;

        if destination.exists() {
            tracing::info!(
                "  [*] '{}' already exists, skipping",
                destination.display()
            );
            return RetrievalOutcome::AlreadyPresent(destination);
        }

        if url.scheme() != "http" && url.scheme() != "https" {
            return RetrievalOutcome::Failed(TransferError::UnsupportedScheme {
                url: url.to_string(),
                scheme: url.scheme().to_string(),
            });
        }

        if let Err(source) = tokio::fs::create_dir_all(&self.download_dir).await {
            return RetrievalOutcome::Failed(TransferError::Io {
                path: self.download_dir.clone(),
                source,
            });
        }

        tracing::info!(
            "  [{step}/{step}] Downloading {} -> {}",
            url,
            destination.display(),
            step = Stage::STEPS
        );
        match self.transfer(url, &destination).await {
            Ok(bytes) => {
                tracing::info!("  [+] Saved {} ({} bytes)", destination.display(), bytes);
                RetrievalOutcome::Downloaded {
                    path: destination,
                    bytes,
                }
            }
            Err(e) => RetrievalOutcome::Failed(e),
        }
    }

    async fn transfer(&self, url: &Url, destination: &Path) -> Result<u64, TransferError> {
        self.pacer.wait().await;

        let request = self.client.get(url.clone()).send();
        let response = tokio::time::timeout(self.idle_timeout, request)
            .await
            .map_err(|_| self.stalled(url))?
            .map_err(|e| network(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let expected = response.content_length();
        let part = PartFile::new(destination);
        let file = tokio::fs::File::create(part.path())
            .await
            .map_err(|e| io_error(part.path(), e))?;
        let mut writer = BufWriter::new(file);
        let bar = self.progress_bar_for(expected, destination);

        let mut stream = response.bytes_stream();
        let mut received: u64 = 0;
        // A body shorter than its Content-Length surfaces here as a network error
        while let Some(chunk) = tokio::time::timeout(self.idle_timeout, stream.next())
            .await
            .map_err(|_| self.stalled(url))?
        {
            let chunk = chunk.map_err(|e| network(url, &e))?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| io_error(part.path(), e))?;
            received += chunk.len() as u64;
            bar.inc(chunk.len() as u64);
        }

        writer.flush().await.map_err(|e| io_error(part.path(), e))?;
        writer
            .get_ref()
            .sync_all()
            .await
            .map_err(|e| io_error(part.path(), e))?;
        drop(writer);
        bar.finish_and_clear();

        if received == 0 {
            return Err(TransferError::Empty {
                url: url.to_string(),
            });
        }

        tokio::fs::rename(part.path(), destination)
            .await
            .map_err(|e| io_error(destination, e))?;
        part.persist();

        Ok(received)
    }

    fn stalled(&self, url: &Url) -> TransferError {
        TransferError::TimedOut {
            url: url.to_string(),
            idle: self.idle_timeout,
        }
    }

    fn progress_bar_for(&self, expected: Option<u64>, destination: &Path) -> ProgressBar {
        if !self.progress_bar {
            return ProgressBar::hidden();
        }

        let bar = match expected {
            Some(len) => ProgressBar::new(len),
            None => ProgressBar::new_spinner(),
        };
        bar.set_style(
            ProgressStyle::with_template(
                "      {msg:30} [{bar:30}] {bytes}/{total_bytes} {bytes_per_sec}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        let label: String = destination
            .file_name()
            .map(|name| name.to_string_lossy().chars().take(30).collect())
            .unwrap_or_default();
        bar.set_message(label);
        bar
    }
}

fn network(url: &Url, error: &reqwest::Error) -> TransferError {
    TransferError::Network {
        url: url.to_string(),
        reason: describe_error(error),
    }
}

fn io_error(path: &Path, source: std::io::Error) -> TransferError {
    TransferError::Io {
        path: path.to_path_buf(),
        source,
    }
}
