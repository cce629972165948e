//! Single-flight downloader implementation.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::Client;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::error::DownloadError;
use crate::config::DownloaderConfig;

/// Suffix of the file a download is streamed into before the swap.
const TEMP_SUFFIX: &str = ".tmp";

/// What happened to a download request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The destination now holds the downloaded content.
    Completed { bytes: u64 },
    /// Another download to the same destination was already in flight.
    Skipped,
    /// The attempt failed and was abandoned; the destination is unchanged.
    Failed,
}

type InFlight = Mutex<HashSet<PathBuf>>;

/// Removes a destination from the in-flight set when the attempt ends,
/// whichever way it ends.
struct InFlightGuard<'a> {
    in_flight: &'a InFlight,
    destination: PathBuf,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.destination);
    }
}

/// Downloads files, allowing at most one in-flight download per destination.
pub struct SingleFlightDownloader {
    client: Client,
    in_flight: InFlight,
}

impl SingleFlightDownloader {
    /// Creates a downloader; requests are unbounded unless a timeout is set.
    pub fn new(config: &DownloaderConfig) -> Result<Self, DownloadError> {
        let mut builder = Client::builder()
            .user_agent(format!("beatsync/{}", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| DownloadError::NotConfigured(e.to_string()))?;

        Ok(Self::with_client(client))
    }

    /// Creates a downloader around an existing client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Number of downloads currently in flight.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Whether a download to `destination` is currently in flight.
    pub fn is_in_flight(&self, destination: &Path) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(destination)
    }

    /// Downloads `url` to `destination`, replacing any existing file.
    ///
    /// If a download to the same destination is already running this call
    /// does nothing. Errors are logged, never returned.
    pub async fn download(&self, url: &str, destination: impl AsRef<Path>) -> DownloadOutcome {
        let destination = destination.as_ref();

        let Some(_guard) = self.admit(destination) else {
            debug!(
                "Download to {:?} already in flight, dropping request for {}",
                destination, url
            );
            return DownloadOutcome::Skipped;
        };

        let temp = temp_path(destination);
        match self.transfer(url, destination, &temp).await {
            Ok(bytes) => {
                info!("Downloaded {} to {:?} ({} bytes)", url, destination, bytes);
                DownloadOutcome::Completed { bytes }
            }
            Err(e) => {
                error!("Could not download {:?} from {}: {}", destination, url, e);
                if let Err(e) = fs::remove_file(&temp).await {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        warn!("Failed to remove partial download {:?}: {}", temp, e);
                    }
                }
                DownloadOutcome::Failed
            }
        }
    }

    /// Starts a download in the background.
    pub fn spawn(
        self: &Arc<Self>,
        url: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> JoinHandle<DownloadOutcome> {
        let downloader = Arc::clone(self);
        let url = url.into();
        let destination = destination.into();
        tokio::spawn(async move { downloader.download(&url, &destination).await })
    }

    /// Claims `destination`; `None` if it is already claimed.
    fn admit(&self, destination: &Path) -> Option<InFlightGuard<'_>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !in_flight.insert(destination.to_path_buf()) {
            return None;
        }
        Some(InFlightGuard {
            in_flight: &self.in_flight,
            destination: destination.to_path_buf(),
        })
    }

    /// Streams `url` into `temp`, then renames it over `destination`.
    async fn transfer(
        &self,
        url: &str,
        destination: &Path,
        temp: &Path,
    ) -> Result<u64, DownloadError> {
        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| DownloadError::io(parent, e))?;
            }
        }

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::http(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut file = File::create(temp)
            .await
            .map_err(|e| DownloadError::io(temp, e))?;

        let mut bytes = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| DownloadError::http(url, e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::io(temp, e))?;
            bytes += chunk.len() as u64;
        }

        file.flush().await.map_err(|e| DownloadError::io(temp, e))?;
        file.sync_all()
            .await
            .map_err(|e| DownloadError::io(temp, e))?;
        drop(file);

        // rename replaces an existing destination in one step
        fs::rename(temp, destination)
            .await
            .map_err(|e| DownloadError::io(destination, e))?;

        Ok(bytes)
    }
}

/// `<destination>.tmp`
fn temp_path(destination: &Path) -> PathBuf {
    let mut name = OsString::from(destination.as_os_str());
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}
