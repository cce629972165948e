//! Error types for the downloader module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can end a download attempt.
///
/// These never reach callers of [`SingleFlightDownloader::download`]; they are
/// logged and reported as a failed outcome.
///
/// [`SingleFlightDownloader::download`]: super::SingleFlightDownloader::download
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Transport failure while requesting or streaming the resource.
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Local file system failure.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Client could not be built.
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

impl DownloadError {
    /// Creates an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an HTTP error for `url`.
    pub fn http(url: &str, source: reqwest::Error) -> Self {
        Self::Http {
            url: url.to_string(),
            source,
        }
    }
}
