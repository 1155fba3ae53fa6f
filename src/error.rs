//! Error types shared by the copy ports, the desktop adapters and the catalog.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while fetching a resource into memory.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FetchError::Status {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            },
            None => FetchError::Transport(err.to_string()),
        }
    }
}

/// Failure while writing to the clipboard.
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("unsupported clipboard content type: {0}")]
    UnsupportedMime(String),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("clipboard write failed: {0}")]
    Write(String),
}

/// Failure of the download fallback.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("invalid download file name: {0:?}")]
    InvalidFilename(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to save {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no free file name for {0:?} in the download directory")]
    NoFreeName(String),
}

/// Failure while loading, saving or scanning the sticker catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog json: {0}")]
    Json(#[from] serde_json::Error),
}
