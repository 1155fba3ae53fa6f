//! Sticker copy chain.
//!
//! `copy_sticker` places a sticker on the most capable destination the
//! environment allows, in strict order:
//!
//! 1. the image bytes on the clipboard,
//! 2. the absolute image URL on the clipboard as text,
//! 3. a download of the image.
//!
//! Outside a secure context the clipboard is never touched and the download
//! runs directly. The chain always resolves to a [`CopyResult`]; strategy
//! failures are logged and fall through to the next strategy.
//!
//! The environment and every side effect are injected, so the chain runs the
//! same against the desktop adapters and against test doubles.

use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use tracing::{debug, warn};

use crate::env::resolve_url;
use crate::error::{ClipboardError, DownloadError, FetchError};

const MSG_INSECURE_DOWNLOAD: &str =
    "Download started (clipboard is unavailable outside a secure context)";
const MSG_IMAGE: &str = "Sticker image copied to clipboard";
const MSG_URL: &str = "Sticker link copied (this environment cannot copy the image itself)";
const MSG_DOWNLOAD: &str = "Download started (clipboard is unavailable)";

/// Which strategy produced the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyMethod {
    Image,
    Url,
    Download,
    /// Only produced when the download fallback itself fails.
    Error,
}

/// Outcome of one copy action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyResult {
    pub success: bool,
    pub method: CopyMethod,
    pub message: String,
}

impl CopyResult {
    fn ok(method: CopyMethod, message: &str) -> Self {
        Self {
            success: true,
            method,
            message: message.to_string(),
        }
    }

    fn failed(reason: &DownloadError) -> Self {
        Self {
            success: false,
            method: CopyMethod::Error,
            message: format!("Could not copy or download the sticker: {}", reason),
        }
    }
}

/// What the clipboard accepts in the current environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClipboardCapability {
    /// Arbitrary binary content keyed by MIME type.
    pub can_write_binary: bool,
    /// Plain text.
    pub can_write_text: bool,
}

/// Explicit stand-in for the ambient browser state the chain depends on.
#[derive(Debug, Clone, Default)]
pub struct CopyEnvironment {
    pub secure_context: bool,
    pub capability: ClipboardCapability,
    /// Base for relative sticker URLs.
    pub origin: Option<Url>,
}

/// A resource fetched fully into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// One clipboard entry keyed by its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardItem {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl From<ImageBlob> for ClipboardItem {
    fn from(blob: ImageBlob) -> Self {
        Self {
            mime: blob.mime,
            bytes: blob.bytes,
        }
    }
}

impl From<ClipboardItem> for ImageBlob {
    fn from(item: ClipboardItem) -> Self {
        Self {
            mime: item.mime,
            bytes: item.bytes,
        }
    }
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch `url` into memory. A non-2xx response is an error.
    async fn fetch(&self, url: &str) -> Result<ImageBlob, FetchError>;
}

#[async_trait]
pub trait ClipboardSink: Send + Sync {
    async fn write_item(&self, item: &ClipboardItem) -> Result<(), ClipboardError>;

    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Save the resource at `url` under the suggested `filename`.
    ///
    /// `fetched` carries the bytes when the chain already fetched them, so the
    /// sink does not fetch the same resource a second time.
    async fn download(
        &self,
        url: &str,
        filename: &str,
        fetched: Option<ImageBlob>,
    ) -> Result<(), DownloadError>;
}

/// The side-effecting collaborators of [`copy_sticker`].
pub struct CopyPorts<'a> {
    pub fetcher: &'a dyn ImageFetcher,
    pub clipboard: &'a dyn ClipboardSink,
    pub downloader: &'a dyn DownloadSink,
}

/// Copy the sticker at `image_url`, falling back from image to URL to a
/// download saved as `filename`.
pub async fn copy_sticker(
    env: &CopyEnvironment,
    ports: &CopyPorts<'_>,
    image_url: &str,
    filename: &str,
) -> CopyResult {
    if !env.secure_context {
        debug!(image_url, "not a secure context, skipping clipboard");
        return download(ports, image_url, filename, None, MSG_INSECURE_DOWNLOAD).await;
    }

    let absolute = resolve_url(env.origin.as_ref(), image_url);
    let mut fetched = None;

    if env.capability.can_write_binary {
        let (item, outcome) = try_copy_image(ports, absolute.as_ref(), image_url).await;
        match outcome {
            Ok(()) => return CopyResult::ok(CopyMethod::Image, MSG_IMAGE),
            Err(e) => warn!(image_url, error = %e, "image copy failed, trying url"),
        }
        fetched = item.map(ImageBlob::from);
    }

    if env.capability.can_write_text {
        match absolute.as_ref() {
            Some(url) => match ports.clipboard.write_text(url.as_str()).await {
                Ok(()) => return CopyResult::ok(CopyMethod::Url, MSG_URL),
                Err(e) => warn!(image_url, error = %e, "url copy failed, falling back to download"),
            },
            None => warn!(image_url, "cannot resolve an absolute url, falling back to download"),
        }
    }

    download(ports, image_url, filename, fetched, MSG_DOWNLOAD).await
}

#[derive(Debug, thiserror::Error)]
enum ImageCopyError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

/// Fetch and write the image. The fetched item is handed back even when the
/// write fails so the download fallback can reuse it.
async fn try_copy_image(
    ports: &CopyPorts<'_>,
    absolute: Option<&Url>,
    image_url: &str,
) -> (Option<ClipboardItem>, Result<(), ImageCopyError>) {
    let target = absolute.map_or(image_url, |u| u.as_str());
    let item = match ports.fetcher.fetch(target).await {
        Ok(blob) => ClipboardItem::from(blob),
        Err(e) => return (None, Err(e.into())),
    };
    debug!(mime = %item.mime, size = item.bytes.len(), "fetched sticker image");
    let outcome = ports
        .clipboard
        .write_item(&item)
        .await
        .map_err(ImageCopyError::from);
    (Some(item), outcome)
}

async fn download(
    ports: &CopyPorts<'_>,
    image_url: &str,
    filename: &str,
    fetched: Option<ImageBlob>,
    message: &str,
) -> CopyResult {
    match ports.downloader.download(image_url, filename, fetched).await {
        Ok(()) => CopyResult::ok(CopyMethod::Download, message),
        Err(e) => {
            warn!(image_url, filename, error = %e, "download fallback failed");
            CopyResult::failed(&e)
        }
    }
}
