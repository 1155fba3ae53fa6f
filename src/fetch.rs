//! Network side of the copy chain: fetching sticker images into memory and the
//! file-saving download fallback.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::clipboard::normalize_mime;
use crate::copy::{DownloadSink, ImageBlob, ImageFetcher};
use crate::error::{DownloadError, FetchError};

const OCTET_STREAM: &str = "application/octet-stream";

/// Highest `name (n).ext` suffix tried before a download gives up.
const MAX_NAME_SUFFIX: u32 = 999;

/// Guess a MIME type from the extension of a path or URL. Any query string or
/// fragment is ignored.
pub fn mime_from_extension(path: &str) -> &'static str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let ext = path
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => OCTET_STREAM,
    }
}

/// MIME type from the extension, or from the image signature in `bytes` when
/// the extension says nothing.
fn guess_mime(path: &str, bytes: &[u8]) -> String {
    match mime_from_extension(path) {
        OCTET_STREAM => image::guess_format(bytes)
            .map(|f| f.to_mime_type())
            .unwrap_or(OCTET_STREAM)
            .to_string(),
        known => known.to_string(),
    }
}

/// [`ImageFetcher`] over HTTP(S), `file://` URLs and plain filesystem paths.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch_http(&self, url: &str) -> Result<ImageBlob, FetchError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let header_mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(normalize_mime)
            .filter(|m| !m.is_empty() && m != OCTET_STREAM);
        let bytes = response.bytes().await?.to_vec();
        let mime = header_mime.unwrap_or_else(|| guess_mime(url, &bytes));
        Ok(ImageBlob { mime, bytes })
    }
}

async fn read_local(path: &Path) -> Result<ImageBlob, FetchError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mime = guess_mime(&path.to_string_lossy(), &bytes);
    Ok(ImageBlob { mime, bytes })
}

/// Local file path a URL or plain path refers to, if it is not a network URL.
fn local_path(target: &str) -> Option<PathBuf> {
    match Url::parse(target) {
        Ok(url) if url.scheme() == "file" => url.to_file_path().ok(),
        Ok(_) => None,
        Err(_) => Some(PathBuf::from(target)),
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<ImageBlob, FetchError> {
        debug!(url, "fetching sticker image");
        match local_path(url) {
            Some(path) => read_local(&path).await,
            None => self.fetch_http(url).await,
        }
    }
}

/// Download fallback that saves the sticker into a directory.
///
/// Relative sticker URLs are resolved against `origin` before fetching.
/// Existing files are never replaced: a taken name is saved as `name (1).ext`,
/// `name (2).ext` and so on.
#[derive(Debug, Clone)]
pub struct FileDownloader {
    dir: PathBuf,
    origin: Option<Url>,
    fetcher: HttpFetcher,
}

impl FileDownloader {
    pub fn new(dir: impl Into<PathBuf>, origin: Option<Url>) -> Self {
        Self {
            dir: dir.into(),
            origin,
            fetcher: HttpFetcher::new(),
        }
    }

    /// Target path for `filename`, keeping only its final component.
    pub fn target_path(&self, filename: &str) -> Result<PathBuf, DownloadError> {
        let name = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| DownloadError::InvalidFilename(filename.to_string()))?;
        Ok(self.dir.join(name))
    }

    /// Create the first free file for `target`. The existence check and the
    /// create happen in one step, so a file appearing concurrently is not
    /// replaced.
    async fn create_unique(&self, target: &Path) -> Result<(File, PathBuf), DownloadError> {
        for n in 0..=MAX_NAME_SUFFIX {
            let candidate = numbered(target, n);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(file) => return Ok((file, candidate)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(path = %candidate.display(), "download name taken");
                }
                Err(source) => {
                    return Err(DownloadError::Io {
                        path: candidate,
                        source,
                    });
                }
            }
        }
        Err(DownloadError::NoFreeName(target.display().to_string()))
    }

    fn source_url(&self, url: &str) -> String {
        match Url::parse(url) {
            Ok(abs) => abs.to_string(),
            Err(_) => match &self.origin {
                Some(origin) => origin
                    .join(url)
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| url.to_string()),
                None => url.to_string(),
            },
        }
    }
}

/// `target` for `n == 0`, otherwise `stem (n).ext`.
fn numbered(target: &Path, n: u32) -> PathBuf {
    if n == 0 {
        return target.to_path_buf();
    }
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let name = match target.extension() {
        Some(ext) => format!("{} ({}).{}", stem, n, ext.to_string_lossy()),
        None => format!("{} ({})", stem, n),
    };
    target.with_file_name(name)
}

#[async_trait]
impl DownloadSink for FileDownloader {
    async fn download(
        &self,
        url: &str,
        filename: &str,
        fetched: Option<ImageBlob>,
    ) -> Result<(), DownloadError> {
        let target = self.target_path(filename)?;
        let blob = match fetched {
            Some(blob) => blob,
            None => self.fetcher.fetch(&self.source_url(url)).await?,
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| DownloadError::Io {
                path: self.dir.clone(),
                source,
            })?;
        let (mut file, path) = self.create_unique(&target).await?;
        let io_err = |source| DownloadError::Io {
            path: path.clone(),
            source,
        };
        file.write_all(&blob.bytes).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;
        info!(path = %path.display(), bytes = blob.bytes.len(), "sticker saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_guessing() {
        assert_eq!(mime_from_extension("/stickers/0.png"), "image/png");
        assert_eq!(mime_from_extension("https://x.example/a/b.JPEG"), "image/jpeg");
        assert_eq!(mime_from_extension("/twemoji/1f600.svg"), "image/svg+xml");
        assert_eq!(mime_from_extension("/v1.2/sticker"), OCTET_STREAM);
        assert_eq!(mime_from_extension("https://cdn.example/s/a.png?v=2"), "image/png");
        assert_eq!(mime_from_extension("/stickers/1.webp#frame"), "image/webp");
        assert_eq!(mime_from_extension("/stickers/1?name=a.png"), OCTET_STREAM);
    }

    #[test]
    fn mime_sniffed_when_extension_unknown() {
        let png_magic = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert_eq!(guess_mime("/api/sticker/7", png_magic), "image/png");
        assert_eq!(guess_mime("/api/sticker/7", b"plain"), OCTET_STREAM);
        assert_eq!(guess_mime("/stickers/7.gif", png_magic), "image/gif");
    }

    #[test]
    fn numbered_names() {
        let target = Path::new("/out/0.png");
        assert_eq!(numbered(target, 0), PathBuf::from("/out/0.png"));
        assert_eq!(numbered(target, 2), PathBuf::from("/out/0 (2).png"));
        assert_eq!(numbered(Path::new("/out/sticker"), 1), PathBuf::from("/out/sticker (1)"));
    }

    #[test]
    fn local_paths() {
        assert_eq!(local_path("stickers/0.png"), Some(PathBuf::from("stickers/0.png")));
        assert!(local_path("https://stickers.example/0.png").is_none());
    }

    #[test]
    fn target_path_strips_directories() {
        let dl = FileDownloader::new("/tmp/out", None);
        assert_eq!(
            dl.target_path("../../etc/evil.png").unwrap(),
            PathBuf::from("/tmp/out/evil.png")
        );
        assert!(dl.target_path("").is_err());
        assert!(dl.target_path("..").is_err());
    }

    #[tokio::test]
    async fn fetches_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0.png");
        std::fs::write(&path, b"png-bytes").unwrap();

        let blob = HttpFetcher::new()
            .fetch(path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(blob.mime, "image/png");
        assert_eq!(blob.bytes, b"png-bytes");
    }

    #[tokio::test]
    async fn missing_local_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.png");
        let err = HttpFetcher::new()
            .fetch(path.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }

    #[tokio::test]
    async fn downloads_local_sticker_into_dir() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let sticker = src.path().join("3.png");
        std::fs::write(&sticker, b"sticker").unwrap();

        let dl = FileDownloader::new(out.path().join("nested"), None);
        dl.download(sticker.to_str().unwrap(), "yukino-3.png", None)
            .await
            .unwrap();
        let saved = std::fs::read(out.path().join("nested/yukino-3.png")).unwrap();
        assert_eq!(saved, b"sticker");
    }

    #[tokio::test]
    async fn download_keeps_existing_file() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let sticker = src.path().join("0.png");
        std::fs::write(&sticker, b"new").unwrap();
        std::fs::write(out.path().join("0.png"), b"mine").unwrap();

        let dl = FileDownloader::new(out.path(), None);
        dl.download(sticker.to_str().unwrap(), "0.png", None)
            .await
            .unwrap();
        dl.download(sticker.to_str().unwrap(), "0.png", None)
            .await
            .unwrap();

        assert_eq!(std::fs::read(out.path().join("0.png")).unwrap(), b"mine");
        assert_eq!(std::fs::read(out.path().join("0 (1).png")).unwrap(), b"new");
        assert_eq!(std::fs::read(out.path().join("0 (2).png")).unwrap(), b"new");
    }

    #[tokio::test]
    async fn download_uses_prefetched_bytes() {
        let out = tempfile::tempdir().unwrap();
        let dl = FileDownloader::new(out.path(), None);
        let blob = ImageBlob {
            mime: "image/png".into(),
            bytes: b"already-fetched".to_vec(),
        };
        dl.download("/no/such/sticker.png", "5.png", Some(blob))
            .await
            .unwrap();
        assert_eq!(
            std::fs::read(out.path().join("5.png")).unwrap(),
            b"already-fetched"
        );
    }
}
