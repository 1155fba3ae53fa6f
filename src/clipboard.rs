//! System clipboard adapter.
//!
//! A thin wrapper around the `arboard` crate. Clipboard initialization may fail
//! on some platforms or in headless CI environments, which the copy chain
//! treats as a failed strategy rather than a fatal error.

use std::borrow::Cow;

use arboard::{Clipboard, ImageData};
use async_trait::async_trait;
use image::ImageFormat;
use tracing::debug;

use crate::copy::{ClipboardItem, ClipboardSink};
use crate::error::ClipboardError;

/// Copy `s` to the system clipboard.
pub fn copy_to_clipboard(s: &str) -> Result<(), ClipboardError> {
    let mut ctx = open()?;
    ctx.set_text(s.to_owned())
        .map_err(|e| ClipboardError::Write(e.to_string()))
}

fn open() -> Result<Clipboard, ClipboardError> {
    Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))
}

/// [`ClipboardSink`] backed by the operating system clipboard.
///
/// Every write opens a fresh `arboard` handle on a blocking thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }

    /// Whether a clipboard handle can be opened in this session.
    pub fn probe() -> bool {
        match open() {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "system clipboard unavailable");
                false
            }
        }
    }
}

#[async_trait]
impl ClipboardSink for SystemClipboard {
    async fn write_item(&self, item: &ClipboardItem) -> Result<(), ClipboardError> {
        let image = decode_image(item)?;
        run_blocking(move || {
            open()?
                .set_image(image)
                .map_err(|e| ClipboardError::Write(e.to_string()))
        })
        .await
    }

    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let text = text.to_owned();
        run_blocking(move || copy_to_clipboard(&text)).await
    }
}

async fn run_blocking<F>(f: F) -> Result<(), ClipboardError>
where
    F: FnOnce() -> Result<(), ClipboardError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ClipboardError::Write(e.to_string()))?
}

/// Strip MIME parameters and lowercase, `"Image/PNG; q=1"` gives `"image/png"`.
pub(crate) fn normalize_mime(mime: &str) -> String {
    mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase()
}

fn image_format(mime: &str) -> Option<ImageFormat> {
    match normalize_mime(mime).as_str() {
        "image/png" => Some(ImageFormat::Png),
        "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
        "image/webp" => Some(ImageFormat::WebP),
        "image/gif" => Some(ImageFormat::Gif),
        _ => None,
    }
}

/// Decode a clipboard item into the RGBA buffer `arboard` expects.
fn decode_image(item: &ClipboardItem) -> Result<ImageData<'static>, ClipboardError> {
    let format =
        image_format(&item.mime).ok_or_else(|| ClipboardError::UnsupportedMime(item.mime.clone()))?;
    let rgba = image::load_from_memory_with_format(&item.bytes, format)
        .map_err(|e| ClipboardError::Decode(e.to_string()))?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(ImageData {
        width: width as usize,
        height: height as usize,
        bytes: Cow::Owned(rgba.into_raw()),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 3, image::Rgba([255, 0, 0, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn clipboard_copy_no_panic() {
        // May fail without a display server; only the absence of a panic matters.
        let _ = copy_to_clipboard("test");
    }

    #[test]
    fn mime_normalization() {
        assert_eq!(normalize_mime("Image/PNG; charset=binary"), "image/png");
        assert_eq!(normalize_mime(""), "");
    }

    #[test]
    fn decodes_png_to_rgba() {
        let item = ClipboardItem {
            mime: "image/png".into(),
            bytes: tiny_png(),
        };
        let data = decode_image(&item).unwrap();
        assert_eq!((data.width, data.height), (2, 3));
        assert_eq!(data.bytes.len(), 2 * 3 * 4);
    }

    #[test]
    fn rejects_unsupported_mime() {
        let item = ClipboardItem {
            mime: "image/svg+xml".into(),
            bytes: b"<svg/>".to_vec(),
        };
        assert!(matches!(
            decode_image(&item),
            Err(ClipboardError::UnsupportedMime(_))
        ));
    }

    #[test]
    fn rejects_corrupt_png() {
        let item = ClipboardItem {
            mime: "image/png".into(),
            bytes: vec![1, 2, 3],
        };
        assert!(matches!(decode_image(&item), Err(ClipboardError::Decode(_))));
    }
}
