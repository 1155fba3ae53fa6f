//! Mirror Twemoji SVG glyphs for every emoji used by the catalog.
//!
//! Glyphs are stored as `{out_dir}/{code_point_key}.svg`, the layout
//! [`crate::twemoji::twemoji_src`] points at.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::twemoji::emoji_to_code_point;

pub const DEFAULT_TWEMOJI_VERSION: &str = "17.0.2";

/// CDN directory holding the SVG assets of a Twemoji release.
pub fn default_base_url(version: &str) -> String {
    format!(
        "https://cdn.jsdelivr.net/gh/jdecked/twemoji@{}/assets/svg",
        version
    )
}

/// Where glyph SVGs come from.
#[async_trait]
pub trait GlyphSource: Send + Sync {
    /// SVG bytes for `key`, or `None` when the source has no such glyph.
    async fn fetch_svg(&self, key: &str) -> Result<Option<Vec<u8>>>;
}

/// [`GlyphSource`] reading `{base_url}/{key}.svg` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGlyphSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGlyphSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl GlyphSource for HttpGlyphSource {
    async fn fetch_svg(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let url = format!("{}/{}.svg", self.base_url, key);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {}", url))?;
        if !response.status().is_success() {
            warn!(key, status = response.status().as_u16(), "glyph not found");
            return Ok(None);
        }
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("reading body of {}", url))?;
        Ok(Some(bytes.to_vec()))
    }
}

/// Counters reported after a fetch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Download the glyph of each emoji in `emoji` into `out_dir`.
///
/// Existing files are kept unless `force` is set. Emoji that do not resolve,
/// glyphs the source lacks and transport errors all count as failures; only
/// filesystem errors on `out_dir` abort the run.
pub async fn fetch_twemoji(
    emoji: &[String],
    source: &dyn GlyphSource,
    out_dir: &Path,
    force: bool,
) -> Result<FetchSummary> {
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut summary = FetchSummary::default();
    for item in emoji {
        let key = emoji_to_code_point(item);
        if key.is_empty() {
            warn!(emoji = %item, "cannot resolve emoji to a code point");
            summary.failed += 1;
            continue;
        }

        let target: PathBuf = out_dir.join(format!("{}.svg", key));
        if !force && tokio::fs::try_exists(&target).await.unwrap_or(false) {
            debug!(key, "glyph already present");
            summary.skipped += 1;
            continue;
        }

        match source.fetch_svg(&key).await {
            Ok(Some(svg)) => {
                tokio::fs::write(&target, svg)
                    .await
                    .with_context(|| format!("writing {}", target.display()))?;
                debug!(key, "glyph saved");
                summary.downloaded += 1;
            }
            Ok(None) => summary.failed += 1,
            Err(e) => {
                warn!(key, error = %e, "glyph fetch failed");
                summary.failed += 1;
            }
        }
    }

    info!(
        downloaded = summary.downloaded,
        skipped = summary.skipped,
        failed = summary.failed,
        "twemoji fetch finished"
    );
    Ok(summary)
}
