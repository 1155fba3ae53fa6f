//! Settings resolved from CLI flags and environment variables.

use std::path::PathBuf;

use anyhow::{Context, Result};
use reqwest::Url;

use crate::assets::default_base_url;

pub const DEFAULT_CATALOG: &str = "data/stickers.json";
pub const DEFAULT_TWEMOJI_DIR: &str = "public/twemoji";

/// Settings for the `copy` command.
#[derive(Debug, Clone)]
pub struct CopyConfig {
    pub origin: Option<Url>,
    pub downloads_dir: PathBuf,
    pub allow_image: bool,
}

impl CopyConfig {
    pub fn resolve(
        origin: Option<&str>,
        downloads_dir: Option<PathBuf>,
        allow_image: bool,
    ) -> Result<Self> {
        let origin = origin
            .filter(|o| !o.trim().is_empty())
            .map(|o| Url::parse(o).with_context(|| format!("invalid origin {:?}", o)))
            .transpose()?;
        Ok(Self {
            origin,
            downloads_dir: downloads_dir.unwrap_or_else(default_downloads_dir),
            allow_image,
        })
    }
}

/// The user's download directory, or the working directory when the platform
/// has none.
pub fn default_downloads_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Settings for the `fetch-twemoji` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwemojiConfig {
    pub base_url: String,
    pub out_dir: PathBuf,
    pub force: bool,
}

impl TwemojiConfig {
    /// An explicit base URL wins over the one derived from `version`.
    pub fn resolve(version: &str, base_url: Option<String>, out_dir: PathBuf, force: bool) -> Self {
        let base_url = base_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| default_base_url(version));
        Self {
            base_url,
            out_dir,
            force,
        }
    }
}
