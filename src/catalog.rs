//! Sticker catalog: the JSON metadata behind the gallery.
//!
//! Each sticker carries 1-3 emoji, an alt text, search tags, whether it is a
//! "hug" sticker (the character interacting with someone else) and an optional
//! mood. The catalog also drives the Twemoji fetcher, which mirrors a glyph
//! for every distinct emoji used.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

const STICKER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    Surprised,
    Loving,
    Silly,
    Calm,
    Excited,
    Confused,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sticker {
    pub id: String,
    /// Image file name inside the sticker directory.
    pub file: String,
    #[serde(default)]
    pub emoji: Vec<String>,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_hug: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
}

impl Sticker {
    /// Empty entry for `file`, waiting for metadata.
    pub fn placeholder(file: &str) -> Self {
        Self {
            id: sticker_id_for_file(file),
            file: file.to_string(),
            emoji: Vec::new(),
            alt: String::new(),
            tags: Vec::new(),
            is_hug: false,
            mood: None,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.alt.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
            || self.emoji.iter().any(|e| e.contains(needle))
    }
}

/// Gallery filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StickerType {
    #[default]
    All,
    Normal,
    Hug,
}

impl StickerType {
    pub fn accepts(self, sticker: &Sticker) -> bool {
        match self {
            StickerType::All => true,
            StickerType::Normal => !sticker.is_hug,
            StickerType::Hug => sticker.is_hug,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub stickers: Vec<Sticker>,
}

impl Catalog {
    pub fn new(stickers: Vec<Sticker>) -> Self {
        Self { stickers }
    }

    pub fn from_json(s: &str) -> Result<Self, CatalogError> {
        Ok(Self::new(serde_json::from_str(s)?))
    }

    pub fn to_json(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(&self.stickers)?)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let mut json = self.to_json()?;
        json.push('\n');
        fs::write(path, json).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Distinct non-blank emoji across all stickers, sorted.
    pub fn emoji_set(&self) -> Vec<String> {
        self.stickers
            .iter()
            .flat_map(|s| s.emoji.iter())
            .filter(|e| !e.trim().is_empty())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn filter(&self, kind: StickerType) -> Vec<&Sticker> {
        self.stickers.iter().filter(|s| kind.accepts(s)).collect()
    }

    /// Sticker count per filter option, in display order.
    pub fn filter_counts(&self) -> [(StickerType, usize); 3] {
        let hug = self.stickers.iter().filter(|s| s.is_hug).count();
        [
            (StickerType::All, self.stickers.len()),
            (StickerType::Normal, self.stickers.len() - hug),
            (StickerType::Hug, hug),
        ]
    }

    /// Stickers whose alt text, tags or emoji contain `term` (case-insensitive).
    pub fn search(&self, term: &str) -> Vec<&Sticker> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.stickers.iter().collect();
        }
        self.stickers.iter().filter(|s| s.matches(&needle)).collect()
    }

    /// Stickers grouped by mood; stickers without a mood are left out.
    pub fn group_by_mood(&self) -> BTreeMap<Mood, Vec<&Sticker>> {
        let mut groups: BTreeMap<Mood, Vec<&Sticker>> = BTreeMap::new();
        for sticker in &self.stickers {
            if let Some(mood) = sticker.mood {
                groups.entry(mood).or_default().push(sticker);
            }
        }
        groups
    }

    /// Rebuild the catalog in `files` order, reusing existing entries by file
    /// name. Returns the new catalog and the files still missing metadata
    /// (no entry, or an entry without a mood).
    pub fn reconcile(&self, files: &[String]) -> (Catalog, Vec<String>) {
        let cached: HashMap<&str, &Sticker> =
            self.stickers.iter().map(|s| (s.file.as_str(), s)).collect();

        let mut pending = Vec::new();
        let stickers = files
            .iter()
            .map(|file| match cached.get(file.as_str()) {
                Some(existing) => {
                    if existing.mood.is_none() {
                        pending.push(file.clone());
                    }
                    (*existing).clone()
                }
                None => {
                    pending.push(file.clone());
                    Sticker::placeholder(file)
                }
            })
            .collect();
        (Catalog::new(stickers), pending)
    }
}

fn file_stem(file: &str) -> &str {
    Path::new(file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file)
}

/// Catalog id for a sticker file: `7.png` gives `sticker-7`, `wave.png` gives
/// `wave`.
pub fn sticker_id_for_file(file: &str) -> String {
    let stem = file_stem(file);
    if !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit()) {
        format!("sticker-{}", stem)
    } else {
        stem.to_string()
    }
}

/// Sticker image files in `dir`, numerically ordered by stem; non-numeric
/// names follow in lexical order.
pub fn scan_sticker_dir(dir: &Path) -> Result<Vec<String>, CatalogError> {
    let io_err = |source| CatalogError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path: PathBuf = entry.map_err(io_err)?.path();
        let is_sticker = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| STICKER_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if path.is_file()
            && is_sticker
            && let Some(name) = path.file_name().and_then(|n| n.to_str())
        {
            files.push(name.to_string());
        }
    }
    files.sort_by(|a, b| {
        let key = |f: &String| file_stem(f).parse::<u64>().ok();
        match (key(a), key(b)) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    });
    Ok(files)
}
