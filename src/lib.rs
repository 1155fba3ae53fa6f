//! Stickerkit library crate
//!
//! Core functionality for the `stickerkit` CLI, the tooling behind a sticker
//! gallery site. Modules:
//!
//! - `twemoji`: emoji to Twemoji code-point keys and asset paths.
//! - `copy`: the copy chain (image to clipboard, else URL, else download) and
//!   the ports it runs against.
//! - `env`: secure-context detection and URL resolution for the copy chain.
//! - `clipboard` and `fetch`: desktop implementations of the copy ports.
//! - `catalog`: the sticker metadata catalog.
//! - `assets`: mirroring Twemoji glyphs for the catalog's emoji.
//! - `config`, `logging`, `error`: settings, tracing setup and error types.
//!
//! The binary `src/main.rs` calls `stickerkit_lib::run()`.

pub mod assets;
pub mod catalog;
pub mod clipboard;
pub mod config;
pub mod copy;
pub mod env;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod twemoji;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};

use crate::assets::{DEFAULT_TWEMOJI_VERSION, HttpGlyphSource, fetch_twemoji};
use crate::catalog::{Catalog, StickerType, scan_sticker_dir};
use crate::clipboard::SystemClipboard;
use crate::config::{CopyConfig, DEFAULT_CATALOG, DEFAULT_TWEMOJI_DIR, TwemojiConfig};
use crate::copy::{CopyMethod, CopyPorts, copy_sticker};
use crate::env::detect_environment;
use crate::fetch::{FileDownloader, HttpFetcher};
use crate::twemoji::{TWEMOJI_LOCAL_PATH, emoji_to_code_point, twemoji_src_with_base};

/// Top-level CLI types and runner. Keep `main.rs` thin.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Sticker catalog (JSON array of stickers)
    #[arg(long = "catalog", global = true, env = "STICKERKIT_CATALOG", default_value = DEFAULT_CATALOG)]
    catalog: PathBuf,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the Twemoji code-point key and asset path of each emoji
    Codepoint {
        #[arg(required = true)]
        emoji: Vec<String>,

        /// Base path of the glyph assets
        #[arg(long = "base-path", default_value = TWEMOJI_LOCAL_PATH)]
        base_path: String,
    },
    /// Copy a sticker image to the clipboard, falling back to its URL, then a download
    Copy {
        /// Sticker image URL or path (relative URLs resolve against --origin)
        image_url: String,

        /// File name used by the download fallback
        #[arg(long = "filename")]
        filename: Option<String>,

        /// Site origin the sticker is served from
        #[arg(long = "origin", env = "STICKERKIT_ORIGIN")]
        origin: Option<String>,

        /// Directory for the download fallback (defaults to the user's downloads)
        #[arg(long = "downloads-dir")]
        downloads_dir: Option<PathBuf>,

        /// Never put image bytes on the clipboard
        #[arg(long = "no-image", action = ArgAction::SetTrue)]
        no_image: bool,

        /// Print the result as JSON
        #[arg(long = "json", action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Download Twemoji SVGs for every emoji in the catalog
    FetchTwemoji {
        /// Twemoji release
        #[arg(long = "twemoji-version", env = "TWEMOJI_VERSION", default_value = DEFAULT_TWEMOJI_VERSION)]
        version: String,

        /// Asset base URL (overrides --version)
        #[arg(long = "base-url", env = "TWEMOJI_BASE_URL")]
        base_url: Option<String>,

        /// Output directory
        #[arg(long = "out", default_value = DEFAULT_TWEMOJI_DIR)]
        out: PathBuf,

        /// Re-download glyphs that already exist
        #[arg(long = "force", action = ArgAction::SetTrue)]
        force: bool,
    },
    /// List catalog stickers
    List {
        /// Sticker type: all, normal, hug
        #[arg(long = "type", value_enum, default_value_t = StickerType::All)]
        kind: StickerType,

        /// Only stickers whose alt text, tags or emoji match
        #[arg(long = "search")]
        search: Option<String>,

        /// Group the output by mood
        #[arg(long = "by-mood", action = ArgAction::SetTrue)]
        by_mood: bool,
    },
    /// Reconcile the catalog with a sticker image directory
    Scan {
        dir: PathBuf,

        /// Save the reconciled catalog
        #[arg(long = "write", action = ArgAction::SetTrue)]
        write: bool,
    },
}

/// Run the stickerkit CLI.
///
/// Parses arguments, installs the tracing subscriber and dispatches to the
/// module functions on a tokio runtime. Errors are printed to stderr.
///
/// Behavior summary:
/// - `codepoint`: resolve emoji to Twemoji keys.
/// - `copy`: run the copy chain against the system clipboard; exits non-zero
///   only when even the download fallback failed.
/// - `fetch-twemoji`: mirror glyphs; exits non-zero when any glyph failed.
/// - `list` / `scan`: inspect and maintain the catalog.
///
/// ```no_run
/// fn main() -> std::process::ExitCode {
///     stickerkit_lib::run()
/// }
/// ```
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(dispatch(cli)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Codepoint { emoji, base_path } => {
            for item in &emoji {
                let key = emoji_to_code_point(item);
                if key.is_empty() {
                    println!("{}\t(no glyph)", item);
                } else {
                    println!("{}\t{}\t{}", item, key, twemoji_src_with_base(item, &base_path));
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Copy {
            image_url,
            filename,
            origin,
            downloads_dir,
            no_image,
            json,
        } => {
            let cfg = CopyConfig::resolve(origin.as_deref(), downloads_dir, !no_image)?;
            let filename = filename.unwrap_or_else(|| default_filename(&image_url));

            let env = detect_environment(cfg.origin.clone(), SystemClipboard::probe(), cfg.allow_image);
            let fetcher = HttpFetcher::new();
            let clipboard = SystemClipboard::new();
            let downloader = FileDownloader::new(&cfg.downloads_dir, cfg.origin.clone());
            let ports = CopyPorts {
                fetcher: &fetcher,
                clipboard: &clipboard,
                downloader: &downloader,
            };

            let result = copy_sticker(&env, &ports, &image_url, &filename).await;
            if json {
                println!("{}", serde_json::to_string(&result)?);
            } else {
                println!("{}", result.message);
            }
            Ok(if result.method == CopyMethod::Error {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::FetchTwemoji {
            version,
            base_url,
            out,
            force,
        } => {
            let cfg = TwemojiConfig::resolve(&version, base_url, out, force);
            let catalog = load_catalog(&cli.catalog)?;
            let source = HttpGlyphSource::new(&cfg.base_url);
            let summary = fetch_twemoji(&catalog.emoji_set(), &source, &cfg.out_dir, cfg.force).await?;
            println!(
                "done: downloaded {}, skipped {}, failed {}",
                summary.downloaded, summary.skipped, summary.failed
            );
            Ok(if summary.failed > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::List {
            kind,
            search,
            by_mood,
        } => {
            let catalog = load_catalog(&cli.catalog)?;
            let counts = catalog
                .filter_counts()
                .iter()
                .map(|(k, n)| format!("{:?}={}", k, n).to_lowercase())
                .collect::<Vec<_>>()
                .join(" ");
            println!("{}", counts);

            let matching = Catalog::new(
                catalog
                    .search(search.as_deref().unwrap_or(""))
                    .into_iter()
                    .filter(|s| kind.accepts(s))
                    .cloned()
                    .collect(),
            );
            if by_mood {
                for (mood, stickers) in matching.group_by_mood() {
                    println!("{:?}:", mood);
                    for s in stickers {
                        println!("  {}\t{}\t{}", s.id, s.emoji.join(""), s.alt);
                    }
                }
            } else {
                for s in &matching.stickers {
                    println!("{}\t{}\t{}\t{}", s.id, s.file, s.emoji.join(""), s.alt);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Scan { dir, write } => {
            let catalog = if cli.catalog.exists() {
                load_catalog(&cli.catalog)?
            } else {
                Catalog::default()
            };
            let files = scan_sticker_dir(&dir)?;
            let (reconciled, pending) = catalog.reconcile(&files);
            println!("{} stickers, {} need metadata", files.len(), pending.len());
            for file in &pending {
                println!("  {}", file);
            }
            if write {
                reconciled.save(&cli.catalog)?;
                println!("wrote {}", cli.catalog.display());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_catalog(path: &Path) -> Result<Catalog> {
    Catalog::load(path).with_context(|| format!("loading catalog {}", path.display()))
}

/// Download name for a sticker URL: its last path segment without query or
/// fragment, `sticker.png` when there is none.
pub fn default_filename(image_url: &str) -> String {
    let path = image_url
        .split(['?', '#'])
        .next()
        .unwrap_or("");
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "sticker.png".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_from_url() {
        assert_eq!(default_filename("/stickers/3.png"), "3.png");
        assert_eq!(default_filename("https://x.example/s/7.png?v=2#top"), "7.png");
        assert_eq!(default_filename("https://x.example/s/"), "sticker.png");
        assert_eq!(default_filename(""), "sticker.png");
    }

    #[test]
    fn cli_parses_copy() {
        let cli = Cli::try_parse_from([
            "stickerkit",
            "copy",
            "/stickers/1.png",
            "--origin",
            "https://stickers.example",
            "--no-image",
        ])
        .unwrap();
        match cli.command {
            Commands::Copy {
                image_url,
                origin,
                no_image,
                ..
            } => {
                assert_eq!(image_url, "/stickers/1.png");
                assert_eq!(origin.as_deref(), Some("https://stickers.example"));
                assert!(no_image);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn cli_parses_list_type() {
        let cli = Cli::try_parse_from(["stickerkit", "list", "--type", "hug"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::List {
                kind: StickerType::Hug,
                ..
            }
        ));
    }
}
