//! Page discovery.
//!
//! Stage 1 of a comic build. Walks `your_content/<folder>comics/`, reads each
//! page directory's `info.ini`, and produces the ordered list of published
//! pages.
//!
//! ## Page Directory
//!
//! ```text
//! comics/
//! ├── Page 1/
//! │   ├── info.ini          # Post date (required), Title, Alt text, Storyline,
//! │   │                     # Characters, Tags, Filenames, custom keys
//! │   ├── page_1.png        # Picked up automatically when Filenames is unset
//! │   ├── _thumbnail.jpg    # Generated; `_` files are never comic images
//! │   ├── post.txt          # Post body
//! │   └── English.txt       # Transcript
//! └── Page 2/
//!     └── ...
//! ```
//!
//! ## Rules
//!
//! - A directory without `info.ini` is skipped with a warning.
//! - `Post date` is parsed with `[Comic Settings] Date format` and compared to
//!   "now" in `[Comic Settings] Timezone`. Future pages are counted as
//!   scheduled and left out unless publishing everything.
//! - Keys starting with `!` are private notes and are dropped.
//! - Pages are ordered by (post date, page name).

use crate::config::{self, ConfigError};
use crate::dates::{self, DateError};
use crate::naming;
use crate::transcripts::{self, TranscriptSettings};
use crate::types::{ComicContext, PageInfo};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Date(#[from] DateError),
    #[error("{0} has no \"Post date\"")]
    MissingPostDate(PathBuf),
    #[error("Bad post date for page {page:?}: {source}")]
    InvalidPostDate {
        page: String,
        #[source]
        source: DateError,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Keys the scanner owns; an `info.ini` cannot override them.
const RESERVED_KEYS: &[&str] = &[
    "page_name",
    "Post date",
    "image_file_names",
    "Storyline",
    "Characters",
    "Tags",
    "transcript_languages",
];

#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    /// Remove the directories of scheduled pages.
    pub delete_scheduled_posts: bool,
    /// Treat scheduled pages as published.
    pub publish_all_comics: bool,
    pub now: DateTime<Utc>,
}

impl ScanOptions {
    pub fn new(delete_scheduled_posts: bool, publish_all_comics: bool) -> Self {
        Self {
            delete_scheduled_posts,
            publish_all_comics,
            now: Utc::now(),
        }
    }
}

/// Published pages plus the number held back for later.
///
/// Serialized as-is to `<folder>comic/page_info_list.json`.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub page_info_list: Vec<PageInfo>,
    pub scheduled_post_count: usize,
}

pub fn scan(ctx: &ComicContext, options: &ScanOptions) -> Result<ScanResult, ScanError> {
    let date_format = ctx.info.require("Comic Settings", "Date format")?;
    let tz = dates::parse_timezone(ctx.info.require("Comic Settings", "Timezone")?)?;
    let transcript_settings = TranscriptSettings::from_comic_info(ctx.info)?;
    tracing::debug!(now = %options.now.with_timezone(&tz), "Comic local time");

    let comics_dir = ctx.comics_dir();
    let mut page_dirs: Vec<PathBuf> = match fs::read_dir(&comics_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_dir() && !is_hidden(p))
            .collect(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(dir = %comics_dir.display(), "No comics directory");
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };
    page_dirs.sort();

    let mut pages = Vec::new();
    let mut scheduled_post_count = 0;

    for page_dir in page_dirs {
        let info_path = page_dir.join("info.ini");
        if !info_path.is_file() {
            tracing::warn!(page = %page_dir.display(), "Missing info.ini, skipping");
            continue;
        }
        let page_name = dir_name(&page_dir);
        let mut fields: Map<String, Value> = config::read_page_info(&info_path)?
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();

        let raw_date = fields
            .get("Post date")
            .and_then(Value::as_str)
            .ok_or_else(|| ScanError::MissingPostDate(info_path.clone()))?
            .to_string();
        let post_date = parse_date(&page_name, &raw_date, date_format)?;

        if !options.publish_all_comics && dates::is_scheduled(&post_date, tz, options.now) {
            scheduled_post_count += 1;
            if options.delete_scheduled_posts {
                tracing::warn!(page = %page_dir.display(), "Deleting scheduled page");
                fs::remove_dir_all(&page_dir)?;
            }
            continue;
        }

        let text_field = |fields: &Map<String, Value>, key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let storyline = text_field(&fields, "Storyline");
        let characters = config::str_to_list(&text_field(&fields, "Characters"), ',');
        let tags = config::str_to_list(&text_field(&fields, "Tags"), ',');
        let image_file_names = image_file_names(&fields, &page_dir)?;

        fields.retain(|key, _| !key.starts_with('!') && !RESERVED_KEYS.contains(&key.as_str()));

        let transcript_languages = transcripts::load_transcripts(
            ctx.root,
            &comics_dir,
            &transcript_settings,
            &page_name,
            ctx.markdown,
        )?
        .keys()
        .cloned()
        .collect();

        let mut page = PageInfo {
            page_name,
            post_date: raw_date,
            image_file_names,
            storyline,
            characters,
            tags,
            transcript_languages,
            extra: fields,
        };
        if let Some(replacement) =
            ctx.hooks
                .extra_page_info_processing(ctx.folder, ctx.info, &page_dir, &page)
        {
            page = replacement;
        }
        tracing::debug!(page = %page.page_name, images = ?page.image_file_names, "Found page");
        pages.push(page);
    }

    // Hooks may rewrite dates, so sort on the final values.
    let mut keyed = pages
        .into_iter()
        .map(|page| Ok((parse_date(&page.page_name, &page.post_date, date_format)?, page)))
        .collect::<Result<Vec<_>, ScanError>>()?;
    keyed.sort_by(|(a_date, a), (b_date, b)| {
        a_date.cmp(b_date).then_with(|| a.page_name.cmp(&b.page_name))
    });

    Ok(ScanResult {
        page_info_list: keyed.into_iter().map(|(_, page)| page).collect(),
        scheduled_post_count,
    })
}

/// Write `<folder>comic/page_info_list.json` under the output root.
pub fn save_page_info_json(output_dir: &Path, result: &ScanResult) -> Result<PathBuf, ScanError> {
    let dir = output_dir.join("comic");
    fs::create_dir_all(&dir)?;
    let path = dir.join("page_info_list.json");
    fs::write(&path, serde_json::to_string(result)?)?;
    Ok(path)
}

fn parse_date(
    page_name: &str,
    value: &str,
    format: &str,
) -> Result<chrono::NaiveDateTime, ScanError> {
    dates::parse_post_date(value, format).map_err(|source| ScanError::InvalidPostDate {
        page: page_name.to_string(),
        source,
    })
}

/// `Filenames` (or `Filename`) when set, otherwise the directory's images.
fn image_file_names(fields: &Map<String, Value>, page_dir: &Path) -> std::io::Result<Vec<String>> {
    let listed = ["Filenames", "Filename"]
        .iter()
        .filter_map(|key| fields.get(*key).and_then(Value::as_str))
        .find(|v| !v.trim().is_empty());
    if let Some(listed) = listed {
        return Ok(config::str_to_list(listed, ','));
    }

    let mut names: Vec<String> = fs::read_dir(page_dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .filter(|name| naming::is_comic_image(name))
        .collect();
    names.sort();
    Ok(names)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}
