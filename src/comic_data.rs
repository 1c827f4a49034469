//! Template records for comic pages.
//!
//! Stage 2 of a comic build: each [`PageInfo`] becomes a [`ComicData`]
//! record carrying everything the `comic` template needs.
//!
//! | Field | Source |
//! |---|---|
//! | `comic_paths` | `your_content/<folder>comics/<page>/<image>` per image |
//! | `thumbnail_path` | `.../<page>/_thumbnail.jpg` |
//! | `escaped_alt_text` | HTML-escaped `Alt text` |
//! | `first_id` ... `last_id` | neighbouring page names |
//! | `archive_post_date` | post date in `[Archive] Date format` |
//! | `post_html` | before-text + `post.txt` + after-text, as markdown |
//! | `transcripts` | language → HTML |
//! | `_<key>` | every page info key, see [`naming::format_user_variable`] |
//! | `_on_comic_click` | page value or `[Comic Settings] On comic click`, lowercase |

use crate::config::{ComicInfo, ConfigError};
use crate::dates::{self, DateError};
use crate::naming;
use crate::transcripts::{self, TranscriptSettings};
use crate::types::{ComicContext, ComicData, PageInfo};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComicDataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Date error for page {page:?}: {source}")]
    Date {
        page: String,
        #[source]
        source: DateError,
    },
}

/// Names of the neighbouring pages, clamped at both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationIds {
    pub first_id: String,
    pub previous_id: String,
    pub current_id: String,
    pub next_id: String,
    pub last_id: String,
}

/// Navigation for `pages[index]`, or `None` when out of range.
pub fn navigation_ids(pages: &[PageInfo], index: usize) -> Option<NavigationIds> {
    let name = |i: usize| pages[i].page_name.clone();
    let last = pages.len().checked_sub(1)?;
    if index > last {
        return None;
    }
    Some(NavigationIds {
        first_id: name(0),
        previous_id: name(index.saturating_sub(1)),
        current_id: name(index),
        next_id: name((index + 1).min(last)),
        last_id: name(last),
    })
}

/// Settings read once per comic and applied to every page.
pub struct PageAssembler<'a> {
    ctx: &'a ComicContext<'a>,
    date_format: &'a str,
    archive_date_format: &'a str,
    on_comic_click: &'a str,
    transcripts: TranscriptSettings,
}

impl<'a> PageAssembler<'a> {
    pub fn new(ctx: &'a ComicContext<'a>) -> Result<Self, ComicDataError> {
        let info: &'a ComicInfo = ctx.info;
        Ok(Self {
            ctx,
            date_format: info.require("Comic Settings", "Date format")?,
            archive_date_format: info.require("Archive", "Date format")?,
            on_comic_click: info.get_or("Comic Settings", "On comic click", "Next comic"),
            transcripts: TranscriptSettings::from_comic_info(info)?,
        })
    }

    /// Build the record for one page, then offer it to the comic data hook.
    pub fn assemble(&self, page: &PageInfo, nav: NavigationIds) -> Result<ComicData, ComicDataError> {
        let ctx = self.ctx;
        let page_dir = ctx.page_web_dir(&page.page_name);
        tracing::debug!(page = %page.page_name, "Building page data");

        let date_error = |source| ComicDataError::Date {
            page: page.page_name.clone(),
            source,
        };
        let post_date = dates::parse_post_date(&page.post_date, self.date_format).map_err(date_error)?;
        let archive_post_date =
            dates::format_date(&post_date, self.archive_date_format).map_err(date_error)?;

        let transcripts = transcripts::load_transcripts(
            ctx.root,
            &ctx.comics_dir(),
            &self.transcripts,
            &page.page_name,
            ctx.markdown,
        )?;

        let mut data = ComicData::new();
        data.insert(
            "comic_paths",
            page.image_file_names
                .iter()
                .map(|f| format!("{page_dir}{f}"))
                .collect::<Vec<_>>(),
        );
        data.insert("thumbnail_path", format!("{page_dir}_thumbnail.jpg"));
        data.insert(
            "escaped_alt_text",
            naming::escape_html(page.get("Alt text").unwrap_or_default()),
        );
        data.insert("first_id", nav.first_id);
        data.insert("previous_id", nav.previous_id);
        data.insert("current_id", nav.current_id);
        data.insert("next_id", nav.next_id);
        data.insert("last_id", nav.last_id);
        data.insert("archive_post_date", archive_post_date);
        data.insert("post_html", self.post_html(&page.page_name)?);
        data.insert("transcripts", Value::Object(transcripts));

        for (key, value) in page.fields() {
            data.insert(naming::format_user_variable(&key), value);
        }
        let on_click = data
            .get_str("_on_comic_click")
            .unwrap_or(self.on_comic_click)
            .to_lowercase();
        data.insert("_on_comic_click", on_click);

        Ok(ctx
            .hooks
            .extra_comic_dict_processing(ctx.folder, ctx.info, &data)
            .unwrap_or(data))
    }

    /// Shared before/after text around the page's own `post.txt`, as HTML.
    fn post_html(&self, page_name: &str) -> std::io::Result<String> {
        let content = self.ctx.content_dir();
        let sources: [PathBuf; 5] = [
            content.join("before post text.txt"),
            content.join("before post text.html"),
            self.ctx.comics_dir().join(page_name).join("post.txt"),
            content.join("after post text.txt"),
            content.join("after post text.html"),
        ];
        let mut parts = Vec::new();
        for path in sources.iter().filter(|p| p.is_file()) {
            parts.push(read_text(path)?);
        }
        Ok(self.ctx.markdown.render(&parts.join("\n\n")))
    }
}

fn read_text(path: &Path) -> std::io::Result<String> {
    std::fs::read_to_string(path)
}

/// Records for every page, in page order.
pub fn build_comic_data(
    ctx: &ComicContext,
    pages: &[PageInfo],
) -> Result<Vec<ComicData>, ComicDataError> {
    let assembler = PageAssembler::new(ctx)?;
    pages
        .iter()
        .enumerate()
        .filter_map(|(i, page)| navigation_ids(pages, i).map(|nav| (page, nav)))
        .map(|(page, nav)| assembler.assemble(page, nav))
        .collect()
}
