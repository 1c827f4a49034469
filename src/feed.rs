//! RSS 2.0 feed.
//!
//! Written to `feed.xml` at the project root when `[RSS Feed] Build RSS feed`
//! is on. One `<item>` per published page of the main comic:
//!
//! ```text
//! <item>
//!     <title>            _title (page name when missing)
//!     <dc:creator>       [Comic Info] Author
//!     <pubDate>          post date, RFC 822, always +0000
//!     <link>             <comic url>/comic/<page name>/
//!     <guid>             link lowercased, spaces and & replaced by _
//!     <category>*        storyline, characters, tags
//!     <description>      CDATA: one <p><img></p> per image, <hr>, post HTML
//! </item>
//! ```
//!
//! The XML writer escapes every text node, so descriptions are emitted as
//! `{post_id_<id>}` placeholders first and swapped for their CDATA sections
//! once the document is serialized.

use crate::config::{ComicInfo, ConfigError};
use crate::dates::{self, DateError};
use crate::naming;
use crate::types::ComicData;
use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("XML error: {0}")]
    Xml(String),
    #[error("Bad post date on {page}: {source}")]
    Date {
        page: String,
        #[source]
        source: DateError,
    },
}

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const PUB_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S +0000";
const INDENT: &str = "    ";

/// Channel-level `<image>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedImage {
    pub url: String,
    pub width: String,
    pub height: String,
}

/// Everything the feed reads from `comic_info.ini`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSettings {
    pub title: String,
    pub author: String,
    pub description: String,
    pub language: String,
    pub date_format: String,
    pub image: Option<FeedImage>,
    pub newest_first: bool,
}

impl FeedSettings {
    /// `None` when the feed is switched off.
    pub fn from_comic_info(info: &ComicInfo) -> Result<Option<Self>, FeedError> {
        if !info.get_bool("RSS Feed", "Build RSS feed", false)? {
            return Ok(None);
        }
        let image = match info.get("RSS Feed", "Image") {
            Some(url) if !url.is_empty() => Some(FeedImage {
                url: url.to_string(),
                width: info.get_or("RSS Feed", "Image width", "").to_string(),
                height: info.get_or("RSS Feed", "Image height", "").to_string(),
            }),
            _ => None,
        };
        Ok(Some(Self {
            title: info.require("Comic Info", "Comic name")?.to_string(),
            author: info.require("Comic Info", "Author")?.to_string(),
            description: info.get_or("RSS Feed", "Description", "").to_string(),
            language: info.get_or("RSS Feed", "Language", "").to_string(),
            date_format: info.require("Comic Settings", "Date format")?.to_string(),
            image,
            newest_first: info.get_bool("RSS Feed", "Newest first", false)?,
        }))
    }
}

/// Resolve `path` against `base` (which ends with `/`) the way a browser would.
///
/// Relative paths are appended, root-relative paths replace the base path,
/// and absolute URLs are kept. Nothing is re-encoded.
pub fn join_url(base: &str, path: &str) -> String {
    if path.contains("://") {
        return path.to_string();
    }
    if let Some(stripped) = path.strip_prefix('/') {
        let origin_end = base
            .find("://")
            .and_then(|scheme| base[scheme + 3..].find('/').map(|i| scheme + 3 + i))
            .unwrap_or(base.len());
        return format!("{}/{stripped}", &base[..origin_end]);
    }
    format!("{base}{path}")
}

/// Post body for a feed item: the images, a rule, then the post HTML.
pub fn rss_post_html(comic_url: &str, comic_paths: &[&str], alt_text: &str, post_html: &str) -> String {
    let alt = if alt_text.is_empty() {
        String::new()
    } else {
        format!(" alt_text=\"{}\"", alt_text.replace('"', "\\\""))
    };
    let images: Vec<String> = comic_paths
        .iter()
        .map(|path| format!("<p><img src=\"{}\"{alt}></p>", join_url(comic_url, path)))
        .collect();
    format!("{}\n\n<hr>\n\n{post_html}", images.join("\n"))
}

const TOKEN_PREFIX: &str = "{post_id_";

/// Placeholder token to CDATA section, for one serialization.
///
/// Tokens keep registration order; registering an id again replaces its
/// section in place.
#[derive(Debug, Default)]
pub struct CdataRegistry(Vec<(String, String)>);

impl CdataRegistry {
    /// Store `html` and return the placeholder to write in its place.
    pub fn register(&mut self, id: &str, html: &str) -> String {
        let token = format!("{TOKEN_PREFIX}{id}}}");
        let cdata = format!("<![CDATA[{html}]]>");
        match self.0.iter_mut().find(|(t, _)| *t == token) {
            Some(entry) => entry.1 = cdata,
            None => self.0.push((token.clone(), cdata)),
        }
        token
    }

    /// Replace every token in one left-to-right pass. Inserted sections are
    /// not scanned again, so a token quoted inside post HTML stays literal.
    pub fn substitute(&self, xml: &str) -> String {
        let mut out = String::with_capacity(xml.len());
        let mut rest = xml;
        while let Some(pos) = rest.find(TOKEN_PREFIX) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            match self.0.iter().find(|(token, _)| tail.starts_with(token.as_str())) {
                Some((token, cdata)) => {
                    out.push_str(cdata);
                    rest = &tail[token.len()..];
                }
                None => {
                    out.push_str(TOKEN_PREFIX);
                    rest = &tail[TOKEN_PREFIX.len()..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Indenting writer: every element starts on its own line.
struct FeedWriter {
    writer: Writer<Vec<u8>>,
    depth: usize,
}

fn xml_error(e: impl std::fmt::Display) -> FeedError {
    FeedError::Xml(e.to_string())
}

impl FeedWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new(b"<?xml version=\"1.0\" ?>".to_vec()),
            depth: 0,
        }
    }

    fn newline(&mut self) -> Result<(), FeedError> {
        let indent = INDENT.repeat(self.depth);
        write!(self.writer.get_mut(), "\n{indent}")?;
        Ok(())
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), FeedError> {
        self.writer.write_event(event).map_err(xml_error)
    }

    fn open(&mut self, start: BytesStart<'_>) -> Result<(), FeedError> {
        self.newline()?;
        self.event(Event::Start(start))?;
        self.depth += 1;
        Ok(())
    }

    fn close(&mut self, name: &str) -> Result<(), FeedError> {
        self.depth -= 1;
        self.newline()?;
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn element(&mut self, start: BytesStart<'_>, text: &str) -> Result<(), FeedError> {
        self.newline()?;
        if text.is_empty() {
            return self.event(Event::Empty(start));
        }
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        self.event(Event::Start(start))?;
        self.event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text(&mut self, name: &str, text: &str) -> Result<(), FeedError> {
        self.element(BytesStart::new(name), text)
    }

    fn finish(mut self) -> Result<String, FeedError> {
        self.writer.get_mut().push(b'\n');
        String::from_utf8(self.writer.into_inner()).map_err(xml_error)
    }
}

fn write_item(
    out: &mut FeedWriter,
    cdata: &mut CdataRegistry,
    settings: &FeedSettings,
    comic_url: &str,
    page: &ComicData,
) -> Result<(), FeedError> {
    let page_name = page.page_name();
    let post_date = page.get_str("_post_date").unwrap_or_default();
    let pub_date = dates::parse_post_date(post_date, &settings.date_format)
        .and_then(|dt| dates::format_date(&dt, PUB_DATE_FORMAT))
        .map_err(|source| FeedError::Date {
            page: page_name.to_string(),
            source,
        })?;
    let link = join_url(comic_url, &format!("comic/{page_name}/"));
    let guid = naming::post_id(&link);

    out.open(BytesStart::new("item"))?;
    out.text("title", page.get_str("_title").unwrap_or(page_name))?;
    out.text("dc:creator", &settings.author)?;
    out.text("pubDate", &pub_date)?;
    out.text("link", &link)?;
    out.element(
        BytesStart::new("guid").with_attributes([("isPermaLink", "true")]),
        &guid,
    )?;

    let categories = page
        .get_str("_storyline")
        .into_iter()
        .map(|s| ("storyline", s))
        .chain(page.get_str_list("_characters").into_iter().map(|c| ("character", c)))
        .chain(page.get_str_list("_tags").into_iter().map(|t| ("tag", t)));
    for (kind, name) in categories {
        out.element(BytesStart::new("category").with_attributes([("type", kind)]), name)?;
    }

    let html = rss_post_html(
        comic_url,
        &page.get_str_list("comic_paths"),
        page.get_str("escaped_alt_text").unwrap_or_default(),
        page.get_str("post_html").unwrap_or_default(),
    );
    let token = cdata.register(&naming::post_id(page_name), &html);
    out.text("description", &token)?;
    out.close("item")
}

/// Serialize the feed document.
///
/// `comic_url` is the published site URL, with or without a trailing slash.
pub fn build_feed(settings: &FeedSettings, comic_url: &str, comic_data: &[ComicData]) -> Result<String, FeedError> {
    let comic_url = format!("{}/", comic_url.trim_end_matches('/'));
    let mut cdata = CdataRegistry::default();
    let mut out = FeedWriter::new();

    out.open(BytesStart::new("rss").with_attributes([
        ("xmlns:atom", ATOM_NS),
        ("xmlns:dc", DC_NS),
        ("version", "2.0"),
    ]))?;
    out.open(BytesStart::new("channel"))?;
    let feed_url = join_url(&comic_url, "feed.xml");
    out.element(
        BytesStart::new("atom:link").with_attributes([
            ("href", feed_url.as_str()),
            ("rel", "self"),
            ("type", "application/rss+xml"),
        ]),
        "",
    )?;
    out.text("title", &settings.title)?;
    out.text("description", &settings.description)?;
    out.text("link", &comic_url)?;
    out.text("dc:creator", &settings.author)?;
    out.text("language", &settings.language)?;

    if let Some(image) = &settings.image {
        out.open(BytesStart::new("image"))?;
        out.text("title", &settings.title)?;
        out.text("link", &comic_url)?;
        out.text("url", &join_url(&comic_url, &image.url))?;
        out.text("width", &image.width)?;
        out.text("height", &image.height)?;
        out.close("image")?;
    }

    let mut pages: Vec<&ComicData> = comic_data.iter().collect();
    if settings.newest_first {
        pages.reverse();
    }
    for page in pages {
        write_item(&mut out, &mut cdata, settings, &comic_url, page)?;
    }

    out.close("channel")?;
    out.close("rss")?;
    Ok(cdata.substitute(&out.finish()?))
}

/// Write `feed.xml` under `root`. Returns `None` when the feed is switched off.
pub fn write_feed(
    root: &Path,
    info: &ComicInfo,
    comic_url: &str,
    comic_data: &[ComicData],
) -> Result<Option<PathBuf>, FeedError> {
    let Some(settings) = FeedSettings::from_comic_info(info)? else {
        tracing::debug!("RSS feed disabled");
        return Ok(None);
    };
    let xml = build_feed(&settings, comic_url, comic_data)?;
    let path = root.join("feed.xml");
    std::fs::write(&path, xml)?;
    tracing::info!(items = comic_data.len(), "Wrote feed.xml");
    Ok(Some(path))
}
