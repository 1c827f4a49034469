//! One full site build.
//!
//! ```text
//! comic_info.ini ─▶ comic URL ─▶ preprocess hook ─▶ clean old output
//!     │
//!     ├─▶ for each extra comic:  build_comic("<name>/")
//!     ├─▶ main comic:            build_comic("")
//!     └─▶ feed.xml ─▶ postprocess hook
//!
//! build_comic:
//!     scan ─▶ page_info_list.json ─▶ comic data ─▶ thumbnails
//!          ─▶ global values (+ hook) ─▶ HTML files
//! ```
//!
//! Extra comics are built first so the main comic's templates can show each
//! one's newest page through `extra_comics`.

use crate::comic_data::{self, ComicDataError};
use crate::config::{self, CONTENT_DIR, ComicInfo, ConfigError, SiteUrl, UrlSources};
use crate::feed::{self, FeedError};
use crate::generate::{self, GenerateError, WriteSummary};
use crate::hooks::{HookError, Hooks};
use crate::markdown::Markdown;
use crate::process::{self, ProcessError, ProcessResult};
use crate::scan::{self, ScanError, ScanOptions, ScanResult};
use crate::storylines;
use crate::types::{ComicContext, ComicData};
use serde_json::{Map, Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Comic data error: {0}")]
    ComicData(#[from] ComicDataError),
    #[error("Image processing error: {0}")]
    Process(#[from] ProcessError),
    #[error("Generate error: {0}")]
    Generate(#[from] GenerateError),
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),
    #[error("Hook error: {0}")]
    Hook(#[from] HookError),
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_BANNER: &str = "/your_content/images/banner.png";

// ============================================================================
// Timings
// ============================================================================

/// Named checkpoints through one build.
#[derive(Debug, Clone)]
pub struct Timings {
    checkpoints: Vec<(String, Instant)>,
}

impl Timings {
    pub fn start() -> Self {
        let mut timings = Self {
            checkpoints: Vec::new(),
        };
        timings.checkpoint("Start");
        timings
    }

    pub fn checkpoint(&mut self, label: impl Into<String>) {
        self.record(label, Instant::now());
    }

    fn record(&mut self, label: impl Into<String>, at: Instant) {
        self.checkpoints.push((label.into(), at));
    }

    /// Each checkpoint after the first, with the time since the one before.
    pub fn steps(&self) -> Vec<(&str, Duration)> {
        self.checkpoints
            .windows(2)
            .map(|pair| (pair[1].0.as_str(), pair[1].1.duration_since(pair[0].1)))
            .collect()
    }

    pub fn total(&self) -> Duration {
        match (self.checkpoints.first(), self.checkpoints.last()) {
            (Some((_, first)), Some((_, last))) => last.duration_since(*first),
            _ => Duration::ZERO,
        }
    }
}

// ============================================================================
// Output cleaning
// ============================================================================

/// Delete everything a previous build wrote. Returns the paths removed.
///
/// Page sources under `your_content/` are never touched.
pub fn clean_output(root: &Path, info: &ComicInfo) -> std::io::Result<Vec<PathBuf>> {
    let mut targets = vec![PathBuf::from("comic"), PathBuf::from("feed.xml")];
    for (template_name, _) in info.options("Pages") {
        targets.push(match template_name {
            "index" => PathBuf::from("index.html"),
            "404" => PathBuf::from("404.html"),
            name => PathBuf::from(name),
        });
    }
    targets.extend(info.extra_comics().into_iter().map(PathBuf::from));

    let mut removed = Vec::new();
    for target in targets {
        let unsafe_target = target.as_os_str().is_empty()
            || target.starts_with(CONTENT_DIR)
            || target.components().any(|c| !matches!(c, std::path::Component::Normal(_)));
        if unsafe_target {
            tracing::warn!(path = %target.display(), "Refusing to delete output path");
            continue;
        }
        let path = root.join(&target);
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else if path.is_file() {
            fs::remove_file(&path)?;
        } else {
            continue;
        }
        tracing::debug!(path = %target.display(), "Removed");
        removed.push(path);
    }
    Ok(removed)
}

// ============================================================================
// Global values
// ============================================================================

/// Values every template of one comic can use.
pub fn global_values(
    ctx: &ComicContext,
    site_url: &SiteUrl,
    comic_data: &[ComicData],
    scheduled_post_count: usize,
    extra_comics: &Map<String, Value>,
) -> Result<Map<String, Value>, SiteError> {
    let info = ctx.info;
    let base_dir = &site_url.base_directory;

    let home_page = ctx.content_dir().join("home page.txt");
    let home_page_text = if home_page.is_file() {
        ctx.markdown.render(&fs::read_to_string(&home_page)?)
    } else {
        String::new()
    };

    let links: Vec<Value> = info
        .options("Links Bar")
        .into_iter()
        .map(|(name, url)| json!({"name": name, "url": site_url.web_path(url)}))
        .collect();
    let storylines = storylines::get_storylines(info, comic_data, ctx.hooks)?;

    let values = json!({
        "version": VERSION,
        "comic_title": info.require("Comic Info", "Comic name")?,
        "comic_author": info.require("Comic Info", "Author")?,
        "comic_description": info.require("Comic Info", "Description")?,
        "banner_image": site_url.web_path(info.get_or("Comic Settings", "Banner image", DEFAULT_BANNER)),
        "theme": info.theme(),
        "comic_url": site_url.comic_url,
        "comic_folder": ctx.folder,
        "base_dir": base_dir,
        "comic_base_dir": format!("{base_dir}/{}", ctx.folder).trim_end_matches('/'),
        "content_base_dir": format!("{base_dir}/{CONTENT_DIR}/{}", ctx.folder).trim_end_matches('/'),
        "links": links,
        "use_images_in_navigation_bar": info.get_bool("Comic Settings", "Use images in navigation bar", false)?,
        "use_thumbnails": info.get_bool("Archive", "Use thumbnails", false)?,
        "storylines": storylines,
        "home_page_text": home_page_text,
        "google_analytics_id": info.get_or("Google Analytics", "Tracking ID", ""),
        "scheduled_post_count": scheduled_post_count,
        "extra_comics": extra_comics,
    });
    match values {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

// ============================================================================
// Builds
// ============================================================================

/// What one comic's build produced.
#[derive(Debug, Clone)]
pub struct ComicBuild {
    pub folder: String,
    pub scan: ScanResult,
    pub comic_data: Vec<ComicData>,
    pub global_values: Map<String, Value>,
    pub thumbnails: ProcessResult,
    pub pages: WriteSummary,
}

#[derive(Debug, Clone)]
pub struct SiteReport {
    pub site_url: SiteUrl,
    /// Extra comics in settings order, then the main comic.
    pub comics: Vec<ComicBuild>,
    pub feed: Option<PathBuf>,
    pub timings: Timings,
}

impl SiteReport {
    pub fn main_comic(&self) -> Option<&ComicBuild> {
        self.comics.last()
    }
}

/// Scan, assemble, and publish one comic.
pub fn build_comic(
    ctx: &ComicContext,
    site_url: &SiteUrl,
    options: &ScanOptions,
    extra_comics: &Map<String, Value>,
    timings: &mut Timings,
) -> Result<ComicBuild, SiteError> {
    let folder = ctx.folder;
    let scan = scan::scan(ctx, options)?;
    tracing::info!(
        comic = folder,
        pages = scan.page_info_list.len(),
        scheduled = scan.scheduled_post_count,
        "Scanned pages"
    );
    timings.checkpoint(format!("Get info for all pages in '{folder}'"));

    scan::save_page_info_json(&ctx.output_dir(), &scan)?;
    timings.checkpoint(format!("Save page_info_list.json file in '{folder}'"));

    let comic_data = comic_data::build_comic_data(ctx, &scan.page_info_list)?;
    timings.checkpoint(format!("Build full comic data dicts for '{folder}'"));

    let thumbnails = process::process_comic_images(ctx.root, ctx.info, &comic_data)?;
    timings.checkpoint(format!("Process comic images in '{folder}'"));

    let mut globals = global_values(
        ctx,
        site_url,
        &comic_data,
        scan.scheduled_post_count,
        extra_comics,
    )?;
    if let Some(extra) = ctx.hooks.extra_global_values(folder, ctx.info, &comic_data) {
        globals.extend(extra);
    }
    timings.checkpoint(format!("Run hook for extra global values in '{folder}'"));

    let pages = generate::write_html_files(ctx, &comic_data, &globals)?;
    timings.checkpoint(format!("Write HTML files for '{folder}'"));

    Ok(ComicBuild {
        folder: folder.to_string(),
        scan,
        comic_data,
        global_values: globals,
        thumbnails,
        pages,
    })
}

/// Settings for the extra comic in `your_content/<name>/`.
pub fn load_extra_comic_info(root: &Path, main: &ComicInfo, name: &str) -> Result<ComicInfo, ConfigError> {
    let path = root.join(CONTENT_DIR).join(name).join("comic_info.ini");
    let extra = if path.is_file() {
        ComicInfo::load(&path)?
    } else {
        tracing::warn!(comic = name, "Extra comic has no comic_info.ini");
        ComicInfo::default()
    };
    Ok(main.for_extra_comic(&extra))
}

/// Build the whole site under `root`.
pub fn build_site(root: &Path, hooks: &dyn Hooks, options: &ScanOptions) -> Result<SiteReport, SiteError> {
    let mut timings = Timings::start();

    let info = ComicInfo::load(&root.join(CONTENT_DIR).join("comic_info.ini"))?;
    let site_url = config::resolve_comic_url(&info, &UrlSources::from_environment(root))?;
    timings.checkpoint("Get comic settings");

    hooks.preprocess(&info)?;
    timings.checkpoint("Preprocessing hook");

    clean_output(root, &info)?;
    timings.checkpoint("Setup output file space");

    let markdown = Markdown::for_posts();
    let mut comics = Vec::new();
    let mut extra_comics = Map::new();
    for name in info.extra_comics() {
        tracing::info!(comic = %name, "Building extra comic");
        let folder = format!("{}/", name.trim_matches('/'));
        let extra_info = load_extra_comic_info(root, &info, &name)?;
        fs::create_dir_all(root.join(&folder))?;
        let ctx = ComicContext {
            root,
            folder: &folder,
            info: &extra_info,
            markdown: &markdown,
            hooks,
        };
        let build = build_comic(&ctx, &site_url, options, &Map::new(), &mut timings)?;
        let newest = build
            .comic_data
            .last()
            .map(|page| Value::Object(page.as_map().clone()))
            .unwrap_or_else(|| Value::Object(Map::new()));
        extra_comics.insert(name, newest);
        comics.push(build);
    }

    tracing::info!("Building main comic");
    let ctx = ComicContext {
        root,
        folder: "",
        info: &info,
        markdown: &markdown,
        hooks,
    };
    let main = build_comic(&ctx, &site_url, options, &extra_comics, &mut timings)?;

    let feed = feed::write_feed(root, &info, &site_url.comic_url, &main.comic_data)?;
    timings.checkpoint("Build RSS feed");

    hooks.postprocess(&info, &main.comic_data, &main.global_values)?;
    timings.checkpoint("Postprocessing hook");

    comics.push(main);
    Ok(SiteReport {
        site_url,
        comics,
        feed,
        timings,
    })
}
