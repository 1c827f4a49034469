//! Shared test utilities for the panelgen test suite.
//!
//! [`TestProject`] lays out a small but complete comic in a temp directory:
//!
//! ```text
//! your_content/
//! ├── comic_info.ini
//! ├── home page.txt
//! ├── after post text.txt
//! ├── comics/
//! │   ├── Page 1/      January 1, 2020  Chapter 1, Alice + Bob, transcript
//! │   ├── Page 2/      January 2, 2020  Chapter 1, Filenames listed
//! │   ├── Page 3/      January 3, 2020  no storyline, On comic click set
//! │   └── Future Page/ January 1, 2999  scheduled
//! ├── themes/default/pages/about.md
//! └── side_story/
//!     ├── comic_info.ini
//!     └── comics/Side 1/
//! ```
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let project = TestProject::new();
//! let ctx = project.context("", &NoHooks);
//! let pages = project.scan_pages(&ctx);
//! assert_eq!(pages[0].page_name, "Page 1");
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::comic_data;
use crate::config::{CONTENT_DIR, ComicInfo};
use crate::hooks::Hooks;
use crate::markdown::Markdown;
use crate::scan::{self, ScanOptions, ScanResult};
use crate::types::{ComicContext, ComicData, PageInfo};
use chrono::{TimeZone, Utc};

pub const COMIC_INFO: &str = "\
[Comic Info]
Comic name = Test Comic
Author = Jane Doe
Description = A comic about testing.

[Comic Settings]
Comic domain = testcomic.example
Comic subdirectory =
Banner image = /your_content/images/banner.png
Date format = %B %d, %Y
Timezone = UTC
Theme = default
On comic click = Next comic
Extra comics = side_story

[Archive]
Date format = %b %d, %Y
Show Uncategorized comics = True

[Pages]
index =
archive = Archive
tagged =
latest =
404 = Page Not Found
about = About

[Links Bar]
Archive = /archive/
Patreon = https://patreon.example/test

[Transcripts]
Enable transcripts = True
Default language = English

[RSS Feed]
Build RSS feed = True
Language = en
Description = Test comic feed
Newest first = False

[Image Reprocessing]
Create thumbnails = True
Overwrite existing images = False
Thumbnail size = 50%
";

const SIDE_STORY_INFO: &str = "\
[Comic Info]
Comic name = Side Story
";

/// A throwaway project directory with the settings already loaded.
pub struct TestProject {
    dir: TempDir,
    pub info: ComicInfo,
    pub markdown: Markdown,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let project = Self {
            dir,
            info: ComicInfo::parse(COMIC_INFO, Path::new("comic_info.ini")).unwrap(),
            markdown: Markdown::for_posts(),
        };
        project.write_file("comic_info.ini", COMIC_INFO);
        project.write_file("home page.txt", "Welcome to **Test Comic**.");
        project.write_file("after post text.txt", "Thanks for reading!");
        project.write_file(
            "themes/default/pages/about.md",
            "title: About\n\n# About\n\nMade for tests.",
        );

        project.write_page(
            "Page 1",
            "Post date = January 1, 2020\n\
             Title = First Page\n\
             Alt text = Hello \"world\"\n\
             Storyline = Chapter 1\n\
             Characters = Alice, Bob\n\
             Tags = intro\n\
             This Page is Full of Spiders!!1 = yes\n\
             !Note = remember to redraw the hands\n",
            &["page_1.png"],
        );
        project.write_file("comics/Page 1/post.txt", "Welcome to the *first* page.");
        project.write_file("comics/Page 1/English.txt", "ALICE: Hi!");
        project.write_file("comics/Page 1/layers.psd", "not a comic image");
        write_test_image(&project.comics_dir().join("Page 1/_thumbnail.jpg"), 100, 50);

        project.write_page(
            "Page 2",
            "Post date = January 2, 2020\n\
             Title = Second Page\n\
             Storyline = Chapter 1\n\
             Characters = Alice\n\
             Filenames = page_2b.png, page_2a.png\n",
            &["page_2a.png", "page_2b.png"],
        );
        project.write_page(
            "Page 3",
            "Post date = January 3, 2020\n\
             Title = Third Page\n\
             Tags = finale\n\
             On comic click = Open Image\n",
            &["page_3.png"],
        );
        project.write_page(
            "Future Page",
            "Post date = January 1, 2999\nTitle = Not Yet\n",
            &["future.png"],
        );

        project.write_file("side_story/comic_info.ini", SIDE_STORY_INFO);
        let side_page = project.content_dir().join("side_story/comics/Side 1");
        write(&side_page.join("info.ini"), "Post date = March 1, 2021\nTitle = Side One\n");
        write_test_image(&side_page.join("side_1.png"), 40, 20);

        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn content_dir(&self) -> PathBuf {
        self.root().join(CONTENT_DIR)
    }

    pub fn comics_dir(&self) -> PathBuf {
        self.content_dir().join("comics")
    }

    pub fn context<'a>(&'a self, folder: &'a str, hooks: &'a dyn Hooks) -> ComicContext<'a> {
        ComicContext {
            root: self.root(),
            folder,
            info: &self.info,
            markdown: &self.markdown,
            hooks,
        }
    }

    /// Write a file relative to `your_content/`.
    pub fn write_file(&self, relative: &str, contents: &str) {
        write(&self.content_dir().join(relative), contents);
    }

    /// Create a page directory with an `info.ini` and 200x100 PNGs.
    pub fn write_page(&self, name: &str, info_text: &str, images: &[&str]) {
        let page_dir = self.comics_dir().join(name);
        write(&page_dir.join("info.ini"), info_text);
        for image in images {
            write_test_image(&page_dir.join(image), 200, 100);
        }
    }

    /// Replace text in `comic_info.ini` on disk and reload the settings.
    pub fn edit_config(&mut self, from: &str, to: &str) {
        let path = self.content_dir().join("comic_info.ini");
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains(from), "comic_info.ini has no {from:?}");
        let text = text.replacen(from, to, 1);
        std::fs::write(&path, &text).unwrap();
        self.info = ComicInfo::parse(&text, &path).unwrap();
    }

    pub fn scan(&self, ctx: &ComicContext) -> ScanResult {
        scan::scan(ctx, &fixed_scan_options()).unwrap()
    }

    pub fn scan_pages(&self, ctx: &ComicContext) -> Vec<PageInfo> {
        self.scan(ctx).page_info_list
    }

    pub fn comic_data(&self, ctx: &ComicContext) -> Vec<ComicData> {
        let pages = self.scan_pages(ctx);
        comic_data::build_comic_data(ctx, &pages).unwrap()
    }
}

/// Scan options with "now" pinned to 2024-06-01 UTC.
pub fn fixed_scan_options() -> ScanOptions {
    ScanOptions {
        delete_scheduled_posts: false,
        publish_all_comics: false,
        now: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
    }
}

fn write(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

/// Write a solid-color image; the format follows the extension.
pub fn write_test_image(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 60, 60]));
    img.save(path).unwrap();
}

/// Write a PNG with a transparent left half.
pub fn write_test_rgba_image(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = image::RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            image::Rgba([0, 0, 0, 0])
        } else {
            image::Rgba([0, 0, 255, 255])
        }
    });
    img.save(path).unwrap();
}

// =========================================================================
// Lookups: panic with the available names on a miss
// =========================================================================

pub fn page_names(result: &ScanResult) -> Vec<&str> {
    result
        .page_info_list
        .iter()
        .map(|p| p.page_name.as_str())
        .collect()
}

pub fn find_page_info<'a>(result: &'a ScanResult, name: &str) -> &'a PageInfo {
    result
        .page_info_list
        .iter()
        .find(|p| p.page_name == name)
        .unwrap_or_else(|| panic!("page '{name}' not found. Available: {:?}", page_names(result)))
}

pub fn find_comic<'a>(data: &'a [ComicData], name: &str) -> &'a ComicData {
    data.iter().find(|d| d.page_name() == name).unwrap_or_else(|| {
        let names: Vec<&str> = data.iter().map(ComicData::page_name).collect();
        panic!("comic page '{name}' not found. Available: {names:?}")
    })
}
