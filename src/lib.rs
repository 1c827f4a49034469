//! # panelgen
//!
//! A static site generator for webcomics. Each page of the comic is a folder
//! with an `info.ini` and its images; the site is ordinary HTML next to those
//! folders, ready for GitHub Pages or any file server.
//!
//! ```text
//! your_content/
//! ├── comic_info.ini                 # site settings
//! ├── home page.txt                  # markdown for the home page
//! ├── comics/
//! │   └── Page 1/
//! │       ├── info.ini               # Post date, Title, Storyline, Tags, ...
//! │       ├── page_1.png
//! │       ├── post.txt               # blog post under the page
//! │       └── English.txt            # transcript
//! ├── themes/<theme>/templates/      # overrides for the built-in templates
//! └── side_story/                    # an extra comic, same layout
//! ```
//!
//! # Build Pipeline
//!
//! Every build runs the same stages for each comic, extra comics first:
//!
//! ```text
//! 1. Scan        comics/*/info.ini  →  PageInfo list     (scheduled pages held back)
//! 2. Assemble    PageInfo           →  ComicData records (navigation, post HTML, transcripts)
//! 3. Thumbnails  first image        →  _thumbnail.jpg
//! 4. Storylines  ComicData          →  archive groups
//! 5. Write       templates          →  comic/<page>/index.html, [Pages], tagged/<tag>/
//! 6. Feed        main comic         →  feed.xml
//! ```
//!
//! A [`hooks::Hooks`] implementation can adjust records or add pages at fixed
//! points in the pipeline.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `comic_info.ini` access, list parsing, comic URL resolution |
//! | [`scan`] | Stage 1: page folders → `PageInfo`, `page_info_list.json` |
//! | [`transcripts`] | Per-language transcript files → HTML |
//! | [`comic_data`] | Stage 2: template records with navigation ids |
//! | [`process`] | Stage 3: thumbnail settings and the per-page loop |
//! | [`imaging`] | Image backend: identify, resize, JPEG encode |
//! | [`storylines`] | Stage 4: archive grouping |
//! | [`generate`] | Stage 5: tera templates and page writers |
//! | [`feed`] | Stage 6: RSS 2.0 |
//! | [`site`] | Whole-site build, output cleaning, timings |
//! | [`serve`] | Dev server with rebuild on change |
//! | [`dates`], [`markdown`], [`naming`] | Shared conversions |
//! | [`types`] | Records passed between stages |
//! | [`output`], [`logging`] | CLI reporting |

pub mod comic_data;
pub mod config;
pub mod dates;
pub mod feed;
pub mod generate;
pub mod hooks;
pub mod imaging;
pub mod logging;
pub mod markdown;
pub mod naming;
pub mod output;
pub mod process;
pub mod scan;
pub mod serve;
pub mod site;
pub mod storylines;
pub mod transcripts;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
