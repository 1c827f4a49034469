//! CLI output formatting.
//!
//! Each report has a `format_*` function returning lines, so the output can
//! be tested without capturing stdout, and a `print_*` wrapper.
//!
//! # Build
//!
//! ```text
//! side_story/
//!     001 Side 1
//!     Scheduled: 0
//!     Thumbnails: 1 created, 0 kept
//!     HTML: 1 comic page, 0 other pages, 0 tag pages
//! Main comic
//!     001 Page 1
//!     002 Page 2
//!     Scheduled: 1
//!     Thumbnails: 1 created, 1 kept
//!     HTML: 2 comic pages, 5 other pages, 3 tag pages
//!     Failed tag page: tagged/Bob/index.html
//! Feed: https://example.com/feed.xml
//! ```
//!
//! # Timings
//!
//! ```text
//! Get comic settings: 0.42 ms
//! Write HTML files for '': 31.07 ms
//! Total time: 31.49 ms
//! ```

use crate::site::{ComicBuild, SiteReport, Timings};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn millis(duration: Duration) -> String {
    format!("{:.2} ms", duration.as_secs_f64() * 1000.0)
}

fn comic_heading(folder: &str) -> String {
    if folder.is_empty() {
        "Main comic".to_string()
    } else {
        folder.to_string()
    }
}

pub fn format_comic_build(build: &ComicBuild) -> Vec<String> {
    let mut lines = vec![comic_heading(&build.folder)];
    for (i, page) in build.scan.page_info_list.iter().enumerate() {
        lines.push(format!("{}{} {}", indent(1), format_index(i + 1), page.page_name));
    }
    lines.push(format!("{}Scheduled: {}", indent(1), build.scan.scheduled_post_count));
    if !build.thumbnails.thumbnails.is_empty() {
        lines.push(format!(
            "{}Thumbnails: {} created, {} kept",
            indent(1),
            build.thumbnails.created(),
            build.thumbnails.skipped()
        ));
    }
    for page in &build.thumbnails.pages_without_images {
        lines.push(format!("{}No image: {page}", indent(1)));
    }
    lines.push(format!(
        "{}HTML: {}, {}, {}",
        indent(1),
        plural(build.pages.comic_pages, "comic page"),
        plural(build.pages.other_pages.len(), "other page"),
        plural(build.pages.tag_pages, "tag page"),
    ));
    for failed in &build.pages.failed_tag_pages {
        lines.push(format!("{}Failed tag page: {failed}", indent(1)));
    }
    lines
}

pub fn format_build_output(report: &SiteReport) -> Vec<String> {
    let mut lines: Vec<String> = report.comics.iter().flat_map(format_comic_build).collect();
    if report.feed.is_some() {
        lines.push(format!("Feed: {}/feed.xml", report.site_url.comic_url));
    }
    lines
}

pub fn print_build_output(report: &SiteReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}

pub fn format_timings(timings: &Timings) -> Vec<String> {
    let mut lines: Vec<String> = timings
        .steps()
        .into_iter()
        .map(|(label, elapsed)| format!("{label}: {}", millis(elapsed)))
        .collect();
    lines.push(format!("Total time: {}", millis(timings.total())));
    lines
}

pub fn print_timings(timings: &Timings) {
    println!();
    for line in format_timings(timings) {
        println!("{}", line);
    }
}

/// Removed paths, relative to the project root.
pub fn format_clean_output(root: &Path, removed: &[PathBuf]) -> Vec<String> {
    if removed.is_empty() {
        return vec!["Nothing to clean".to_string()];
    }
    removed
        .iter()
        .map(|path| {
            let shown = path.strip_prefix(root).unwrap_or(path);
            format!("Removed {}", shown.display())
        })
        .collect()
}

pub fn print_clean_output(root: &Path, removed: &[PathBuf]) {
    for line in format_clean_output(root, removed) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::WriteSummary;
    use crate::hooks::NoHooks;
    use crate::imaging::ThumbnailOutcome;
    use crate::process::{ProcessResult, ProcessedThumbnail};
    use crate::scan::ScanResult;
    use crate::test_helpers::*;
    use serde_json::Map;

    fn comic_build(folder: &str) -> ComicBuild {
        let project = TestProject::new();
        let ctx = project.context("", &NoHooks);
        let scan = project.scan(&ctx);
        ComicBuild {
            folder: folder.to_string(),
            scan: ScanResult {
                page_info_list: scan.page_info_list[..2].to_vec(),
                scheduled_post_count: 1,
            },
            comic_data: Vec::new(),
            global_values: Map::new(),
            thumbnails: ProcessResult {
                thumbnails: vec![
                    ProcessedThumbnail {
                        page_name: "Page 1".into(),
                        path: PathBuf::from("a"),
                        outcome: ThumbnailOutcome::Skipped,
                    },
                    ProcessedThumbnail {
                        page_name: "Page 2".into(),
                        path: PathBuf::from("b"),
                        outcome: ThumbnailOutcome::Created { width: 100, height: 50 },
                    },
                ],
                pages_without_images: vec![],
            },
            pages: WriteSummary {
                comic_pages: 2,
                other_pages: vec!["index.html".into()],
                tag_pages: 3,
                failed_tag_pages: vec!["tagged/Bob/index.html".into()],
            },
        }
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "tag page"), "1 tag page");
        assert_eq!(plural(0, "tag page"), "0 tag pages");
    }

    #[test]
    fn comic_build_lines() {
        assert_eq!(
            format_comic_build(&comic_build("")),
            vec![
                "Main comic",
                "    001 Page 1",
                "    002 Page 2",
                "    Scheduled: 1",
                "    Thumbnails: 1 created, 1 kept",
                "    HTML: 2 comic pages, 1 other page, 3 tag pages",
                "    Failed tag page: tagged/Bob/index.html",
            ]
        );
    }

    #[test]
    fn extra_comic_heading_is_folder() {
        assert_eq!(format_comic_build(&comic_build("side_story/"))[0], "side_story/");
    }

    #[test]
    fn build_output_ends_with_feed() {
        let report = SiteReport {
            site_url: crate::config::SiteUrl {
                comic_url: "https://c.example/sub".into(),
                base_directory: "/sub".into(),
            },
            comics: vec![comic_build("")],
            feed: Some(PathBuf::from("feed.xml")),
            timings: Timings::start(),
        };
        let lines = format_build_output(&report);
        assert_eq!(lines.last().unwrap(), "Feed: https://c.example/sub/feed.xml");
    }

    #[test]
    fn timings_end_with_total() {
        let mut timings = Timings::start();
        timings.checkpoint("Scan");
        let lines = format_timings(&timings);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Scan: "));
        assert!(lines[0].ends_with(" ms"));
        assert!(lines[1].starts_with("Total time: "));
    }

    #[test]
    fn millis_two_decimals() {
        assert_eq!(millis(Duration::from_micros(1500)), "1.50 ms");
        assert_eq!(millis(Duration::ZERO), "0.00 ms");
    }

    #[test]
    fn clean_output_lines() {
        let root = Path::new("/site");
        assert_eq!(format_clean_output(root, &[]), vec!["Nothing to clean"]);
        assert_eq!(
            format_clean_output(root, &[root.join("feed.xml"), root.join("comic")]),
            vec!["Removed feed.xml", "Removed comic"]
        );
    }
}
