//! Per-page transcripts, keyed by language.
//!
//! A transcript is a text file named after its language, e.g.
//! `your_content/comics/Page 1/English.txt` or `Español.md`. Files are read
//! from the page directory and, when `[Transcripts] Transcripts folder` is
//! set, from `<folder>/<page name>/`. Within a folder `.txt` files are read
//! before `.md` files, so a markdown transcript replaces a plain one for the
//! same language. `post.txt` is the post body, never a transcript.

use crate::config::{ComicInfo, ConfigError};
use crate::markdown::Markdown;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Language → rendered HTML, default language first.
pub type Transcripts = Map<String, Value>;

/// The `[Transcripts]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSettings {
    pub enabled: bool,
    pub from_comic_folder: bool,
    pub folder: Option<PathBuf>,
    pub default_language: String,
}

impl TranscriptSettings {
    pub fn from_comic_info(info: &ComicInfo) -> Result<Self, ConfigError> {
        const SECTION: &str = "Transcripts";
        Ok(Self {
            enabled: info.get_bool(SECTION, "Enable transcripts", false)?,
            from_comic_folder: info.get_bool(SECTION, "Load transcripts from comic folder", true)?,
            folder: info
                .get(SECTION, "Transcripts folder")
                .filter(|f| !f.trim().is_empty())
                .map(PathBuf::from),
            default_language: info
                .get_or(SECTION, "Default language", "English")
                .to_string(),
        })
    }
}

/// Load every transcript for one page.
///
/// `comics_dir` is the comic's `your_content/<folder>comics` directory;
/// relative transcript folders resolve against `root`.
pub fn load_transcripts(
    root: &Path,
    comics_dir: &Path,
    settings: &TranscriptSettings,
    page_name: &str,
    markdown: &Markdown,
) -> std::io::Result<Transcripts> {
    let mut transcripts = Map::new();
    if !settings.enabled {
        return Ok(transcripts);
    }
    if settings.from_comic_folder {
        load_from_folder(&comics_dir.join(page_name), markdown, &mut transcripts)?;
    }
    if let Some(folder) = &settings.folder {
        load_from_folder(&root.join(folder).join(page_name), markdown, &mut transcripts)?;
    }

    match transcripts.shift_remove(&settings.default_language) {
        Some(default) => {
            let mut ordered = Map::new();
            ordered.insert(settings.default_language.clone(), default);
            ordered.extend(transcripts);
            Ok(ordered)
        }
        None => Ok(transcripts),
    }
}

fn load_from_folder(dir: &Path, markdown: &Markdown, into: &mut Transcripts) -> std::io::Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    for ext in ["txt", "md"] {
        for path in files.iter().filter(|p| has_extension(p, ext)) {
            if path.file_name().is_some_and(|n| n == "post.txt") {
                continue;
            }
            let Some(language) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let text = decode(std::fs::read(path)?);
            into.insert(language.to_string(), Value::String(markdown.render(&text)));
        }
    }
    Ok(())
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e == ext)
}

/// UTF-8, falling back to Latin-1 for legacy files.
fn decode(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|e| e.into_bytes().iter().map(|&b| char::from(b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn enabled() -> TranscriptSettings {
        TranscriptSettings {
            enabled: true,
            from_comic_folder: true,
            folder: None,
            default_language: "English".to_string(),
        }
    }

    fn write(path: &Path, contents: &[u8]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn languages(t: &Transcripts) -> Vec<&str> {
        t.keys().map(String::as_str).collect()
    }

    #[test]
    fn disabled_loads_nothing() {
        let tmp = TempDir::new().unwrap();
        let comics = tmp.path().join("comics");
        write(&comics.join("Page 1/English.txt"), b"hi");
        let settings = TranscriptSettings {
            enabled: false,
            ..enabled()
        };
        let t = load_transcripts(tmp.path(), &comics, &settings, "Page 1", &Markdown::for_posts())
            .unwrap();
        assert!(t.is_empty());
    }

    #[test]
    fn default_language_first_and_post_skipped() {
        let tmp = TempDir::new().unwrap();
        let comics = tmp.path().join("comics");
        write(&comics.join("Page 1/Deutsch.txt"), b"Hallo");
        write(&comics.join("Page 1/English.txt"), b"Hello");
        write(&comics.join("Page 1/post.txt"), b"Not a transcript");

        let t = load_transcripts(tmp.path(), &comics, &enabled(), "Page 1", &Markdown::for_posts())
            .unwrap();
        assert_eq!(languages(&t), vec!["English", "Deutsch"]);
        assert_eq!(t["English"], "<p>Hello</p>\n");
    }

    #[test]
    fn markdown_overrides_text_for_same_language() {
        let tmp = TempDir::new().unwrap();
        let comics = tmp.path().join("comics");
        write(&comics.join("Page 1/English.txt"), b"plain");
        write(&comics.join("Page 1/English.md"), b"**bold**");

        let t = load_transcripts(tmp.path(), &comics, &enabled(), "Page 1", &Markdown::for_posts())
            .unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t["English"], "<p><strong>bold</strong></p>\n");
    }

    #[test]
    fn transcripts_folder_adds_to_comic_folder() {
        let tmp = TempDir::new().unwrap();
        let comics = tmp.path().join("comics");
        write(&comics.join("Page 1/English.txt"), b"from page");
        write(&tmp.path().join("transcripts/Page 1/Français.txt"), b"bonjour");
        write(&tmp.path().join("transcripts/Page 1/English.txt"), b"from folder");

        let settings = TranscriptSettings {
            folder: Some(PathBuf::from("transcripts")),
            ..enabled()
        };
        let t = load_transcripts(tmp.path(), &comics, &settings, "Page 1", &Markdown::for_posts())
            .unwrap();
        assert_eq!(languages(&t), vec!["English", "Français"]);
        assert_eq!(t["English"], "<p>from folder</p>\n");
    }

    #[test]
    fn latin1_files_are_decoded() {
        let tmp = TempDir::new().unwrap();
        let comics = tmp.path().join("comics");
        write(&comics.join("Page 1/English.txt"), b"caf\xe9");

        let t = load_transcripts(tmp.path(), &comics, &enabled(), "Page 1", &Markdown::for_posts())
            .unwrap();
        assert_eq!(t["English"], "<p>café</p>\n");
    }

    #[test]
    fn settings_defaults() {
        let info = ComicInfo::parse("[Transcripts]\nEnable transcripts = True\n", Path::new("x")).unwrap();
        let s = TranscriptSettings::from_comic_info(&info).unwrap();
        assert!(s.enabled);
        assert!(s.from_comic_folder);
        assert_eq!(s.folder, None);
        assert_eq!(s.default_language, "English");
    }
}
