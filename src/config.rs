//! Comic settings and page metadata loading.
//!
//! Every comic is configured by one ini file, `your_content/comic_info.ini`.
//! Each published page carries its own `info.ini` with plain `key = value`
//! lines and no section header.
//!
//! ## Layout
//!
//! ```text
//! your_content/
//! ├── comic_info.ini                 # Site-wide settings (sections below)
//! ├── home page.txt                  # Markdown shown on the home page
//! ├── before post text.txt           # Prepended to every post body
//! ├── comics/
//! │   └── Page 1/
//! │       ├── info.ini               # Post date, Title, Alt text, ...
//! │       ├── page_1.png
//! │       └── post.txt               # Post body (markdown)
//! ├── themes/<theme>/templates/      # Template overrides
//! └── side_story/                    # Extra comic (see "Extra comics")
//!     ├── comic_info.ini             # Merged over the main settings
//!     └── comics/...
//! ```
//!
//! ## Sections
//!
//! ```ini
//! [Comic Info]
//! Comic name = My Comic
//! Author = Me
//! Description = A comic about me
//!
//! [Comic Settings]
//! Comic domain = mycomic.com
//! Comic subdirectory =
//! Date format = %B %d, %Y
//! Timezone = US/Eastern
//! Theme = default
//! On comic click = Next comic
//! Extra comics = side_story
//!
//! [Archive]
//! Date format = %B %d, %Y
//! ```
//!
//! `Comic name`, `Author`, `Description`, both `Date format`s and `Timezone`
//! are required. Without `Comic domain`, the domain comes from a `CNAME`
//! file or from `GITHUB_REPOSITORY` (see [`resolve_comic_url`]).
//!
//! Values are taken verbatim: no quote stripping and no escape processing.
//! Keys are case-sensitive.

use ini::{Ini, ParseOption};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory whose presence marks the project root.
pub const CONTENT_DIR: &str = "your_content";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("{path} has a [{section}] section; page info files only support plain key = value lines")]
    MultipleSections { path: PathBuf, section: String },
    #[error("Missing option \"{key}\" in section [{section}] of comic_info.ini")]
    MissingOption { section: String, key: String },
    #[error("Option \"{key}\" in section [{section}] is not a boolean: {value:?}")]
    InvalidBool {
        section: String,
        key: String,
        value: String,
    },
    #[error(
        "Set \"Comic domain\" in the [Comic Settings] section of your comic_info.ini file \
         before building your site locally. Without it there is no way to know where the \
         comic will be hosted."
    )]
    MissingDomain,
    #[error("Couldn't find a '{CONTENT_DIR}' folder in {0} or any of its parents")]
    ProjectRootNotFound(PathBuf),
}

fn parse_options() -> ParseOption {
    ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    }
}

fn read_text(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_ini(text: &str, path: &Path) -> Result<Ini, ConfigError> {
    Ini::load_from_str_opt(text, parse_options()).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Parsed `comic_info.ini`: ordered sections of ordered options.
#[derive(Debug, Clone)]
pub struct ComicInfo {
    ini: Ini,
}

impl Default for ComicInfo {
    fn default() -> Self {
        Self { ini: Ini::new() }
    }
}

impl ComicInfo {
    /// Read a settings file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = read_text(path)?;
        Ok(Self {
            ini: parse_ini(&text, path)?,
        })
    }

    /// Parse settings from a string. `origin` only labels errors.
    pub fn parse(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        Ok(Self {
            ini: parse_ini(text, origin)?,
        })
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.ini.get_from(Some(section), key)
    }

    pub fn get_or<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.get(section, key).unwrap_or(default)
    }

    /// Look up an option the build cannot proceed without.
    pub fn require(&self, section: &str, key: &str) -> Result<&str, ConfigError> {
        self.get(section, key)
            .ok_or_else(|| ConfigError::MissingOption {
                section: section.to_string(),
                key: key.to_string(),
            })
    }

    /// Ini-style boolean: `1/yes/true/on` or `0/no/false/off`, any case.
    pub fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.get(section, key) else {
            return Ok(default);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "yes" | "true" | "on" => Ok(true),
            "0" | "no" | "false" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool {
                section: section.to_string(),
                key: key.to_string(),
                value: raw.to_string(),
            }),
        }
    }

    /// All options of a section in file order. Empty if the section is absent.
    pub fn options(&self, section: &str) -> Vec<(&str, &str)> {
        self.ini
            .section(Some(section))
            .map(|props| props.iter().collect())
            .unwrap_or_default()
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.ini.section(Some(section)).is_some()
    }

    pub fn remove_section(&mut self, section: &str) {
        self.ini.delete(Some(section));
    }

    /// Overlay every option of `other` on top of these settings.
    pub fn merge(&mut self, other: &ComicInfo) {
        for (section, props) in other.ini.iter() {
            for (key, value) in props.iter() {
                self.ini.with_section(section).set(key, value);
            }
        }
    }

    /// Settings for an extra comic living in `your_content/<folder>/`.
    ///
    /// Starts from the main settings without `[Pages]`. The main `[Links Bar]`
    /// is dropped when the extra comic defines its own.
    pub fn for_extra_comic(&self, extra: &ComicInfo) -> ComicInfo {
        let mut merged = self.clone();
        merged.remove_section("Pages");
        if extra.has_section("Links Bar") {
            merged.remove_section("Links Bar");
        }
        merged.merge(extra);
        merged
    }

    pub fn theme(&self) -> &str {
        self.get_or("Comic Settings", "Theme", "default")
    }

    /// Folder names listed under `[Comic Settings] Extra comics`.
    pub fn extra_comics(&self) -> Vec<String> {
        str_to_list(self.get_or("Comic Settings", "Extra comics", ""), ',')
    }
}

/// Read a page's `info.ini` as ordered `(key, value)` pairs.
///
/// Page files hold a single anonymous section; any named section is an error.
pub fn read_page_info(path: &Path) -> Result<Vec<(String, String)>, ConfigError> {
    let text = read_text(path)?;
    let ini = parse_ini(&text, path)?;
    if let Some(section) = ini.sections().flatten().next() {
        return Err(ConfigError::MultipleSections {
            path: path.to_path_buf(),
            section: section.to_string(),
        });
    }
    Ok(ini
        .section(None::<String>)
        .map(|props| {
            props
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default())
}

/// Split on `delimiter`, trimming spaces and stray leading/trailing delimiters.
///
/// `"Alice, Bob,"` → `["Alice", "Bob"]`; `""` → `[]`.
pub fn str_to_list(s: &str, delimiter: char) -> Vec<String> {
    let trimmed = s.trim_matches(|c| c == delimiter || c == ' ');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed
        .split(delimiter)
        .map(|item| item.trim_matches(' ').to_string())
        .collect()
}

/// Walk up from `start` until a directory containing `your_content/` is found.
pub fn find_project_root(start: &Path) -> Result<PathBuf, ConfigError> {
    start
        .ancestors()
        .find(|dir| dir.join(CONTENT_DIR).is_dir())
        .map(Path::to_path_buf)
        .ok_or_else(|| ConfigError::ProjectRootNotFound(start.to_path_buf()))
}

// ============================================================================
// Comic URL resolution
// ============================================================================

/// Hosting hints gathered from outside `comic_info.ini`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlSources {
    /// Contents of a `CNAME` file at the project root.
    pub cname: Option<String>,
    /// `owner/name` from the `GITHUB_REPOSITORY` environment variable.
    pub github_repository: Option<String>,
}

impl UrlSources {
    pub fn from_environment(root: &Path) -> Self {
        Self {
            cname: std::fs::read_to_string(root.join("CNAME")).ok(),
            github_repository: std::env::var("GITHUB_REPOSITORY").ok(),
        }
    }
}

/// Where the site is published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrl {
    /// Absolute URL without a trailing slash, e.g. `https://me.github.io/comic`.
    pub comic_url: String,
    /// `""` or `/sub` when served from a subdirectory.
    pub base_directory: String,
}

impl SiteUrl {
    /// Prefix root-relative paths (`/x`) with the base directory.
    pub fn web_path(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_directory, path)
        } else {
            path.to_string()
        }
    }
}

/// Work out the published URL of the comic.
///
/// Precedence: explicit `Comic domain` / `Comic subdirectory`, then a `CNAME`
/// file, then the GitHub Pages default for `GITHUB_REPOSITORY`.
pub fn resolve_comic_url(info: &ComicInfo, sources: &UrlSources) -> Result<SiteUrl, ConfigError> {
    let mut domain = info.get("Comic Settings", "Comic domain").map(str::to_string);
    let mut subdirectory = info
        .get("Comic Settings", "Comic subdirectory")
        .map(str::to_string);

    if domain.is_none() {
        if let Some(cname) = &sources.cname {
            domain = Some(cname.trim().trim_matches('/').to_string());
            subdirectory = Some(String::new());
        } else if let Some((owner, name)) = sources
            .github_repository
            .as_deref()
            .and_then(|repo| repo.split_once('/'))
        {
            let pages_domain = format!("{owner}.github.io");
            if subdirectory.is_none() {
                subdirectory = Some(if name.eq_ignore_ascii_case(&pages_domain) {
                    String::new()
                } else {
                    name.to_string()
                });
            }
            domain = Some(pages_domain);
        }
    }

    let domain = domain
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .ok_or(ConfigError::MissingDomain)?;
    let domain = match domain.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None if domain.starts_with("https://") => domain,
        None => format!("https://{domain}"),
    };
    let domain = domain.trim_matches('/');

    let subdirectory = subdirectory.unwrap_or_default();
    let subdirectory = subdirectory.trim().trim_matches('/');
    let base_directory = if subdirectory.is_empty() {
        String::new()
    } else {
        format!("/{subdirectory}")
    };

    tracing::info!(comic_url = %format!("{domain}{base_directory}"), base_directory = %base_directory, "Resolved comic URL");
    Ok(SiteUrl {
        comic_url: format!("{domain}{base_directory}"),
        base_directory,
    })
}
