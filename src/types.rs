//! Records shared between the build stages.
//!
//! [`PageInfo`] is what the scanner reads from a page's `info.ini` and what
//! lands in `page_info_list.json`. [`ComicData`] is the template-ready record
//! derived from it; templates see it as a flat map of JSON values.

use crate::config::{CONTENT_DIR, ComicInfo};
use crate::hooks::Hooks;
use crate::markdown::Markdown;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// One comic being built: the main comic (`folder == ""`) or an extra comic
/// (`folder == "side_story/"`).
pub struct ComicContext<'a> {
    pub root: &'a Path,
    pub folder: &'a str,
    pub info: &'a ComicInfo,
    pub markdown: &'a Markdown,
    pub hooks: &'a dyn Hooks,
}

impl ComicContext<'_> {
    /// `your_content/<folder>` on disk.
    pub fn content_dir(&self) -> PathBuf {
        self.root.join(CONTENT_DIR).join(self.folder)
    }

    /// `your_content/<folder>comics` on disk.
    pub fn comics_dir(&self) -> PathBuf {
        self.content_dir().join("comics")
    }

    /// Where this comic's HTML is written: the root, or `<root>/<folder>`.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(self.folder)
    }

    /// Site-relative directory of a page, e.g. `your_content/comics/Page 1/`.
    pub fn page_web_dir(&self, page_name: &str) -> String {
        format!("{CONTENT_DIR}/{}comics/{page_name}/", self.folder)
    }
}

/// Metadata for one published page.
///
/// The well-known keys are typed; every other `info.ini` key is kept verbatim
/// in `extra`, in file order (`Title`, `Alt text`, custom keys, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Page directory name. Unique within a comic; used in URLs.
    pub page_name: String,
    #[serde(rename = "Post date")]
    pub post_date: String,
    pub image_file_names: Vec<String>,
    #[serde(rename = "Storyline", default)]
    pub storyline: String,
    #[serde(rename = "Characters", default)]
    pub characters: Vec<String>,
    #[serde(rename = "Tags", default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub transcript_languages: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PageInfo {
    /// A pass-through `info.ini` value, if it is a string.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }

    /// Every field as `(key, value)` pairs, typed fields first.
    pub fn fields(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Template context for one comic page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComicData(Map<String, Value>);

impl ComicData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// String items of an array field; empty when missing or not an array.
    pub fn get_str_list(&self, key: &str) -> Vec<&str> {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Overlay `values` on top of this record.
    pub fn extend(&mut self, values: &Map<String, Value>) {
        for (key, value) in values {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn page_name(&self) -> &str {
        self.get_str("page_name").unwrap_or_default()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ComicData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
