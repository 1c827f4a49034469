//! HTML site generation.
//!
//! Stage 5 of a comic build. Renders every comic page, the auxiliary pages
//! listed under `[Pages]`, and one page per tag, through [tera] templates.
//!
//! ## Template Lookup
//!
//! Templates are loaded from three places, highest priority first. A name
//! found higher up shadows the same name below it:
//!
//! ```text
//! your_content/themes/<theme>/templates/<comic folder>/   (extra comics only)
//! your_content/themes/<theme>/templates/
//! built-in templates (compiled into the binary)
//! ```
//!
//! For a page called `archive`, [`TemplateWriter::write_to_template`] tries:
//!
//! 1. `archive.html`, rendered with no variables
//! 2. `archive.tpl`, rendered with the page data
//! 3. `your_content/themes/<theme>/pages/archive.md`, converted to HTML and
//!    rendered through the template named by its `template:` metadata
//!    (default `md_page.tpl`) with the HTML in `text`
//!
//! ## Output Structure
//!
//! ```text
//! <comic folder>
//! ├── index.html                 # [Pages] index
//! ├── 404.html                   # [Pages] 404
//! ├── archive/index.html         # any other [Pages] entry
//! ├── comic/<page name>/index.html
//! └── tagged/<tag>/index.html
//! ```
//!
//! Output is not escaped: post bodies and transcripts are already HTML.

use crate::config::{self, CONTENT_DIR, ComicInfo, ConfigError};
use crate::hooks::HookError;
use crate::markdown::{self, Markdown};
use crate::types::{ComicContext, ComicData};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Template matching '{0}' not found")]
    TemplateNotFound(String),
    #[error("Failed to load templates: {0}")]
    Load(String),
    #[error("Failed to render {name}: {detail}")]
    Render { name: String, detail: String },
    #[error("Hook failed: {0}")]
    Hook(#[from] HookError),
}

/// Templates shipped with the binary, used when a theme doesn't override them.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("base.tpl", include_str!("../templates/base.tpl")),
    ("comic.tpl", include_str!("../templates/comic.tpl")),
    ("comic_body.tpl", include_str!("../templates/comic_body.tpl")),
    ("index.tpl", include_str!("../templates/index.tpl")),
    ("archive.tpl", include_str!("../templates/archive.tpl")),
    ("tagged.tpl", include_str!("../templates/tagged.tpl")),
    ("latest.tpl", include_str!("../templates/latest.tpl")),
    ("404.tpl", include_str!("../templates/404.tpl")),
    ("md_page.tpl", include_str!("../templates/md_page.tpl")),
];

const TEMPLATE_EXTENSIONS: &[&str] = &["tpl", "html"];

/// Theme template directories for a comic, highest priority first.
pub fn template_dirs(root: &Path, comic_folder: &str, theme: &str) -> Vec<PathBuf> {
    let theme_templates = root
        .join(CONTENT_DIR)
        .join("themes")
        .join(theme)
        .join("templates");
    let mut dirs = Vec::new();
    let folder = comic_folder.trim_matches('/');
    if !folder.is_empty() {
        dirs.push(theme_templates.join(folder));
    }
    dirs.push(theme_templates);
    dirs
}

/// Tera's errors keep the useful part in their source chain.
fn error_chain(e: &tera::Error) -> String {
    let mut parts = vec![e.to_string()];
    let mut source = std::error::Error::source(e);
    while let Some(err) = source {
        parts.push(err.to_string());
        source = err.source();
    }
    parts.join(": ")
}

/// Renders named pages for one comic and writes them under the project root.
pub struct TemplateWriter {
    tera: Tera,
    root: PathBuf,
    theme: String,
    page_markdown: Markdown,
}

impl TemplateWriter {
    pub fn new(root: &Path, comic_folder: &str, info: &ComicInfo) -> Result<Self, GenerateError> {
        let theme = info.theme().to_string();
        let dirs = template_dirs(root, comic_folder, &theme);
        tracing::debug!(dirs = ?dirs, "Template folders");

        let mut sources: HashMap<String, String> = BUILTIN_TEMPLATES
            .iter()
            .map(|(name, body)| (name.to_string(), body.to_string()))
            .collect();
        // Lowest priority first, so later directories overwrite.
        for dir in dirs.iter().rev() {
            sources.extend(read_template_dir(dir)?);
        }

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(sources)
            .map_err(|e| GenerateError::Load(error_chain(&e)))?;

        let extras =
            config::str_to_list(info.get_or("Comic Settings", "Markdown extras", ""), ',');
        Ok(Self {
            tera,
            root: root.to_path_buf(),
            theme,
            page_markdown: Markdown::with_extras(&extras),
        })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    fn render(&self, name: &str, data: &Map<String, Value>) -> Result<String, GenerateError> {
        let context = Context::from_value(Value::Object(data.clone())).map_err(|e| {
            GenerateError::Render {
                name: name.to_string(),
                detail: error_chain(&e),
            }
        })?;
        self.tera
            .render(name, &context)
            .map_err(|e| GenerateError::Render {
                name: name.to_string(),
                detail: error_chain(&e),
            })
    }

    /// Resolve `name` to HTML: `.html`, then `.tpl`, then a theme markdown page.
    pub fn render_page(&self, name: &str, data: &Map<String, Value>) -> Result<String, GenerateError> {
        let html = format!("{name}.html");
        if self.has_template(&html) {
            return self.render(&html, &Map::new());
        }
        let tpl = format!("{name}.tpl");
        if self.has_template(&tpl) {
            return self.render(&tpl, data);
        }
        match self.render_markdown_page(name, data)? {
            Some(page) => Ok(page),
            None => Err(GenerateError::TemplateNotFound(name.to_string())),
        }
    }

    fn render_markdown_page(
        &self,
        name: &str,
        data: &Map<String, Value>,
    ) -> Result<Option<String>, GenerateError> {
        let md_path = self
            .root
            .join(CONTENT_DIR)
            .join("themes")
            .join(&self.theme)
            .join("pages")
            .join(format!("{name}.md"));
        if !md_path.is_file() {
            return Ok(None);
        }
        let source = fs::read_to_string(&md_path)?;
        let (metadata, body) = markdown::split_metadata(&source);
        let template = metadata
            .get("template")
            .map(String::as_str)
            .unwrap_or("md_page.tpl");
        if !self.has_template(template) {
            return Err(GenerateError::TemplateNotFound(template.to_string()));
        }

        let mut page_data = data.clone();
        page_data.insert("text".into(), Value::String(self.page_markdown.render(body)));
        self.render(template, &page_data).map(Some)
    }

    /// Render `name` and write it to `html_path`, relative to the project root.
    pub fn write_to_template(
        &self,
        name: &str,
        html_path: &str,
        data: &Map<String, Value>,
    ) -> Result<PathBuf, GenerateError> {
        let contents = self.render_page(name, data)?;
        let path = self.root.join(html_path);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        tracing::debug!(path = html_path, "Writing");
        fs::write(&path, contents)?;
        Ok(path)
    }
}

fn read_template_dir(dir: &Path) -> Result<Vec<(String, String)>, GenerateError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut templates = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();
        let is_template = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| TEMPLATE_EXTENSIONS.contains(&e));
        if !entry.file_type().is_file() || !is_template {
            continue;
        }
        let Ok(relative) = path.strip_prefix(dir) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        templates.push((name, fs::read_to_string(path)?));
    }
    Ok(templates)
}

// ============================================================================
// Pages
// ============================================================================

/// What [`write_html_files`] produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub comic_pages: usize,
    /// Output paths of `[Pages]` entries, relative to the project root.
    pub other_pages: Vec<String>,
    pub tag_pages: usize,
    pub failed_tag_pages: Vec<String>,
}

/// `<comic folder>comic/<page name>/index.html` for every page.
pub fn write_comic_pages(
    writer: &TemplateWriter,
    comic_folder: &str,
    comic_data: &[ComicData],
    global_values: &Map<String, Value>,
) -> Result<usize, GenerateError> {
    tracing::info!(count = comic_data.len(), "Writing comic pages");
    for page in comic_data {
        let mut data = page.clone();
        data.extend(global_values);
        let html_path = format!("{comic_folder}comic/{}/index.html", page.page_name());
        writer.write_to_template("comic", &html_path, data.as_map())?;
    }
    Ok(comic_data.len())
}

/// Output path of a `[Pages]` entry.
pub fn other_page_path(comic_folder: &str, template_name: &str) -> String {
    let name = template_name.to_lowercase();
    if name == "index" || name == "404" {
        format!("{comic_folder}{template_name}.html")
    } else {
        format!("{comic_folder}{template_name}/index.html")
    }
}

/// Data shared by the auxiliary and tag pages: the newest page plus globals.
pub fn base_page_data(comic_data: &[ComicData], global_values: &Map<String, Value>) -> Map<String, Value> {
    let mut base = match comic_data.last() {
        Some(last) => last.clone(),
        None => {
            tracing::warn!("Publishing a website with no comic pages");
            let mut empty = ComicData::new();
            empty.insert("_title", "Index");
            empty
        }
    };
    base.extend(global_values);
    base.into_map()
}

pub fn write_other_pages(
    writer: &TemplateWriter,
    comic_folder: &str,
    info: &ComicInfo,
    comic_data: &[ComicData],
    global_values: &Map<String, Value>,
    summary: &mut WriteSummary,
) -> Result<(), GenerateError> {
    let base = base_page_data(comic_data, global_values);
    for (template_name, title) in info.options("Pages") {
        if template_name == "tagged" {
            write_tagged_pages(writer, comic_folder, comic_data, &base, summary);
            continue;
        }
        if template_name == "latest" && comic_data.is_empty() {
            continue;
        }
        let mut data = base.clone();
        if !title.is_empty() {
            data.insert("_title".into(), Value::String(title.to_string()));
        }
        let html_path = other_page_path(comic_folder, template_name);
        writer.write_to_template(template_name, &html_path, &data)?;
        summary.other_pages.push(html_path);
    }
    Ok(())
}

/// Characters and tags in first-seen order, each with its pages.
pub fn collect_tags(comic_data: &[ComicData]) -> Vec<(String, Vec<&ComicData>)> {
    let mut tags: Vec<(String, Vec<&ComicData>)> = Vec::new();
    for page in comic_data {
        let names = page
            .get_str_list("_characters")
            .into_iter()
            .chain(page.get_str_list("_tags"));
        for name in names {
            match tags.iter_mut().find(|(tag, _)| tag == name) {
                Some((_, pages)) => pages.push(page),
                None => tags.push((name.to_string(), vec![page])),
            }
        }
    }
    tags
}

/// One page per tag. A tag page that fails to render is logged and skipped.
pub fn write_tagged_pages(
    writer: &TemplateWriter,
    comic_folder: &str,
    comic_data: &[ComicData],
    base: &Map<String, Value>,
    summary: &mut WriteSummary,
) {
    for (tag, pages) in collect_tags(comic_data) {
        let mut data = base.clone();
        data.insert("_title".into(), Value::String(format!("Posts tagged with {tag}")));
        data.insert("tag".into(), Value::String(tag.clone()));
        data.insert(
            "tagged_pages".into(),
            Value::Array(pages.iter().map(|p| Value::Object(p.as_map().clone())).collect()),
        );
        let html_path = format!("{comic_folder}tagged/{tag}/index.html");
        match writer.write_to_template("tagged", &html_path, &data) {
            Ok(_) => summary.tag_pages += 1,
            Err(e) => {
                tracing::error!(path = %html_path, error = %e, "Failed to create tag page");
                summary.failed_tag_pages.push(html_path);
            }
        }
    }
}

/// Write every HTML file of one comic, then run the `build_other_pages` hook.
pub fn write_html_files(
    ctx: &ComicContext,
    comic_data: &[ComicData],
    global_values: &Map<String, Value>,
) -> Result<WriteSummary, GenerateError> {
    let writer = TemplateWriter::new(ctx.root, ctx.folder, ctx.info)?;
    let mut summary = WriteSummary {
        comic_pages: write_comic_pages(&writer, ctx.folder, comic_data, global_values)?,
        ..WriteSummary::default()
    };
    write_other_pages(&writer, ctx.folder, ctx.info, comic_data, global_values, &mut summary)?;
    ctx.hooks
        .build_other_pages(ctx.folder, ctx.info, comic_data, &writer)?;
    Ok(summary)
}
