//! Markdown rendering for post bodies, transcripts, and theme pages.
//!
//! A [`Markdown`] value is built once per build and passed wherever text is
//! converted. Post text uses [`Markdown::for_posts`]: strikethrough, and every
//! newline becomes `<br />` so authors don't need trailing double spaces.
//! Theme pages use [`Markdown::with_extras`], driven by
//! `[Comic Settings] Markdown extras`.

use pulldown_cmark::{Event, Options, Parser, html as md_html};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Markdown {
    options: Options,
    hard_breaks: bool,
}

impl Markdown {
    pub fn for_posts() -> Self {
        Self {
            options: Options::ENABLE_STRIKETHROUGH,
            hard_breaks: true,
        }
    }

    /// Build a renderer from a list of extra names.
    ///
    /// Known names: `tables`, `footnotes`, `strike`, `task_list`,
    /// `smarty-pants`, `header-ids`, `break-on-newline`. Others are ignored.
    pub fn with_extras(extras: &[String]) -> Self {
        let mut options = Options::empty();
        let mut hard_breaks = false;
        for extra in extras {
            match extra.as_str() {
                "tables" => options.insert(Options::ENABLE_TABLES),
                "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
                "strike" => options.insert(Options::ENABLE_STRIKETHROUGH),
                "task_list" => options.insert(Options::ENABLE_TASKLISTS),
                "smarty-pants" => options.insert(Options::ENABLE_SMART_PUNCTUATION),
                "header-ids" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
                "break-on-newline" => hard_breaks = true,
                "metadata" | "fenced-code-blocks" => {}
                other => tracing::debug!(extra = other, "Ignoring unsupported markdown extra"),
            }
        }
        Self {
            options,
            hard_breaks,
        }
    }

    pub fn render(&self, text: &str) -> String {
        let parser = Parser::new_ext(text, self.options);
        let mut html = String::new();
        if self.hard_breaks {
            let events = parser.map(|event| match event {
                Event::SoftBreak => Event::HardBreak,
                other => other,
            });
            md_html::push_html(&mut html, events);
        } else {
            md_html::push_html(&mut html, parser);
        }
        html
    }
}

impl Default for Markdown {
    fn default() -> Self {
        Self::for_posts()
    }
}

/// Split leading `key: value` metadata off a markdown document.
///
/// Metadata is either fenced by `---` lines, or the whole first paragraph when
/// every one of its lines is a `key: value` pair. Returns the metadata and
/// the remaining body.
pub fn split_metadata(text: &str) -> (BTreeMap<String, String>, &str) {
    let mut metadata = BTreeMap::new();

    if let Some(rest) = strip_fence(text) {
        let mut consumed = text.len() - rest.len();
        for line in rest.split_inclusive('\n') {
            consumed += line.len();
            if line.trim_end() == "---" {
                return (metadata, &text[consumed..]);
            }
            if let Some((key, value)) = metadata_line(line) {
                metadata.insert(key, value);
            }
        }
        // Unterminated fence: treat the document as plain markdown.
        return (BTreeMap::new(), text);
    }

    let (head, body) = match text.find("\n\n") {
        Some(pos) => (&text[..pos], &text[pos + 2..]),
        None => (text, ""),
    };
    if head.trim().is_empty() {
        return (metadata, text);
    }
    for line in head.lines() {
        match metadata_line(line) {
            Some((key, value)) => {
                metadata.insert(key, value);
            }
            None => return (BTreeMap::new(), text),
        }
    }
    (metadata, body)
}

fn strip_fence(text: &str) -> Option<&str> {
    let first_line_end = text.find('\n')?;
    (text[..first_line_end].trim_end() == "---").then(|| &text[first_line_end + 1..])
}

fn metadata_line(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then(|| (key.to_string(), value.trim().to_string()))
}
