//! Archive grouping by storyline.
//!
//! Pages are bucketed by their `_storyline` value in first-seen order.
//! Pages without one land in "Uncategorized", which always sorts last (or is
//! left out with `[Archive] Show Uncategorized comics = False`).

use crate::config::{ComicInfo, ConfigError};
use crate::hooks::Hooks;
use crate::types::ComicData;
use serde::ser::{Serialize, SerializeMap, Serializer};

pub const UNCATEGORIZED: &str = "Uncategorized";

/// Ordered `storyline → pages`. Serializes as a JSON object in that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Storylines(Vec<(String, Vec<ComicData>)>);

impl Storylines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `page` to the named bucket, creating it at the end if needed.
    pub fn push(&mut self, storyline: &str, page: ComicData) {
        match self.0.iter_mut().find(|(name, _)| name == storyline) {
            Some((_, pages)) => pages.push(page),
            None => self.0.push((storyline.to_string(), vec![page])),
        }
    }

    pub fn get(&self, storyline: &str) -> Option<&[ComicData]> {
        self.0
            .iter()
            .find(|(name, _)| name == storyline)
            .map(|(_, pages)| pages.as_slice())
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ComicData])> {
        self.0.iter().map(|(name, pages)| (name.as_str(), pages.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn move_to_end(&mut self, storyline: &str) {
        if let Some(pos) = self.0.iter().position(|(name, _)| name == storyline) {
            let entry = self.0.remove(pos);
            self.0.push(entry);
        }
    }
}

impl Serialize for Storylines {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, pages) in &self.0 {
            map.serialize_entry(name, pages)?;
        }
        map.end()
    }
}

pub fn get_storylines(
    info: &ComicInfo,
    comic_data: &[ComicData],
    hooks: &dyn Hooks,
) -> Result<Storylines, ConfigError> {
    let show_uncategorized = info.get_bool("Archive", "Show Uncategorized comics", true)?;

    let mut storylines = Storylines::new();
    for page in comic_data {
        match page.get_str("_storyline").filter(|s| !s.is_empty()) {
            Some(name) => storylines.push(name, page.clone()),
            None if show_uncategorized => storylines.push(UNCATEGORIZED, page.clone()),
            None => {}
        }
    }
    storylines.move_to_end(UNCATEGORIZED);

    Ok(hooks
        .extra_get_storylines_processing(info, comic_data, &storylines)
        .unwrap_or(storylines))
}
