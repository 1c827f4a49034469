//! Build hooks: the extension points a theme can plug into.
//!
//! The build calls these at fixed points. Every method has a no-op default,
//! so an implementation overrides only what it needs. Methods returning
//! `Option` replace the value they were shown when they return `Some`.
//!
//! ```text
//! preprocess ─▶ scan ─▶ extra_page_info_processing (per page)
//!            ─▶ assemble ─▶ extra_comic_dict_processing (per page)
//!            ─▶ storylines ─▶ extra_get_storylines_processing
//!            ─▶ extra_global_values ─▶ write pages ─▶ build_other_pages
//!            ─▶ feed ─▶ postprocess
//! ```

use crate::config::ComicInfo;
use crate::generate::{GenerateError, TemplateWriter};
use crate::storylines::Storylines;
use crate::types::{ComicData, PageInfo};
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("{0}")]
pub struct HookError(pub String);

impl From<GenerateError> for HookError {
    fn from(e: GenerateError) -> Self {
        Self(e.to_string())
    }
}

pub trait Hooks {
    /// Runs once, before any output is touched.
    fn preprocess(&self, _comic_info: &ComicInfo) -> Result<(), HookError> {
        Ok(())
    }

    fn extra_page_info_processing(
        &self,
        _comic_folder: &str,
        _comic_info: &ComicInfo,
        _page_path: &Path,
        _page_info: &PageInfo,
    ) -> Option<PageInfo> {
        None
    }

    fn extra_comic_dict_processing(
        &self,
        _comic_folder: &str,
        _comic_info: &ComicInfo,
        _comic_data: &ComicData,
    ) -> Option<ComicData> {
        None
    }

    fn extra_get_storylines_processing(
        &self,
        _comic_info: &ComicInfo,
        _comic_data: &[ComicData],
        _storylines: &Storylines,
    ) -> Option<Storylines> {
        None
    }

    /// Values merged over the built-in global template values.
    fn extra_global_values(
        &self,
        _comic_folder: &str,
        _comic_info: &ComicInfo,
        _comic_data: &[ComicData],
    ) -> Option<Map<String, Value>> {
        None
    }

    /// Write additional pages with the comic's template writer.
    fn build_other_pages(
        &self,
        _comic_folder: &str,
        _comic_info: &ComicInfo,
        _comic_data: &[ComicData],
        _writer: &TemplateWriter,
    ) -> Result<(), HookError> {
        Ok(())
    }

    /// Runs once, after the feed is written.
    fn postprocess(
        &self,
        _comic_info: &ComicInfo,
        _comic_data: &[ComicData],
        _global_values: &Map<String, Value>,
    ) -> Result<(), HookError> {
        Ok(())
    }
}

/// The hooks used when a theme doesn't provide any.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl Hooks for NoHooks {}
