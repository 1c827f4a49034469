//! Thumbnail generation.
//!
//! Stage 3 of a comic build. For every page the first comic image is scaled
//! by `[Image Reprocessing] Thumbnail size` and written beside it:
//!
//! ```text
//! your_content/comics/Page 1/
//! ├── page_1.png
//! └── _thumbnail.jpg     # generated
//! ```
//!
//! ## Settings
//!
//! ```ini
//! [Image Reprocessing]
//! Create thumbnails = True
//! Overwrite existing images = False
//! Thumbnail size = 50%
//! ```
//!
//! Existing thumbnails are kept unless overwriting is on. Pages without any
//! image are skipped with a warning.

use crate::config::{ComicInfo, ConfigError};
use crate::imaging::{
    BackendError, ImageBackend, InvalidSize, ResizeSpec, RustBackend, ThumbnailOutcome,
    create_thumbnail,
};
use crate::types::ComicData;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    InvalidSize(#[from] InvalidSize),
    #[error("Image processing failed for {path}: {source}")]
    Imaging {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
}

const SECTION: &str = "Image Reprocessing";

/// The `[Image Reprocessing]` section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessConfig {
    /// `None` when thumbnails are switched off.
    pub thumbnail_size: Option<ResizeSpec>,
    pub overwrite_existing: bool,
}

impl ProcessConfig {
    pub fn from_comic_info(info: &ComicInfo) -> Result<Self, ProcessError> {
        let thumbnail_size = if info.get_bool(SECTION, "Create thumbnails", false)? {
            Some(info.require(SECTION, "Thumbnail size")?.parse::<ResizeSpec>()?)
        } else {
            None
        };
        Ok(Self {
            thumbnail_size,
            overwrite_existing: info.get_bool(SECTION, "Overwrite existing images", false)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedThumbnail {
    pub page_name: String,
    pub path: PathBuf,
    pub outcome: ThumbnailOutcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessResult {
    pub thumbnails: Vec<ProcessedThumbnail>,
    /// Pages that had no image to make a thumbnail from.
    pub pages_without_images: Vec<String>,
}

impl ProcessResult {
    pub fn created(&self) -> usize {
        self.thumbnails
            .iter()
            .filter(|t| matches!(t.outcome, ThumbnailOutcome::Created { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.thumbnails.len() - self.created()
    }
}

pub fn process_comic_images(
    root: &Path,
    info: &ComicInfo,
    comic_data: &[ComicData],
) -> Result<ProcessResult, ProcessError> {
    let config = ProcessConfig::from_comic_info(info)?;
    process_with_backend(&RustBackend::new(), root, &config, comic_data)
}

/// Process images using a specific backend (allows testing with mock).
pub fn process_with_backend(
    backend: &impl ImageBackend,
    root: &Path,
    config: &ProcessConfig,
    comic_data: &[ComicData],
) -> Result<ProcessResult, ProcessError> {
    let mut result = ProcessResult::default();
    let Some(size) = config.thumbnail_size else {
        return Ok(result);
    };

    for page in comic_data {
        let Some(first_image) = page.get_str_list("comic_paths").first().copied() else {
            tracing::warn!(page = page.page_name(), "No comic image, skipping thumbnail");
            result.pages_without_images.push(page.page_name().to_string());
            continue;
        };
        let source = root.join(first_image);
        let output = source
            .parent()
            .map(|dir| dir.join("_thumbnail.jpg"))
            .unwrap_or_else(|| root.join("_thumbnail.jpg"));

        let outcome = create_thumbnail(backend, &source, &output, size, config.overwrite_existing)
            .map_err(|source_err| ProcessError::Imaging {
                path: source.clone(),
                source: source_err,
            })?;
        if let ThumbnailOutcome::Created { width, height } = outcome {
            tracing::info!(page = page.page_name(), width, height, "Created thumbnail");
        }
        result.thumbnails.push(ProcessedThumbnail {
            page_name: page.page_name().to_string(),
            path: output,
            outcome,
        });
    }
    Ok(result)
}
