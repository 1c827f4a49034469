//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between [`operations`](super::operations), which decides what
//! images to create, and the [`backend`](super::backend), which does the
//! pixel work.

use std::path::PathBuf;

/// Resize `source` to exactly `width` x `height` and save it to `output`.
///
/// The output format follows the extension of `output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
}
