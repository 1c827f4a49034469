//! High-level image operations.
//!
//! These functions combine calculations with backend execution.

use super::backend::{BackendError, ImageBackend};
use super::calculations::ResizeSpec;
use super::params::ThumbnailParams;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    Created { width: u32, height: u32 },
    /// The output already existed and overwriting is off.
    Skipped,
}

/// Plan a thumbnail operation without executing it.
pub fn plan_thumbnail(
    source: &Path,
    output: &Path,
    source_dims: (u32, u32),
    size: ResizeSpec,
) -> ThumbnailParams {
    let (width, height) = size.target_dimensions(source_dims);
    ThumbnailParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
    }
}

/// Write a resized copy of `source` to `output`.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    size: ResizeSpec,
    overwrite: bool,
) -> Result<ThumbnailOutcome> {
    if !overwrite && output.exists() {
        return Ok(ThumbnailOutcome::Skipped);
    }
    let dims = backend.identify(source)?;
    let params = plan_thumbnail(source, output, (dims.width, dims.height), size);
    backend.thumbnail(&params)?;
    Ok(ThumbnailOutcome::Created {
        width: params.width,
        height: params.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use tempfile::TempDir;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    #[test]
    fn plan_thumbnail_applies_resize_spec() {
        let params = plan_thumbnail(
            Path::new("/page.png"),
            Path::new("/_thumbnail.jpg"),
            (200, 100),
            ResizeSpec::Height(300),
        );
        assert_eq!((params.width, params.height), (600, 300));
        assert_eq!(params.output, Path::new("/_thumbnail.jpg"));
    }

    #[test]
    fn create_thumbnail_identifies_then_resizes() {
        let backend = MockBackend::with_dimensions(vec![dims(200, 100)]);

        let outcome = create_thumbnail(
            &backend,
            Path::new("/comics/Page 1/page.png"),
            Path::new("/comics/Page 1/_thumbnail.jpg"),
            ResizeSpec::Percent(0.5),
            true,
        )
        .unwrap();

        assert_eq!(outcome, ThumbnailOutcome::Created { width: 100, height: 50 });
        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Identify("/comics/Page 1/page.png".to_string()),
                RecordedOp::Thumbnail {
                    source: "/comics/Page 1/page.png".to_string(),
                    output: "/comics/Page 1/_thumbnail.jpg".to_string(),
                    width: 100,
                    height: 50,
                },
            ]
        );
    }

    #[test]
    fn existing_output_skipped_without_overwrite() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("_thumbnail.jpg");
        std::fs::write(&output, b"old").unwrap();
        let backend = MockBackend::with_dimensions(vec![dims(200, 100)]);

        let outcome = create_thumbnail(
            &backend,
            &tmp.path().join("page.png"),
            &output,
            ResizeSpec::Percent(0.5),
            false,
        )
        .unwrap();

        assert_eq!(outcome, ThumbnailOutcome::Skipped);
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn existing_output_replaced_with_overwrite() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("_thumbnail.jpg");
        std::fs::write(&output, b"old").unwrap();
        let backend = MockBackend::with_dimensions(vec![dims(200, 100)]);

        let outcome =
            create_thumbnail(&backend, &tmp.path().join("page.png"), &output, ResizeSpec::Width(50), true)
                .unwrap();
        assert_eq!(outcome, ThumbnailOutcome::Created { width: 50, height: 25 });
    }
}
