//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, BMP, TIFF, WebP) | `image` crate decoders |
//! | Resize | `DynamicImage::resize_exact` with `CatmullRom` |
//! | Encode | format from the output extension; JPEG at quality 75 |
//!
//! JPEG has no alpha channel. Opaque images are converted to RGB and images
//! with alpha are flattened onto white before encoding. The encoder would
//! otherwise drop the alpha channel and leave transparent areas black.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::ThumbnailParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageFormat, ImageReader, Rgba, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const JPEG_QUALITY: u8 = 75;

/// Pure Rust backend using the `image` crate.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

fn output_format(path: &Path) -> Result<ImageFormat, BackendError> {
    ImageFormat::from_path(path).map_err(|e| {
        BackendError::ProcessingFailed(format!("Unsupported output {}: {}", path.display(), e))
    })
}

/// Composite `img` over an opaque white background.
pub(crate) fn flatten_onto_white(img: &DynamicImage) -> DynamicImage {
    let rgba = img.to_rgba8();
    let mut background = RgbaImage::from_pixel(rgba.width(), rgba.height(), Rgba([255; 4]));
    image::imageops::overlay(&mut background, &rgba, 0, 0);
    DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(background).to_rgb8())
}

fn encode_jpeg(img: &DynamicImage, path: &Path) -> Result<(), ImageError> {
    let writer = BufWriter::new(File::create(path).map_err(ImageError::IoError)?);
    img.write_with_encoder(JpegEncoder::new_with_quality(writer, JPEG_QUALITY))
}

/// Save `img` to `path` in the format its extension names.
pub(crate) fn save_image(img: &DynamicImage, path: &Path) -> Result<(), BackendError> {
    let failed = |e: ImageError| {
        BackendError::ProcessingFailed(format!("Failed to save {}: {}", path.display(), e))
    };
    let format = output_format(path)?;
    if format != ImageFormat::Jpeg {
        return img.save_with_format(path, format).map_err(failed);
    }

    let rgb = if img.color().has_alpha() {
        tracing::debug!(path = %path.display(), "Flattening alpha onto white for JPEG");
        flatten_onto_white(img)
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };
    match encode_jpeg(&rgb, path) {
        Err(ImageError::Unsupported(_)) => {
            tracing::debug!(path = %path.display(), "Encoder rejected pixel layout, flattening");
            encode_jpeg(&flatten_onto_white(img), path).map_err(failed)
        }
        other => other.map_err(failed),
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let resized = img.resize_exact(params.width, params.height, FilterType::CatmullRom);
        save_image(&resized, &params.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{write_test_image, write_test_rgba_image};
    use tempfile::TempDir;

    fn params(dir: &Path, source: &str, output: &str, width: u32, height: u32) -> ThumbnailParams {
        ThumbnailParams {
            source: dir.join(source),
            output: dir.join(output),
            width,
            height,
        }
    }

    #[test]
    fn identify_synthetic_png() {
        let tmp = TempDir::new().unwrap();
        write_test_image(&tmp.path().join("page.png"), 200, 150);

        let dims = RustBackend::new().identify(&tmp.path().join("page.png")).unwrap();
        assert_eq!((dims.width, dims.height), (200, 150));
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let result = RustBackend::new().identify(Path::new("/nonexistent/image.png"));
        assert!(result.is_err());
    }

    #[test]
    fn thumbnail_resizes_to_exact_size() {
        let tmp = TempDir::new().unwrap();
        write_test_image(&tmp.path().join("page.png"), 200, 100);

        let backend = RustBackend::new();
        backend
            .thumbnail(&params(tmp.path(), "page.png", "_thumbnail.jpg", 100, 50))
            .unwrap();

        let dims = backend.identify(&tmp.path().join("_thumbnail.jpg")).unwrap();
        assert_eq!((dims.width, dims.height), (100, 50));
    }

    #[test]
    fn thumbnail_of_transparent_png_saves_as_jpeg() {
        let tmp = TempDir::new().unwrap();
        write_test_rgba_image(&tmp.path().join("page.png"), 40, 20);

        RustBackend::new()
            .thumbnail(&params(tmp.path(), "page.png", "_thumbnail.jpg", 20, 10))
            .unwrap();

        let saved = image::open(tmp.path().join("_thumbnail.jpg")).unwrap();
        assert!(!saved.color().has_alpha());
        assert_eq!((saved.width(), saved.height()), (20, 10));
        let pixel = saved.to_rgb8().get_pixel(2, 5).0;
        assert!(pixel.iter().all(|&c| c > 240), "transparent area saved as {pixel:?}");
    }

    #[test]
    fn transparent_image_saves_as_white_jpeg() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("clear.jpg");
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 0])));

        save_image(&img, &path).unwrap();

        let saved = image::open(&path).unwrap().to_rgb8();
        let pixel = saved.get_pixel(8, 8).0;
        assert!(pixel.iter().all(|&c| c > 240), "transparent pixel saved as {pixel:?}");
    }

    #[test]
    fn png_output_keeps_alpha() {
        let tmp = TempDir::new().unwrap();
        write_test_rgba_image(&tmp.path().join("page.png"), 40, 20);

        RustBackend::new()
            .thumbnail(&params(tmp.path(), "page.png", "small.png", 20, 10))
            .unwrap();

        let saved = image::open(tmp.path().join("small.png")).unwrap();
        assert!(saved.color().has_alpha());
    }

    #[test]
    fn flatten_turns_transparent_pixels_white() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([10, 20, 30, 255])
            }
        }));
        let flat = flatten_onto_white(&img).to_rgb8();
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(flat.get_pixel(1, 0).0, [10, 20, 30]);
    }

    #[test]
    fn unknown_output_extension_errors() {
        let tmp = TempDir::new().unwrap();
        write_test_image(&tmp.path().join("page.png"), 20, 20);
        let result =
            RustBackend::new().thumbnail(&params(tmp.path(), "page.png", "thumb.xyz", 10, 10));
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }

    #[test]
    fn undecodable_source_errors() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("page.png"), b"not really a png").unwrap();
        let result =
            RustBackend::new().thumbnail(&params(tmp.path(), "page.png", "_thumbnail.jpg", 10, 10));
        assert!(result.is_err());
    }
}
