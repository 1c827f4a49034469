//! Image processing, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Resize** | `resize_exact` with `CatmullRom` (bicubic) |
//! | **Save** | extension-chosen encoder; JPEG flattens alpha onto white |
//!
//! The module is split into:
//! - **Calculations**: [`ResizeSpec`] parsing and dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{InvalidSize, ResizeSpec};
pub use rust_backend::RustBackend;
#[cfg(test)]
pub use backend::Dimensions;
pub use operations::{ThumbnailOutcome, create_thumbnail};
pub use params::ThumbnailParams;
