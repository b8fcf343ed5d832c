//! Imprint Image Processing Library
//!
//! This crate provides the per-image watermarking pipeline: EXIF orientation
//! resolution, resize policy, watermark compositing, and the decode/encode
//! collaborators those stages are wired to.

pub mod compression;
pub mod image;
pub mod pipeline;
pub mod traits;
pub mod validator;

// Re-export commonly used types
pub use compression::ImageCompressor;
pub use crate::image::{
    CompositeResult, Compositor, ImageOrientation, ImageProcessor, ImageResize, Orientation,
    WatermarkSpec,
};
pub use pipeline::{ImagePipeline, ProcessedImage};
pub use traits::{ImageDecoder, ImageEncoder, OrientationReader};
pub use validator::{SourceFilter, SourceKind};
