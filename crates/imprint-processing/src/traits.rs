//! Core traits for the watermarking pipeline
//!
//! The pipeline depends on these collaborators rather than on concrete codecs.

use bytes::Bytes;
use image::DynamicImage;

use crate::image::Orientation;

/// Turns encoded bytes into pixels.
pub trait ImageDecoder: Send + Sync {
    /// Decode image data, failing on anything that is not a supported raster format
    fn decode(&self, data: &[u8]) -> Result<DynamicImage, anyhow::Error>;
}

/// Reads the stored orientation tag.
pub trait OrientationReader: Send + Sync {
    /// Returns `Orientation::Absent` when there is no metadata; errors only on
    /// metadata that is present but unreadable
    fn read_orientation(&self, data: &[u8]) -> Result<Orientation, anyhow::Error>;
}

/// Turns pixels back into bytes for a given output extension.
pub trait ImageEncoder: Send + Sync {
    fn encode(&self, img: &DynamicImage, extension: &str) -> Result<Bytes, anyhow::Error>;
}
