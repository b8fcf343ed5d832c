use anyhow::Result;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use imprint_core::QualityPreset;
use std::io::Cursor;

use crate::traits::ImageEncoder;

/// Main compression service
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCompressor {
    pub quality: QualityPreset,
}

impl ImageCompressor {
    pub fn new(quality: QualityPreset) -> Self {
        Self { quality }
    }

    /// Output format for a file extension. Anything the image crate cannot
    /// write falls back to JPEG.
    pub fn format_for_extension(extension: &str) -> ImageFormat {
        ImageFormat::from_extension(extension)
            .filter(|format| format.writing_enabled())
            .unwrap_or(ImageFormat::Jpeg)
    }

    /// Compress image with specified format and quality
    pub fn compress(&self, img: &DynamicImage, format: ImageFormat) -> Result<Bytes> {
        match format {
            ImageFormat::Jpeg => self.compress_jpeg(img),
            other => Self::compress_generic(img, other),
        }
    }

    /// JPEG has no alpha channel, so RGBA input is flattened to RGB here.
    fn compress_jpeg(&self, img: &DynamicImage) -> Result<Bytes> {
        let rgb_img = img.to_rgb8();
        let mut buffer = Vec::new();

        let encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality.jpeg_quality());
        rgb_img.write_with_encoder(encoder)?;

        Ok(Bytes::from(buffer))
    }

    fn compress_generic(img: &DynamicImage, format: ImageFormat) -> Result<Bytes> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        img.write_to(&mut cursor, format)?;

        Ok(Bytes::from(buffer))
    }
}

impl ImageEncoder for ImageCompressor {
    fn encode(&self, img: &DynamicImage, extension: &str) -> Result<Bytes> {
        let format = Self::format_for_extension(extension);
        tracing::debug!(
            extension = extension,
            format = ?format,
            quality = ?self.quality,
            "Encoding image"
        );
        self.compress(img, format)
    }
}
