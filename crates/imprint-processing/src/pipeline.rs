//! Per-item watermarking pipeline
//!
//! Order of operations for one source file:
//! 1. Read the EXIF orientation (metadata that exists but cannot be parsed
//!    fails the item)
//! 2. Decode
//! 3. Turn the pixels upright
//! 4. Composite: scale watermark, resize, place, blend
//! 5. Encode for the source file's extension

use bytes::Bytes;
use image::GenericImageView;
use imprint_core::{PerItemError, ResizePolicy};
use std::path::Path;

use crate::compression::ImageCompressor;
use crate::image::{Compositor, ImageOrientation, ImageProcessor, Orientation, WatermarkSpec};
use crate::traits::{ImageDecoder, ImageEncoder, OrientationReader};

/// Encoded output of one item, ready to be written.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub data: Bytes,
    pub extension: String,
    pub width: u32,
    pub height: u32,
    pub orientation: Orientation,
}

/// Watermarking pipeline over pluggable decode/encode collaborators.
///
/// Holds no per-image state, so one instance can serve any number of items.
pub struct ImagePipeline<P = ImageProcessor, E = ImageCompressor> {
    processor: P,
    encoder: E,
}

impl<E: ImageEncoder> ImagePipeline<ImageProcessor, E> {
    pub fn with_encoder(encoder: E) -> Self {
        Self {
            processor: ImageProcessor,
            encoder,
        }
    }
}

impl<P, E> ImagePipeline<P, E>
where
    P: ImageDecoder + OrientationReader,
    E: ImageEncoder,
{
    pub fn new(processor: P, encoder: E) -> Self {
        Self { processor, encoder }
    }

    /// Run the full pipeline for one source file.
    pub fn process(
        &self,
        path: &Path,
        data: &[u8],
        watermark: &WatermarkSpec,
        resize: ResizePolicy,
    ) -> Result<ProcessedImage, PerItemError> {
        let orientation = self.orientation(path, data)?;

        let img = self
            .processor
            .decode(data)
            .map_err(|e| PerItemError::Decode {
                path: path.to_path_buf(),
                reason: format!("{:#}", e),
            })?;

        let upright = ImageOrientation::resolve(img, orientation);

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();

        let result = Compositor::composite(upright, watermark, resize, &extension);
        let (width, height) = result.image.dimensions();

        let encoded = self
            .encoder
            .encode(&result.image, &result.extension)
            .map_err(|e| PerItemError::Encode {
                path: path.to_path_buf(),
                reason: format!("{:#}", e),
            })?;

        Ok(ProcessedImage {
            data: encoded,
            extension: result.extension,
            width,
            height,
            orientation,
        })
    }

    fn orientation(&self, path: &Path, data: &[u8]) -> Result<Orientation, PerItemError> {
        let orientation = self
            .processor
            .read_orientation(data)
            .map_err(|e| PerItemError::Metadata {
                path: path.to_path_buf(),
                reason: format!("{:#}", e),
            })?;

        if orientation == Orientation::Absent {
            tracing::debug!(file = %path.display(), "No EXIF orientation found");
        }
        Ok(orientation)
    }
}

impl Default for ImagePipeline {
    fn default() -> Self {
        Self::new(ImageProcessor, ImageCompressor::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::processor::tests::{jpeg_with_app1, jpeg_with_orientation, png_bytes};
    use image::{DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage};
    use imprint_core::{ErrorMetadata, WatermarkSettings};
    use std::io::Cursor;

    fn spec() -> WatermarkSpec {
        WatermarkSpec::new(
            RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])),
            WatermarkSettings::new(100.0, 1.0, 1, 1).unwrap(),
        )
        .unwrap()
    }

    fn pipeline() -> ImagePipeline {
        ImagePipeline::default()
    }

    fn decode(data: &[u8]) -> DynamicImage {
        ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap()
    }

    /// Decodes like the real processor but always fails to read metadata.
    struct BrokenMetadata;

    impl ImageDecoder for BrokenMetadata {
        fn decode(&self, data: &[u8]) -> Result<DynamicImage, anyhow::Error> {
            ImageProcessor.decode(data)
        }
    }

    impl OrientationReader for BrokenMetadata {
        fn read_orientation(&self, _data: &[u8]) -> Result<Orientation, anyhow::Error> {
            Err(anyhow::anyhow!("corrupt IFD"))
        }
    }

    struct FailingEncoder;

    impl ImageEncoder for FailingEncoder {
        fn encode(&self, _img: &DynamicImage, _extension: &str) -> Result<Bytes, anyhow::Error> {
            Err(anyhow::anyhow!("disk codec unavailable"))
        }
    }

    #[test]
    fn test_png_end_to_end() {
        let source = png_bytes(&RgbaImage::from_pixel(20, 10, Rgba([255, 255, 255, 255])));
        let out = pipeline()
            .process(Path::new("in/a.png"), &source, &spec(), ResizePolicy::None)
            .unwrap();

        assert_eq!(out.extension, "png");
        assert_eq!((out.width, out.height), (20, 10));
        assert_eq!(out.orientation, Orientation::Absent);

        let img = decode(&out.data).to_rgba8();
        // Anchor (20 - 4 - 1, 10 - 4 - 1) = (15, 5)
        assert_eq!(img.get_pixel(15, 5), &Rgba([0, 0, 0, 255]));
        assert_eq!(img.get_pixel(18, 8), &Rgba([0, 0, 0, 255]));
        assert_eq!(img.get_pixel(19, 9), &Rgba([255, 255, 255, 255]));
        assert_eq!(img.get_pixel(14, 5), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_orientation_applied_before_compositing() {
        let source = jpeg_with_orientation(16, 8, 6);
        let out = pipeline()
            .process(Path::new("IMG_0001.jpg"), &source, &spec(), ResizePolicy::None)
            .unwrap();

        assert_eq!(out.orientation, Orientation::Rotate90);
        assert_eq!((out.width, out.height), (8, 16));
        assert_eq!(decode(&out.data).dimensions(), (8, 16));
    }

    #[test]
    fn test_resize_policy_applied() {
        let source = png_bytes(&RgbaImage::from_pixel(100, 80, Rgba([255, 255, 255, 255])));
        let out = pipeline()
            .process(
                Path::new("a.png"),
                &source,
                &spec(),
                ResizePolicy::MaxDimension(50),
            )
            .unwrap();
        assert_eq!((out.width, out.height), (50, 40));
    }

    #[test]
    fn test_unreadable_metadata_fails_the_item() {
        let source = png_bytes(&RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255])));
        let pipeline = ImagePipeline::new(BrokenMetadata, ImageCompressor::default());
        let err = pipeline
            .process(Path::new("a.png"), &source, &spec(), ResizePolicy::None)
            .unwrap_err();
        assert!(matches!(err, PerItemError::Metadata { .. }));
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("corrupt IFD"));
    }

    #[test]
    fn test_malformed_exif_segment_fails_the_item() {
        let source = jpeg_with_app1(8, 8, b"ZZ not a TIFF header");
        let err = pipeline()
            .process(Path::new("IMG_0002.jpg"), &source, &spec(), ResizePolicy::None)
            .unwrap_err();
        assert!(matches!(err, PerItemError::Metadata { .. }));
    }

    #[test]
    fn test_gif_without_metadata_is_processed() {
        let mut gif = Vec::new();
        RgbaImage::from_pixel(12, 12, Rgba([255, 255, 255, 255]))
            .write_to(&mut Cursor::new(&mut gif), ImageFormat::Gif)
            .unwrap();

        let out = pipeline()
            .process(Path::new("anim.gif"), &gif, &spec(), ResizePolicy::None)
            .unwrap();
        assert_eq!(out.orientation, Orientation::Absent);
        assert_eq!(out.extension, "gif");
        assert_eq!(decode(&out.data).dimensions(), (12, 12));
    }

    #[test]
    fn test_undecodable_source_is_item_error() {
        let err = pipeline()
            .process(
                Path::new("broken.jpg"),
                b"\xFF\xD8 definitely not a jpeg",
                &spec(),
                ResizePolicy::None,
            )
            .unwrap_err();
        assert!(matches!(err, PerItemError::Decode { .. }));
        assert!(err.to_string().contains("broken.jpg"));
    }

    #[test]
    fn test_encode_failure_is_item_error() {
        let source = png_bytes(&RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255])));
        let pipeline = ImagePipeline::with_encoder(FailingEncoder);
        let err = pipeline
            .process(Path::new("a.png"), &source, &spec(), ResizePolicy::None)
            .unwrap_err();
        assert!(matches!(err, PerItemError::Encode { .. }));
    }
}
