//! Image processor - decoding and EXIF orientation reading

use crate::image::orientation::Orientation;
use crate::traits::{ImageDecoder, OrientationReader};
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

pub struct ImageProcessor;

impl ImageDecoder for ImageProcessor {
    fn decode(&self, data: &[u8]) -> Result<DynamicImage, anyhow::Error> {
        let cursor = Cursor::new(data);
        let reader = ImageReader::new(cursor).with_guessed_format()?;
        Ok(reader.decode()?)
    }
}

impl OrientationReader for ImageProcessor {
    fn read_orientation(&self, data: &[u8]) -> Result<Orientation, anyhow::Error> {
        Self::read_exif_orientation(data)
    }
}

impl ImageProcessor {
    /// Read EXIF orientation tag from image data.
    ///
    /// A container without EXIF support (GIF, BMP, ...), a missing EXIF segment,
    /// or a segment without the orientation tag is `Orientation::Absent`. Only
    /// metadata that exists but cannot be parsed is reported as an error.
    pub fn read_exif_orientation(data: &[u8]) -> Result<Orientation, anyhow::Error> {
        if !Self::may_carry_exif(data) {
            return Ok(Orientation::Absent);
        }

        let mut cursor = Cursor::new(data);
        let exif = match exif::Reader::new().read_from_container(&mut cursor) {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => return Ok(Orientation::Absent),
            Err(e) => return Err(e.into()),
        };

        let orientation = exif
            .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from_exif)
            .unwrap_or(Orientation::Absent);

        Ok(orientation)
    }

    /// Containers the EXIF reader knows how to walk.
    fn may_carry_exif(data: &[u8]) -> bool {
        matches!(
            image::guess_format(data),
            Ok(ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP | ImageFormat::Tiff)
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

    pub(crate) fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        img.write_to(&mut cursor, ImageFormat::Png).unwrap();
        buffer
    }

    /// Baseline JPEG with an APP1 segment carrying a single orientation entry.
    pub(crate) fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
        let mut tiff = vec![b'M', b'M', 0x00, 0x2a, 0x00, 0x00, 0x00, 0x08];
        tiff.extend_from_slice(&[0x00, 0x01]);
        tiff.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        tiff.extend_from_slice(&orientation.to_be_bytes());
        tiff.extend_from_slice(&[0x00, 0x00]);
        tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        jpeg_with_app1(width, height, &tiff)
    }

    /// Baseline JPEG with an `Exif` APP1 segment wrapping `tiff` verbatim.
    pub(crate) fn jpeg_with_app1(width: u32, height: u32, tiff: &[u8]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 100, 50]));
        let mut jpeg = Vec::new();
        img.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();

        let mut payload = b"Exif\0\0".to_vec();
        payload.extend_from_slice(tiff);
        let len = (payload.len() + 2) as u16;

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn test_decode_png() {
        let data = png_bytes(&RgbaImage::from_pixel(10, 6, Rgba([255, 0, 0, 255])));
        let img = ImageProcessor.decode(&data).unwrap();
        assert_eq!(img.dimensions(), (10, 6));
    }

    #[test]
    fn test_decode_invalid_image() {
        assert!(ImageProcessor.decode(b"not an image").is_err());
    }

    #[test]
    fn test_read_exif_orientation_no_exif() {
        let data = png_bytes(&RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])));
        let orientation = ImageProcessor::read_exif_orientation(&data).unwrap();
        assert_eq!(orientation, Orientation::Absent);

        let mut jpeg = Vec::new();
        RgbImage::new(4, 4)
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();
        assert_eq!(
            ImageProcessor.read_orientation(&jpeg).unwrap(),
            Orientation::Absent
        );
    }

    #[test]
    fn test_read_exif_orientation_from_jpeg() {
        let data = jpeg_with_orientation(8, 4, 6);
        assert_eq!(
            ImageProcessor::read_exif_orientation(&data).unwrap(),
            Orientation::Rotate90
        );

        // The APP1 segment must not disturb decoding
        let img = ImageProcessor.decode(&data).unwrap();
        assert_eq!(img.dimensions(), (8, 4));
    }

    #[test]
    fn test_read_exif_orientation_gif_is_absent() {
        let mut gif = Vec::new();
        RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]))
            .write_to(&mut Cursor::new(&mut gif), ImageFormat::Gif)
            .unwrap();

        assert_eq!(
            ImageProcessor::read_exif_orientation(&gif).unwrap(),
            Orientation::Absent
        );
        assert_eq!(ImageProcessor.decode(&gif).unwrap().dimensions(), (4, 4));
    }

    #[test]
    fn test_read_exif_orientation_malformed_segment() {
        let data = jpeg_with_app1(4, 4, b"ZZ garbage, not a TIFF header");
        assert!(ImageProcessor::read_exif_orientation(&data).is_err());
    }

    #[test]
    fn test_read_exif_orientation_out_of_range_value() {
        let data = jpeg_with_orientation(4, 4, 12);
        assert_eq!(
            ImageProcessor::read_exif_orientation(&data).unwrap(),
            Orientation::Unknown(12)
        );
    }
}
