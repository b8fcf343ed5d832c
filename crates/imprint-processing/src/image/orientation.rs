use image::DynamicImage;

/// Orientation tag as stored by the camera (EXIF tag 0x0112).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// No EXIF segment or no orientation tag
    #[default]
    Absent,
    /// 1
    Normal,
    /// 2
    FlipHorizontal,
    /// 3
    Rotate180,
    /// 4
    FlipVertical,
    /// 5
    Transpose,
    /// 6
    Rotate90,
    /// 7
    Transverse,
    /// 8
    Rotate270,
    /// Any value outside 1-8
    Unknown(u32),
}

impl Orientation {
    pub fn from_exif(value: u32) -> Self {
        match value {
            1 => Orientation::Normal,
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270,
            other => Orientation::Unknown(other),
        }
    }

    pub fn exif_value(self) -> Option<u32> {
        match self {
            Orientation::Absent => None,
            Orientation::Normal => Some(1),
            Orientation::FlipHorizontal => Some(2),
            Orientation::Rotate180 => Some(3),
            Orientation::FlipVertical => Some(4),
            Orientation::Transpose => Some(5),
            Orientation::Rotate90 => Some(6),
            Orientation::Transverse => Some(7),
            Orientation::Rotate270 => Some(8),
            Orientation::Unknown(v) => Some(v),
        }
    }

    /// Whether the upright image has width and height swapped.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90
                | Orientation::Transverse
                | Orientation::Rotate270
        )
    }
}

/// Image orientation operations (rotation and flipping)
pub struct ImageOrientation;

impl ImageOrientation {
    /// Turn a decoded image upright according to its orientation tag.
    ///
    /// Exactly one transform is applied per tag. Angles below are clockwise; the
    /// flips are applied after the rotation. Absent and unknown tags leave the
    /// image untouched.
    pub fn resolve(img: DynamicImage, orientation: Orientation) -> DynamicImage {
        tracing::debug!(
            orientation = ?orientation,
            swaps_dimensions = orientation.swaps_dimensions(),
            "Resolving EXIF orientation"
        );

        match orientation {
            Orientation::Absent | Orientation::Normal | Orientation::Unknown(_) => img,
            Orientation::FlipHorizontal => Self::apply_flip_horizontal(img),
            Orientation::Rotate180 => Self::rotate_by_angle(img, 180),
            Orientation::FlipVertical => {
                Self::apply_flip_horizontal(Self::rotate_by_angle(img, 180))
            }
            Orientation::Transpose => Self::apply_flip_vertical(Self::rotate_by_angle(img, 270)),
            Orientation::Rotate90 => Self::rotate_by_angle(img, 90),
            Orientation::Transverse => Self::apply_flip_vertical(Self::rotate_by_angle(img, 90)),
            Orientation::Rotate270 => Self::rotate_by_angle(img, 270),
        }
    }

    /// Rotate image by specified angle (90, 180, or 270 degrees clockwise)
    ///
    /// Quarter turns permute pixels exactly, so the rotated bounds never expose
    /// uncovered area and no fill is needed. The color type is kept as-is.
    pub fn rotate_by_angle(img: DynamicImage, angle: u16) -> DynamicImage {
        match angle {
            90 => img.rotate90(),
            180 => img.rotate180(),
            270 => img.rotate270(),
            _ => img,
        }
    }

    /// Apply horizontal flip (mirror)
    pub fn apply_flip_horizontal(img: DynamicImage) -> DynamicImage {
        img.fliph()
    }

    /// Apply vertical flip
    pub fn apply_flip_vertical(img: DynamicImage) -> DynamicImage {
        img.flipv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    const W: u32 = 4;
    const H: u32 = 3;

    /// Every pixel encodes its own coordinates so corners can be traced.
    fn coordinate_image() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(W, H, |x, y| {
            Rgba([x as u8 * 10, y as u8 * 10, 7, 255])
        }))
    }

    fn source_pixel(x: u32, y: u32) -> Rgba<u8> {
        Rgba([x as u8 * 10, y as u8 * 10, 7, 255])
    }

    #[test]
    fn test_from_exif_values() {
        for value in 1..=8 {
            let orientation = Orientation::from_exif(value);
            assert_eq!(orientation.exif_value(), Some(value));
            assert!(!matches!(orientation, Orientation::Unknown(_)));
        }
        assert_eq!(Orientation::from_exif(0), Orientation::Unknown(0));
        assert_eq!(Orientation::from_exif(9), Orientation::Unknown(9));
        assert_eq!(Orientation::Absent.exif_value(), None);
    }

    #[test]
    fn test_dimensions_for_all_tags() {
        for value in 1..=8 {
            let orientation = Orientation::from_exif(value);
            let out = ImageOrientation::resolve(coordinate_image(), orientation);
            if value >= 5 {
                assert_eq!(out.dimensions(), (H, W), "tag {}", value);
            } else {
                assert_eq!(out.dimensions(), (W, H), "tag {}", value);
            }
        }

        let out = ImageOrientation::resolve(coordinate_image(), Orientation::Absent);
        assert_eq!(out.dimensions(), (W, H));
    }

    #[test]
    fn test_corner_mapping_for_all_tags() {
        // Stored pixel that ends up at the upright top-left corner
        let expected = [
            (Orientation::Absent, (0, 0)),
            (Orientation::Normal, (0, 0)),
            (Orientation::FlipHorizontal, (W - 1, 0)),
            (Orientation::Rotate180, (W - 1, H - 1)),
            (Orientation::FlipVertical, (0, H - 1)),
            (Orientation::Transpose, (0, 0)),
            (Orientation::Rotate90, (0, H - 1)),
            (Orientation::Transverse, (W - 1, H - 1)),
            (Orientation::Rotate270, (W - 1, 0)),
        ];

        for (orientation, (sx, sy)) in expected {
            let out = ImageOrientation::resolve(coordinate_image(), orientation);
            assert_eq!(
                out.get_pixel(0, 0),
                source_pixel(sx, sy),
                "orientation {:?}",
                orientation
            );
        }
    }

    #[test]
    fn test_transpose_is_a_true_transpose() {
        let out = ImageOrientation::resolve(coordinate_image(), Orientation::Transpose);
        for y in 0..W {
            for x in 0..H {
                assert_eq!(out.get_pixel(x, y), source_pixel(y, x));
            }
        }
    }

    #[test]
    fn test_unknown_tag_is_identity() {
        let img = coordinate_image();
        let out = ImageOrientation::resolve(img.clone(), Orientation::Unknown(42));
        assert_eq!(out.to_rgba8(), img.to_rgba8());
    }

    #[test]
    fn test_rotation_keeps_color_type() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(4, 2));
        let rotated = ImageOrientation::rotate_by_angle(img, 90);
        assert_eq!(rotated.dimensions(), (2, 4));
        assert!(matches!(rotated, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_rotate_by_invalid_angle() {
        let img = coordinate_image();
        let rotated = ImageOrientation::rotate_by_angle(img.clone(), 45);
        assert_eq!(rotated.dimensions(), img.dimensions());
    }

    #[test]
    fn test_no_transparent_fill_for_quarter_turns() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(5, 3, Rgba([1, 2, 3, 255])));
        for orientation in [
            Orientation::Rotate90,
            Orientation::Rotate180,
            Orientation::Rotate270,
            Orientation::Transverse,
        ] {
            let out = ImageOrientation::resolve(img.clone(), orientation).to_rgba8();
            assert!(out.pixels().all(|p| p[3] == 255));
        }
    }
}
