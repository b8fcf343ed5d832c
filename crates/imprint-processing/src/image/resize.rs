use image::{imageops::FilterType, DynamicImage, GenericImageView};
use imprint_core::ResizePolicy;

/// Image resize operations
pub struct ImageResize;

impl ImageResize {
    /// Kernel for the image that ends up on disk.
    pub const OUTPUT_FILTER: FilterType = FilterType::Lanczos3;

    /// Calculate target dimensions for a resize policy.
    ///
    /// Aspect-preserving results use integer truncation and never drop below one
    /// pixel on either side.
    pub fn calculate_dimensions(
        orig_width: u32,
        orig_height: u32,
        policy: ResizePolicy,
    ) -> (u32, u32) {
        if orig_width == 0 || orig_height == 0 {
            return (orig_width, orig_height);
        }

        match policy {
            ResizePolicy::None => (orig_width, orig_height),
            ResizePolicy::MaxDimension(n) => {
                if orig_height > orig_width {
                    (Self::scale_side(n, orig_width, orig_height), n)
                } else {
                    (n, Self::scale_side(n, orig_height, orig_width))
                }
            }
            ResizePolicy::ExplicitSize { width, height } => match (width, height) {
                (0, 0) => (orig_width, orig_height),
                (w, 0) => (w, Self::scale_side(w, orig_height, orig_width)),
                (0, h) => (Self::scale_side(h, orig_width, orig_height), h),
                (w, h) => (w, h),
            },
        }
    }

    /// `floor(target * side / reference)`, at least 1.
    fn scale_side(target: u32, side: u32, reference: u32) -> u32 {
        let scaled = target as u64 * side as u64 / reference as u64;
        scaled.clamp(1, u32::MAX as u64) as u32
    }

    /// Select a filter for scaling the watermark raster based on resize ratio
    ///
    /// All candidates are interpolating kernels; nearest-neighbour is never used.
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> FilterType {
        let width_ratio = orig_width as f32 / new_width as f32;
        let height_ratio = orig_height as f32 / new_height as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            FilterType::Triangle
        } else if max_ratio > 1.5 {
            FilterType::CatmullRom
        } else {
            FilterType::Lanczos3
        }
    }

    /// Resize image to exact dimensions with [`Self::OUTPUT_FILTER`].
    pub fn resize_image(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        img.resize_exact(width, height, Self::OUTPUT_FILTER)
    }

    /// Apply a resize policy, returning the image untouched when the size
    /// does not change.
    pub fn apply_policy(img: DynamicImage, policy: ResizePolicy) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        let (target_width, target_height) =
            Self::calculate_dimensions(orig_width, orig_height, policy);

        if (target_width, target_height) == (orig_width, orig_height) {
            return img;
        }

        tracing::debug!(
            policy = ?policy,
            from = ?(orig_width, orig_height),
            to = ?(target_width, target_height),
            "Resizing image"
        );

        Self::resize_image(&img, target_width, target_height)
    }
}
