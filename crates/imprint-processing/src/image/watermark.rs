use std::borrow::Cow;

use image::{imageops, DynamicImage, ImageBuffer, ImageReader, Pixel, RgbImage, RgbaImage};
use imprint_core::{ConfigError, ResizePolicy, WatermarkSettings};
use std::io::Cursor;

use crate::image::resize::ImageResize;

/// The shared watermark raster together with its placement settings.
///
/// Loaded once per run and only ever read; scaling works on a copy.
#[derive(Debug, Clone)]
pub struct WatermarkSpec {
    pub raster: RgbaImage,
    pub settings: WatermarkSettings,
}

impl WatermarkSpec {
    /// Fails when the settings are invalid or would scale this raster past
    /// the size limit.
    pub fn new(raster: RgbaImage, settings: WatermarkSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        settings.check_scaled_size(raster.width(), raster.height())?;
        Ok(Self { raster, settings })
    }

    /// Decode watermark image data (any supported format) into an RGBA raster.
    pub fn decode_raster(data: &[u8]) -> Result<RgbaImage, anyhow::Error> {
        let cursor = Cursor::new(data);
        let reader = ImageReader::new(cursor).with_guessed_format()?;
        Ok(reader.decode()?.to_rgba8())
    }

    /// Watermark raster at the configured scale.
    ///
    /// Borrows the original when the scale leaves the size unchanged and returns
    /// `None` when either side truncates to zero.
    pub fn scaled(&self) -> Option<Cow<'_, RgbaImage>> {
        let (width, height) = self.raster.dimensions();
        let (target_width, target_height) = self.settings.scaled_dimensions(width, height);

        if target_width == 0 || target_height == 0 {
            return None;
        }
        if (target_width, target_height) == (width, height) {
            return Some(Cow::Borrowed(&self.raster));
        }

        let filter = ImageResize::select_filter(width, height, target_width, target_height);
        Some(Cow::Owned(imageops::resize(
            &self.raster,
            target_width,
            target_height,
            filter,
        )))
    }
}

/// Final raster of one item plus the extension it should be written with.
#[derive(Debug, Clone)]
pub struct CompositeResult {
    pub image: DynamicImage,
    /// Taken from the source file, never from the watermark
    pub extension: String,
}

pub struct Compositor;

impl Compositor {
    /// Scale the watermark, resize the upright source, place and blend.
    pub fn composite(
        source: DynamicImage,
        spec: &WatermarkSpec,
        resize: ResizePolicy,
        extension: &str,
    ) -> CompositeResult {
        let scaled = spec.scaled();

        let resized = ImageResize::apply_policy(source, resize);
        let mut canvas = Canvas::from_image(resized);

        match scaled {
            Some(watermark) => {
                let (img_width, img_height) = canvas.dimensions();
                let (x, y) = Self::overlay_anchor(
                    (img_width, img_height),
                    watermark.dimensions(),
                    &spec.settings,
                );

                tracing::debug!(
                    image = ?(img_width, img_height),
                    watermark = ?watermark.dimensions(),
                    x = x,
                    y = y,
                    opacity = spec.settings.opacity,
                    "Applying watermark"
                );

                match &mut canvas {
                    Canvas::Rgb(buffer) => {
                        Self::blend(buffer, &watermark, x, y, spec.settings.opacity)
                    }
                    Canvas::Rgba(buffer) => {
                        Self::blend(buffer, &watermark, x, y, spec.settings.opacity)
                    }
                }
            }
            None => {
                tracing::debug!(
                    scale_percent = spec.settings.scale_percent,
                    "Watermark scaled to zero size, skipping overlay"
                );
            }
        }

        CompositeResult {
            image: canvas.into_image(),
            extension: extension.to_string(),
        }
    }

    /// Top-left corner of the watermark, measured from the bottom-right margins.
    ///
    /// Not clamped: a watermark larger than the image minus margins yields negative
    /// coordinates and is clipped during blending.
    pub fn overlay_anchor(
        image: (u32, u32),
        watermark: (u32, u32),
        settings: &WatermarkSettings,
    ) -> (i64, i64) {
        (
            image.0 as i64 - watermark.0 as i64 - settings.margin_right as i64,
            image.1 as i64 - watermark.1 as i64 - settings.margin_bottom as i64,
        )
    }

    /// Blend the watermark's color channels into `base` at `(x, y)`.
    ///
    /// `out = src * (1 - a) + wm * a` with `a = wm_alpha / 255 * opacity`, applied to
    /// the first three channels only. The base alpha channel, if any, is untouched.
    pub fn blend<P>(
        base: &mut ImageBuffer<P, Vec<u8>>,
        watermark: &RgbaImage,
        x: i64,
        y: i64,
        opacity: f64,
    ) where
        P: Pixel<Subpixel = u8>,
    {
        let (base_width, base_height) = base.dimensions();
        let (wm_width, wm_height) = watermark.dimensions();

        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + wm_width as i64).min(base_width as i64);
        let y1 = (y + wm_height as i64).min(base_height as i64);

        if x0 >= x1 || y0 >= y1 {
            return;
        }

        for by in y0..y1 {
            for bx in x0..x1 {
                let wm = watermark.get_pixel((bx - x) as u32, (by - y) as u32);
                let alpha = wm[3] as f64 / 255.0 * opacity;
                if alpha <= 0.0 {
                    continue;
                }

                let pixel = base.get_pixel_mut(bx as u32, by as u32);
                for (channel, wm_value) in pixel.channels_mut().iter_mut().zip(wm.0).take(3) {
                    let blended = *channel as f64 * (1.0 - alpha) + wm_value as f64 * alpha;
                    *channel = blended.round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    }
}

/// Blend target: 8-bit RGB, or RGBA when the source carries alpha.
enum Canvas {
    Rgb(RgbImage),
    Rgba(RgbaImage),
}

impl Canvas {
    fn from_image(img: DynamicImage) -> Self {
        match img {
            DynamicImage::ImageRgb8(buffer) => Canvas::Rgb(buffer),
            DynamicImage::ImageRgba8(buffer) => Canvas::Rgba(buffer),
            other if other.color().has_alpha() => Canvas::Rgba(other.to_rgba8()),
            other => Canvas::Rgb(other.to_rgb8()),
        }
    }

    fn dimensions(&self) -> (u32, u32) {
        match self {
            Canvas::Rgb(buffer) => buffer.dimensions(),
            Canvas::Rgba(buffer) => buffer.dimensions(),
        }
    }

    fn into_image(self) -> DynamicImage {
        match self {
            Canvas::Rgb(buffer) => DynamicImage::ImageRgb8(buffer),
            Canvas::Rgba(buffer) => DynamicImage::ImageRgba8(buffer),
        }
    }
}
