//! Configuration module
//!
//! The batch configuration is built once, validated before the first image is
//! read, and then passed by reference into every stage of the pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::naming::NamingPolicy;

pub const DEFAULT_SCALE_PERCENT: f64 = 100.0;
pub const DEFAULT_OPACITY: f64 = 0.5;
pub const DEFAULT_MARGIN: u32 = 20;
/// Largest side a scaled watermark may have, in pixels.
pub const MAX_WATERMARK_SIDE: u32 = 16_384;

/// Placement and blending settings for the shared watermark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WatermarkSettings {
    /// Scale applied to the watermark raster, in percent of its own size
    pub scale_percent: f64,
    /// Global opacity multiplied into the watermark's own alpha
    pub opacity: f64,
    pub margin_right: u32,
    pub margin_bottom: u32,
}

impl WatermarkSettings {
    pub fn new(
        scale_percent: f64,
        opacity: f64,
        margin_right: u32,
        margin_bottom: u32,
    ) -> Result<Self, ConfigError> {
        let settings = Self {
            scale_percent,
            opacity,
            margin_right,
            margin_bottom,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Reject out-of-range values instead of clamping them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.opacity.is_finite() || !(0.0..=1.0).contains(&self.opacity) {
            return Err(ConfigError::InvalidOpacity(self.opacity));
        }
        if !self.scale_percent.is_finite() || self.scale_percent < 0.0 {
            return Err(ConfigError::InvalidScaleFactor(self.scale_percent));
        }
        Ok(())
    }

    /// Watermark dimensions after scaling: `floor(side * scale_percent / 100)`.
    ///
    /// Saturates at `u32::MAX`; see [`Self::check_scaled_size`].
    pub fn scaled_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let scale = |side: u32| (side as f64 * self.scale_percent / 100.0).floor() as u32;
        (scale(width), scale(height))
    }

    /// Reject a scale factor that would blow a `width` x `height` watermark up
    /// beyond [`MAX_WATERMARK_SIDE`].
    pub fn check_scaled_size(&self, width: u32, height: u32) -> Result<(), ConfigError> {
        let (scaled_width, scaled_height) = self.scaled_dimensions(width, height);
        if scaled_width > MAX_WATERMARK_SIDE || scaled_height > MAX_WATERMARK_SIDE {
            return Err(ConfigError::WatermarkTooLarge {
                width: scaled_width,
                height: scaled_height,
                limit: MAX_WATERMARK_SIDE,
            });
        }
        Ok(())
    }
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            scale_percent: DEFAULT_SCALE_PERCENT,
            opacity: DEFAULT_OPACITY,
            margin_right: DEFAULT_MARGIN,
            margin_bottom: DEFAULT_MARGIN,
        }
    }
}

/// How the watermarked image is resized before the overlay is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResizePolicy {
    #[default]
    None,
    /// Longer side becomes `n`, aspect ratio preserved
    MaxDimension(u32),
    /// Exact size; a zero side is derived from the other one
    ExplicitSize { width: u32, height: u32 },
}

impl ResizePolicy {
    /// Build a policy from the raw option values, where zero means "unset".
    pub fn from_options(max_dimension: u32, width: u32, height: u32) -> Result<Self, ConfigError> {
        match (max_dimension, width, height) {
            (0, 0, 0) => Ok(ResizePolicy::None),
            (n, 0, 0) => Ok(ResizePolicy::MaxDimension(n)),
            (0, width, height) => Ok(ResizePolicy::ExplicitSize { width, height }),
            _ => Err(ConfigError::ConflictingResize),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ResizePolicy::MaxDimension(0) => Err(ConfigError::InvalidMaxDimension),
            _ => Ok(()),
        }
    }
}

/// Quality presets for JPEG output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QualityPreset {
    #[default]
    Normal, // Default quality, balanced size and quality
    Better,   // Higher quality
    Best,     // Near pristine quality
    Lighter,  // Smaller files
    Lightest, // Maximum compression
}

impl QualityPreset {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(QualityPreset::Normal),
            "better" => Ok(QualityPreset::Better),
            "best" => Ok(QualityPreset::Best),
            "lighter" => Ok(QualityPreset::Lighter),
            "lightest" => Ok(QualityPreset::Lightest),
            _ => Err(ConfigError::InvalidQuality(s.to_string())),
        }
    }

    /// Get quality value for JPEG (0-100)
    pub fn jpeg_quality(self) -> u8 {
        match self {
            QualityPreset::Normal => 75,
            QualityPreset::Better => 85,
            QualityPreset::Best => 95,
            QualityPreset::Lighter => 65,
            QualityPreset::Lightest => 50,
        }
    }
}

/// Immutable settings for one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    pub watermark_path: PathBuf,
    pub watermark: WatermarkSettings,
    pub resize: ResizePolicy,
    pub naming: NamingPolicy,
    pub quality: QualityPreset,
}

impl BatchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingPath("source directory"));
        }
        if self.target_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingPath("target directory"));
        }
        if self.watermark_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingPath("watermark image file"));
        }
        self.watermark.validate()?;
        self.resize.validate()?;
        Ok(())
    }
}
