//! Imprint CLI: batch-apply a watermark to a directory of photographs.
//!
//! Every flag can also be set through its IMPRINT_* environment variable or a `.env` file.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use imprint_cli::{init_tracing, run, LogFormat};
use imprint_core::{
    AppError, BatchConfig, NamingPolicy, QualityPreset, ResizePolicy, WatermarkSettings,
};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "imprint", version, about = "Batch watermark photographs")]
struct Cli {
    /// Directory with the original images
    #[arg(long, env = "IMPRINT_SOURCE_DIR")]
    source_dir: PathBuf,

    /// Directory for the watermarked images (created if missing)
    #[arg(long, env = "IMPRINT_TARGET_DIR")]
    target_dir: PathBuf,

    /// Watermark image file, usually a PNG with transparency
    #[arg(long, env = "IMPRINT_WATERMARK")]
    watermark: PathBuf,

    /// Scale factor for the watermark, in percent
    #[arg(long, env = "IMPRINT_SCALE", default_value_t = 100.0)]
    scale: f64,

    /// Opacity of the watermark (0.0 to 1.0)
    #[arg(long, env = "IMPRINT_OPACITY", default_value_t = 0.5)]
    opacity: f64,

    /// Margin from the right edge, in pixels
    #[arg(long, env = "IMPRINT_MARGIN_RIGHT", default_value_t = 20)]
    margin_right: u32,

    /// Margin from the bottom edge, in pixels
    #[arg(long, env = "IMPRINT_MARGIN_BOTTOM", default_value_t = 20)]
    margin_bottom: u32,

    /// Longest side of the output image; 0 keeps the original size
    #[arg(long, env = "IMPRINT_MAX_DIMENSION", default_value_t = 0)]
    max_dimension: u32,

    /// Output width; with height 0 the aspect ratio is preserved
    #[arg(long, env = "IMPRINT_WIDTH", default_value_t = 0)]
    width: u32,

    /// Output height; with width 0 the aspect ratio is preserved
    #[arg(long, env = "IMPRINT_HEIGHT", default_value_t = 0)]
    height: u32,

    /// Rename every output file to this prefix plus a suffix
    #[arg(long, env = "IMPRINT_FILENAME")]
    filename: Option<String>,

    /// Suffix for renamed files: 3DIGITSCOUNT or RAND
    #[arg(long, env = "IMPRINT_SUFFIX", default_value = "3DIGITSCOUNT")]
    suffix: String,

    /// JPEG quality: lightest, lighter, normal, better, best
    #[arg(long, env = "IMPRINT_QUALITY", default_value = "normal")]
    quality: String,

    /// Log output format
    #[arg(long, env = "IMPRINT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

impl Cli {
    fn into_config(self) -> Result<BatchConfig, AppError> {
        let config = BatchConfig {
            source_dir: self.source_dir,
            target_dir: self.target_dir,
            watermark_path: self.watermark,
            watermark: WatermarkSettings::new(
                self.scale,
                self.opacity,
                self.margin_right,
                self.margin_bottom,
            )?,
            resize: ResizePolicy::from_options(self.max_dimension, self.width, self.height)?,
            naming: NamingPolicy::from_options(self.filename.as_deref(), &self.suffix)?,
            quality: QualityPreset::parse(&self.quality)?,
        };
        config.validate()?;
        Ok(config)
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize report")?;
    println!("{}", out);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = cli.into_config().context("Invalid configuration")?;
    tracing::debug!(
        watermark = ?config.watermark,
        resize = ?config.resize,
        naming = ?config.naming,
        "Configuration loaded"
    );

    let report = run(&config).inspect_err(|e| {
        tracing::error!(error = %e, "Batch aborted");
    })?;
    print_json(&report)?;

    Ok(())
}
