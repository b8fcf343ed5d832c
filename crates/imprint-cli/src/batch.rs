//! Batch driver: walks the source directory and watermarks every image in it.
//!
//! Configuration and watermark problems abort the run before the first item.
//! Anything that goes wrong with a single source file is logged and the run
//! moves on to the next one.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use imprint_core::{
    AppError, BatchConfig, ErrorMetadata, LogLevel, OutputNamer, PerItemError,
    SharedResourceError,
};
use imprint_processing::{
    ImageCompressor, ImagePipeline, SourceFilter, SourceKind, WatermarkSpec,
};
use serde::Serialize;

/// Outcome counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Run a whole batch.
pub fn run(config: &BatchConfig) -> Result<BatchReport, AppError> {
    config.validate()?;

    let watermark = load_watermark(config)?;
    fs::create_dir_all(&config.target_dir).map_err(|source| {
        SharedResourceError::TargetDirectory {
            path: config.target_dir.clone(),
            source,
        }
    })?;
    let sources = list_sources(&config.source_dir)?;

    tracing::info!(
        source_dir = %config.source_dir.display(),
        files = sources.len(),
        "Processing images"
    );

    let pipeline = ImagePipeline::with_encoder(ImageCompressor::new(config.quality));
    let mut namer = OutputNamer::new(config.naming.clone());
    let mut report = BatchReport::default();

    for path in sources {
        if SourceFilter::is_hidden(&path) {
            continue;
        }

        match process_one(&path, config, &watermark, &pipeline, &namer) {
            Ok(dest) => {
                tracing::info!(
                    source = %path.display(),
                    target = %dest.display(),
                    "Saved watermarked image"
                );
                report.processed += 1;
                namer.advance();
            }
            Err(e @ PerItemError::Unsupported { .. }) => {
                log_item_error(&e);
                report.skipped += 1;
            }
            Err(e) => {
                log_item_error(&e);
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        processed = report.processed,
        skipped = report.skipped,
        failed = report.failed,
        "Batch complete"
    );

    Ok(report)
}

/// Read and decode the watermark once; its size is checked against the scale here.
fn load_watermark(config: &BatchConfig) -> Result<WatermarkSpec, AppError> {
    let path = &config.watermark_path;
    let data = fs::read(path).map_err(|source| SharedResourceError::WatermarkUnreadable {
        path: path.clone(),
        source,
    })?;

    let raster = WatermarkSpec::decode_raster(&data).map_err(|e| {
        SharedResourceError::WatermarkUndecodable {
            path: path.clone(),
            reason: format!("{:#}", e),
        }
    })?;
    let spec = WatermarkSpec::new(raster, config.watermark)?;

    tracing::debug!(
        file = %path.display(),
        width = spec.raster.width(),
        height = spec.raster.height(),
        "Loaded watermark"
    );

    Ok(spec)
}

/// Regular files directly inside `dir`, sorted by file name.
fn list_sources(dir: &Path) -> Result<Vec<PathBuf>, SharedResourceError> {
    let to_error = |source| SharedResourceError::SourceDirectory {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(to_error)? {
        let entry = entry.map_err(to_error)?;
        let file_type = entry.file_type().map_err(to_error)?;
        if file_type.is_file() {
            files.push(entry.path());
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn process_one(
    path: &Path,
    config: &BatchConfig,
    watermark: &WatermarkSpec,
    pipeline: &ImagePipeline,
    namer: &OutputNamer,
) -> Result<PathBuf, PerItemError> {
    let data = fs::read(path).map_err(|source| PerItemError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    match SourceFilter::classify(path, &data) {
        SourceKind::Supported { .. } => {}
        SourceKind::Heic => {
            return Err(PerItemError::Unsupported {
                path: path.to_path_buf(),
                mime: "image/heic".to_string(),
            });
        }
        SourceKind::Unsupported { mime } => {
            return Err(PerItemError::Unsupported {
                path: path.to_path_buf(),
                mime,
            });
        }
    }

    let processed = pipeline.process(path, &data, watermark, config.resize)?;

    let dest = config.target_dir.join(namer.file_name(path));
    write_atomic(&config.target_dir, &dest, &processed.data)?;

    Ok(dest)
}

/// Write through a temporary file in the target directory, renamed into place
/// only after the data is fully on disk.
fn write_atomic(dir: &Path, dest: &Path, data: &[u8]) -> Result<(), PerItemError> {
    let to_error = |source| PerItemError::Write {
        path: dest.to_path_buf(),
        source,
    };

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(to_error)?;
    file.write_all(data).map_err(to_error)?;
    file.as_file().sync_all().map_err(to_error)?;
    file.persist(dest).map_err(|e| to_error(e.error))?;
    Ok(())
}

fn log_item_error(err: &PerItemError) {
    let code = err.error_code();
    match err.log_level() {
        LogLevel::Info => tracing::info!(code, error = %err, "Skipping file"),
        LogLevel::Warn => tracing::warn!(code, error = %err, "Skipping file"),
        LogLevel::Error => tracing::error!(code, error = %err, "Skipping file"),
    }
}
