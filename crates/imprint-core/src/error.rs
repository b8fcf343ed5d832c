//! Error types module
//!
//! Errors are split by blast radius. Configuration errors are reported before any
//! image is touched, shared-resource errors abort the run, and per-item errors skip
//! a single source file while the batch carries on.

use std::io;
use std::path::PathBuf;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Info level - for inputs that are skipped on purpose, like HEIC photos
    Info,
    /// Warning level - for recoverable per-item failures
    Warn,
    /// Error level - for failures that end the run
    Error,
}

/// Describes how an error should be reported and whether the batch may continue.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "DECODE_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether the batch can proceed to the next item
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Invalid settings, detected before processing starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("only one of max dimension or width/height may be set")]
    ConflictingResize,

    #[error("opacity must be within 0.0..=1.0, got {0}")]
    InvalidOpacity(f64),

    #[error("watermark scale factor must be a finite, non-negative percentage, got {0}")]
    InvalidScaleFactor(f64),

    #[error("scaled watermark would be {width}x{height}, larger than {limit} pixels per side")]
    WatermarkTooLarge { width: u32, height: u32, limit: u32 },

    #[error("max dimension must be greater than zero")]
    InvalidMaxDimension,

    #[error("invalid filename suffix mode: {0} (allowed: 3DIGITSCOUNT, RAND)")]
    InvalidNamingMode(String),

    #[error("invalid quality preset: {0}")]
    InvalidQuality(String),

    #[error("missing required setting: {0}")]
    MissingPath(&'static str),
}

/// Failure of a resource every item depends on.
#[derive(Debug, thiserror::Error)]
pub enum SharedResourceError {
    #[error("cannot read watermark {}: {source}", path.display())]
    WatermarkUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot decode watermark {}: {reason}", path.display())]
    WatermarkUndecodable { path: PathBuf, reason: String },

    #[error("cannot list source directory {}: {source}", path.display())]
    SourceDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot prepare target directory {}: {source}", path.display())]
    TargetDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure confined to a single source image.
#[derive(Debug, thiserror::Error)]
pub enum PerItemError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported content type {mime} for {}", path.display())]
    Unsupported { path: PathBuf, mime: String },

    #[error("cannot decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("cannot read EXIF metadata of {}: {reason}", path.display())]
    Metadata { path: PathBuf, reason: String },

    #[error("cannot encode {}: {reason}", path.display())]
    Encode { path: PathBuf, reason: String },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Shared resource error: {0}")]
    SharedResource(#[from] SharedResourceError),

    #[error("Item error: {0}")]
    Item(#[from] PerItemError),
}

/// HEIC/HEIF content type, as reported by content sniffing.
pub fn is_heic(mime: &str) -> bool {
    matches!(mime, "image/heic" | "image/heif")
}

impl ErrorMetadata for PerItemError {
    fn error_code(&self) -> &'static str {
        match self {
            PerItemError::Read { .. } => "READ_FAILED",
            PerItemError::Unsupported { .. } => "UNSUPPORTED_FORMAT",
            PerItemError::Decode { .. } => "DECODE_FAILED",
            PerItemError::Metadata { .. } => "METADATA_FAILED",
            PerItemError::Encode { .. } => "ENCODE_FAILED",
            PerItemError::Write { .. } => "WRITE_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        true
    }

    fn log_level(&self) -> LogLevel {
        match self {
            PerItemError::Unsupported { mime, .. } if is_heic(mime) => LogLevel::Info,
            _ => LogLevel::Warn,
        }
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::SharedResource(_) => "SHARED_RESOURCE_ERROR",
            AppError::Item(e) => e.error_code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, AppError::Item(_))
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AppError::Config(_) | AppError::SharedResource(_) => LogLevel::Error,
            AppError::Item(e) => e.log_level(),
        }
    }
}
