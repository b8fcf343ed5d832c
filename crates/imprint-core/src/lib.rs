//! Imprint Core Library
//!
//! This crate provides the error taxonomy, the immutable batch configuration and
//! the output naming policy shared by the processing pipeline and the batch driver.

pub mod config;
pub mod error;
pub mod naming;

// Re-export commonly used types
pub use config::{
    BatchConfig, QualityPreset, ResizePolicy, WatermarkSettings, MAX_WATERMARK_SIDE,
};
pub use error::{
    is_heic, AppError, ConfigError, ErrorMetadata, LogLevel, PerItemError, SharedResourceError,
};
pub use naming::{NamingPolicy, OutputNamer, SuffixMode};
