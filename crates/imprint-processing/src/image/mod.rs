//! Image processing module
//!
//! This module provides the image stages of the pipeline:
//! - Decoding and EXIF orientation reading (processor)
//! - Orientation normalization (orientation)
//! - Output dimension policy and resampling (resize)
//! - Watermark scaling, placement and blending (watermark)

pub mod orientation;
pub mod processor;
pub mod resize;
pub mod watermark;

pub use orientation::{ImageOrientation, Orientation};
pub use processor::ImageProcessor;
pub use resize::ImageResize;
pub use watermark::{CompositeResult, Compositor, WatermarkSpec};
