//! Image preprocessing for OCR
//!
//! Decodes uploads and normalizes them into grayscale (optionally binarized)
//! images before they reach the OCR engine.

pub mod pipeline;
pub mod steps;

pub use pipeline::{Pipeline, PreprocessingResult, Preset, StepTiming};

use crate::error::OcrError;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;

/// Raster formats accepted for upload
pub const SUPPORTED_FORMATS: &[ImageFormat] =
    &[ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Bmp];

/// Decode an image file, sniffing the format from its contents
pub fn load(path: &Path) -> Result<DynamicImage, OcrError> {
    let reader = ImageReader::open(path)
        .map_err(|e| OcrError::DecodeError(format!("Failed to open image: {}", e)))?
        .with_guessed_format()
        .map_err(|e| OcrError::DecodeError(format!("Failed to read image: {}", e)))?;

    match reader.format() {
        Some(format) if SUPPORTED_FORMATS.contains(&format) => {}
        Some(format) => {
            return Err(OcrError::UnsupportedFormat(format!("{:?}", format)));
        }
        None => {
            return Err(OcrError::DecodeError("unrecognized image data".to_string()));
        }
    }

    reader
        .decode()
        .map_err(|e| OcrError::DecodeError(format!("Failed to decode image: {}", e)))
}
