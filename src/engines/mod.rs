//! OCR engine implementations
//!
//! This module contains implementations of the OcrEngine trait for different
//! OCR backends. Engines are conditionally compiled based on feature flags.

#[cfg(feature = "engine-tesseract")]
pub mod tesseract;

use crate::config::Config;
use crate::engine::OcrEngine;
use crate::error::OcrError;
use std::sync::Arc;

/// Initialize the OCR engine compiled into this build
#[cfg(feature = "engine-tesseract")]
pub fn create(config: &Config) -> Result<Arc<dyn OcrEngine>, OcrError> {
    tracing::info!("Initializing tesseract engine...");
    let engine = tesseract::TesseractEngine::new(config)?;
    report_missing_languages(&engine, config);
    Ok(Arc::new(engine))
}

#[cfg(not(feature = "engine-tesseract"))]
pub fn create(_config: &Config) -> Result<Arc<dyn OcrEngine>, OcrError> {
    Err(OcrError::InitializationError(
        "No OCR engine available. Build with --features engine-tesseract".to_string(),
    ))
}

/// Warn about candidate languages the engine has no data for.
///
/// Those candidates still run; their selector attempt simply fails.
pub fn report_missing_languages(engine: &dyn OcrEngine, config: &Config) -> Vec<String> {
    let Some(installed) = engine.installed_languages() else {
        return Vec::new();
    };

    let mut missing = Vec::new();
    for lang in config.languages.iter() {
        if !installed.iter().any(|code| code == &lang.code) {
            tracing::warn!(
                language = %lang.name,
                code = %lang.code,
                "No {} language data installed; detection will skip it",
                engine.name()
            );
            missing.push(lang.name.clone());
        }
    }
    missing
}
