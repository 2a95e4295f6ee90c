use crate::error::OcrError;
use image::DynamicImage;

/// Confidence value the engine reports for rows that are not recognized words
pub const NO_CONFIDENCE: f32 = -1.0;

/// Per-token output of a data-mode OCR pass
#[derive(Debug, Clone, Default)]
pub struct TokenData {
    /// Raw per-token confidences (0-100), sentinel values included
    pub confidences: Vec<f32>,
}

impl TokenData {
    pub fn new(confidences: Vec<f32>) -> Self {
        Self { confidences }
    }

    /// Arithmetic mean over tokens carrying a real score.
    ///
    /// Returns `None` when every token is a sentinel (or there are none).
    pub fn mean_confidence(&self) -> Option<f64> {
        let valid: Vec<f64> = self
            .confidences
            .iter()
            .filter(|c| **c >= 0.0)
            .map(|c| *c as f64)
            .collect();

        if valid.is_empty() {
            return None;
        }

        Some(valid.iter().sum::<f64>() / valid.len() as f64)
    }
}

/// Trait that all OCR engines must implement
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "tesseract")
    fn name(&self) -> &'static str;

    /// Data mode: per-token confidences for `image` read as `language_code`
    fn recognize_data(
        &self,
        image: &DynamicImage,
        language_code: &str,
    ) -> Result<TokenData, OcrError>;

    /// Text mode: the recognized text for `image` read as `language_code`
    fn recognize_text(&self, image: &DynamicImage, language_code: &str)
        -> Result<String, OcrError>;

    /// Languages the engine has data installed for, if it can tell
    fn installed_languages(&self) -> Option<Vec<String>> {
        None
    }
}
