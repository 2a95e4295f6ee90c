use crate::error::OcrError;
use image::DynamicImage;
use std::time::Instant;

use super::steps;

/// Preprocessing preset names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// Steps: grayscale, blur
    #[default]
    Standard,
    /// Steps: grayscale, blur, adaptive threshold
    Advanced,
}

impl Preset {
    /// Preset selected by the "advanced processing" toggle
    pub fn from_toggle(advanced: bool) -> Self {
        if advanced {
            Self::Advanced
        } else {
            Self::Standard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Advanced => "advanced",
        }
    }
}

/// Timing information for a single preprocessing step
#[derive(Debug, Clone)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of preprocessing including timing stats
#[derive(Debug, Clone)]
pub struct PreprocessingResult {
    pub image: DynamicImage,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

/// Preprocessing pipeline that applies steps based on preset
pub struct Pipeline {
    preset: Preset,
}

impl Pipeline {
    pub fn new(preset: Preset) -> Self {
        Self { preset }
    }

    /// Process an image according to the configured preset
    pub fn process(&self, image: DynamicImage) -> Result<PreprocessingResult, OcrError> {
        let start = Instant::now();
        let mut steps_timing = Vec::new();

        let mut img = image;
        img = self.run_step("grayscale", img, &mut steps_timing, steps::grayscale::apply)?;
        img = self.run_step("blur", img, &mut steps_timing, steps::blur::apply)?;

        if self.preset == Preset::Advanced {
            img = self.run_step("threshold", img, &mut steps_timing, steps::threshold::apply)?;
        }

        Ok(PreprocessingResult {
            image: img,
            total_time_ms: start.elapsed().as_millis() as u64,
            steps: steps_timing,
        })
    }

    fn run_step<F>(
        &self,
        name: &str,
        img: DynamicImage,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> Result<DynamicImage, OcrError>
    where
        F: FnOnce(DynamicImage) -> Result<DynamicImage, OcrError>,
    {
        let step_start = Instant::now();
        let result = step_fn(img)?;
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms: step_start.elapsed().as_millis() as u64,
        });
        Ok(result)
    }
}
