//! Extraction orchestration
//!
//! One staged upload in, one `Extraction` out: decode, preprocess, pick a
//! language, run the final text pass, persist. Failures never escape as
//! errors; they come back as `Extraction::Failed` for the caller to render.

use crate::db::Store;
use crate::engine::OcrEngine;
use crate::error::OcrError;
use crate::languages::LanguageSet;
use crate::models::{ExtractionResult, Status, UNKNOWN_LANGUAGE};
use crate::preprocessing::{self, Pipeline, Preset, StepTiming};
use crate::selector::{self, Selection};
use crate::staging::StagedUpload;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Outcome of one extraction request
#[derive(Debug)]
pub enum Extraction {
    /// The pipeline ran to completion and the result was stored
    Completed(ExtractionResult),
    /// The pipeline failed; `result` is the uniform error view
    Failed {
        error: OcrError,
        result: ExtractionResult,
    },
}

impl Extraction {
    pub fn result(&self) -> &ExtractionResult {
        match self {
            Extraction::Completed(result) => result,
            Extraction::Failed { result, .. } => result,
        }
    }

    pub fn into_result(self) -> ExtractionResult {
        match self {
            Extraction::Completed(result) => result,
            Extraction::Failed { result, .. } => result,
        }
    }
}

/// Everything the engine produced for one image
#[derive(Debug)]
pub(crate) struct Recognition {
    pub selection: Selection,
    pub text: String,
    pub preprocessing_ms: u64,
    pub steps: Vec<StepTiming>,
}

pub struct Extractor {
    engine: Arc<dyn OcrEngine>,
    store: Store,
    languages: LanguageSet,
    record_failures: bool,
    // Serializes extractions so requests are processed one at a time
    lock: Mutex<()>,
}

impl Extractor {
    pub fn new(engine: Arc<dyn OcrEngine>, store: Store, languages: LanguageSet) -> Self {
        Self {
            engine,
            store,
            languages,
            record_failures: false,
            lock: Mutex::new(()),
        }
    }

    /// Also store failed extractions (status "error")
    pub fn record_failures(mut self, enabled: bool) -> Self {
        self.record_failures = enabled;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn languages(&self) -> &LanguageSet {
        &self.languages
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub async fn extract(&self, upload: &StagedUpload, preset: Preset) -> Extraction {
        let _guard = self.lock.lock().await;
        let start = Instant::now();
        let image_path = upload.original_name().to_string();

        match self.run(upload.path(), &image_path, preset).await {
            Ok(result) => {
                tracing::info!(
                    id = ?result.id,
                    language = %result.language,
                    confidence = result.confidence,
                    status = %result.status,
                    preset = preset.as_str(),
                    "Extraction of {} finished in {}ms",
                    image_path,
                    start.elapsed().as_millis()
                );
                Extraction::Completed(result)
            }
            Err(error) => {
                tracing::warn!(code = error.code(), "Extraction of {} failed: {}", image_path, error);
                let mut result = failure_result(&image_path, &error);

                if self.record_failures {
                    match self.store.save(&result).await {
                        Ok(id) => result.id = Some(id),
                        Err(e) => tracing::error!("Failed to record failed extraction: {}", e),
                    }
                }

                Extraction::Failed { error, result }
            }
        }
    }

    async fn run(
        &self,
        path: &Path,
        image_path: &str,
        preset: Preset,
    ) -> Result<ExtractionResult, OcrError> {
        let engine = Arc::clone(&self.engine);
        let languages = self.languages.clone();
        let path = path.to_path_buf();

        let recognition = tokio::task::spawn_blocking(move || {
            recognize(engine.as_ref(), &path, preset, &languages)
        })
        .await
        .map_err(|e| OcrError::Internal(format!("recognition task failed: {}", e)))??;

        tracing::debug!(
            attempts = recognition.selection.attempts.len(),
            preprocessing_ms = recognition.preprocessing_ms,
            steps = %step_summary(&recognition.steps),
            "Recognition finished"
        );

        let mut result = package(image_path, recognition);
        result.id = Some(self.store.save(&result).await?);
        Ok(result)
    }
}

/// The blocking half of an extraction: decode, preprocess, select, read text.
///
/// Confidence comes from the selector's data pass while the text comes from a
/// separate text pass with the same language; the two are not reconciled.
pub(crate) fn recognize(
    engine: &dyn OcrEngine,
    path: &Path,
    preset: Preset,
    languages: &LanguageSet,
) -> Result<Recognition, OcrError> {
    let image = preprocessing::load(path)?;
    let prepared = Pipeline::new(preset).process(image)?;

    let selection = selector::select_language(engine, &prepared.image, languages);
    let text = engine.recognize_text(&prepared.image, &selection.language.code)?;

    Ok(Recognition {
        selection,
        text,
        preprocessing_ms: prepared.total_time_ms,
        steps: prepared.steps,
    })
}

/// `grayscale=1ms blur=0ms ...`
fn step_summary(steps: &[StepTiming]) -> String {
    steps
        .iter()
        .map(|s| format!("{}={}ms", s.name, s.time_ms))
        .collect::<Vec<_>>()
        .join(" ")
}

fn package(image_path: &str, recognition: Recognition) -> ExtractionResult {
    let text = recognition.text.trim().to_string();
    let language = recognition.selection.language.name;

    let (status, message) = if text.is_empty() {
        (
            Status::Warning,
            format!("Text extracted with no result in {}", language),
        )
    } else {
        (
            Status::Success,
            format!("Text extracted successfully in {}", language),
        )
    };

    ExtractionResult {
        id: None,
        image_path: image_path.to_string(),
        text,
        language,
        confidence: recognition.selection.confidence,
        status,
        message,
    }
}

fn failure_result(image_path: &str, error: &OcrError) -> ExtractionResult {
    ExtractionResult {
        id: None,
        image_path: image_path.to_string(),
        text: String::new(),
        language: UNKNOWN_LANGUAGE.to_string(),
        confidence: 0.0,
        status: Status::Error,
        message: format!("Error processing image: {}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TokenData;
    use image::{DynamicImage, GrayImage, ImageFormat, Luma};
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    /// Reads "text" only when the image has dark pixels
    struct InkEngine {
        text: String,
        scores: HashMap<String, Vec<f32>>,
        fail_text_pass: bool,
        seen: StdMutex<Vec<(String, bool)>>,
    }

    impl InkEngine {
        fn new(text: &str, scores: &[(&str, Vec<f32>)]) -> Self {
            Self {
                text: text.to_string(),
                scores: scores
                    .iter()
                    .map(|(code, c)| (code.to_string(), c.clone()))
                    .collect(),
                fail_text_pass: false,
                seen: StdMutex::new(Vec::new()),
            }
        }

        fn has_ink(image: &DynamicImage) -> bool {
            image.to_luma8().pixels().any(|p| p.0[0] < 128)
        }

        fn is_binary(image: &DynamicImage) -> bool {
            image.to_luma8().pixels().all(|p| p.0[0] == 0 || p.0[0] == 255)
        }
    }

    impl OcrEngine for InkEngine {
        fn name(&self) -> &'static str {
            "ink"
        }

        fn recognize_data(
            &self,
            image: &DynamicImage,
            language_code: &str,
        ) -> Result<TokenData, OcrError> {
            self.seen
                .lock()
                .unwrap()
                .push((format!("data:{}", language_code), Self::is_binary(image)));
            if !Self::has_ink(image) {
                return Ok(TokenData::new(vec![-1.0]));
            }
            self.scores
                .get(language_code)
                .map(|c| TokenData::new(c.clone()))
                .ok_or_else(|| OcrError::EngineError(format!("no {} data", language_code)))
        }

        fn recognize_text(
            &self,
            image: &DynamicImage,
            language_code: &str,
        ) -> Result<String, OcrError> {
            self.seen
                .lock()
                .unwrap()
                .push((format!("text:{}", language_code), Self::is_binary(image)));
            if self.fail_text_pass {
                return Err(OcrError::EngineError("engine crashed".to_string()));
            }
            Ok(if Self::has_ink(image) {
                format!("  {}\n", self.text)
            } else {
                "\n".to_string()
            })
        }
    }

    fn engine() -> InkEngine {
        InkEngine::new(
            "नमस्ते दुनिया",
            &[("eng", vec![-1.0, 41.0]), ("hin", vec![-1.0, 80.0, 90.0, -1.0, 70.0])],
        )
    }

    async fn extractor(engine: InkEngine) -> Extractor {
        let store = Store::open(":memory:").await.unwrap();
        Extractor::new(
            Arc::new(engine),
            store,
            "english=eng,hindi=hin".parse().unwrap(),
        )
    }

    fn text_image() -> GrayImage {
        let mut img = GrayImage::from_pixel(60, 30, Luma([235]));
        for x in 10..50 {
            for y in 12..16 {
                img.put_pixel(x, y, Luma([15]));
            }
        }
        img
    }

    fn stage_png(dir: &Path, name: &str, img: &GrayImage) -> StagedUpload {
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        StagedUpload::create(dir, name, &bytes).unwrap()
    }

    #[tokio::test]
    async fn test_text_image_succeeds_and_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = extractor(engine()).await;
        let upload = stage_png(dir.path(), "page.png", &text_image());

        let result = extractor.extract(&upload, Preset::Standard).await.into_result();

        assert_eq!(result.status, Status::Success);
        assert_eq!(result.language, "hindi");
        assert_eq!(result.confidence, 80.0);
        assert_eq!(result.text, "नमस्ते दुनिया");
        assert_eq!(result.message, "Text extracted successfully in hindi");
        assert_eq!(result.image_path, "page.png");

        let stored = extractor.store().get(result.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.extracted_text, result.text);
        assert_eq!(stored.status, Status::Success);
        assert_eq!(extractor.store().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_blank_image_warns_and_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = extractor(engine()).await;
        let upload = stage_png(dir.path(), "blank.png", &GrayImage::from_pixel(40, 40, Luma([250])));

        let extraction = extractor.extract(&upload, Preset::Standard).await;
        assert!(matches!(extraction, Extraction::Completed(_)));

        let result = extraction.into_result();
        assert_eq!(result.status, Status::Warning);
        assert_eq!(result.text, "");
        assert_eq!(result.language, "english");
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.message, "Text extracted with no result in english");
        assert!(result.id.is_some());
        assert_eq!(extractor.store().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_image_fails_without_record() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = extractor(engine()).await;
        let upload = StagedUpload::create(dir.path(), "broken.png", b"\x89PNG garbage").unwrap();

        let extraction = extractor.extract(&upload, Preset::Standard).await;

        match &extraction {
            Extraction::Failed { error, result } => {
                assert!(matches!(error, OcrError::DecodeError(_)));
                assert_eq!(result.status, Status::Error);
                assert_eq!(result.language, "unknown");
                assert_eq!(result.confidence, 0.0);
                assert_eq!(result.text, "");
                assert!(result.message.starts_with("Error processing image: "));
                assert_eq!(result.id, None);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(extractor.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failures_recorded_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = extractor(engine()).await.record_failures(true);
        let upload = StagedUpload::create(dir.path(), "broken.bmp", b"BM nope").unwrap();

        let result = extractor.extract(&upload, Preset::Advanced).await.into_result();

        assert_eq!(result.status, Status::Error);
        let stored = extractor.store().get(result.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.status, Status::Error);
        assert_eq!(stored.detected_language, "unknown");
    }

    #[tokio::test]
    async fn test_engine_failure_in_text_pass_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut failing = engine();
        failing.fail_text_pass = true;
        let extractor = extractor(failing).await;
        let upload = stage_png(dir.path(), "page.png", &text_image());

        let extraction = extractor.extract(&upload, Preset::Standard).await;

        assert!(matches!(
            extraction,
            Extraction::Failed {
                error: OcrError::EngineError(_),
                ..
            }
        ));
        assert_eq!(extractor.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = extractor(engine()).await;
        extractor
            .store()
            .connection()
            .execute("DROP TABLE ocr_results", ())
            .await
            .unwrap();
        let upload = stage_png(dir.path(), "page.png", &text_image());

        let extraction = extractor.extract(&upload, Preset::Standard).await;

        assert!(matches!(
            extraction,
            Extraction::Failed {
                error: OcrError::Database(_),
                ..
            }
        ));
        assert_eq!(extraction.result().language, "unknown");
    }

    #[tokio::test]
    async fn test_repeated_extraction_stores_independent_records() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = extractor(engine()).await;
        let upload = stage_png(dir.path(), "page.png", &text_image());

        let first = extractor.extract(&upload, Preset::Standard).await.into_result();
        let second = extractor.extract(&upload, Preset::Standard).await.into_result();

        assert_ne!(first.id, second.id);
        assert_eq!(first.text, second.text);
        assert_eq!(first.language, second.language);
        assert_eq!(first.confidence, second.confidence);
        assert_eq!(extractor.store().count().await.unwrap(), 2);
    }

    #[test]
    fn test_presets_share_the_same_call_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let upload = stage_png(dir.path(), "page.png", &text_image());
        let languages: LanguageSet = "english=eng,hindi=hin".parse().unwrap();

        let standard = engine();
        let plain = recognize(&standard, upload.path(), Preset::Standard, &languages).unwrap();
        let advanced = engine();
        let binarized = recognize(&advanced, upload.path(), Preset::Advanced, &languages).unwrap();

        let calls = |e: &InkEngine| -> Vec<String> {
            e.seen.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
        };
        assert_eq!(calls(&standard), vec!["data:eng", "data:hin", "text:hin"]);
        assert_eq!(calls(&standard), calls(&advanced));

        // Only the image fed to the engine differs
        assert!(advanced.seen.lock().unwrap().iter().all(|(_, binary)| *binary));
        assert!(standard.seen.lock().unwrap().iter().all(|(_, binary)| !*binary));
        assert_eq!(plain.selection.language, binarized.selection.language);
    }

    #[test]
    fn test_recognition_reports_step_timings() {
        let dir = tempfile::tempdir().unwrap();
        let upload = stage_png(dir.path(), "page.png", &text_image());
        let languages: LanguageSet = "english=eng,hindi=hin".parse().unwrap();

        let plain = recognize(&engine(), upload.path(), Preset::Standard, &languages).unwrap();
        let binarized = recognize(&engine(), upload.path(), Preset::Advanced, &languages).unwrap();

        let names = |r: &Recognition| -> Vec<String> {
            r.steps.iter().map(|s| s.name.clone()).collect()
        };
        assert_eq!(names(&plain), vec!["grayscale", "blur"]);
        assert_eq!(names(&binarized), vec!["grayscale", "blur", "threshold"]);

        let summary = step_summary(&binarized.steps);
        assert!(summary.starts_with("grayscale="));
        assert!(summary.contains(" blur="));
        assert!(summary.ends_with("ms"));
    }
}
