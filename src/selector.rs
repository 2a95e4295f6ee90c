//! Confidence-based language selection
//!
//! Runs one data-mode OCR pass per candidate language and keeps the language
//! whose tokens carry the highest mean confidence. This is a proxy, not real
//! language identification: it only works when the candidate scripts are
//! visually distinct.

use crate::engine::OcrEngine;
use crate::languages::{Language, LanguageSet};
use image::DynamicImage;

/// Outcome of one candidate's data-mode pass
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// Mean confidence over tokens with a real score
    Scored(f64),
    /// The pass ran but every token carried the sentinel
    NoTokens,
    /// The engine failed for this language (missing data, crash, ...)
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub language: Language,
    pub outcome: AttemptOutcome,
}

/// Winning language plus every attempt made on the way
#[derive(Debug, Clone)]
pub struct Selection {
    pub language: Language,
    /// Mean confidence of the winner, 0-100; 0.0 when falling back
    pub confidence: f64,
    pub attempts: Vec<Attempt>,
}

/// Try every candidate in declaration order and pick the best scorer.
///
/// Ties keep the earlier candidate. When no candidate scores, the fallback
/// language is returned with confidence 0.0.
pub fn select_language(
    engine: &dyn OcrEngine,
    image: &DynamicImage,
    languages: &LanguageSet,
) -> Selection {
    let attempts: Vec<Attempt> = languages
        .iter()
        .map(|language| {
            let outcome = match engine.recognize_data(image, &language.code) {
                Ok(data) => match data.mean_confidence() {
                    Some(mean) => AttemptOutcome::Scored(mean),
                    None => AttemptOutcome::NoTokens,
                },
                Err(e) => {
                    tracing::warn!(language = %language.name, "Language attempt failed: {}", e);
                    AttemptOutcome::Failed(e.to_string())
                }
            };
            tracing::debug!(language = %language.name, ?outcome, "Language attempt finished");
            Attempt {
                language: language.clone(),
                outcome,
            }
        })
        .collect();

    let (language, confidence) = best_of(&attempts, languages.fallback());

    Selection {
        language,
        confidence,
        attempts,
    }
}

fn best_of(attempts: &[Attempt], fallback: &Language) -> (Language, f64) {
    let mut best = (fallback, 0.0);

    for attempt in attempts {
        if let AttemptOutcome::Scored(mean) = attempt.outcome {
            if mean > best.1 {
                best = (&attempt.language, mean);
            }
        }
    }

    (best.0.clone(), best.1)
}
