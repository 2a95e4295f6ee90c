//! Candidate language set used for confidence-based language detection

use crate::error::OcrError;
use std::fmt;
use std::str::FromStr;

/// Languages tried by default, in declaration order
const DEFAULT_LANGUAGES: &[(&str, &str)] = &[
    ("english", "eng"),
    ("hindi", "hin"),
    ("marathi", "mar"),
    ("punjabi", "pan"),
    ("gujarati", "guj"),
];

/// A human-readable language name paired with its engine language code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    pub name: String,
    pub code: String,
}

impl Language {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

/// Ordered, non-empty set of candidate languages.
///
/// The first entry doubles as the fallback when no candidate produces a score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSet {
    languages: Vec<Language>,
}

impl LanguageSet {
    pub fn new(languages: Vec<Language>) -> Result<Self, OcrError> {
        if languages.is_empty() {
            return Err(OcrError::Config(
                "candidate language set must not be empty".to_string(),
            ));
        }

        for (i, lang) in languages.iter().enumerate() {
            if lang.name.is_empty() || lang.code.is_empty() {
                return Err(OcrError::Config(format!(
                    "language entry {} has an empty name or code",
                    i + 1
                )));
            }
            if languages[..i].iter().any(|l| l.name == lang.name) {
                return Err(OcrError::Config(format!(
                    "duplicate language name: {}",
                    lang.name
                )));
            }
        }

        Ok(Self { languages })
    }

    pub fn fallback(&self) -> &Language {
        &self.languages[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Language> {
        self.languages.iter()
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.name == name)
    }

    #[cfg(test)]
    pub fn codes(&self) -> Vec<&str> {
        self.languages.iter().map(|l| l.code.as_str()).collect()
    }
}

impl Default for LanguageSet {
    fn default() -> Self {
        Self {
            languages: DEFAULT_LANGUAGES
                .iter()
                .map(|(name, code)| Language::new(*name, *code))
                .collect(),
        }
    }
}

/// Parses `name=code` pairs separated by commas, e.g. `english=eng,hindi=hin`
impl FromStr for LanguageSet {
    type Err = OcrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let languages = s
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (name, code) = entry.split_once('=').ok_or_else(|| {
                    OcrError::Config(format!("expected name=code, got '{}'", entry))
                })?;
                Ok(Language::new(
                    name.trim().to_lowercase(),
                    code.trim().to_string(),
                ))
            })
            .collect::<Result<Vec<_>, OcrError>>()?;

        Self::new(languages)
    }
}

impl fmt::Display for LanguageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .languages
            .iter()
            .map(|l| format!("{}={}", l.name, l.code))
            .collect();
        write!(f, "{}", pairs.join(","))
    }
}
