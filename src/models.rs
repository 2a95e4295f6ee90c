use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Language reported when extraction failed before a language was chosen
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Outcome tag of an extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Non-empty text was extracted
    Success,
    /// The pipeline ran but produced no text
    Warning,
    /// The pipeline failed
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Warning => "warning",
            Status::Error => "error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Status::Success),
            "warning" => Ok(Status::Warning),
            "error" => Ok(Status::Error),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// One request's outcome in uniform shape, ready for display or storage
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    /// Stored record id, once persisted
    pub id: Option<i64>,
    pub image_path: String,
    pub text: String,
    pub language: String,
    pub confidence: f64,
    pub status: Status,
    pub message: String,
}

/// A row of the results table
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: i64,
    pub image_path: String,
    pub extracted_text: String,
    pub detected_language: String,
    pub confidence: Option<f64>,
    pub processed_date: DateTime<Utc>,
    pub status: Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_forms_agree() {
        for status in [Status::Success, Status::Warning, Status::Error] {
            assert_eq!(status.as_str().parse::<Status>(), Ok(status));
            assert_eq!(status.to_string(), status.as_str());
        }
        assert!("failed".parse::<Status>().is_err());
    }
}
