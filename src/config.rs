use crate::languages::LanguageSet;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "smart-ocr")]
#[command(about = "Interactive OCR extractor with confidence-based language detection")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "OCR_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "OCR_PORT", default_value = "9292")]
    pub port: u16,

    /// SQLite database file for extraction results (":memory:" for a throwaway store)
    #[arg(long, env = "OCR_DATABASE", default_value = "ocr_results.db")]
    pub database: String,

    /// Directory uploads are staged in while being processed
    #[arg(long, env = "OCR_STAGING_DIR", default_value = "temp")]
    pub staging_dir: PathBuf,

    /// Candidate languages as name=code pairs, in priority order (first is the fallback)
    #[arg(
        long,
        env = "OCR_LANGUAGES",
        default_value = "english=eng,hindi=hin,marathi=mar,punjabi=pan,gujarati=guj"
    )]
    pub languages: LanguageSet,

    /// Maximum file size in bytes (default: 50MB)
    #[arg(long, env = "OCR_MAX_FILE_SIZE", default_value = "52428800")]
    pub max_file_size: usize,

    /// Also store failed extractions with status "error"
    #[arg(long, env = "OCR_RECORD_FAILURES", default_value_t = false)]
    pub record_failures: bool,

    /// Delete all stored results before serving
    #[arg(long)]
    pub reset_store: bool,

    /// Number of records shown on the history page
    #[arg(long, env = "OCR_HISTORY_LIMIT", default_value = "50")]
    pub history_limit: u32,

    /// Path to tessdata directory (uses TESSDATA_PREFIX env var if not set)
    #[arg(long, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub staging_dir: PathBuf,
    pub languages: LanguageSet,
    pub max_file_size: usize,
    pub record_failures: bool,
    pub reset_store: bool,
    pub history_limit: u32,
    pub tessdata_path: Option<String>,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            database: args.database,
            staging_dir: args.staging_dir,
            languages: args.languages,
            max_file_size: args.max_file_size,
            record_failures: args.record_failures,
            reset_store: args.reset_store,
            history_limit: args.history_limit,
            tessdata_path: args.tessdata_path,
        }
    }
}

impl Config {
    /// Exports `tessdata_path` as TESSDATA_PREFIX for the tesseract child
    /// processes. Call before any other thread is running.
    pub fn export_tessdata(&self) {
        if let Some(path) = &self.tessdata_path {
            std::env::set_var("TESSDATA_PREFIX", path);
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9292,
            database: "ocr_results.db".to_string(),
            staging_dir: PathBuf::from("temp"),
            languages: LanguageSet::default(),
            max_file_size: 52_428_800,
            record_failures: false,
            reset_store: false,
            history_limit: 50,
            tessdata_path: None,
        }
    }
}
