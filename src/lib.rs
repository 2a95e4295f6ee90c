//! Smart OCR: upload an image, guess its language from OCR confidence,
//! extract the text and keep a record of every extraction.

pub mod config;
pub mod db;
pub mod engine;
pub mod engines;
pub mod error;
pub mod extraction;
pub mod languages;
pub mod models;
pub mod preprocessing;
pub mod render;
pub mod selector;
pub mod server;
pub mod staging;

pub use config::Config;
pub use db::Store;
pub use engine::{OcrEngine, TokenData};
pub use error::OcrError;
pub use extraction::{Extraction, Extractor};
pub use languages::{Language, LanguageSet};
pub use models::{ExtractionResult, Status, StoredRecord};
