//! Upload staging
//!
//! Uploaded bytes are written to a temporary file inside the staging
//! directory. The file is removed when the `StagedUpload` is dropped, so every
//! exit path of a request cleans up after itself.

use crate::error::OcrError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

pub struct StagedUpload {
    file: NamedTempFile,
    original_name: String,
}

impl StagedUpload {
    /// Write `data` into `dir`, keeping the original file extension
    pub fn create(dir: &Path, original_name: &str, data: &[u8]) -> Result<Self, OcrError> {
        std::fs::create_dir_all(dir)?;

        let original_name = sanitize_file_name(original_name);
        let extension = Path::new(&original_name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_else(|| ".tmp".to_string());

        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&extension)
            .tempfile_in(dir)?;
        file.write_all(data)?;
        file.flush()?;

        tracing::debug!(
            "Staged {} ({} bytes) at {:?}",
            original_name,
            data.len(),
            file.path()
        );

        Ok(Self {
            file,
            original_name,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Client-supplied file name, reduced to its last path component
    pub fn original_name(&self) -> &str {
        &self.original_name
    }
}

fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        "upload".to_string()
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedUpload::create(dir.path(), "scan.png", b"bytes").unwrap();
        let path = staged.path().to_path_buf();

        assert!(path.exists());
        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().unwrap(), "png");
        assert_eq!(std::fs::read(&path).unwrap(), b"bytes");

        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn test_creates_missing_staging_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("temp").join("uploads");
        let staged = StagedUpload::create(&nested, "a.jpg", b"x").unwrap();
        assert!(staged.path().starts_with(&nested));
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\scans\\page.bmp"), "page.bmp");
        assert_eq!(sanitize_file_name(""), "upload");
        assert_eq!(sanitize_file_name(".."), "upload");
    }
}
