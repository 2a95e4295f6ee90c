use libsql::Connection;

use crate::error::OcrError;

/// Create the results table if it does not exist yet. Safe to run on every start.
pub async fn init_schema(conn: &Connection) -> Result<(), OcrError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS ocr_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            image_path TEXT NOT NULL,
            extracted_text TEXT NOT NULL,
            detected_language TEXT NOT NULL,
            confidence REAL,
            processed_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            status TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_ocr_results_processed_date ON ocr_results(processed_date);
        "#,
    )
    .await?;

    Ok(())
}

/// Remove every stored result and restart id numbering
pub async fn reset(conn: &Connection) -> Result<(), OcrError> {
    conn.execute_batch(
        r#"
        DELETE FROM ocr_results;
        DELETE FROM sqlite_sequence WHERE name = 'ocr_results';
        "#,
    )
    .await?;

    Ok(())
}
