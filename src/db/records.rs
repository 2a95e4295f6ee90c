use chrono::{DateTime, NaiveDateTime, Utc};
use libsql::{params, Connection, Row};

use crate::error::OcrError;
use crate::models::{ExtractionResult, Status, StoredRecord};

const SQLITE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

pub struct RecordRepository;

impl RecordRepository {
    /// Append a result and return the new row id
    pub async fn insert(conn: &Connection, result: &ExtractionResult) -> Result<i64, OcrError> {
        let mut rows = conn
            .query(
                r#"
                INSERT INTO ocr_results (
                    image_path, extracted_text, detected_language, confidence, status
                ) VALUES (?1, ?2, ?3, ?4, ?5)
                RETURNING id
                "#,
                params![
                    result.image_path.clone(),
                    result.text.clone(),
                    result.language.clone(),
                    result.confidence,
                    result.status.as_str(),
                ],
            )
            .await?;

        let row = rows
            .next()
            .await?
            .ok_or_else(|| OcrError::Internal("insert returned no id".to_string()))?;

        Ok(row.get::<i64>(0)?)
    }

    pub async fn get_by_id(conn: &Connection, id: i64) -> Result<Option<StoredRecord>, OcrError> {
        let mut rows = conn
            .query(
                "SELECT id, image_path, extracted_text, detected_language, confidence, \
                 processed_date, status FROM ocr_results WHERE id = ?1",
                params![id],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_record(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Most recent records first
    pub async fn list_recent(conn: &Connection, limit: u32) -> Result<Vec<StoredRecord>, OcrError> {
        let mut rows = conn
            .query(
                "SELECT id, image_path, extracted_text, detected_language, confidence, \
                 processed_date, status FROM ocr_results ORDER BY id DESC LIMIT ?1",
                params![limit as i64],
            )
            .await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(Self::row_to_record(&row)?);
        }
        Ok(records)
    }

    pub async fn count(conn: &Connection) -> Result<u64, OcrError> {
        let mut rows = conn.query("SELECT COUNT(*) FROM ocr_results", ()).await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)? as u64),
            None => Ok(0),
        }
    }

    fn row_to_record(row: &Row) -> Result<StoredRecord, OcrError> {
        let processed_date: String = row.get(5)?;
        let status: String = row.get(6)?;

        Ok(StoredRecord {
            id: row.get(0)?,
            image_path: row.get(1)?,
            extracted_text: row.get(2)?,
            detected_language: row.get(3)?,
            confidence: row.get::<Option<f64>>(4)?,
            processed_date: parse_timestamp(&processed_date)?,
            status: status.parse().map_err(OcrError::Internal)?,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, OcrError> {
    NaiveDateTime::parse_from_str(value, SQLITE_TIMESTAMP)
        .map(|naive| naive.and_utc())
        .map_err(|e| OcrError::Internal(format!("bad timestamp '{}': {}", value, e)))
}
