//! Local result store backed by an embedded libsql (SQLite) database

mod records;
pub(crate) mod schema;

pub use records::RecordRepository;

use libsql::{Builder, Connection};

use crate::error::OcrError;
use crate::models::{ExtractionResult, StoredRecord};

/// Append-only store of extraction results.
///
/// Opens one connection per process and reuses it; callers serialize writes.
#[derive(Clone)]
pub struct Store {
    // Keeps the database alive for as long as the connection is used
    _db: std::sync::Arc<libsql::Database>,
    conn: Connection,
}

impl Store {
    /// Open (or create) the database at `path`; `:memory:` gives a throwaway store
    pub async fn open(path: &str) -> Result<Self, OcrError> {
        let path = path.strip_prefix("file:").unwrap_or(path);
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        schema::init_schema(&conn).await?;
        tracing::info!("Result store ready at {}", path);

        Ok(Self {
            _db: std::sync::Arc::new(db),
            conn,
        })
    }

    /// Persist a result, returning the assigned record id
    pub async fn save(&self, result: &ExtractionResult) -> Result<i64, OcrError> {
        let id = RecordRepository::insert(&self.conn, result).await?;
        tracing::debug!(id, status = %result.status, "Stored extraction result");
        Ok(id)
    }

    pub async fn get(&self, id: i64) -> Result<Option<StoredRecord>, OcrError> {
        RecordRepository::get_by_id(&self.conn, id).await
    }

    pub async fn recent(&self, limit: u32) -> Result<Vec<StoredRecord>, OcrError> {
        RecordRepository::list_recent(&self.conn, limit).await
    }

    pub async fn count(&self) -> Result<u64, OcrError> {
        RecordRepository::count(&self.conn).await
    }

    /// Delete all stored results. Only ever run on explicit request.
    pub async fn reset(&self) -> Result<(), OcrError> {
        schema::reset(&self.conn).await?;
        tracing::warn!("Result store reset; all previous records deleted");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}
