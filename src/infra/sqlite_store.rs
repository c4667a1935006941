use crate::app::ports::DocumentStorePort;
use crate::error::{RegistryError, Result};
use crate::types::StoredRecord;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// SQLite-backed document store; one JSON document per key
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

// Fixed-width timestamps so that text comparison orders them correctly
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl SqliteDocumentStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            CREATE TABLE IF NOT EXISTS documents (
                key          TEXT PRIMARY KEY,
                record_type  TEXT NOT NULL,
                updated_at   TEXT NOT NULL,
                body         TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS documents_updated_at ON documents (updated_at);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| RegistryError::Storage {
            message: format!("sqlite connection lock poisoned: {e}"),
        })
    }
}

#[async_trait]
impl DocumentStorePort for SqliteDocumentStore {
    async fn get(&self, key: &str) -> Result<Option<StoredRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT body FROM documents WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            let body: String = row.get(0)?;
            Ok(Some(serde_json::from_str(&body)?))
        } else {
            Ok(None)
        }
    }

    async fn put(&self, key: &str, record: &StoredRecord) -> Result<()> {
        let body = serde_json::to_string(record)?;
        self.conn()?.execute(
            "INSERT INTO documents (key, record_type, updated_at, body) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET record_type=excluded.record_type, updated_at=excluded.updated_at, body=excluded.body",
            params![key, record.record_type.to_string(), timestamp(&record.updated_at), body],
        )?;
        debug!("Stored record {}", key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let removed = self
            .conn()?
            .execute("DELETE FROM documents WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    async fn list_keys(&self, cutoff: Option<DateTime<Utc>>) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut keys = Vec::new();
        match cutoff {
            Some(cutoff) => {
                let mut stmt = conn
                    .prepare("SELECT key FROM documents WHERE updated_at <= ?1 ORDER BY key")?;
                let mut rows = stmt.query(params![timestamp(&cutoff)])?;
                while let Some(row) = rows.next()? {
                    keys.push(row.get(0)?);
                }
            }
            None => {
                let mut stmt = conn.prepare("SELECT key FROM documents ORDER BY key")?;
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    keys.push(row.get(0)?);
                }
            }
        }
        Ok(keys)
    }
}
