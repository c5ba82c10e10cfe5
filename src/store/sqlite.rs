use super::traits::ApprovalStore;
use crate::error::StoreError;
use async_trait::async_trait;
use rusqlite::{Connection, params};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

/// SQLite-backed approval store.
///
/// One row per key. `seq` is a process-assigned monotonic counter that
/// defines insertion order exactly; re-setting a key moves it to the tail.
/// `inserted_at` is kept for human inspection only.
pub struct SqliteApprovalStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    next_seq: AtomicI64,
}

impl SqliteApprovalStore {
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }

        let conn =
            Connection::open(db_path).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::init_schema(&conn)?;

        let max_seq: i64 = conn
            .query_row("SELECT COALESCE(MAX(seq), 0) FROM approvals", [], |row| {
                row.get(0)
            })
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: db_path.to_path_buf(),
            next_seq: AtomicI64::new(max_seq + 1),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS approvals (
                key         TEXT PRIMARY KEY,
                value       INTEGER NOT NULL,
                seq         INTEGER NOT NULL,
                inserted_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_approvals_seq ON approvals(seq);",
        )
        .map_err(|e| StoreError::Schema(e.to_string()))
    }

    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection mutex poisoned".into()))
    }
}

#[async_trait]
impl ApprovalStore for SqliteApprovalStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn health_check(&self) -> bool {
        self.lock()
            .and_then(|conn| {
                conn.query_row("SELECT 1", [], |_| Ok(()))
                    .map_err(|e| StoreError::Query(e.to_string()))
            })
            .is_ok()
    }

    async fn get(&self, keys: &[String]) -> Result<HashMap<String, bool>, StoreError> {
        let conn = self.lock()?;
        let mut found = HashMap::with_capacity(keys.len());
        let mut stmt = conn
            .prepare_cached("SELECT value FROM approvals WHERE key = ?1")
            .map_err(|e| StoreError::Query(e.to_string()))?;
        for key in keys {
            let value: Option<i64> = stmt
                .query_row(params![key], |row| row.get(0))
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(StoreError::Query(other.to_string())),
                })?;
            if let Some(value) = value {
                found.insert(key.clone(), value != 0);
            }
        }
        Ok(found)
    }

    async fn set(&self, entries: HashMap<String, bool>) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare_cached(
                "INSERT INTO approvals (key, value, seq, inserted_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     seq = excluded.seq,
                     inserted_at = excluded.inserted_at",
            )
            .map_err(|e| StoreError::Query(e.to_string()))?;
        for (key, value) in entries {
            let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
            stmt.execute(params![
                key,
                i64::from(value),
                seq,
                chrono::Utc::now().to_rfc3339()
            ])
            .map_err(|e| StoreError::Query(e.to_string()))?;
        }
        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare_cached("DELETE FROM approvals WHERE key = ?1")
            .map_err(|e| StoreError::Query(e.to_string()))?;
        for key in keys {
            stmt.execute(params![key])
                .map_err(|e| StoreError::Query(e.to_string()))?;
        }
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<(String, bool)>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare_cached("SELECT key, value FROM approvals ORDER BY seq ASC")
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? != 0))
            })
            .map_err(|e| StoreError::Query(e.to_string()))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Query(e.to_string()))
    }
}
