use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OptionalExtension;
use std::fs;
use std::path::Path;

use crate::error::WordgateError;

const SCHEMA_VERSION: &str = "1";

const CREATE_SCHEMA_SQL: &str = r#"
CREATE TABLE meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE words (
    id INTEGER PRIMARY KEY,
    full_word TEXT NOT NULL COLLATE NOCASE,
    created_by TEXT NOT NULL,
    created_reason TEXT NOT NULL,
    created_at TEXT NOT NULL,
    deleted_by TEXT,
    deleted_reason TEXT,
    deleted_at TEXT,
    deleted INTEGER NOT NULL DEFAULT 0,
    super_restricted INTEGER NOT NULL DEFAULT 0,
    categories TEXT NOT NULL DEFAULT '[]'
);

CREATE INDEX idx_words_full_word ON words (full_word);

CREATE TABLE super_restricted_audit (
    id INTEGER PRIMARY KEY,
    word_id INTEGER NOT NULL REFERENCES words (id),
    changed_at TEXT NOT NULL,
    changed_by TEXT NOT NULL,
    new_value INTEGER NOT NULL
);

CREATE TABLE categories_audit (
    id INTEGER PRIMARY KEY,
    word_id INTEGER NOT NULL REFERENCES words (id),
    changed_at TEXT NOT NULL,
    changed_by TEXT NOT NULL,
    changed_reason TEXT NOT NULL,
    categories TEXT NOT NULL
);

INSERT INTO meta (key, value) VALUES ('schema_version', '1');
"#;

/// Pooled handle to the word store. Cheap to clone; each checkout is a plain
/// rusqlite connection.
#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self, WordgateError> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(db_path)
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));

        let pool = Pool::builder()
            .build(manager)
            .map_err(|e| WordgateError::Error(format!("Failed to create connection pool: {e}")))?;

        let db = Self { pool };

        // Ensure schema is current
        db.ensure_schema()?;

        Ok(db)
    }

    pub fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, WordgateError> {
        self.pool
            .get()
            .map_err(|e| WordgateError::Error(format!("Failed to check out a connection: {e}")))
    }

    fn ensure_schema(&self) -> Result<(), WordgateError> {
        let conn = self.conn()?;

        let table_exists: bool = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='meta'",
                [],
                |row| row.get::<_, i32>(0),
            )
            .map(|count| count > 0)
            .unwrap_or(false);

        if !table_exists {
            conn.execute_batch(CREATE_SCHEMA_SQL)?;
            return Ok(());
        }

        // Get the stored schema version
        let stored_version: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match stored_version.as_deref() {
            Some(SCHEMA_VERSION) => Ok(()), // Schema is up to date
            Some(other) => Err(WordgateError::Error(format!(
                "Schema version mismatch: expected {SCHEMA_VERSION}, found {other}"
            ))),
            None => Err(WordgateError::Error("Schema version missing".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_the_schema() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("wordgate.db")).unwrap();

        let conn = db.conn().unwrap();
        let word_count: i64 = conn
            .query_row("SELECT count(*) FROM words", [], |row| row.get(0))
            .unwrap();

        assert_eq!(word_count, 0);
    }

    #[test]
    fn reopening_an_existing_database_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wordgate.db");

        drop(Database::open(&path).unwrap());
        assert!(Database::open(&path).is_ok());
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wordgate.db");

        let db = Database::open(&path).unwrap();
        db.conn()
            .unwrap()
            .execute("UPDATE meta SET value = '999' WHERE key = 'schema_version'", [])
            .unwrap();
        drop(db);

        assert!(Database::open(&path).is_err());
    }
}
