//! SQLite-based storage.
//!
//! Provides persistent storage for:
//! - Completed assessments (the local result history)
//! - Key-value store for application state, such as an in-flight session

use std::path::Path;

use rusqlite::{params, Connection};

use super::data_dir;
use super::repository::AssessmentRepository;
use crate::assessment::AssessmentRecord;
use crate::error::{DatabaseError, Result};

/// SQLite database for assessment storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/stemcompass.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("stemcompass.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS assessments (
                session_id       TEXT PRIMARY KEY,
                user_id          TEXT,
                primary_category TEXT NOT NULL,
                record_json      TEXT NOT NULL,
                completed_at     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_assessments_completed_at ON assessments(completed_at);",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn decode(session_id: &str, json: &str) -> Result<AssessmentRecord> {
        serde_json::from_str(json).map_err(|e| {
            DatabaseError::CorruptRecord {
                id: session_id.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

impl AssessmentRepository for Database {
    fn save(&self, record: &AssessmentRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO assessments
                (session_id, user_id, primary_category, record_json, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.session_id,
                record.user_id,
                record.primary_category.as_str(),
                json,
                record.completed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn find_by_id(&self, session_id: &str) -> Result<Option<AssessmentRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT record_json FROM assessments WHERE session_id = ?1")?;
        let result = stmt.query_row(params![session_id], |row| row.get::<_, String>(0));
        match result {
            Ok(json) => Ok(Some(Self::decode(session_id, &json)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> Result<Vec<AssessmentRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, record_json FROM assessments ORDER BY completed_at DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, json) = row?;
            records.push(Self::decode(&id, &json)?);
        }
        Ok(records)
    }
}
