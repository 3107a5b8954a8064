//! Word document store backed by SQLite.
//!
//! Each record is kept as a JSON document keyed by (name, lang). The UNIQUE
//! constraint makes concurrent get-or-create calls for the same word converge
//! on one row instead of inserting twice.

use crate::logic::TranslationRecord;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite: {0}")] Sqlite(#[from] rusqlite::Error),
    #[error("Document: {0}")] Document(#[from] serde_json::Error),
    #[error("Store lock poisoned")] Poisoned,
}

/// A record as persisted, with its store id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredWord {
    pub id: i64,
    #[serde(flatten)]
    pub record: TranslationRecord,
}

pub trait WordStore: Send + Sync {
    fn find(&self, name: &str, lang: &str) -> Result<Option<StoredWord>, StoreError>;

    /// Insert, or return the row already stored for the same (name, lang)
    fn insert(&self, record: &TranslationRecord) -> Result<StoredWord, StoreError>;

    /// All words whose name contains `fragment`
    fn search(&self, fragment: &str) -> Result<Vec<StoredWord>, StoreError>;

    /// Remove one language (or every language when `lang` is None); returns rows removed
    fn delete(&self, name: &str, lang: Option<&str>) -> Result<usize, StoreError>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        log::info!("Word store opened at {:?}", path);
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS words (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                lang TEXT NOT NULL,
                document TEXT NOT NULL,
                created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
                UNIQUE(name, lang)
            );
            ",
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn decode(id: i64, document: &str) -> Result<StoredWord, StoreError> {
    Ok(StoredWord {
        id,
        record: serde_json::from_str(document)?,
    })
}

impl WordStore for SqliteStore {
    fn find(&self, name: &str, lang: &str) -> Result<Option<StoredWord>, StoreError> {
        let conn = self.lock()?;
        let row: Option<(i64, String)> = conn
            .query_row(
                "SELECT id, document FROM words WHERE name = ?1 AND lang = ?2",
                params![name, lang],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        row.map(|(id, document)| decode(id, &document)).transpose()
    }

    fn insert(&self, record: &TranslationRecord) -> Result<StoredWord, StoreError> {
        let document = serde_json::to_string(record)?;
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT INTO words (name, lang, document) VALUES (?1, ?2, ?3)
             ON CONFLICT(name, lang) DO NOTHING",
            params![record.name, record.lang, document],
        )?;
        if inserted == 0 {
            log::debug!("'{}' ({}) already stored, keeping existing row", record.name, record.lang);
        }

        let (id, stored): (i64, String) = conn.query_row(
            "SELECT id, document FROM words WHERE name = ?1 AND lang = ?2",
            params![record.name, record.lang],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        decode(id, &stored)
    }

    fn search(&self, fragment: &str) -> Result<Vec<StoredWord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT id, document FROM words WHERE instr(name, ?1) > 0 ORDER BY id")?;
        let rows = stmt
            .query_map(params![fragment], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<(i64, String)>, _>>()?;
        rows.iter().map(|(id, document)| decode(*id, document)).collect()
    }

    fn delete(&self, name: &str, lang: Option<&str>) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let removed = match lang {
            Some(lang) => conn.execute(
                "DELETE FROM words WHERE name = ?1 AND lang = ?2",
                params![name, lang],
            )?,
            None => conn.execute("DELETE FROM words WHERE name = ?1", params![name])?,
        };
        Ok(removed)
    }
}
