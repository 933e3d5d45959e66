//! Key-value repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide get/put/remove over string keys and values.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `put` is an upsert; last write wins.
//! - Blank keys are rejected before touching storage.

use crate::db::{latest_version, schema_version, DbError};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for key-value persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidKey(String),
    /// Connection schema is not at the version this binary expects.
    SchemaMismatch { found: u32, expected: u32 },
    /// Snapshot could not be serialized.
    Encode { key: String, message: String },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidKey(key) => write!(f, "invalid snapshot key: `{key}`"),
            Self::SchemaMismatch { found, expected } => write!(
                f,
                "snapshot store schema version {found} does not match expected {expected}"
            ),
            Self::Encode { key, message } => {
                write!(f, "failed to encode snapshot `{key}`: {message}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Minimal key-value contract used for planner snapshots.
pub trait KeyValueRepository {
    fn get(&self, key: &str) -> RepoResult<Option<String>>;
    fn put(&self, key: &str, value: &str) -> RepoResult<()>;
    /// Returns whether a value was removed.
    fn remove(&self, key: &str) -> RepoResult<bool>;
    /// Stored keys in ascending order.
    fn keys(&self) -> RepoResult<Vec<String>>;
}

/// SQLite-backed key-value repository over the `kv_entries` table.
pub struct SqliteKeyValueRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKeyValueRepository<'conn> {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `SchemaMismatch` when the connection was not opened through
    ///   `open_db`/`open_db_in_memory` (or is at another schema version).
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let found = schema_version(conn)?;
        let expected = latest_version();
        if found != expected {
            return Err(RepoError::SchemaMismatch { found, expected });
        }
        Ok(Self { conn })
    }
}

impl KeyValueRepository for SqliteKeyValueRepository<'_> {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let key = normalize_key(key)?;
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> RepoResult<()> {
        let key = normalize_key(key)?;
        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> RepoResult<bool> {
        let key = normalize_key(key)?;
        let changed = self
            .conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", params![key])?;
        Ok(changed > 0)
    }

    fn keys(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv_entries ORDER BY key ASC;")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

fn normalize_key(key: &str) -> RepoResult<&str> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(RepoError::InvalidKey(key.to_string()));
    }
    Ok(trimmed)
}
