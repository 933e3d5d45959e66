//! SQLite storage for the planner's key-value snapshots.
//!
//! # Responsibility
//! - Open connections with pragmas and schema in place.
//! - Report schema problems as typed errors.
//!
//! # Invariants
//! - `PRAGMA user_version` equals the last applied migration.
//! - A database from a newer binary is never written to.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod migrations;
mod open;

pub use migrations::{latest_version, schema_version};
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// One migration script failed; nothing from the batch was committed.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// `user_version` is ahead of every migration this binary knows.
    UnsupportedSchemaVersion { found: u32, latest: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::Migration { version, source } => {
                write!(f, "migration {version:04} failed: {source}")
            }
            Self::UnsupportedSchemaVersion { found, latest } => write!(
                f,
                "planner database is at schema {found}, this build understands up to {latest}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
