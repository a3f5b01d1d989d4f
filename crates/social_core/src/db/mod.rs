//! Local SQLite schema for the social graph and everything hanging off it.
//!
//! # Responsibility
//! - Own the schema for profiles, follows, posts, stories, engagement,
//!   messages, notifications, wallet tables, banners and auth sessions.
//! - Hand repositories a connection that is configured and migrated.
//!
//! # Invariants
//! - The schema version lives in `PRAGMA user_version`.
//! - Counter columns (`like_count`, `follower_count`, `coins`, ...) carry
//!   `CHECK (>= 0)` constraints; repositories keep them in step with the
//!   rows they count.
//! - Repositories refuse connections whose version differs from
//!   [`migrations::latest_version`].

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
