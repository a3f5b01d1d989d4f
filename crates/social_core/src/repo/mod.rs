//! Data store contracts and the SQLite-backed implementation.
//!
//! # Responsibility
//! - Define one repository trait per table family.
//! - Implement every trait on [`SqliteStore`], keeping SQL inside this layer.
//! - Publish a [`RowChange`] for every committed write.
//!
//! # Invariants
//! - Write paths validate their input models before SQL mutations.
//! - Counter and coin adjustments happen in SQL, in the same transaction as
//!   the row change that causes them.
//! - Changes are published only after commit.

pub mod account_repo;
pub mod badge_repo;
pub mod banner_repo;
pub mod comment_repo;
pub mod follow_repo;
pub mod like_repo;
pub mod message_repo;
pub mod notification_repo;
pub mod post_repo;
pub mod profile_repo;
pub mod story_repo;
pub mod tip_repo;
pub mod wallet_repo;

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::validation::ModelValidationError;
use crate::realtime::{ChangeFeed, ChangeKind, RowChange, Table};
use rusqlite::{Connection, ErrorCode, Transaction};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every table family.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    NotFound {
        entity: &'static str,
        id: Uuid,
    },
    /// Unique constraint or state conflict, e.g. a taken username.
    Conflict(String),
    InsufficientCoins {
        required: i64,
        available: i64,
    },
    /// Connection schema is not at the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::InsufficientCoins {
                required,
                available,
            } => write!(
                f,
                "insufficient coins: {required} required, {available} available"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "data store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
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

/// SQLite data store over one borrowed, migrated connection.
///
/// Implements every repository trait of this module.
#[derive(Clone)]
pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
    feed: ChangeFeed,
}

impl<'conn> SqliteStore<'conn> {
    /// Creates a store with a private change feed.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::with_feed(conn, ChangeFeed::new())
    }

    /// Creates a store publishing to a shared change feed.
    pub fn with_feed(conn: &'conn Connection, feed: ChangeFeed) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn, feed })
    }

    /// Change feed this store publishes to.
    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    pub(crate) fn conn(&self) -> &'conn Connection {
        self.conn
    }

    /// Starts a deferred transaction on the shared connection.
    ///
    /// Nested calls fail with a SQLite error; repository methods never nest.
    pub(crate) fn begin(&self) -> RepoResult<Transaction<'conn>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    pub(crate) fn publish(
        &self,
        table: Table,
        kind: ChangeKind,
        row_id: Uuid,
        record: &impl Serialize,
    ) {
        self.feed
            .publish(RowChange::new(table, kind, row_id, record));
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

/// Maps unique/check constraint failures to [`RepoError::Conflict`].
pub(crate) fn map_conflict(err: rusqlite::Error, message: impl FnOnce() -> String) -> RepoError {
    if err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
        RepoError::Conflict(message())
    } else {
        err.into()
    }
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_opt_uuid(
    value: Option<String>,
    column: &'static str,
) -> RepoResult<Option<Uuid>> {
    value.map(|text| parse_uuid(&text, column)).transpose()
}

pub(crate) fn parse_bool(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn parse_enum<T>(
    value: &str,
    column: &'static str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> RepoResult<T> {
    parse(value).ok_or_else(|| RepoError::InvalidData(format!("invalid value `{value}` in {column}")))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

/// Clamps list limits to `1..=max`, using `default` for `None`/`0`.
pub(crate) fn normalize_limit(limit: Option<u32>, default: u32, max: u32) -> u32 {
    match limit {
        None | Some(0) => default,
        Some(value) if value > max => max,
        Some(value) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_limit, parse_bool, parse_uuid, RepoError, SqliteStore};
    use crate::db::open_db_in_memory;
    use rusqlite::Connection;

    #[test]
    fn normalize_limit_applies_default_and_max() {
        assert_eq!(normalize_limit(None, 20, 50), 20);
        assert_eq!(normalize_limit(Some(0), 20, 50), 20);
        assert_eq!(normalize_limit(Some(7), 20, 50), 7);
        assert_eq!(normalize_limit(Some(500), 20, 50), 50);
    }

    #[test]
    fn parse_helpers_reject_corrupt_values() {
        assert!(matches!(
            parse_uuid("nope", "posts.id"),
            Err(RepoError::InvalidData(_))
        ));
        assert!(matches!(
            parse_bool(2, "posts.is_boosted"),
            Err(RepoError::InvalidData(_))
        ));
    }

    #[test]
    fn store_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let result = SqliteStore::try_new(&conn);
        assert!(matches!(
            result,
            Err(RepoError::UninitializedConnection {
                actual_version: 0,
                ..
            })
        ));
    }

    #[test]
    fn store_accepts_migrated_connection() {
        let conn = open_db_in_memory().unwrap();
        assert!(SqliteStore::try_new(&conn).is_ok());
    }
}
