//! Core domain logic for the social client.
//! This crate is the single source of truth for business invariants.

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod realtime;
pub mod repo;
pub mod service;
pub mod storage;

pub use auth::{AuthError, AuthService, Session};
pub use config::{ClientConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::now_epoch_ms;
pub use realtime::{ChangeFeed, ChangeFilter, ChangeKind, RowChange, Subscription, Table};
pub use repo::{RepoError, RepoResult, SqliteStore};
pub use service::{ServiceError, ServiceResult, Toast};
pub use storage::{BlobError, BlobStore, FsBlobStore, MediaUpload};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
