//! Credential and session storage.
//!
//! # Invariants
//! - One account per profile; emails are stored lowercased and unique.
//! - Only password hashes are stored.

use crate::model::profile::{NewProfile, Profile, ProfileId};
use crate::realtime::{ChangeKind, Table};
use crate::repo::profile_repo::insert_profile;
use crate::repo::{map_conflict, parse_uuid, RepoResult, SqliteStore};
use rusqlite::{params, OptionalExtension};

/// Persisted `accounts` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub profile_id: ProfileId,
    pub email: String,
    pub password_hash: String,
    pub created_at: i64,
}

/// Persisted `sessions` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub token: String,
    pub profile_id: ProfileId,
    pub created_at: i64,
    pub expires_at: i64,
}

/// Repository interface for accounts and sessions.
pub trait AccountRepository {
    /// Creates the profile and its account in one transaction.
    ///
    /// Fails with `RepoError::Conflict` when the email or username is taken.
    fn register(
        &self,
        profile: &NewProfile,
        email: &str,
        password_hash: &str,
    ) -> RepoResult<(Profile, Account)>;
    fn find_account_by_email(&self, email: &str) -> RepoResult<Option<Account>>;
    fn create_session(&self, session: &SessionRecord) -> RepoResult<()>;
    fn get_session(&self, token: &str) -> RepoResult<Option<SessionRecord>>;
    /// Returns whether a session was removed.
    fn delete_session(&self, token: &str) -> RepoResult<bool>;
    /// Removes sessions expired at `now_ms`.
    fn purge_expired_sessions(&self, now_ms: i64) -> RepoResult<usize>;
}

impl AccountRepository for SqliteStore<'_> {
    fn register(
        &self,
        profile: &NewProfile,
        email: &str,
        password_hash: &str,
    ) -> RepoResult<(Profile, Account)> {
        let email = email.trim().to_lowercase();
        let tx = self.begin()?;
        let stored = insert_profile(&tx, profile)?;
        let account = Account {
            profile_id: stored.id,
            email,
            password_hash: password_hash.to_string(),
            created_at: stored.created_at,
        };
        tx.execute(
            "INSERT INTO accounts (profile_id, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                account.profile_id.to_string(),
                account.email.as_str(),
                account.password_hash.as_str(),
                account.created_at,
            ],
        )
        .map_err(|err| map_conflict(err, || format!("email `{}` is registered", account.email)))?;
        tx.commit()?;

        self.publish(Table::Profiles, ChangeKind::Insert, stored.id, &stored);
        Ok((stored, account))
    }

    fn find_account_by_email(&self, email: &str) -> RepoResult<Option<Account>> {
        let row: Option<(String, String, String, i64)> = self
            .conn()
            .query_row(
                "SELECT profile_id, email, password_hash, created_at
                 FROM accounts WHERE email = ?1;",
                [email.trim().to_lowercase()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;
        row.map(|(profile_text, email, password_hash, created_at)| {
            Ok(Account {
                profile_id: parse_uuid(&profile_text, "accounts.profile_id")?,
                email,
                password_hash,
                created_at,
            })
        })
        .transpose()
    }

    fn create_session(&self, session: &SessionRecord) -> RepoResult<()> {
        self.conn().execute(
            "INSERT INTO sessions (token, profile_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                session.token.as_str(),
                session.profile_id.to_string(),
                session.created_at,
                session.expires_at,
            ],
        )?;
        Ok(())
    }

    fn get_session(&self, token: &str) -> RepoResult<Option<SessionRecord>> {
        let row: Option<(String, i64, i64)> = self
            .conn()
            .query_row(
                "SELECT profile_id, created_at, expires_at FROM sessions WHERE token = ?1;",
                [token],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        row.map(|(profile_text, created_at, expires_at)| {
            Ok(SessionRecord {
                token: token.to_string(),
                profile_id: parse_uuid(&profile_text, "sessions.profile_id")?,
                created_at,
                expires_at,
            })
        })
        .transpose()
    }

    fn delete_session(&self, token: &str) -> RepoResult<bool> {
        let removed = self
            .conn()
            .execute("DELETE FROM sessions WHERE token = ?1;", [token])?;
        Ok(removed > 0)
    }

    fn purge_expired_sessions(&self, now_ms: i64) -> RepoResult<usize> {
        Ok(self
            .conn()
            .execute("DELETE FROM sessions WHERE expires_at <= ?1;", [now_ms])?)
    }
}
