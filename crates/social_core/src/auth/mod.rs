//! Email/password accounts and local sessions.
//!
//! # Responsibility
//! - Register accounts together with their profile.
//! - Issue, resolve and revoke opaque session tokens.
//!
//! # Invariants
//! - Passwords are stored only as Argon2id hashes.
//! - Unknown emails and wrong passwords fail with the same error.
//! - Expired sessions never resolve.

pub mod password;

use crate::model::now_epoch_ms;
use crate::model::profile::{NewProfile, Profile, ProfileId};
use crate::model::HOUR_MS;
use crate::repo::account_repo::{AccountRepository, SessionRecord};
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::RepoError;
use log::{info, warn};
use password::{hash_password, verify_password};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const SESSION_TOKEN_CHARS: usize = 48;
pub const DEFAULT_SESSION_TTL_HOURS: u32 = 24 * 30;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug)]
pub enum AuthError {
    InvalidEmail,
    WeakPassword,
    EmailTaken,
    UsernameTaken,
    InvalidCredentials,
    SessionExpired,
    Repo(RepoError),
    Hash(String),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "email address is invalid"),
            Self::WeakPassword => write!(
                f,
                "password must be at least {} characters",
                password::MIN_PASSWORD_CHARS
            ),
            Self::EmailTaken => write!(f, "email is already registered"),
            Self::UsernameTaken => write!(f, "username is already taken"),
            Self::InvalidCredentials => write!(f, "invalid email or password"),
            Self::SessionExpired => write!(f, "session expired; sign in again"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Hash(message) => write!(f, "password hash error: {message}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AuthError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// A signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub profile_id: ProfileId,
    pub expires_at: i64,
}

impl From<SessionRecord> for Session {
    fn from(record: SessionRecord) -> Self {
        Self {
            token: record.token,
            profile_id: record.profile_id,
            expires_at: record.expires_at,
        }
    }
}

/// Sign-up, sign-in and session resolution.
pub struct AuthService<R: AccountRepository + ProfileRepository> {
    repo: R,
    session_ttl_ms: i64,
}

impl<R: AccountRepository + ProfileRepository> AuthService<R> {
    pub fn new(repo: R) -> Self {
        Self::with_session_ttl_hours(repo, DEFAULT_SESSION_TTL_HOURS)
    }

    pub fn with_session_ttl_hours(repo: R, hours: u32) -> Self {
        Self {
            repo,
            session_ttl_ms: i64::from(hours.max(1)) * HOUR_MS,
        }
    }

    /// Creates the account and profile, then opens a session.
    pub fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
        full_name: Option<&str>,
    ) -> AuthResult<(Profile, Session)> {
        let email = normalize_email(email)?;
        let password_hash = hash_password(password)?;
        if self.repo.find_account_by_email(&email)?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let new_profile = NewProfile {
            id: Uuid::new_v4(),
            username: username.to_string(),
            full_name: full_name.map(str::to_string),
        }
        .normalize()
        .map_err(RepoError::from)?;
        if self
            .repo
            .get_profile_by_username(&new_profile.username)?
            .is_some()
        {
            return Err(AuthError::UsernameTaken);
        }

        let (profile, _) = match self.repo.register(&new_profile, &email, &password_hash) {
            Ok(created) => created,
            Err(RepoError::Conflict(message)) if message.starts_with("username") => {
                return Err(AuthError::UsernameTaken)
            }
            Err(RepoError::Conflict(_)) => return Err(AuthError::EmailTaken),
            Err(err) => return Err(err.into()),
        };
        let session = self.open_session(profile.id, now_epoch_ms())?;
        info!(
            "event=auth_sign_up module=auth status=ok profile_id={}",
            profile.id
        );
        Ok((profile, session))
    }

    pub fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session> {
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;
        let account = match self.repo.find_account_by_email(&email)? {
            Some(account) => account,
            None => {
                warn!("event=auth_sign_in module=auth status=rejected reason=unknown_email");
                return Err(AuthError::InvalidCredentials);
            }
        };
        if let Err(err) = verify_password(password, &account.password_hash) {
            warn!(
                "event=auth_sign_in module=auth status=rejected profile_id={}",
                account.profile_id
            );
            return Err(err);
        }
        let now_ms = now_epoch_ms();
        let purged = self.repo.purge_expired_sessions(now_ms)?;
        let session = self.open_session(account.profile_id, now_ms)?;
        info!(
            "event=auth_sign_in module=auth status=ok profile_id={} purged_sessions={}",
            account.profile_id, purged
        );
        Ok(session)
    }

    /// Revokes `token`; unknown tokens are ignored.
    pub fn sign_out(&self, token: &str) -> AuthResult<()> {
        let removed = self.repo.delete_session(token)?;
        info!("event=auth_sign_out module=auth status=ok removed={removed}");
        Ok(())
    }

    /// Resolves a token to a live session.
    pub fn current_session(&self, token: &str, now_ms: i64) -> AuthResult<Session> {
        let record = self
            .repo
            .get_session(token)?
            .ok_or(AuthError::SessionExpired)?;
        if record.expires_at <= now_ms {
            self.repo.delete_session(token)?;
            return Err(AuthError::SessionExpired);
        }
        Ok(record.into())
    }

    fn open_session(&self, profile_id: ProfileId, now_ms: i64) -> AuthResult<Session> {
        let record = SessionRecord {
            token: generate_token(),
            profile_id,
            created_at: now_ms,
            expires_at: now_ms + self.session_ttl_ms,
        };
        self.repo.create_session(&record)?;
        Ok(record.into())
    }
}

/// Trims and lowercases an email; requires a non-empty local part and a
/// dotted domain.
pub fn normalize_email(email: &str) -> AuthResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(AuthError::InvalidEmail)
    }
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_CHARS)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{generate_token, normalize_email, AuthError, SESSION_TOKEN_CHARS};

    #[test]
    fn normalize_email_lowercases_and_validates() {
        assert_eq!(normalize_email("  Mira@Example.COM ").unwrap(), "mira@example.com");
        for bad in ["", "mira", "@example.com", "mira@", "mira@example", "a b@c.de", "a@b@c.de"] {
            assert!(matches!(normalize_email(bad), Err(AuthError::InvalidEmail)), "{bad}");
        }
    }

    #[test]
    fn tokens_are_long_and_distinct() {
        let first = generate_token();
        assert_eq!(first.len(), SESSION_TOKEN_CHARS);
        assert_ne!(first, generate_token());
    }
}
