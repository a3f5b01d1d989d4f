//! Client configuration.
//!
//! Resolution order: built-in defaults, then an optional TOML file, then
//! `SOCIAL_*` environment variables. Command-line flags are applied last by
//! the binary.
//!
//! # Invariants
//! - A loaded config has passed [`ClientConfig::validate`].

use crate::auth::DEFAULT_SESSION_TTL_HOURS;
use crate::repo::post_repo::{POSTS_DEFAULT_LIMIT, POSTS_LIMIT_MAX};
use crate::storage::MEDIA_BUCKET;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "SOCIAL_";
const SESSION_FILE: &str = "session";

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    /// An environment override could not be parsed.
    InvalidEnv { key: String, value: String },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
            Self::InvalidEnv { key, value } => write!(f, "invalid value `{value}` for {key}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Root for the database, session file and default media directory.
    pub data_dir: PathBuf,
    /// Database file name inside `data_dir`.
    pub db_file: String,
    /// Blob store root; `<data_dir>/media` when unset.
    pub media_dir: Option<PathBuf>,
    pub media_bucket: String,
    /// Prefix of public media URLs.
    pub public_base_url: String,
    pub log_level: String,
    /// Absolute directory for rolling log files; stderr when unset.
    pub log_dir: Option<PathBuf>,
    pub feed_limit: u32,
    pub session_ttl_hours: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".social"),
            db_file: "social.db".to_string(),
            media_dir: None,
            media_bucket: MEDIA_BUCKET.to_string(),
            public_base_url: "http://localhost:8080/storage".to_string(),
            log_level: "warn".to_string(),
            log_dir: None,
            feed_limit: POSTS_DEFAULT_LIMIT,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
        }
    }
}

impl ClientConfig {
    /// Loads defaults, `path` (when given) and process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Applies `SOCIAL_<FIELD>` overrides read through `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let get = |field: &str| {
            let key = format!("{ENV_PREFIX}{}", field.to_ascii_uppercase());
            lookup(&key).map(|value| (key, value))
        };

        if let Some((_, value)) = get("data_dir") {
            self.data_dir = PathBuf::from(value);
        }
        if let Some((_, value)) = get("db_file") {
            self.db_file = value;
        }
        if let Some((_, value)) = get("media_dir") {
            self.media_dir = Some(PathBuf::from(value)).filter(|path| !path.as_os_str().is_empty());
        }
        if let Some((_, value)) = get("media_bucket") {
            self.media_bucket = value;
        }
        if let Some((_, value)) = get("public_base_url") {
            self.public_base_url = value;
        }
        if let Some((_, value)) = get("log_level") {
            self.log_level = value;
        }
        if let Some((_, value)) = get("log_dir") {
            self.log_dir = Some(PathBuf::from(value)).filter(|path| !path.as_os_str().is_empty());
        }
        if let Some((key, value)) = get("feed_limit") {
            self.feed_limit = parse_number(&key, &value)?;
        }
        if let Some((key, value)) = get("session_ttl_hours") {
            self.session_ttl_hours = parse_number(&key, &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir cannot be empty".to_string()));
        }
        let db_file = self.db_file.trim();
        if db_file.is_empty() || db_file.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "db_file must be a plain file name, got `{}`",
                self.db_file
            )));
        }
        let bucket = self.media_bucket.trim();
        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
            return Err(ConfigError::Invalid(format!(
                "media_bucket must be a single path segment, got `{}`",
                self.media_bucket
            )));
        }
        if self.public_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "public_base_url cannot be empty".to_string(),
            ));
        }
        if let Some(log_dir) = self.log_dir.as_ref() {
            if !log_dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be absolute, got `{}`",
                    log_dir.display()
                )));
            }
        }
        if self.feed_limit == 0 || self.feed_limit > POSTS_LIMIT_MAX {
            return Err(ConfigError::Invalid(format!(
                "feed_limit must be within 1..={POSTS_LIMIT_MAX}, got {}",
                self.feed_limit
            )));
        }
        if self.session_ttl_hours == 0 {
            return Err(ConfigError::Invalid(
                "session_ttl_hours must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(self.db_file.trim())
    }

    pub fn media_root(&self) -> PathBuf {
        self.media_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("media"))
    }

    /// File holding the signed-in session token.
    pub fn session_file(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}
