//! Profile records.
//!
//! # Invariants
//! - `id` equals the auth identity that owns the profile.
//! - `username` is unique and normalized (see `normalize_username`).
//! - `coins`, `follower_count` and `following_count` are never negative.

use crate::model::enums::ThemeType;
use crate::model::validation::{
    check_text_len, normalize_username, require_non_negative, ModelValidationError,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable profile identifier, shared with the auth identity.
pub type ProfileId = Uuid;

/// Persisted `profiles` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub username: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    /// Spendable virtual currency balance.
    pub coins: i64,
    pub follower_count: i64,
    pub following_count: i64,
    pub is_vip: bool,
    pub theme: ThemeType,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Profile {
    /// Validates field-level invariants of a persisted or pending profile.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        let normalized = normalize_username(&self.username)?;
        if normalized != self.username {
            return Err(ModelValidationError::InvalidUsername(self.username.clone()));
        }
        require_non_negative("coins", self.coins)?;
        require_non_negative("follower_count", self.follower_count)?;
        require_non_negative("following_count", self.following_count)?;
        if let Some(bio) = self.bio.as_deref() {
            check_text_len("bio", bio)?;
        }
        Ok(())
    }

    /// First letter of the username, uppercased, for avatar fallbacks.
    pub fn initial(&self) -> char {
        self.username
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }
}

/// Insert model for a new profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    pub id: ProfileId,
    pub username: String,
    pub full_name: Option<String>,
}

impl NewProfile {
    /// Validates and normalizes the username in place.
    pub fn normalize(mut self) -> Result<Self, ModelValidationError> {
        self.username = normalize_username(&self.username)?;
        self.full_name = self
            .full_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        Ok(self)
    }
}

/// Partial update applied by the settings form.
///
/// `None` leaves a field untouched; `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub full_name: Option<Option<String>>,
    pub bio: Option<Option<String>>,
    pub avatar_url: Option<Option<String>>,
    pub theme: Option<ThemeType>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.full_name.is_none()
            && self.bio.is_none()
            && self.avatar_url.is_none()
            && self.theme.is_none()
    }

    /// Normalizes username and trims free-text fields.
    pub fn normalize(mut self) -> Result<Self, ModelValidationError> {
        if let Some(username) = self.username.as_deref() {
            self.username = Some(normalize_username(username)?);
        }
        self.full_name = self.full_name.map(trim_to_none);
        self.bio = self.bio.map(trim_to_none);
        if let Some(Some(bio)) = &self.bio {
            check_text_len("bio", bio)?;
        }
        Ok(self)
    }
}

fn trim_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
