//! Time-expiring story records.

use crate::model::profile::ProfileId;
use crate::model::validation::{check_text_len, require_non_negative, ModelValidationError};
use crate::model::DAY_MS;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type StoryId = Uuid;

/// Default story lifetime.
pub const STORY_TTL_MS: i64 = DAY_MS;

/// Persisted `stories` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub user_id: ProfileId,
    pub content: Option<String>,
    pub media_url: String,
    /// Free-form MIME-ish label, e.g. `image` or `video/mp4`.
    pub media_type: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub view_count: i64,
    pub expires_at: i64,
    pub created_at: i64,
}

impl Story {
    pub fn is_active(&self, now_ms: i64) -> bool {
        self.expires_at > now_ms
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_negative("like_count", self.like_count)?;
        require_non_negative("comment_count", self.comment_count)?;
        require_non_negative("view_count", self.view_count)?;
        Ok(())
    }
}

/// Insert model for a new story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStory {
    pub user_id: ProfileId,
    pub content: Option<String>,
    pub media_url: String,
    pub media_type: Option<String>,
    pub created_at: i64,
    pub expires_at: i64,
}

impl NewStory {
    /// Builds a story that expires [`STORY_TTL_MS`] after `created_at`.
    pub fn expiring(
        user_id: ProfileId,
        media_url: impl Into<String>,
        media_type: Option<String>,
        content: Option<String>,
        created_at: i64,
    ) -> Self {
        Self {
            user_id,
            content,
            media_url: media_url.into(),
            media_type,
            created_at,
            expires_at: created_at.saturating_add(STORY_TTL_MS),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.media_url.trim().is_empty() {
            return Err(ModelValidationError::BlankText("media_url"));
        }
        if self.expires_at <= self.created_at {
            return Err(ModelValidationError::InvalidExpiry {
                created_at: self.created_at,
                expires_at: self.expires_at,
            });
        }
        if let Some(content) = self.content.as_deref() {
            check_text_len("content", content)?;
        }
        Ok(())
    }
}
