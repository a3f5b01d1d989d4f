//! Post records for feed, explore and reels projections.
//!
//! # Invariants
//! - A post carries content, media, or both.
//! - `boost_expires_at` is meaningful only while `is_boosted` is set.

use crate::model::enums::MediaType;
use crate::model::profile::ProfileId;
use crate::model::validation::{
    check_text_len, require_non_negative, ModelValidationError,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PostId = Uuid;

/// Persisted `posts` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub user_id: ProfileId,
    pub content: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<MediaType>,
    /// Hashtags without the leading `#`; `None` when the post has none.
    pub hashtags: Option<Vec<String>>,
    pub like_count: i64,
    pub comment_count: i64,
    pub view_count: i64,
    pub is_boosted: bool,
    pub boost_expires_at: Option<i64>,
    pub created_at: i64,
}

impl Post {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_body(self.content.as_deref(), self.media_url.as_deref())?;
        require_non_negative("like_count", self.like_count)?;
        require_non_negative("comment_count", self.comment_count)?;
        require_non_negative("view_count", self.view_count)?;
        Ok(())
    }

    /// Whether the paid boost window is still open at `now_ms`.
    pub fn is_boost_active(&self, now_ms: i64) -> bool {
        self.is_boosted
            && self
                .boost_expires_at
                .is_some_and(|expires_at| expires_at > now_ms)
    }

    pub fn has_hashtag(&self, tag: &str) -> bool {
        self.hashtags
            .as_ref()
            .is_some_and(|tags| tags.iter().any(|value| value == tag))
    }
}

/// Insert model for the post composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub user_id: ProfileId,
    pub content: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<MediaType>,
    pub hashtags: Option<Vec<String>>,
    pub created_at: i64,
}

impl NewPost {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_body(self.content.as_deref(), self.media_url.as_deref())
    }
}

fn validate_body(content: Option<&str>, media_url: Option<&str>) -> Result<(), ModelValidationError> {
    let has_content = content.is_some_and(|text| !text.trim().is_empty());
    let has_media = media_url.is_some_and(|url| !url.trim().is_empty());
    if !has_content && !has_media {
        return Err(ModelValidationError::EmptyPost);
    }
    if let Some(text) = content {
        check_text_len("content", text)?;
    }
    Ok(())
}
