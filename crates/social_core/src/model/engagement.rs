//! Comments, likes and follow edges.
//!
//! # Invariants
//! - Comments and likes target exactly one post or one story.
//! - A profile likes a target at most once and follows a profile at most once.
//! - A profile never follows itself.

use crate::model::post::PostId;
use crate::model::profile::ProfileId;
use crate::model::story::StoryId;
use crate::model::validation::{require_text, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Target of a like or a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EngagementTarget {
    Post(PostId),
    Story(StoryId),
}

impl EngagementTarget {
    /// Splits the target into `(post_id, story_id)` columns.
    pub fn columns(self) -> (Option<PostId>, Option<StoryId>) {
        match self {
            Self::Post(id) => (Some(id), None),
            Self::Story(id) => (None, Some(id)),
        }
    }

    /// Rebuilds a target from persisted columns.
    pub fn from_columns(
        post_id: Option<PostId>,
        story_id: Option<StoryId>,
    ) -> Result<Self, ModelValidationError> {
        match (post_id, story_id) {
            (Some(id), None) => Ok(Self::Post(id)),
            (None, Some(id)) => Ok(Self::Story(id)),
            _ => Err(ModelValidationError::AmbiguousTarget),
        }
    }

    pub fn id(self) -> Uuid {
        match self {
            Self::Post(id) | Self::Story(id) => id,
        }
    }
}

/// Persisted `comments` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: ProfileId,
    pub target: EngagementTarget,
    pub content: String,
    pub created_at: i64,
}

/// Insert model for a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub user_id: ProfileId,
    pub target: EngagementTarget,
    pub content: String,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("comment", &self.content)
    }
}

/// Persisted `likes` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub id: Uuid,
    pub user_id: ProfileId,
    pub target: EngagementTarget,
    pub created_at: i64,
}

/// Persisted `follows` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    pub id: Uuid,
    pub follower_id: ProfileId,
    pub following_id: ProfileId,
    pub created_at: i64,
}
