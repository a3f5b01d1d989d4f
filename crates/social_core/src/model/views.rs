//! Joined read models returned to screens.

use crate::model::message::Message;
use crate::model::notification::Notification;
use crate::model::post::Post;
use crate::model::profile::{Profile, ProfileId};
use crate::model::story::Story;
use serde::{Deserialize, Serialize};

/// Author columns embedded next to posts, stories and messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: ProfileId,
    pub username: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<&Profile> for AuthorSummary {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            username: profile.username.clone(),
            full_name: profile.full_name.clone(),
            avatar_url: profile.avatar_url.clone(),
        }
    }
}

/// One post card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub post: Post,
    pub author: AuthorSummary,
    /// `false` when rendered without a signed-in viewer.
    pub liked_by_viewer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryView {
    pub story: Story,
    pub author: AuthorSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageView {
    pub message: Message,
    pub sender: AuthorSummary,
    pub receiver: AuthorSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationView {
    pub notification: Notification,
    /// `None` for system notifications or deleted actors.
    pub actor: Option<AuthorSummary>,
}
