//! Activity notification records.

use crate::model::enums::NotificationType;
use crate::model::post::PostId;
use crate::model::profile::ProfileId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type NotificationId = Uuid;

/// Persisted `notifications` row. `user_id` is the recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: ProfileId,
    pub actor_id: Option<ProfileId>,
    pub post_id: Option<PostId>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub content: String,
    pub is_read: bool,
    pub created_at: i64,
}

/// Insert model for a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: ProfileId,
    pub actor_id: Option<ProfileId>,
    pub post_id: Option<PostId>,
    pub kind: NotificationType,
    pub content: String,
}

impl NewNotification {
    /// Builds the notification sent to `recipient` for an action by `actor`.
    pub fn activity(
        recipient: ProfileId,
        actor: ProfileId,
        kind: NotificationType,
        actor_username: &str,
        post_id: Option<PostId>,
    ) -> Self {
        let content = match kind {
            NotificationType::Like => format!("{actor_username} liked your post"),
            NotificationType::Comment => format!("{actor_username} commented on your post"),
            NotificationType::Follow => format!("{actor_username} started following you"),
            NotificationType::Message => format!("{actor_username} sent you a message"),
            NotificationType::Tip => format!("{actor_username} sent you a tip"),
        };
        Self {
            user_id: recipient,
            actor_id: Some(actor),
            post_id,
            kind,
            content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::NewNotification;
    use crate::model::enums::NotificationType;
    use uuid::Uuid;

    #[test]
    fn activity_content_names_the_actor() {
        let note = NewNotification::activity(
            Uuid::new_v4(),
            Uuid::new_v4(),
            NotificationType::Follow,
            "mira",
            None,
        );
        assert_eq!(note.content, "mira started following you");
        assert_eq!(note.kind, NotificationType::Follow);
    }
}
