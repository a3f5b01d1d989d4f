//! Notification repository.

use crate::model::enums::NotificationType;
use crate::model::notification::{NewNotification, Notification, NotificationId};
use crate::model::now_epoch_ms;
use crate::model::profile::ProfileId;
use crate::realtime::{ChangeKind, Table};
use crate::repo::{
    normalize_limit, parse_bool, parse_enum, parse_opt_uuid, parse_uuid, RepoError, RepoResult,
    SqliteStore,
};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

const NOTIFICATION_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    actor_id,
    post_id,
    type,
    content,
    is_read,
    created_at
FROM notifications";

pub const NOTIFICATIONS_DEFAULT_LIMIT: u32 = 50;
pub const NOTIFICATIONS_LIMIT_MAX: u32 = 200;

/// Repository interface for notification records.
pub trait NotificationRepository {
    fn create_notification(&self, notification: &NewNotification) -> RepoResult<Notification>;
    /// Newest first; limit defaults to 50.
    fn list_notifications(
        &self,
        recipient: ProfileId,
        limit: Option<u32>,
    ) -> RepoResult<Vec<Notification>>;
    /// Marks one of `recipient`'s notifications read.
    fn mark_notification_read(
        &self,
        recipient: ProfileId,
        id: NotificationId,
    ) -> RepoResult<()>;
    fn mark_all_notifications_read(&self, recipient: ProfileId) -> RepoResult<usize>;
    fn unread_notification_count(&self, recipient: ProfileId) -> RepoResult<i64>;
}

impl NotificationRepository for SqliteStore<'_> {
    fn create_notification(&self, notification: &NewNotification) -> RepoResult<Notification> {
        let id = Uuid::new_v4();
        let now = now_epoch_ms();
        self.conn().execute(
            "INSERT INTO notifications (id, user_id, actor_id, post_id, type, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                id.to_string(),
                notification.user_id.to_string(),
                notification.actor_id.map(|value| value.to_string()),
                notification.post_id.map(|value| value.to_string()),
                notification.kind.as_str(),
                notification.content.as_str(),
                now,
            ],
        )?;

        let stored = Notification {
            id,
            user_id: notification.user_id,
            actor_id: notification.actor_id,
            post_id: notification.post_id,
            kind: notification.kind,
            content: notification.content.clone(),
            is_read: false,
            created_at: now,
        };
        self.publish(Table::Notifications, ChangeKind::Insert, id, &stored);
        Ok(stored)
    }

    fn list_notifications(
        &self,
        recipient: ProfileId,
        limit: Option<u32>,
    ) -> RepoResult<Vec<Notification>> {
        let limit = normalize_limit(limit, NOTIFICATIONS_DEFAULT_LIMIT, NOTIFICATIONS_LIMIT_MAX);
        let mut stmt = self.conn().prepare_cached(&format!(
            "{NOTIFICATION_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2;"
        ))?;
        let mut rows = stmt.query(params![recipient.to_string(), i64::from(limit)])?;
        let mut notifications = Vec::new();
        while let Some(row) = rows.next()? {
            notifications.push(parse_notification_row(row)?);
        }
        Ok(notifications)
    }

    fn mark_notification_read(
        &self,
        recipient: ProfileId,
        id: NotificationId,
    ) -> RepoResult<()> {
        let changed = self.conn().execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2;",
            params![id.to_string(), recipient.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "notification",
                id,
            });
        }
        if let Some(stored) = get_notification(self, id)? {
            self.publish(Table::Notifications, ChangeKind::Update, id, &stored);
        }
        Ok(())
    }

    fn mark_all_notifications_read(&self, recipient: ProfileId) -> RepoResult<usize> {
        let changed = self.conn().execute(
            "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0;",
            [recipient.to_string()],
        )?;
        Ok(changed)
    }

    fn unread_notification_count(&self, recipient: ProfileId) -> RepoResult<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0;",
            [recipient.to_string()],
            |row| row.get(0),
        )?)
    }
}

fn get_notification(store: &SqliteStore<'_>, id: NotificationId) -> RepoResult<Option<Notification>> {
    let mut stmt = store
        .conn()
        .prepare_cached(&format!("{NOTIFICATION_SELECT_SQL} WHERE id = ?1;"))?;
    let row = stmt
        .query_row([id.to_string()], |row| Ok(parse_notification_row(row)))
        .optional()?;
    row.transpose()
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    let id_text: String = row.get("id")?;
    let user_text: String = row.get("user_id")?;
    let kind_text: String = row.get("type")?;
    Ok(Notification {
        id: parse_uuid(&id_text, "notifications.id")?,
        user_id: parse_uuid(&user_text, "notifications.user_id")?,
        actor_id: parse_opt_uuid(row.get("actor_id")?, "notifications.actor_id")?,
        post_id: parse_opt_uuid(row.get("post_id")?, "notifications.post_id")?,
        kind: parse_enum(&kind_text, "notifications.type", NotificationType::parse)?,
        content: row.get("content")?,
        is_read: parse_bool(row.get("is_read")?, "notifications.is_read")?,
        created_at: row.get("created_at")?,
    })
}
