//! Notification list and its live inbox.

use crate::model::notification::NotificationId;
use crate::model::profile::ProfileId;
use crate::model::views::NotificationView;
use crate::realtime::{ChangeFeed, ChangeFilter, Subscription, Table};
use crate::repo::notification_repo::{NotificationRepository, NOTIFICATIONS_DEFAULT_LIMIT};
use crate::repo::profile_repo::ProfileRepository;
use crate::service::ServiceResult;
use log::debug;

/// Realtime channel the inbox listens on.
pub const NOTIFICATIONS_CHANNEL: &str = "notifications";

pub struct NotificationService<R> {
    repo: R,
}

impl<R> NotificationService<R>
where
    R: NotificationRepository + ProfileRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Newest 50 notifications with their actor.
    pub fn list(&self, viewer: ProfileId) -> ServiceResult<Vec<NotificationView>> {
        let notifications = self
            .repo
            .list_notifications(viewer, Some(NOTIFICATIONS_DEFAULT_LIMIT))?;
        let actor_ids: Vec<ProfileId> = notifications
            .iter()
            .filter_map(|notification| notification.actor_id)
            .collect();
        let actors = self.repo.author_summaries(&actor_ids)?;
        Ok(notifications
            .into_iter()
            .map(|notification| {
                let actor = notification
                    .actor_id
                    .and_then(|id| actors.get(&id).cloned());
                NotificationView {
                    notification,
                    actor,
                }
            })
            .collect())
    }

    pub fn mark_read(&self, viewer: ProfileId, id: NotificationId) -> ServiceResult<()> {
        Ok(self.repo.mark_notification_read(viewer, id)?)
    }

    pub fn mark_all_read(&self, viewer: ProfileId) -> ServiceResult<usize> {
        Ok(self.repo.mark_all_notifications_read(viewer)?)
    }

    pub fn unread_count(&self, viewer: ProfileId) -> ServiceResult<i64> {
        Ok(self.repo.unread_notification_count(viewer)?)
    }
}

/// Live notification list of one viewer.
pub struct NotificationInbox<R> {
    service: NotificationService<R>,
    viewer: ProfileId,
    subscription: Subscription,
    items: Vec<NotificationView>,
}

impl<R> NotificationInbox<R>
where
    R: NotificationRepository + ProfileRepository,
{
    /// Subscribes to the viewer's notification inserts and loads the list.
    pub fn open(
        service: NotificationService<R>,
        feed: &ChangeFeed,
        viewer: ProfileId,
    ) -> ServiceResult<Self> {
        let subscription = feed.subscribe(
            NOTIFICATIONS_CHANNEL,
            ChangeFilter::inserts(Table::Notifications).with_column_eq("user_id", viewer),
        );
        let items = service.list(viewer)?;
        Ok(Self {
            service,
            viewer,
            subscription,
            items,
        })
    }

    pub fn items(&self) -> &[NotificationView] {
        &self.items
    }

    pub fn unread(&self) -> usize {
        self.items
            .iter()
            .filter(|item| !item.notification.is_read)
            .count()
    }

    /// Re-fetches when a new notification arrived; returns whether it did.
    pub fn refresh_if_changed(&mut self) -> ServiceResult<bool> {
        let arrived = self.subscription.drain().len();
        if arrived == 0 {
            return Ok(false);
        }
        self.items = self.service.list(self.viewer)?;
        debug!("event=inbox_refresh module=service status=ok arrived={arrived}");
        Ok(true)
    }

    pub fn mark_read(&mut self, id: NotificationId) -> ServiceResult<()> {
        self.service.mark_read(self.viewer, id)?;
        for item in &mut self.items {
            if item.notification.id == id {
                item.notification.is_read = true;
            }
        }
        Ok(())
    }

    pub fn mark_all_read(&mut self) -> ServiceResult<usize> {
        let changed = self.service.mark_all_read(self.viewer)?;
        for item in &mut self.items {
            item.notification.is_read = true;
        }
        Ok(changed)
    }
}
