//! Direct messaging: conversation list, threads and the live pane.
//!
//! # Invariants
//! - One conversation per counterpart, carrying the newest message in
//!   either direction; conversations are ordered newest first.
//! - `unread_count` counts the counterpart's `sent` messages newer than the
//!   viewer's latest message to them.

use crate::model::enums::{MessageStatus, NotificationType};
use crate::model::message::{Message, NewMessage};
use crate::model::profile::ProfileId;
use crate::model::views::AuthorSummary;
use crate::realtime::{ChangeFeed, ChangeFilter, RowChange, Subscription, Table};
use crate::repo::message_repo::MessageRepository;
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::profile_repo::ProfileRepository;
use crate::service::{notify_activity, ServiceError, ServiceResult};
use log::{debug, info};
use std::collections::HashMap;

/// Realtime channel the messages pane listens on.
pub const MESSAGES_CHANNEL: &str = "messages";

/// One row of the conversation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub other: AuthorSummary,
    pub last_message: Message,
    pub unread_count: usize,
}

pub struct MessageService<R> {
    repo: R,
}

impl<R> MessageService<R>
where
    R: MessageRepository + ProfileRepository + NotificationRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn conversations(&self, viewer: ProfileId) -> ServiceResult<Vec<Conversation>> {
        let messages = self.repo.messages_involving(viewer)?;
        let summaries = group_conversations(viewer, &messages);
        let other_ids: Vec<ProfileId> = summaries.iter().map(|summary| summary.other).collect();
        let authors = self.repo.author_summaries(&other_ids)?;
        Ok(summaries
            .into_iter()
            .filter_map(|summary| {
                let other = authors.get(&summary.other)?.clone();
                Some(Conversation {
                    other,
                    last_message: summary.last_message,
                    unread_count: summary.unread_count,
                })
            })
            .collect())
    }

    /// Both directions between the viewer and `other`, oldest first.
    pub fn thread(&self, viewer: ProfileId, other: ProfileId) -> ServiceResult<Vec<Message>> {
        Ok(self.repo.message_thread(viewer, other)?)
    }

    /// Sends a trimmed, non-empty message and notifies the receiver.
    pub fn send(&self, viewer: ProfileId, receiver: ProfileId, text: &str) -> ServiceResult<Message> {
        if self.repo.get_profile(receiver)?.is_none() {
            return Err(ServiceError::NotFound {
                entity: "profile",
                id: receiver,
            });
        }
        let message = self.repo.send_message(&NewMessage {
            sender_id: viewer,
            receiver_id: receiver,
            content: text.to_string(),
        })?;
        notify_activity(&self.repo, receiver, viewer, NotificationType::Message, None);
        info!(
            "event=message_send module=service status=ok message_id={}",
            message.id
        );
        Ok(message)
    }

    /// Marks `other`'s messages to the viewer as ignored.
    pub fn ignore(&self, viewer: ProfileId, other: ProfileId) -> ServiceResult<usize> {
        Ok(self
            .repo
            .set_message_status(other, viewer, MessageStatus::Ignored)?)
    }
}

struct ConversationSummary {
    other: ProfileId,
    last_message: Message,
    unread_count: usize,
}

/// Groups `messages` (newest first) by counterpart.
fn group_conversations(viewer: ProfileId, messages: &[Message]) -> Vec<ConversationSummary> {
    let mut order: Vec<ProfileId> = Vec::new();
    let mut latest: HashMap<ProfileId, &Message> = HashMap::new();
    let mut viewer_last_sent: HashMap<ProfileId, i64> = HashMap::new();

    for message in messages {
        let other = message.counterpart(viewer);
        if !latest.contains_key(&other) {
            order.push(other);
            latest.insert(other, message);
        }
        if message.sender_id == viewer {
            viewer_last_sent
                .entry(other)
                .and_modify(|at| *at = (*at).max(message.created_at))
                .or_insert(message.created_at);
        }
    }

    let mut unread: HashMap<ProfileId, usize> = HashMap::new();
    for message in messages {
        if message.receiver_id != viewer || message.status != MessageStatus::Sent {
            continue;
        }
        let newer_than_reply = viewer_last_sent
            .get(&message.sender_id)
            .map_or(true, |replied_at| message.created_at > *replied_at);
        if newer_than_reply {
            *unread.entry(message.sender_id).or_default() += 1;
        }
    }

    order
        .into_iter()
        .filter_map(|other| {
            let last_message = (*latest.get(&other)?).clone();
            Some(ConversationSummary {
                other,
                last_message,
                unread_count: unread.get(&other).copied().unwrap_or(0),
            })
        })
        .collect()
}

/// Live state of the messages screen.
///
/// Holds a subscription to message inserts; [`MessagesPane::refresh_if_changed`]
/// re-fetches only when an insert involving the viewer arrived.
pub struct MessagesPane<R> {
    service: MessageService<R>,
    viewer: ProfileId,
    subscription: Subscription,
    selected: Option<ProfileId>,
    conversations: Vec<Conversation>,
    thread: Vec<Message>,
}

impl<R> MessagesPane<R>
where
    R: MessageRepository + ProfileRepository + NotificationRepository,
{
    /// Subscribes and performs the initial load.
    pub fn open(service: MessageService<R>, feed: &ChangeFeed, viewer: ProfileId) -> ServiceResult<Self> {
        let subscription = feed.subscribe(MESSAGES_CHANNEL, ChangeFilter::inserts(Table::Messages));
        let conversations = service.conversations(viewer)?;
        Ok(Self {
            service,
            viewer,
            subscription,
            selected: None,
            conversations,
            thread: Vec::new(),
        })
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn thread(&self) -> &[Message] {
        &self.thread
    }

    pub fn selected(&self) -> Option<ProfileId> {
        self.selected
    }

    /// Opens the thread with `other`.
    pub fn select(&mut self, other: ProfileId) -> ServiceResult<&[Message]> {
        self.thread = self.service.thread(self.viewer, other)?;
        self.selected = Some(other);
        Ok(&self.thread)
    }

    /// Sends to the selected counterpart and reloads the thread.
    pub fn send(&mut self, text: &str) -> ServiceResult<Message> {
        let other = self.selected.ok_or_else(|| {
            ServiceError::InvalidInput("select a conversation first".to_string())
        })?;
        let message = self.service.send(self.viewer, other, text)?;
        self.refresh_if_changed()?;
        Ok(message)
    }

    /// Applies pending inserts; returns whether anything was reloaded.
    pub fn refresh_if_changed(&mut self) -> ServiceResult<bool> {
        let changes = self.subscription.drain();
        let viewer = self.viewer.to_string();
        let relevant: Vec<&RowChange> = changes
            .iter()
            .filter(|change| involves(change, &viewer))
            .collect();
        if relevant.is_empty() {
            return Ok(false);
        }

        self.conversations = self.service.conversations(self.viewer)?;
        if let Some(other) = self.selected {
            let other_text = other.to_string();
            if relevant.iter().any(|change| involves(change, &other_text)) {
                self.thread = self.service.thread(self.viewer, other)?;
            }
        }
        debug!(
            "event=messages_refresh module=service status=ok changes={}",
            relevant.len()
        );
        Ok(true)
    }
}

fn involves(change: &RowChange, profile: &str) -> bool {
    change.column_text("sender_id").as_deref() == Some(profile)
        || change.column_text("receiver_id").as_deref() == Some(profile)
}

#[cfg(test)]
mod tests {
    use super::group_conversations;
    use crate::model::enums::MessageStatus;
    use crate::model::message::Message;
    use uuid::Uuid;

    fn message(sender: Uuid, receiver: Uuid, at: i64, status: MessageStatus) -> Message {
        Message {
            id: Uuid::new_v4(),
            sender_id: sender,
            receiver_id: receiver,
            content: format!("m{at}"),
            status,
            created_at: at,
        }
    }

    #[test]
    fn unread_counts_only_messages_after_last_reply() {
        let me = Uuid::new_v4();
        let ana = Uuid::new_v4();
        let bo = Uuid::new_v4();
        // Newest first.
        let messages = vec![
            message(ana, me, 50, MessageStatus::Sent),
            message(bo, me, 40, MessageStatus::Ignored),
            message(ana, me, 30, MessageStatus::Sent),
            message(me, ana, 20, MessageStatus::Sent),
            message(ana, me, 10, MessageStatus::Sent),
        ];

        let summaries = group_conversations(me, &messages);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].other, ana);
        assert_eq!(summaries[0].last_message.created_at, 50);
        assert_eq!(summaries[0].unread_count, 2);
        assert_eq!(summaries[1].other, bo);
        assert_eq!(summaries[1].unread_count, 0);
    }
}
