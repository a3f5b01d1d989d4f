//! Direct message repository.

use crate::model::enums::MessageStatus;
use crate::model::message::{Message, NewMessage};
use crate::model::now_epoch_ms;
use crate::model::profile::ProfileId;
use crate::realtime::{ChangeKind, Table};
use crate::repo::{parse_enum, parse_uuid, RepoResult, SqliteStore};
use rusqlite::{params, Row};
use uuid::Uuid;

const MESSAGE_SELECT_SQL: &str = "SELECT
    id,
    sender_id,
    receiver_id,
    content,
    status,
    created_at
FROM messages";

/// Repository interface for direct messages.
pub trait MessageRepository {
    fn send_message(&self, message: &NewMessage) -> RepoResult<Message>;
    /// Every message sent or received by `user`, newest first.
    fn messages_involving(&self, user: ProfileId) -> RepoResult<Vec<Message>>;
    /// Both directions between `a` and `b`, oldest first.
    fn message_thread(&self, a: ProfileId, b: ProfileId) -> RepoResult<Vec<Message>>;
    /// Sets `status` on messages from `sender` to `receiver`; returns count.
    fn set_message_status(
        &self,
        sender: ProfileId,
        receiver: ProfileId,
        status: MessageStatus,
    ) -> RepoResult<usize>;
}

impl MessageRepository for SqliteStore<'_> {
    fn send_message(&self, message: &NewMessage) -> RepoResult<Message> {
        let message = message.clone().normalize()?;
        let id = Uuid::new_v4();
        let now = now_epoch_ms();
        self.conn().execute(
            "INSERT INTO messages (id, sender_id, receiver_id, content, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id.to_string(),
                message.sender_id.to_string(),
                message.receiver_id.to_string(),
                message.content.as_str(),
                MessageStatus::Sent.as_str(),
                now,
            ],
        )?;

        let stored = Message {
            id,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content: message.content,
            status: MessageStatus::Sent,
            created_at: now,
        };
        self.publish(Table::Messages, ChangeKind::Insert, id, &stored);
        Ok(stored)
    }

    fn messages_involving(&self, user: ProfileId) -> RepoResult<Vec<Message>> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "{MESSAGE_SELECT_SQL}
             WHERE sender_id = ?1 OR receiver_id = ?1
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([user.to_string()])?;
        collect_messages(&mut rows)
    }

    fn message_thread(&self, a: ProfileId, b: ProfileId) -> RepoResult<Vec<Message>> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "{MESSAGE_SELECT_SQL}
             WHERE (sender_id = ?1 AND receiver_id = ?2)
                OR (sender_id = ?2 AND receiver_id = ?1)
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query(params![a.to_string(), b.to_string()])?;
        collect_messages(&mut rows)
    }

    fn set_message_status(
        &self,
        sender: ProfileId,
        receiver: ProfileId,
        status: MessageStatus,
    ) -> RepoResult<usize> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "{MESSAGE_SELECT_SQL}
             WHERE sender_id = ?1 AND receiver_id = ?2 AND status <> ?3
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query(params![
            sender.to_string(),
            receiver.to_string(),
            status.as_str()
        ])?;
        let pending = collect_messages(&mut rows)?;
        drop(rows);

        let changed = self.conn().execute(
            "UPDATE messages SET status = ?3
             WHERE sender_id = ?1 AND receiver_id = ?2 AND status <> ?3;",
            params![sender.to_string(), receiver.to_string(), status.as_str()],
        )?;
        for mut message in pending {
            message.status = status;
            self.publish(Table::Messages, ChangeKind::Update, message.id, &message);
        }
        Ok(changed)
    }
}

fn collect_messages(rows: &mut rusqlite::Rows<'_>) -> RepoResult<Vec<Message>> {
    let mut messages = Vec::new();
    while let Some(row) = rows.next()? {
        messages.push(parse_message_row(row)?);
    }
    Ok(messages)
}

fn parse_message_row(row: &Row<'_>) -> RepoResult<Message> {
    let id_text: String = row.get("id")?;
    let sender_text: String = row.get("sender_id")?;
    let receiver_text: String = row.get("receiver_id")?;
    let status_text: String = row.get("status")?;
    Ok(Message {
        id: parse_uuid(&id_text, "messages.id")?,
        sender_id: parse_uuid(&sender_text, "messages.sender_id")?,
        receiver_id: parse_uuid(&receiver_text, "messages.receiver_id")?,
        content: row.get("content")?,
        status: parse_enum(&status_text, "messages.status", MessageStatus::parse)?,
        created_at: row.get("created_at")?,
    })
}
