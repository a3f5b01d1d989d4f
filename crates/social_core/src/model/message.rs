//! Direct message records.

use crate::model::enums::MessageStatus;
use crate::model::profile::ProfileId;
use crate::model::validation::{require_text, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type MessageId = Uuid;

/// Persisted `messages` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: ProfileId,
    pub receiver_id: ProfileId,
    pub content: String,
    pub status: MessageStatus,
    pub created_at: i64,
}

impl Message {
    /// Returns the participant that is not `viewer`.
    pub fn counterpart(&self, viewer: ProfileId) -> ProfileId {
        if self.sender_id == viewer {
            self.receiver_id
        } else {
            self.sender_id
        }
    }

    pub fn involves(&self, profile: ProfileId) -> bool {
        self.sender_id == profile || self.receiver_id == profile
    }
}

/// Insert model for a direct message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender_id: ProfileId,
    pub receiver_id: ProfileId,
    pub content: String,
}

impl NewMessage {
    /// Trims content and validates participants.
    pub fn normalize(mut self) -> Result<Self, ModelValidationError> {
        self.content = self.content.trim().to_string();
        require_text("message", &self.content)?;
        if self.sender_id == self.receiver_id {
            return Err(ModelValidationError::SelfTarget("message"));
        }
        Ok(self)
    }
}
