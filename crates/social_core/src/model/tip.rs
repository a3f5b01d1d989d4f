//! Coin tip records.

use crate::model::post::PostId;
use crate::model::profile::ProfileId;
use crate::model::validation::{check_text_len, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted `tips` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tip {
    pub id: Uuid,
    pub sender_id: ProfileId,
    pub receiver_id: ProfileId,
    pub post_id: Option<PostId>,
    pub amount: i64,
    pub message: Option<String>,
    pub created_at: i64,
}

/// Insert model for a tip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTip {
    pub sender_id: ProfileId,
    pub receiver_id: ProfileId,
    pub post_id: Option<PostId>,
    pub amount: i64,
    pub message: Option<String>,
}

impl NewTip {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.amount <= 0 {
            return Err(ModelValidationError::NonPositiveAmount(self.amount));
        }
        if self.sender_id == self.receiver_id {
            return Err(ModelValidationError::SelfTarget("tip"));
        }
        if let Some(message) = self.message.as_deref() {
            check_text_len("tip message", message)?;
        }
        Ok(())
    }
}
