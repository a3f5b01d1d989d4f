//! Profile badge records.

use crate::model::enums::BadgeType;
use crate::model::profile::ProfileId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted `user_badges` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBadge {
    pub id: Uuid,
    pub user_id: ProfileId,
    pub badge_type: BadgeType,
    pub earned_at: i64,
}
