//! Badge repository.

use crate::model::badge::UserBadge;
use crate::model::enums::BadgeType;
use crate::model::now_epoch_ms;
use crate::model::profile::ProfileId;
use crate::realtime::{ChangeKind, Table};
use crate::repo::{parse_enum, parse_uuid, RepoResult, SqliteStore};
use rusqlite::{params, Connection};
use uuid::Uuid;

/// Repository interface for earned badges.
pub trait BadgeRepository {
    /// Grants a badge once; returns `None` when it was already earned.
    fn award_badge(&self, user: ProfileId, badge: BadgeType) -> RepoResult<Option<UserBadge>>;
    /// Badges of `user`, earliest first.
    fn list_badges(&self, user: ProfileId) -> RepoResult<Vec<UserBadge>>;
}

impl BadgeRepository for SqliteStore<'_> {
    fn award_badge(&self, user: ProfileId, badge: BadgeType) -> RepoResult<Option<UserBadge>> {
        let awarded = insert_badge(self.conn(), user, badge)?;
        if let Some(badge) = awarded.as_ref() {
            self.publish(Table::UserBadges, ChangeKind::Insert, badge.id, badge);
        }
        Ok(awarded)
    }

    fn list_badges(&self, user: ProfileId) -> RepoResult<Vec<UserBadge>> {
        let mut stmt = self.conn().prepare_cached(
            "SELECT id, user_id, badge_type, earned_at FROM user_badges
             WHERE user_id = ?1
             ORDER BY earned_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([user.to_string()])?;
        let mut badges = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get("id")?;
            let user_text: String = row.get("user_id")?;
            let badge_text: String = row.get("badge_type")?;
            badges.push(UserBadge {
                id: parse_uuid(&id_text, "user_badges.id")?,
                user_id: parse_uuid(&user_text, "user_badges.user_id")?,
                badge_type: parse_enum(&badge_text, "user_badges.badge_type", BadgeType::parse)?,
                earned_at: row.get("earned_at")?,
            });
        }
        Ok(badges)
    }
}

/// Inserts a badge row unless `(user, badge)` already exists.
/// Callers inside a transaction pass it by deref.
pub(crate) fn insert_badge(
    conn: &Connection,
    user: ProfileId,
    badge: BadgeType,
) -> RepoResult<Option<UserBadge>> {
    let id = Uuid::new_v4();
    let now = now_epoch_ms();
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO user_badges (id, user_id, badge_type, earned_at)
         VALUES (?1, ?2, ?3, ?4);",
        params![id.to_string(), user.to_string(), badge.as_str(), now],
    )?;
    Ok((inserted > 0).then_some(UserBadge {
        id,
        user_id: user,
        badge_type: badge,
        earned_at: now,
    }))
}
