//! Like repository.
//!
//! # Invariants
//! - `like` and `unlike` are idempotent; the target's `like_count` moves
//!   only when a row was actually inserted or removed.

use crate::model::engagement::{EngagementTarget, Like};
use crate::model::now_epoch_ms;
use crate::model::post::PostId;
use crate::model::profile::ProfileId;
use crate::realtime::{ChangeKind, Table};
use crate::repo::comment_repo::target_not_found;
use crate::repo::{parse_uuid, RepoResult, SqliteStore};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension};
use std::collections::HashSet;
use uuid::Uuid;

/// Result of a like/unlike call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    /// Whether a row was inserted or removed.
    pub changed: bool,
    /// Target's `like_count` after the call.
    pub like_count: i64,
}

/// Repository interface for likes on posts and stories.
pub trait LikeRepository {
    fn like(&self, user_id: ProfileId, target: EngagementTarget) -> RepoResult<LikeOutcome>;
    fn unlike(&self, user_id: ProfileId, target: EngagementTarget) -> RepoResult<LikeOutcome>;
    fn has_liked(&self, user_id: ProfileId, target: EngagementTarget) -> RepoResult<bool>;
    /// Subset of `post_ids` liked by `user_id`.
    fn liked_post_ids(&self, user_id: ProfileId, post_ids: &[PostId]) -> RepoResult<HashSet<PostId>>;
}

impl LikeRepository for SqliteStore<'_> {
    fn like(&self, user_id: ProfileId, target: EngagementTarget) -> RepoResult<LikeOutcome> {
        let id = Uuid::new_v4();
        let now = now_epoch_ms();
        let (post_id, story_id) = target.columns();

        let tx = self.begin()?;
        let exists = tx
            .query_row(target_exists_sql(target), [target.id().to_string()], |_| Ok(()))
            .optional()?;
        if exists.is_none() {
            return Err(target_not_found(target));
        }
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO likes (id, user_id, post_id, story_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.to_string(),
                user_id.to_string(),
                post_id.map(|value| value.to_string()),
                story_id.map(|value| value.to_string()),
                now,
            ],
        )?;
        if inserted > 0 {
            tx.execute(adjust_sql(target, 1), [target.id().to_string()])?;
        }
        let like_count = read_like_count(&tx, target)?;
        tx.commit()?;

        if inserted > 0 {
            let like = Like {
                id,
                user_id,
                target,
                created_at: now,
            };
            self.publish(Table::Likes, ChangeKind::Insert, id, &like);
        }
        Ok(LikeOutcome {
            changed: inserted > 0,
            like_count,
        })
    }

    fn unlike(&self, user_id: ProfileId, target: EngagementTarget) -> RepoResult<LikeOutcome> {
        let tx = self.begin()?;
        let removed: Option<(String, i64)> = tx
            .query_row(
                delete_like_sql(target),
                params![user_id.to_string(), target.id().to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        if removed.is_some() {
            tx.execute(adjust_sql(target, -1), [target.id().to_string()])?;
        }
        let like_count = read_like_count(&tx, target)?;
        tx.commit()?;

        let changed = removed.is_some();
        if let Some((id_text, created_at)) = removed {
            let id = parse_uuid(&id_text, "likes.id")?;
            let like = Like {
                id,
                user_id,
                target,
                created_at,
            };
            self.publish(Table::Likes, ChangeKind::Delete, id, &like);
        }
        Ok(LikeOutcome {
            changed,
            like_count,
        })
    }

    fn has_liked(&self, user_id: ProfileId, target: EngagementTarget) -> RepoResult<bool> {
        let sql = match target {
            EngagementTarget::Post(_) => {
                "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = ?1 AND post_id = ?2);"
            }
            EngagementTarget::Story(_) => {
                "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = ?1 AND story_id = ?2);"
            }
        };
        let exists: i64 = self.conn().query_row(
            sql,
            params![user_id.to_string(), target.id().to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn liked_post_ids(&self, user_id: ProfileId, post_ids: &[PostId]) -> RepoResult<HashSet<PostId>> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let placeholders = vec!["?"; post_ids.len()].join(", ");
        let sql = format!(
            "SELECT post_id FROM likes WHERE user_id = ? AND post_id IN ({placeholders});"
        );
        let mut bind_values = vec![Value::Text(user_id.to_string())];
        bind_values.extend(post_ids.iter().map(|id| Value::Text(id.to_string())));

        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut liked = HashSet::new();
        while let Some(row) = rows.next()? {
            let text: String = row.get(0)?;
            liked.insert(parse_uuid(&text, "likes.post_id")?);
        }
        Ok(liked)
    }
}

fn target_exists_sql(target: EngagementTarget) -> &'static str {
    match target {
        EngagementTarget::Post(_) => "SELECT 1 FROM posts WHERE id = ?1;",
        EngagementTarget::Story(_) => "SELECT 1 FROM stories WHERE id = ?1;",
    }
}

fn delete_like_sql(target: EngagementTarget) -> &'static str {
    match target {
        EngagementTarget::Post(_) => {
            "DELETE FROM likes WHERE user_id = ?1 AND post_id = ?2 RETURNING id, created_at;"
        }
        EngagementTarget::Story(_) => {
            "DELETE FROM likes WHERE user_id = ?1 AND story_id = ?2 RETURNING id, created_at;"
        }
    }
}

fn adjust_sql(target: EngagementTarget, delta: i8) -> &'static str {
    match (target, delta > 0) {
        (EngagementTarget::Post(_), true) => {
            "UPDATE posts SET like_count = like_count + 1 WHERE id = ?1;"
        }
        (EngagementTarget::Post(_), false) => {
            "UPDATE posts SET like_count = MAX(like_count - 1, 0) WHERE id = ?1;"
        }
        (EngagementTarget::Story(_), true) => {
            "UPDATE stories SET like_count = like_count + 1 WHERE id = ?1;"
        }
        (EngagementTarget::Story(_), false) => {
            "UPDATE stories SET like_count = MAX(like_count - 1, 0) WHERE id = ?1;"
        }
    }
}

fn read_like_count(conn: &rusqlite::Connection, target: EngagementTarget) -> RepoResult<i64> {
    let sql = match target {
        EngagementTarget::Post(_) => "SELECT like_count FROM posts WHERE id = ?1;",
        EngagementTarget::Story(_) => "SELECT like_count FROM stories WHERE id = ?1;",
    };
    conn.query_row(sql, [target.id().to_string()], |row| row.get(0))
        .optional()?
        .ok_or_else(|| target_not_found(target))
}
